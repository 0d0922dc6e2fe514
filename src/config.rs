// src/config.rs
//
// Declarative hierarchy setup: a serde-backed description of the domain,
// grid and refinement boxes, and a builder turning it into a populated
// `PatchHierarchy` with zeroed fields and deterministically seeded
// particles.

use std::collections::BTreeMap;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::boxm::Box;
use crate::error::{AmrError, AmrResult};
use crate::gridlayout::{is_field_quantity, particle_ghost_width, GridLayout};
use crate::hierarchy::{Patch, PatchHierarchy, PatchLevel};
use crate::particles::{periodic_duplicate, Particles};
use crate::patchdata::{FieldData, ParticleData, PatchData};

/// Boundary condition along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    Periodic,
    Open,
}

/// One axis-aligned refinement region, in the index space of the level it
/// refines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxConfig {
    pub lower: Vec<i32>,
    pub upper: Vec<i32>,
}

/// One particle population to seed on every patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub name: String,
    pub mass: f64,
}

/// Full hierarchy description. Array-valued entries are per-dimension;
/// their length fixes the dimensionality and must agree everywhere.
///
/// `refinement_boxes` maps level keys (`"L0"`, `"L1"`, ...) to named boxes
/// in that level's index space; each box, refined once, becomes a patch of
/// the next level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub cells: Vec<i32>,
    pub origin: Vec<f64>,
    pub cell_width: Vec<f64>,
    pub interp_order: u8,
    #[serde(default = "default_ratio")]
    pub refinement_ratio: u32,
    pub boundary: Vec<Boundary>,
    pub quantities: Vec<String>,
    #[serde(default)]
    pub populations: Vec<PopulationConfig>,
    #[serde(default)]
    pub refinement_boxes: BTreeMap<String, BTreeMap<String, BoxConfig>>,
    #[serde(default)]
    pub time: f64,
}

fn default_ratio() -> u32 {
    2
}

impl HierarchyConfig {
    pub fn from_json(text: &str) -> AmrResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> AmrResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    fn dim_checked(&self, len: usize, what: &str) -> AmrResult<()> {
        if len != self.cells.len() {
            return Err(AmrError::Config(format!(
                "{} has {} entries for a {}-dimensional domain",
                what,
                len,
                self.cells.len()
            )));
        }
        Ok(())
    }
}

pub(crate) fn to_array<T: Copy + Default, const D: usize>(v: &[T], what: &str) -> AmrResult<[T; D]> {
    if v.len() != D {
        return Err(AmrError::Config(format!(
            "{} has {} entries, expected {}",
            what,
            v.len(),
            D
        )));
    }
    let mut a = [T::default(); D];
    a.copy_from_slice(v);
    Ok(a)
}

/// Build a populated hierarchy from its description: level 0 split into two
/// patches along axis 0, finer levels made of the configured refinement
/// boxes refined once, every quantity zero-filled and every population
/// seeded one particle per ghost-box cell (with periodic duplicates).
///
/// The result carries a single snapshot at `config.time`.
pub fn build_hierarchy<const D: usize>(config: &HierarchyConfig) -> AmrResult<PatchHierarchy<D>> {
    config.dim_checked(config.origin.len(), "origin")?;
    config.dim_checked(config.cell_width.len(), "cell_width")?;
    config.dim_checked(config.boundary.len(), "boundary")?;
    let cells: [i32; D] = to_array(&config.cells, "cells")?;
    let origin: [f64; D] = to_array(&config.origin, "origin")?;
    let dl: [f64; D] = to_array(&config.cell_width, "cell_width")?;
    for d in 0..D {
        if cells[d] < 1 {
            return Err(AmrError::Config(format!(
                "domain needs at least one cell per dim, got {} in dim {}",
                cells[d], d
            )));
        }
    }
    let mut periodic = [false; D];
    for d in 0..D {
        periodic[d] = config.boundary[d] == Boundary::Periodic;
    }
    for qty in &config.quantities {
        if !is_field_quantity(qty) {
            return Err(AmrError::UnknownQuantity(qty.clone()));
        }
    }

    let mut upper = [0i32; D];
    for d in 0..D {
        upper[d] = cells[d] - 1;
    }
    let domain_box = Box::new([0; D], upper);
    let mut hier = PatchHierarchy::new(domain_box, config.refinement_ratio, periodic);

    // level boxes, coarsest first: L0 is the domain split in two along
    // axis 0, finer levels are the configured boxes refined once
    let mut level_boxes: Vec<Vec<Box<D>>> = vec![split_along_first_axis(&domain_box)];
    for ilvl in 0.. {
        let key = format!("L{}", ilvl);
        let named = match config.refinement_boxes.get(&key) {
            Some(named) => named,
            None => break,
        };
        let parent_domain = hier.refined_domain_box(ilvl);
        let mut boxes = Vec::with_capacity(named.len());
        for (name, bc) in named {
            let b = Box::new(to_array(&bc.lower, name)?, to_array(&bc.upper, name)?);
            if !parent_domain.contains(&b) {
                return Err(AmrError::Config(format!(
                    "refinement box '{}' {:?} escapes level {} domain {:?}",
                    name, b, ilvl, parent_domain
                )));
            }
            boxes.push(b.refine(config.refinement_ratio));
        }
        level_boxes.push(boxes);
    }

    let mut levels = BTreeMap::new();
    for (ilvl, boxes) in level_boxes.iter().enumerate() {
        let mut dl_lvl = dl;
        for d in 0..D {
            dl_lvl[d] /= (config.refinement_ratio as f64).powi(ilvl as i32);
        }

        // shared particle pool for the level, so neighboring patches hold
        // identical copies in their overlapping ghost regions
        let level_domain = hier.refined_domain_box(ilvl);
        let pool = if config.populations.is_empty() {
            Particles::new()
        } else {
            let mut pool = Particles::one_per_cell(&level_domain);
            periodic_duplicate(
                &mut pool,
                &level_domain,
                periodic,
                particle_ghost_width(config.interp_order),
            );
            pool
        };

        let mut patches = Vec::with_capacity(boxes.len());
        for (ipatch, cell_box) in boxes.iter().enumerate() {
            let mut patch_origin = origin;
            for d in 0..D {
                patch_origin[d] += cell_box.lower[d] as f64 * dl_lvl[d];
            }
            let layout = GridLayout::new(*cell_box, patch_origin, dl_lvl, config.interp_order)?;

            let mut datas = Vec::new();
            for qty in &config.quantities {
                datas.push(PatchData::Field(FieldData::zeros(layout.clone(), qty)?));
            }
            for pop in &config.populations {
                let ghost_box = cell_box.grow(particle_ghost_width(config.interp_order));
                datas.push(PatchData::Particles(ParticleData::new(
                    layout.clone(),
                    &pop.name,
                    pop.mass,
                    pool.select(&ghost_box),
                )));
            }
            patches.push(Patch::new(&format!("L{}P{}", ilvl, ipatch), datas)?);
        }
        levels.insert(ilvl, PatchLevel::new(ilvl, patches)?);
    }

    let time = PatchHierarchy::<D>::format_timestamp(config.time);
    info!(
        "built {}-level hierarchy over {:?} at t={}",
        levels.len(),
        domain_box,
        time
    );
    hier.add_snapshot(&time, levels)?;
    Ok(hier)
}

fn split_along_first_axis<const D: usize>(domain: &Box<D>) -> Vec<Box<D>> {
    let middle = (domain.lower[0] + domain.upper[0]) / 2;
    let mut left = *domain;
    left.upper[0] = middle;
    let mut right = *domain;
    right.lower[0] = middle + 1;
    vec![left, right]
}
