// src/snapshot.rs
//
// JSON persistence for hierarchy snapshots. One file can hold any subset of
// quantities; several files covering the same times merge back into a
// single hierarchy, so field and particle outputs may be written
// separately.

use std::collections::BTreeMap;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::boxm::Box;
use crate::config::to_array;
use crate::error::{AmrError, AmrResult};
use crate::gridlayout::GridLayout;
use crate::hierarchy::{Patch, PatchHierarchy, PatchLevel};
use crate::particles::{Particle, Particles};
use crate::patchdata::{FieldData, ParticleData, PatchData};

#[derive(Debug, Serialize, Deserialize)]
struct FieldDto {
    name: String,
    data: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ParticleDto {
    icell: Vec<i32>,
    delta: Vec<f64>,
    v: [f64; 3],
    weight: f64,
    charge: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PopulationDto {
    name: String,
    mass: f64,
    particles: Vec<ParticleDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PatchDto {
    id: String,
    lower: Vec<i32>,
    upper: Vec<i32>,
    origin: Vec<f64>,
    dl: Vec<f64>,
    interp_order: u8,
    fields: Vec<FieldDto>,
    populations: Vec<PopulationDto>,
}

/// On-disk snapshot layout: hierarchy metadata plus, per timestamp key and
/// level index, the patches with their datasets.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    domain_lower: Vec<i32>,
    domain_upper: Vec<i32>,
    refinement_ratio: u32,
    periodic: Vec<bool>,
    times: BTreeMap<String, BTreeMap<usize, Vec<PatchDto>>>,
}

fn patch_to_dto<const D: usize>(patch: &Patch<D>) -> Option<PatchDto> {
    let layout = patch.datas().first()?.layout();
    let mut dto = PatchDto {
        id: patch.id.clone(),
        lower: layout.cell_box.lower.to_vec(),
        upper: layout.cell_box.upper.to_vec(),
        origin: layout.origin.to_vec(),
        dl: layout.dl.to_vec(),
        interp_order: layout.interp_order,
        fields: Vec::new(),
        populations: Vec::new(),
    };
    for pd in patch.datas() {
        match pd {
            PatchData::Field(f) => dto.fields.push(FieldDto {
                name: f.name.clone(),
                data: f.data.clone(),
            }),
            PatchData::Particles(p) => dto.populations.push(PopulationDto {
                name: p.pop.clone(),
                mass: p.mass,
                particles: p
                    .particles
                    .particles
                    .iter()
                    .map(|particle| ParticleDto {
                        icell: particle.icell.to_vec(),
                        delta: particle.delta.to_vec(),
                        v: particle.v,
                        weight: particle.weight,
                        charge: particle.charge,
                    })
                    .collect(),
            }),
        }
    }
    Some(dto)
}

fn patch_from_dto<const D: usize>(dto: &PatchDto) -> AmrResult<Patch<D>> {
    let cell_box = Box::new(
        to_array(&dto.lower, "patch lower")?,
        to_array(&dto.upper, "patch upper")?,
    );
    let layout = GridLayout::new(
        cell_box,
        to_array(&dto.origin, "patch origin")?,
        to_array(&dto.dl, "patch cell width")?,
        dto.interp_order,
    )?;

    let mut datas = Vec::with_capacity(dto.fields.len() + dto.populations.len());
    for f in &dto.fields {
        datas.push(PatchData::Field(FieldData::new(
            layout.clone(),
            &f.name,
            f.data.clone(),
        )?));
    }
    for pop in &dto.populations {
        let mut particles = Particles::new();
        for p in &pop.particles {
            particles.particles.push(Particle {
                icell: to_array(&p.icell, "particle icell")?,
                delta: to_array(&p.delta, "particle delta")?,
                v: p.v,
                weight: p.weight,
                charge: p.charge,
            });
        }
        datas.push(PatchData::Particles(ParticleData::new(
            layout.clone(),
            &pop.name,
            pop.mass,
            particles,
        )));
    }
    Patch::new(&dto.id, datas)
}

/// Write every snapshot of `hier` to a JSON file.
pub fn save<const D: usize>(hier: &PatchHierarchy<D>, path: impl AsRef<Path>) -> AmrResult<()> {
    let domain = hier.domain_box();
    let mut file = SnapshotFile {
        domain_lower: domain.lower.to_vec(),
        domain_upper: domain.upper.to_vec(),
        refinement_ratio: hier.refinement_ratio(),
        periodic: hier.periodic().to_vec(),
        times: BTreeMap::new(),
    };
    for time in hier.times() {
        let mut levels = BTreeMap::new();
        for (&ilvl, level) in hier.levels_at(time)? {
            levels.insert(
                ilvl,
                level.patches.iter().filter_map(patch_to_dto).collect(),
            );
        }
        file.times.insert(time.to_string(), levels);
    }
    std::fs::write(&path, serde_json::to_string_pretty(&file)?)?;
    info!(
        "wrote {} snapshot(s) to {}",
        file.times.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Load a hierarchy from a JSON snapshot file. A missing or malformed file
/// is a hard error.
pub fn load<const D: usize>(path: impl AsRef<Path>) -> AmrResult<PatchHierarchy<D>> {
    let file: SnapshotFile = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    let domain = Box::new(
        to_array(&file.domain_lower, "domain lower")?,
        to_array(&file.domain_upper, "domain upper")?,
    );
    let mut hier = PatchHierarchy::new(
        domain,
        file.refinement_ratio,
        to_array(&file.periodic, "periodic")?,
    );
    for (time, level_dtos) in &file.times {
        let mut levels = BTreeMap::new();
        for (&ilvl, patch_dtos) in level_dtos {
            let patches = patch_dtos
                .iter()
                .map(patch_from_dto)
                .collect::<AmrResult<Vec<_>>>()?;
            levels.insert(ilvl, PatchLevel::new(ilvl, patches)?);
        }
        hier.add_snapshot(time, levels)?;
    }
    Ok(hier)
}

/// Merge another snapshot file into an existing hierarchy.
///
/// Times absent from `hier` are added wholesale. For times already present,
/// each file patch must match an existing patch by id and its quantities
/// are attached to it; a population appearing on both sides must agree on
/// its mass.
pub fn load_into<const D: usize>(
    hier: &mut PatchHierarchy<D>,
    path: impl AsRef<Path>,
) -> AmrResult<()> {
    let other = load::<D>(&path)?;
    if other.domain_box() != hier.domain_box()
        || other.refinement_ratio() != hier.refinement_ratio()
        || other.periodic() != hier.periodic()
    {
        return Err(AmrError::DataIntegrity(format!(
            "snapshot file {} describes a different hierarchy",
            path.as_ref().display()
        )));
    }

    let times: Vec<String> = other.times().map(str::to_string).collect();
    for time in &times {
        if hier.levels_at(time).is_err() {
            let levels = other.levels_at(time)?.clone();
            hier.add_snapshot(time, levels)?;
            continue;
        }
        let other_levels = other.levels_at(time)?;
        for (&ilvl, other_level) in other_levels {
            let level = hier.level_mut(ilvl, time)?;
            for other_patch in &other_level.patches {
                let patch = level
                    .patches
                    .iter_mut()
                    .find(|p| p.id == other_patch.id)
                    .ok_or_else(|| {
                        AmrError::DataIntegrity(format!(
                            "patch '{}' at t={} not present in target hierarchy",
                            other_patch.id, time
                        ))
                    })?;
                for pd in other_patch.datas() {
                    match patch.data(pd.name()) {
                        None => patch.push_data(pd.clone())?,
                        Some(existing) => {
                            let (a, b) = (existing.as_particles(), pd.as_particles());
                            if let (Some(a), Some(b)) = (a, b) {
                                if a.mass != b.mass {
                                    return Err(AmrError::DataIntegrity(format!(
                                        "population '{}' mass mismatch: {} vs {}",
                                        a.pop, a.mass, b.mass
                                    )));
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
