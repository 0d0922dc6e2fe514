// src/hierarchy.rs
//
// Compositional data model: Patch -> PatchLevel -> PatchHierarchy.
//
// A hierarchy owns its levels, patches and patch data exclusively. Each time
// snapshot is immutable once inserted; advancing in time appends a new
// snapshot rather than mutating an existing one, so in-flight geometry
// queries never observe a half-built state.

use std::collections::BTreeMap;

use crate::boxm::Box;
use crate::error::{AmrError, AmrResult};
use crate::patchdata::PatchData;

/// One grid block at a refinement level: a box plus the per-quantity data
/// defined over it. All `PatchData` entries share the patch box; insertion
/// order is the deterministic enumeration order used by the geometry engine.
#[derive(Debug, Clone)]
pub struct Patch<const D: usize> {
    pub id: String,
    pub cell_box: Box<D>,
    datas: Vec<PatchData<D>>,
}

impl<const D: usize> Patch<D> {
    pub fn new(id: &str, datas: Vec<PatchData<D>>) -> AmrResult<Self> {
        let first = datas
            .first()
            .ok_or_else(|| AmrError::Config(format!("patch '{}' carries no data", id)))?;
        let cell_box = first.layout().cell_box;
        for pd in &datas {
            if pd.layout().cell_box != cell_box {
                return Err(AmrError::DataIntegrity(format!(
                    "patch '{}': quantity '{}' box {:?} differs from patch box {:?}",
                    id,
                    pd.name(),
                    pd.layout().cell_box,
                    cell_box
                )));
            }
        }
        Ok(Self {
            id: id.to_string(),
            cell_box,
            datas,
        })
    }

    pub fn datas(&self) -> &[PatchData<D>] {
        &self.datas
    }

    pub fn data(&self, name: &str) -> Option<&PatchData<D>> {
        self.datas.iter().find(|pd| pd.name() == name)
    }

    pub fn data_mut(&mut self, name: &str) -> Option<&mut PatchData<D>> {
        self.datas.iter_mut().find(|pd| pd.name() == name)
    }

    /// Attach another quantity, e.g. when merging related snapshot files.
    pub fn push_data(&mut self, pd: PatchData<D>) -> AmrResult<()> {
        if pd.layout().cell_box != self.cell_box {
            return Err(AmrError::DataIntegrity(format!(
                "patch '{}': quantity '{}' box {:?} differs from patch box {:?}",
                self.id,
                pd.name(),
                pd.layout().cell_box,
                self.cell_box
            )));
        }
        self.datas.push(pd);
        Ok(())
    }
}

/// Ordered set of patches at one refinement level.
///
/// Invariant: patch interiors never overlap; only ghost boxes may.
#[derive(Debug, Clone)]
pub struct PatchLevel<const D: usize> {
    pub index: usize,
    pub patches: Vec<Patch<D>>,
}

impl<const D: usize> PatchLevel<D> {
    pub fn new(index: usize, patches: Vec<Patch<D>>) -> AmrResult<Self> {
        for (i, a) in patches.iter().enumerate() {
            for b in patches.iter().skip(i + 1) {
                if a.cell_box.intersection(&b.cell_box).is_some() {
                    return Err(AmrError::OverlappingPatches {
                        level: index,
                        first: a.id.clone(),
                        second: b.id.clone(),
                    });
                }
            }
        }
        Ok(Self { index, patches })
    }
}

/// Ordered map of levels per time snapshot, plus the level-0 domain box,
/// the integer refinement ratio and the per-axis periodicity.
#[derive(Debug, Clone)]
pub struct PatchHierarchy<const D: usize> {
    domain_box: Box<D>,
    refinement_ratio: u32,
    periodic: [bool; D],
    snapshots: BTreeMap<String, BTreeMap<usize, PatchLevel<D>>>,
}

impl<const D: usize> PatchHierarchy<D> {
    pub fn new(domain_box: Box<D>, refinement_ratio: u32, periodic: [bool; D]) -> Self {
        Self {
            domain_box,
            refinement_ratio,
            periodic,
            snapshots: BTreeMap::new(),
        }
    }

    /// Fixed-precision decimal key for a physical time, the storage and
    /// lookup convention for snapshots.
    pub fn format_timestamp(time: f64) -> String {
        format!("{:.10}", time)
    }

    #[inline]
    pub fn domain_box(&self) -> Box<D> {
        self.domain_box
    }

    #[inline]
    pub fn refinement_ratio(&self) -> u32 {
        self.refinement_ratio
    }

    #[inline]
    pub fn periodic(&self) -> [bool; D] {
        self.periodic
    }

    /// Domain box expressed in level `ilvl`'s own index space.
    pub fn refined_domain_box(&self, ilvl: usize) -> Box<D> {
        let mut b = self.domain_box;
        for _ in 0..ilvl {
            b = b.refine(self.refinement_ratio);
        }
        b
    }

    /// Append a new immutable time snapshot. Re-inserting an existing time
    /// is a data-integrity violation: snapshots are never replaced.
    pub fn add_snapshot(
        &mut self,
        time: &str,
        levels: BTreeMap<usize, PatchLevel<D>>,
    ) -> AmrResult<()> {
        if self.snapshots.contains_key(time) {
            return Err(AmrError::DataIntegrity(format!(
                "snapshot at time '{}' already exists",
                time
            )));
        }
        self.snapshots.insert(time.to_string(), levels);
        Ok(())
    }

    pub fn times(&self) -> impl Iterator<Item = &str> {
        self.snapshots.keys().map(String::as_str)
    }

    /// Earliest snapshot key, the default target for geometry queries.
    pub fn first_time(&self) -> AmrResult<&str> {
        self.snapshots
            .keys()
            .next()
            .map(String::as_str)
            .ok_or_else(|| AmrError::MissingTime("<empty hierarchy>".to_string()))
    }

    pub fn levels_at(&self, time: &str) -> AmrResult<&BTreeMap<usize, PatchLevel<D>>> {
        self.snapshots
            .get(time)
            .ok_or_else(|| AmrError::MissingTime(time.to_string()))
    }

    pub fn level(&self, ilvl: usize, time: &str) -> AmrResult<&PatchLevel<D>> {
        self.levels_at(time)?
            .get(&ilvl)
            .ok_or_else(|| AmrError::MissingLevel {
                level: ilvl,
                time: time.to_string(),
            })
    }

    /// Mutable patch lookup, for explicit operators (transfer, coarsening
    /// sync) that rebuild data in place before a snapshot is published.
    pub fn level_mut(&mut self, ilvl: usize, time: &str) -> AmrResult<&mut PatchLevel<D>> {
        self.snapshots
            .get_mut(time)
            .ok_or_else(|| AmrError::MissingTime(time.to_string()))?
            .get_mut(&ilvl)
            .ok_or_else(|| AmrError::MissingLevel {
                level: ilvl,
                time: time.to_string(),
            })
    }
}
