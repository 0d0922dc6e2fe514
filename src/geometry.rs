// src/geometry.rs
//
// Overlap detection and ghost-region derivation for inter-level and
// inter-patch consistency.
//
// Everything here is a pure function over an immutable hierarchy snapshot.
// Results are exact integer boxes. Records are emitted in a fixed order
// (direct overlaps in patch-pair order, then periodic images), but callers
// should treat each result list as a set.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::debug;

use crate::boxm::{remove_all, Box};
use crate::error::{AmrError, AmrResult};
use crate::gridlayout::particle_ghost_width;
use crate::hierarchy::{Patch, PatchHierarchy, PatchLevel};

/// Domain border side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Lower,
    Upper,
}

/// True if, in any dimension, `b` reaches or crosses `domain`'s boundary on
/// the given side.
pub fn touch_domain_border<const D: usize>(b: &Box<D>, domain: &Box<D>, side: Side) -> bool {
    (0..D).any(|d| touches_side_dim(b, domain, side, d))
}

#[inline]
fn touches_side_dim<const D: usize>(b: &Box<D>, domain: &Box<D>, side: Side, d: usize) -> bool {
    match side {
        Side::Lower => b.lower[d] <= domain.lower[d],
        Side::Upper => b.upper[d] >= domain.upper[d],
    }
}

/// One ghost-box overlap between an ordered pair of patches.
///
/// `region` is the intersection of the (possibly shifted) ghost boxes,
/// expressed in the shifted frame; `offset` records the shift applied to
/// each patch of the pair: zero for direct overlaps, one domain length
/// along one periodic axis for periodic images.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlap<const D: usize> {
    pub quantity: String,
    pub patches: (String, String),
    pub region: Box<D>,
    pub offset: ([i32; D], [i32; D]),
}

/// All ghost-box overlaps per level: every distinct patch pair, every shared
/// quantity, direct first, then single-image periodic overlaps (a patch may
/// periodically overlap its own image).
pub fn hierarchy_overlaps<const D: usize>(
    hier: &PatchHierarchy<D>,
    time: &str,
) -> AmrResult<BTreeMap<usize, Vec<Overlap<D>>>> {
    let mut result = BTreeMap::new();
    for (&ilvl, level) in hier.levels_at(time)? {
        let overlaps = level_overlaps(hier, ilvl, level);
        debug!(
            "level {}: {} ghost-box overlaps ({} patches)",
            ilvl,
            overlaps.len(),
            level.patches.len()
        );
        result.insert(ilvl, overlaps);
    }
    Ok(result)
}

fn level_overlaps<const D: usize>(
    hier: &PatchHierarchy<D>,
    ilvl: usize,
    level: &PatchLevel<D>,
) -> Vec<Overlap<D>> {
    let domain = hier.refined_domain_box(ilvl);
    let periodic = hier.periodic();
    let zero = [0i32; D];
    let mut overlaps = Vec::new();

    // direct overlaps, patch-pair order
    for (p1, p2) in level.patches.iter().tuple_combinations() {
        for pd1 in p1.datas() {
            let pd2 = match p2.data(pd1.name()) {
                Some(pd) => pd,
                None => continue,
            };
            if let Some(region) = pd1.ghost_box().intersection(&pd2.ghost_box()) {
                overlaps.push(Overlap {
                    quantity: pd1.name().to_string(),
                    patches: (p1.id.clone(), p2.id.clone()),
                    region,
                    offset: (zero, zero),
                });
            }
        }
    }

    // periodic images: one domain length per periodic axis, both signs, each
    // wrap expressed in both patches' frames. Ghost widths are always far
    // smaller than the domain extent, so single-image shifts suffice.
    let n = level.patches.len();
    for i in 0..n {
        for j in i..n {
            let (p1, p2) = (&level.patches[i], &level.patches[j]);
            for pd1 in p1.datas() {
                let pd2 = match p2.data(pd1.name()) {
                    Some(pd) => pd,
                    None => continue,
                };
                for d in 0..D {
                    if !periodic[d] {
                        continue;
                    }
                    let mut down = [0i32; D];
                    down[d] = -domain.shape()[d];
                    let mut up = [0i32; D];
                    up[d] = domain.shape()[d];

                    let lower_wrap = touches_side_dim(&p1.cell_box, &domain, Side::Lower, d)
                        || touches_side_dim(&p2.cell_box, &domain, Side::Upper, d);
                    let upper_wrap = touches_side_dim(&p1.cell_box, &domain, Side::Upper, d)
                        || touches_side_dim(&p2.cell_box, &domain, Side::Lower, d);

                    let mut candidates: Vec<([i32; D], [i32; D])> = Vec::new();
                    if lower_wrap {
                        candidates.push((zero, down));
                        candidates.push((up, zero));
                    }
                    if upper_wrap {
                        candidates.push((zero, up));
                        candidates.push((down, zero));
                    }

                    for (off1, off2) in candidates {
                        let g1 = pd1.ghost_box().shift(off1);
                        let g2 = pd2.ghost_box().shift(off2);
                        if let Some(region) = g1.intersection(&g2) {
                            overlaps.push(Overlap {
                                quantity: pd1.name().to_string(),
                                patches: (p1.id.clone(), p2.id.clone()),
                                region,
                                offset: (off1, off2),
                            });
                        }
                    }
                }
            }
        }
    }

    overlaps
}

/// Per-patch list of ghost boxes for one quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchGhostBoxes<const D: usize> {
    pub patch_id: String,
    pub boxes: Vec<Box<D>>,
}

/// The cells of each patch's particle ghost box that lie outside the patch
/// itself, where ghost particles must be supplied by neighbors or by
/// periodic copies of the patch's own interior.
///
/// Result: per level, patch-ordered box lists (treat each list as a set).
pub fn particle_ghost_area_boxes<const D: usize>(
    hier: &PatchHierarchy<D>,
    time: &str,
) -> AmrResult<BTreeMap<usize, Vec<PatchGhostBoxes<D>>>> {
    let mut result = BTreeMap::new();
    for (&ilvl, level) in hier.levels_at(time)? {
        let mut per_patch = Vec::with_capacity(level.patches.len());
        for patch in &level.patches {
            let gw = particle_ghost_width(patch_interp_order(patch)?);
            let gbox = patch.cell_box.grow(gw);
            per_patch.push(PatchGhostBoxes {
                patch_id: patch.id.clone(),
                boxes: gbox.remove(&patch.cell_box),
            });
        }
        result.insert(ilvl, per_patch);
    }
    Ok(result)
}

fn patch_interp_order<const D: usize>(patch: &Patch<D>) -> AmrResult<u8> {
    patch
        .datas()
        .first()
        .map(|pd| pd.layout().interp_order)
        .ok_or_else(|| AmrError::Config(format!("patch '{}' carries no data", patch.id)))
}

/// Per-quantity, patch-ordered ghost boxes for one quantity on every patch
/// of a level.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityGhostBoxes<const D: usize> {
    pub quantity: String,
    pub patches: Vec<PatchGhostBoxes<D>>,
}

/// For level `ilvl > 0`: the cells of each patch's ghost box that no
/// same-level patch interior covers (periodic images included): the cells
/// that must be filled by interpolating from level `ilvl - 1`.
///
/// By construction no returned box intersects any level-`ilvl` patch
/// interior.
pub fn level_ghost_boxes<const D: usize>(
    hier: &PatchHierarchy<D>,
    quantities: &[&str],
    ilvl: usize,
    time: &str,
) -> AmrResult<Vec<QuantityGhostBoxes<D>>> {
    if ilvl == 0 {
        return Err(AmrError::CoarsestLevelGhosts);
    }
    let level = hier.level(ilvl, time)?;
    let domain = hier.refined_domain_box(ilvl);
    let periodic = hier.periodic();

    let mut result = Vec::with_capacity(quantities.len());
    for &qty in quantities {
        let mut per_patch = Vec::with_capacity(level.patches.len());
        for patch in &level.patches {
            let pdata = patch.data(qty).ok_or_else(|| AmrError::MissingData {
                patch: patch.id.clone(),
                quantity: qty.to_string(),
            })?;

            let mut boxes = pdata.ghost_box().remove(&patch.cell_box);
            for other in &level.patches {
                if other.id != patch.id {
                    boxes = remove_all(boxes, &other.cell_box);
                }
                for d in 0..D {
                    if !periodic[d] {
                        continue;
                    }
                    let mut shift = [0i32; D];
                    shift[d] = domain.shape()[d];
                    boxes = remove_all(boxes, &other.cell_box.shift(shift));
                    shift[d] = -domain.shape()[d];
                    boxes = remove_all(boxes, &other.cell_box.shift(shift));
                }
            }

            for b in &boxes {
                for other in &level.patches {
                    debug_assert!(
                        b.intersection(&other.cell_box).is_none(),
                        "level ghost box {:?} intersects patch '{}'",
                        b,
                        other.id
                    );
                }
            }
            per_patch.push(PatchGhostBoxes {
                patch_id: patch.id.clone(),
                boxes,
            });
        }
        result.push(QuantityGhostBoxes {
            quantity: qty.to_string(),
            patches: per_patch,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxm::Box1;

    #[test]
    fn touch_border_reference_cases() {
        let domain = Box1::span(0, 64);
        assert!(!touch_domain_border(&Box1::span(10, 20), &domain, Side::Upper));
        assert!(!touch_domain_border(&Box1::span(10, 20), &domain, Side::Lower));
        assert!(touch_domain_border(&Box1::span(0, 20), &domain, Side::Lower));
        assert!(touch_domain_border(&Box1::span(-5, 20), &domain, Side::Lower));
        assert!(touch_domain_border(&Box1::span(-5, 70), &domain, Side::Lower));
        assert!(touch_domain_border(&Box1::span(-5, 70), &domain, Side::Upper));
        assert!(touch_domain_border(&Box1::span(40, 70), &domain, Side::Upper));
        assert!(touch_domain_border(&Box1::span(40, 64), &domain, Side::Upper));
    }

    #[test]
    fn touch_border_2d_any_dimension_suffices() {
        use crate::boxm::Box2;
        let domain = Box2::new([0, 0], [9, 9]);
        // reaches the border in y only
        let b = Box2::new([3, 0], [5, 4]);
        assert!(touch_domain_border(&b, &domain, Side::Lower));
        assert!(!touch_domain_border(&b, &domain, Side::Upper));
    }
}
