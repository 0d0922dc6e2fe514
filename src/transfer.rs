// src/transfer.rs
//
// Inter-level transfer operators: spatial refinement (coarse to fine),
// coarsening (fine to coarse) and linear time interpolation, plus their
// composition used to reconstruct fine-level ghost values between two
// coarse snapshots.

use std::collections::BTreeMap;

use log::debug;

use crate::boxm::Box;
use crate::error::{AmrError, AmrResult};
use crate::gridlayout::Centering;
use crate::hierarchy::PatchHierarchy;
use crate::patchdata::FieldData;

/// Stencil taps along one axis for a fine index: the coarse indices read and
/// their weights. Coarse fine-index parity selects the branch.
///
/// Primal even fine nodes coincide with coarse nodes and are copied
/// verbatim, which keeps coinciding values bit-identical across levels.
#[inline]
fn axis_taps(centering: Centering, fine: i32) -> ([(i32, f64); 2], usize) {
    let c = fine.div_euclid(2);
    let even = fine.rem_euclid(2) == 0;
    match (centering, even) {
        (Centering::Primal, true) => ([(c, 1.0), (0, 0.0)], 1),
        (Centering::Primal, false) => ([(c, 0.5), (c + 1, 0.5)], 2),
        (Centering::Dual, true) => ([(c - 1, 0.25), (c, 0.75)], 2),
        (Centering::Dual, false) => ([(c, 0.75), (c + 1, 0.25)], 2),
    }
}

/// Spatially refine `coarse` onto the ratio-2 refined box, using the
/// centering-aware linear stencils. Fine values are produced for the fine
/// interior (plus the upper node on primal axes); the fine halo is left
/// zeroed, to be filled by ghost exchange.
///
/// Only `ratio == 2` and one or two dimensions are supported.
pub fn refine<const D: usize>(coarse: &FieldData<D>, ratio: u32) -> AmrResult<FieldData<D>> {
    refine_with_data(coarse, ratio, &coarse.data)
}

/// Same as [`refine`], but reading coarse values from `data` instead of the
/// field's own dataset. `data` must have the field's allocated length; this
/// avoids cloning a whole field just to refine a substituted dataset (e.g.
/// a time-interpolated one).
pub fn refine_with_data<const D: usize>(
    coarse: &FieldData<D>,
    ratio: u32,
    data: &[f64],
) -> AmrResult<FieldData<D>> {
    if ratio != 2 {
        return Err(AmrError::UnsupportedRatio(ratio));
    }
    if D > 2 {
        return Err(AmrError::UnsupportedDim {
            op: "refine",
            dim: D,
        });
    }
    let expected: usize = coarse.alloc_shape().iter().product();
    if data.len() != expected {
        return Err(AmrError::SizeMismatch {
            name: coarse.name.clone(),
            expected,
            actual: data.len(),
        });
    }

    let fine_layout = coarse.layout.refined(ratio);
    let mut fine = FieldData::zeros(fine_layout, &coarse.name)?;

    // fine interior, extended to the closing node on primal axes
    let mut fill = fine.layout.cell_box;
    for d in 0..D {
        if coarse.centerings[d].is_primal() {
            fill.upper[d] += 1;
        }
    }

    for point in fill.points() {
        let mut value = 0.0;
        // tensor product of the per-axis taps, at most 2^D terms
        let mut taps = [([(0i32, 0.0); 2], 0usize); D];
        for d in 0..D {
            taps[d] = axis_taps(coarse.centerings[d], point[d]);
        }
        let mut combo = [0usize; D];
        'combos: loop {
            let mut weight = 1.0;
            let mut cidx = [0i32; D];
            for d in 0..D {
                let (c, w) = taps[d].0[combo[d]];
                weight *= w;
                cidx[d] = c;
            }
            value += weight * data[coarse.flat(coarse.local(cidx))];

            let mut d = D;
            loop {
                if d == 0 {
                    break 'combos;
                }
                d -= 1;
                combo[d] += 1;
                if combo[d] < taps[d].1 {
                    break;
                }
                combo[d] = 0;
            }
        }
        fine.set(point, value);
    }
    Ok(fine)
}

/// Coarsen `fine` values into `out` over the cells of `coarse_box`.
///
/// Along primal axes the coarse node coincides with fine node `ratio * i`
/// and that single value is taken; along dual axes the `ratio` covered fine
/// cells are averaged. Cells of `out` outside `coarse_box` are untouched.
pub fn coarsen<const D: usize>(
    fine: &FieldData<D>,
    coarse_box: &Box<D>,
    ratio: u32,
    out: &mut FieldData<D>,
) -> AmrResult<()> {
    if fine.name != out.name {
        return Err(AmrError::DataIntegrity(format!(
            "coarsening '{}' into '{}'",
            fine.name, out.name
        )));
    }
    if !out.layout.cell_box.contains(coarse_box) {
        return Err(AmrError::DataIntegrity(format!(
            "coarse box {:?} not contained in destination box {:?}",
            coarse_box, out.layout.cell_box
        )));
    }
    let r = ratio as i32;

    for coarse_point in coarse_box.points() {
        // per axis: one coinciding fine sample (primal) or `ratio` covered
        // fine samples (dual)
        let mut counts = [0i32; D];
        for d in 0..D {
            counts[d] = if out.centerings[d].is_primal() { 1 } else { r };
        }

        let mut sum = 0.0;
        let mut n = 0usize;
        let mut sub = [0i32; D];
        'samples: loop {
            let mut fidx = [0i32; D];
            for d in 0..D {
                fidx[d] = coarse_point[d] * r + sub[d];
            }
            sum += fine.at(fidx);
            n += 1;

            let mut d = D;
            loop {
                if d == 0 {
                    break 'samples;
                }
                d -= 1;
                sub[d] += 1;
                if sub[d] < counts[d] {
                    break;
                }
                sub[d] = 0;
            }
        }
        out.set(coarse_point, sum / n as f64);
    }
    Ok(())
}

/// Linear interpolation between two snapshots of the same field at
/// `t0 <= t <= t1`.
pub fn time_interpolate<const D: usize>(
    t0: f64,
    t1: f64,
    t: f64,
    before: &FieldData<D>,
    after: &FieldData<D>,
) -> AmrResult<Vec<f64>> {
    if before.name != after.name || before.layout != after.layout {
        return Err(AmrError::DataIntegrity(format!(
            "time-interpolating mismatched fields '{}' and '{}'",
            before.name, after.name
        )));
    }
    if !(t1 > t0) {
        return Err(AmrError::Config(format!(
            "degenerate time interval [{}, {}]",
            t0, t1
        )));
    }
    let alpha = (t - t0) / (t1 - t0);
    Ok(before
        .data
        .iter()
        .zip(&after.data)
        .map(|(a, b)| (1.0 - alpha) * a + alpha * b)
        .collect())
}

/// For each quantity and each requested fine time, time-interpolate every
/// coarse patch of level `ilvl` between the two bracketing coarse snapshots
/// and spatially refine the result.
///
/// The returned fields predict what the fine level should see in its
/// coarse-fed ghost cells at each subcycle time. Patches are matched between
/// the two snapshots by origin order; a box mismatch between matched patches
/// means the level was regridded in between, which this reconstruction
/// cannot handle.
pub fn refine_time_interpolate<const D: usize>(
    hier: &PatchHierarchy<D>,
    quantities: &[&str],
    ilvl: usize,
    coarsest_time_before: f64,
    coarsest_time_after: f64,
    fine_times: &[f64],
) -> AmrResult<BTreeMap<String, BTreeMap<String, Vec<FieldData<D>>>>> {
    let t0 = coarsest_time_before;
    let t1 = coarsest_time_after;
    let before = hier.level(ilvl, &PatchHierarchy::<D>::format_timestamp(t0))?;
    let after = hier.level(ilvl, &PatchHierarchy::<D>::format_timestamp(t1))?;
    if before.patches.len() != after.patches.len() {
        return Err(AmrError::DataIntegrity(format!(
            "level {} has {} patches at t={} but {} at t={}",
            ilvl,
            before.patches.len(),
            t0,
            after.patches.len(),
            t1
        )));
    }

    let mut before_sorted: Vec<_> = before.patches.iter().collect();
    before_sorted.sort_by_key(|p| p.cell_box.lower);
    let mut after_sorted: Vec<_> = after.patches.iter().collect();
    after_sorted.sort_by_key(|p| p.cell_box.lower);

    let mut result = BTreeMap::new();
    for &qty in quantities {
        let mut per_time = BTreeMap::new();
        for &t in fine_times {
            let mut fields = Vec::with_capacity(before_sorted.len());
            for (pb, pa) in before_sorted.iter().zip(&after_sorted) {
                if pb.cell_box != pa.cell_box {
                    return Err(AmrError::DataIntegrity(format!(
                        "patch boxes changed between snapshots: {:?} vs {:?}",
                        pb.cell_box, pa.cell_box
                    )));
                }
                let fb = field_data(pb.data(qty), &pb.id, qty)?;
                let fa = field_data(pa.data(qty), &pa.id, qty)?;
                let interpolated = time_interpolate(t0, t1, t, fb, fa)?;
                fields.push(refine_with_data(fb, 2, &interpolated)?);
            }
            per_time.insert(PatchHierarchy::<D>::format_timestamp(t), fields);
        }
        result.insert(qty.to_string(), per_time);
    }
    debug!(
        "refined {} quantities over {} subcycle times from level {}",
        quantities.len(),
        fine_times.len(),
        ilvl
    );
    Ok(result)
}

fn field_data<'a, const D: usize>(
    pd: Option<&'a crate::patchdata::PatchData<D>>,
    patch: &str,
    qty: &str,
) -> AmrResult<&'a FieldData<D>> {
    pd.and_then(|pd| pd.as_field())
        .ok_or_else(|| AmrError::MissingData {
            patch: patch.to_string(),
            quantity: qty.to_string(),
        })
}
