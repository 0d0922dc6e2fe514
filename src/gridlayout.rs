// src/gridlayout.rs
//
// Staggered (Yee) grid layout: maps a box plus origin, cell width and
// interpolation order to physical coordinates and per-quantity ghost widths.
//
// Centering is per quantity *and* per axis: primal quantities live on grid
// nodes, dual quantities at cell centers. Ghost widths come from fixed small
// tables keyed by interpolation order, so every patch carrying a quantity
// agrees on its halo, a precondition for bit-consistent ghost exchange.

use crate::boxm::Box;
use crate::error::{AmrError, AmrResult};

/// Node-centered (primal) or cell-centered (dual) storage along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Centering {
    Primal,
    Dual,
}

impl Centering {
    /// Coordinate offset subtracted from the local index: 0 for primal
    /// (node) points, 0.5 for dual (cell-centered) points.
    #[inline]
    pub fn offset(self) -> f64 {
        match self {
            Centering::Primal => 0.0,
            Centering::Dual => 0.5,
        }
    }

    #[inline]
    pub fn is_primal(self) -> bool {
        matches!(self, Centering::Primal)
    }
}

// Yee staggering, (x, y, z) per quantity. Moments are node-centered in every
// direction.
const YEE_TABLE: &[(&str, [Centering; 3])] = {
    use Centering::{Dual as D, Primal as P};
    &[
        ("Bx", [P, D, D]),
        ("By", [D, P, D]),
        ("Bz", [D, D, P]),
        ("Ex", [D, P, P]),
        ("Ey", [P, D, P]),
        ("Ez", [P, P, D]),
        ("Jx", [D, P, P]),
        ("Jy", [P, D, P]),
        ("Jz", [P, P, D]),
        ("rho", [P, P, P]),
        ("Vx", [P, P, P]),
        ("Vy", [P, P, P]),
        ("Vz", [P, P, P]),
        ("P", [P, P, P]),
    ]
};

/// True if `qty` names a field quantity of the Yee table (as opposed to a
/// particle population).
pub fn is_field_quantity(qty: &str) -> bool {
    YEE_TABLE.iter().any(|(name, _)| *name == qty)
}

/// Per-axis centerings for a field quantity, truncated to the first `D` axes.
pub fn yee_centerings<const D: usize>(qty: &str) -> AmrResult<[Centering; D]> {
    let (_, full) = YEE_TABLE
        .iter()
        .find(|(name, _)| *name == qty)
        .ok_or_else(|| AmrError::UnknownQuantity(qty.to_string()))?;
    let mut out = [Centering::Primal; D];
    out.copy_from_slice(&full[..D]);
    Ok(out)
}

/// Field halo width for a given interpolation order.
///
/// Wide enough for every inter-level refinement stencil; identical for both
/// centerings (primal quantities additionally carry one extra node, which is
/// a storage matter handled by `FieldData`, not a halo width).
pub fn field_ghost_width(interp_order: u8) -> i32 {
    debug_assert!((1..=4).contains(&interp_order));
    5
}

/// How far particles must be duplicated across patch and domain boundaries.
pub fn particle_ghost_width(interp_order: u8) -> i32 {
    debug_assert!((1..=4).contains(&interp_order));
    if interp_order == 1 {
        1
    } else {
        2
    }
}

/// Index-space box plus the information needed to place it in physical
/// space: origin of the box's lower corner, cell width per axis, and the
/// particle interpolation order governing ghost widths. Immutable once
/// constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout<const D: usize> {
    pub cell_box: Box<D>,
    pub origin: [f64; D],
    pub dl: [f64; D],
    pub interp_order: u8,
}

impl<const D: usize> GridLayout<D> {
    pub fn new(
        cell_box: Box<D>,
        origin: [f64; D],
        dl: [f64; D],
        interp_order: u8,
    ) -> AmrResult<Self> {
        if !(1..=4).contains(&interp_order) {
            return Err(AmrError::InvalidInterpOrder(interp_order));
        }
        for d in 0..D {
            if !(dl[d] > 0.0) {
                return Err(AmrError::Config(format!(
                    "cell width must be positive, got {} in dim {}",
                    dl[d], d
                )));
            }
        }
        Ok(Self {
            cell_box,
            origin,
            dl,
            interp_order,
        })
    }

    /// Layout of the same region refined by `ratio`: same origin, index box
    /// refined, cell width divided.
    pub fn refined(&self, ratio: u32) -> GridLayout<D> {
        let mut dl = self.dl;
        for d in 0..D {
            dl[d] /= ratio as f64;
        }
        GridLayout {
            cell_box: self.cell_box.refine(ratio),
            origin: self.origin,
            dl,
            interp_order: self.interp_order,
        }
    }

    /// Physical coordinate of index `i` along `axis`:
    /// `origin + (i_local - centering_offset) * dl`.
    pub fn coordinate(&self, centering: Centering, axis: usize, i: i32) -> f64 {
        let i_local = (i - self.cell_box.lower[axis]) as f64;
        self.origin[axis] + (i_local - centering.offset()) * self.dl[axis]
    }

    /// Ghost width for a named quantity: field table for Yee quantities,
    /// particle table for anything else (particle populations).
    pub fn ghost_width(&self, qty: &str) -> i32 {
        if is_field_quantity(qty) {
            field_ghost_width(self.interp_order)
        } else {
            particle_ghost_width(self.interp_order)
        }
    }

    /// `grow(box, ghost_width(qty))`.
    pub fn ghost_box(&self, qty: &str) -> Box<D> {
        self.cell_box.grow(self.ghost_width(qty))
    }
}
