// src/boxm.rs
//
// Integer box algebra for block-structured AMR.
//
// A `Box` is a closed integer hyper-rectangle: per dimension it stores an
// inclusive `[lower, upper]` interval of cell (or node) indices. All of the
// geometry engine is built on this value type, so every operation here must
// be exact integer arithmetic, never floats.

use itertools::Itertools;

use crate::error::{AmrError, AmrResult};

/// Closed integer hyper-rectangle in `D`-dimensional index space.
///
/// Invariant: `lower[d] <= upper[d]` for every dimension. Empty results are
/// represented as `None` at the API level (e.g. [`Box::intersection`]), never
/// as an inverted box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Box<const D: usize> {
    pub lower: [i32; D],
    pub upper: [i32; D],
}

/// 1D box alias.
pub type Box1 = Box<1>;
/// 2D box alias.
pub type Box2 = Box<2>;

impl Box<1> {
    /// Convenience constructor for 1D boxes.
    #[inline]
    pub fn span(lower: i32, upper: i32) -> Self {
        Self::new([lower], [upper])
    }
}

impl<const D: usize> Box<D> {
    #[inline]
    pub fn new(lower: [i32; D], upper: [i32; D]) -> Self {
        for d in 0..D {
            debug_assert!(
                lower[d] <= upper[d],
                "inverted box in dim {}: {} > {}",
                d,
                lower[d],
                upper[d]
            );
        }
        Self { lower, upper }
    }

    /// Number of cells per dimension: `upper - lower + 1`.
    #[inline]
    pub fn shape(&self) -> [i32; D] {
        let mut s = [0; D];
        for d in 0..D {
            s[d] = self.upper[d] - self.lower[d] + 1;
        }
        s
    }

    /// Total cell count.
    pub fn n_cells(&self) -> i64 {
        self.shape().iter().map(|&s| s as i64).product()
    }

    #[inline]
    pub fn contains_point(&self, p: [i32; D]) -> bool {
        (0..D).all(|d| self.lower[d] <= p[d] && p[d] <= self.upper[d])
    }

    #[inline]
    pub fn contains(&self, other: &Box<D>) -> bool {
        (0..D).all(|d| self.lower[d] <= other.lower[d] && other.upper[d] <= self.upper[d])
    }

    /// Per-dimension `[max(lowers), min(uppers)]`; `None` if any dimension
    /// comes out inverted. Commutative, and `intersection(A, A) == A`.
    pub fn intersection(&self, other: &Box<D>) -> Option<Box<D>> {
        let mut lower = [0; D];
        let mut upper = [0; D];
        for d in 0..D {
            lower[d] = self.lower[d].max(other.lower[d]);
            upper[d] = self.upper[d].min(other.upper[d]);
            if lower[d] > upper[d] {
                return None;
            }
        }
        Some(Box::new(lower, upper))
    }

    /// Expand by `n` cells on every side of every dimension.
    pub fn grow(&self, n: i32) -> Box<D> {
        assert!(n >= 0, "grow takes a non-negative width, got {}", n);
        let mut b = *self;
        for d in 0..D {
            b.lower[d] -= n;
            b.upper[d] += n;
        }
        b
    }

    /// Contract by `n` cells on every side of every dimension.
    pub fn shrink(&self, n: i32) -> Box<D> {
        assert!(n >= 0, "shrink takes a non-negative width, got {}", n);
        let mut b = *self;
        for d in 0..D {
            b.lower[d] += n;
            b.upper[d] -= n;
            assert!(
                b.lower[d] <= b.upper[d],
                "shrink by {} empties the box in dim {}",
                n,
                d
            );
        }
        b
    }

    /// Translate by an integer offset (used for periodic images).
    pub fn shift(&self, offset: [i32; D]) -> Box<D> {
        let mut b = *self;
        for d in 0..D {
            b.lower[d] += offset[d];
            b.upper[d] += offset[d];
        }
        b
    }

    /// Map a coarse index range onto the fine index range covering the same
    /// physical extent: `lower*ratio ..= (upper+1)*ratio - 1`.
    pub fn refine(&self, ratio: u32) -> Box<D> {
        let r = ratio as i32;
        let mut b = *self;
        for d in 0..D {
            b.lower[d] *= r;
            b.upper[d] = (b.upper[d] + 1) * r - 1;
        }
        b
    }

    /// Inverse of [`Box::refine`]. The box must be ratio-aligned on both
    /// bounds; a misaligned box has no exact coarse counterpart and errors.
    pub fn coarsen(&self, ratio: u32) -> AmrResult<Box<D>> {
        let r = ratio as i32;
        let mut b = *self;
        for d in 0..D {
            if self.lower[d].rem_euclid(r) != 0 || (self.upper[d] + 1).rem_euclid(r) != 0 {
                return Err(AmrError::MisalignedBox {
                    lower: self.lower.to_vec(),
                    upper: self.upper.to_vec(),
                    ratio,
                });
            }
            b.lower[d] = self.lower[d].div_euclid(r);
            b.upper[d] = (self.upper[d] + 1).div_euclid(r) - 1;
        }
        Ok(b)
    }

    /// Set difference `self \ other` as a disjoint box cover.
    ///
    /// Carves slabs dimension by dimension: for each axis, first the slab
    /// below the intersection, then the slab above it, shrinking the core as
    /// it goes. The order is deterministic (lower slab before upper slab,
    /// axis 0 first) but callers should treat the result as a set.
    pub fn remove(&self, other: &Box<D>) -> Vec<Box<D>> {
        let inter = match self.intersection(other) {
            Some(b) => b,
            None => return vec![*self],
        };
        let mut parts = Vec::new();
        let mut core = *self;
        for d in 0..D {
            if core.lower[d] < inter.lower[d] {
                let mut slab = core;
                slab.upper[d] = inter.lower[d] - 1;
                parts.push(slab);
                core.lower[d] = inter.lower[d];
            }
            if core.upper[d] > inter.upper[d] {
                let mut slab = core;
                slab.lower[d] = inter.upper[d] + 1;
                parts.push(slab);
                core.upper[d] = inter.upper[d];
            }
        }
        parts
    }

    /// Iterate every point of the box in row-major order (axis 0 outermost).
    pub fn points(&self) -> impl Iterator<Item = [i32; D]> + '_ {
        (0..D)
            .map(|d| self.lower[d]..=self.upper[d])
            .multi_cartesian_product()
            .map(|p| {
                let mut point = [0i32; D];
                point.copy_from_slice(&p);
                point
            })
    }
}

/// Subtract `cut` from every box in `boxes`, keeping a disjoint cover.
pub fn remove_all<const D: usize>(boxes: Vec<Box<D>>, cut: &Box<D>) -> Vec<Box<D>> {
    boxes.into_iter().flat_map(|b| b.remove(cut)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_is_commutative_and_idempotent() {
        let a = Box1::span(2, 10);
        let b = Box1::span(7, 20);
        assert_eq!(a.intersection(&b), b.intersection(&a));
        assert_eq!(a.intersection(&b), Some(Box1::span(7, 10)));
        assert_eq!(a.intersection(&a), Some(a));

        let far = Box1::span(30, 40);
        assert_eq!(a.intersection(&far), None);
    }

    #[test]
    fn intersection_2d_requires_overlap_in_every_dim() {
        let a = Box2::new([0, 0], [4, 4]);
        let b = Box2::new([3, 5], [8, 8]);
        // overlaps in x but not in y
        assert_eq!(a.intersection(&b), None);

        let c = Box2::new([3, 2], [8, 8]);
        assert_eq!(a.intersection(&c), Some(Box2::new([3, 2], [4, 4])));
    }

    #[test]
    fn grow_shrink_shift_shape() {
        let b = Box1::span(0, 9);
        assert_eq!(b.grow(2), Box1::span(-2, 11));
        assert_eq!(b.grow(2).shrink(2), b);
        assert_eq!(b.shift([5]), Box1::span(5, 14));
        assert_eq!(b.shape(), [10]);
        assert_eq!(Box2::new([1, 2], [3, 6]).shape(), [3, 5]);
    }

    #[test]
    fn refine_coarsen_roundtrip() {
        let b = Box1::span(5, 29);
        let fine = b.refine(2);
        assert_eq!(fine, Box1::span(10, 59));
        assert_eq!(fine.coarsen(2).unwrap(), b);

        let b2 = Box2::new([-2, 3], [4, 7]);
        assert_eq!(b2.refine(2).coarsen(2).unwrap(), b2);
    }

    #[test]
    fn coarsen_rejects_misaligned_boxes() {
        let b = Box1::span(1, 10);
        assert!(matches!(
            b.coarsen(2),
            Err(crate::error::AmrError::MisalignedBox { .. })
        ));
    }

    #[test]
    fn remove_splits_around_the_cut() {
        let gbox = Box1::span(-1, 33);
        let own = Box1::span(0, 32);
        let parts = gbox.remove(&own);
        assert_eq!(parts.len(), 2);
        assert!(parts.contains(&Box1::span(-1, -1)));
        assert!(parts.contains(&Box1::span(33, 33)));

        // disjoint cut leaves the box untouched
        assert_eq!(gbox.remove(&Box1::span(40, 50)), vec![gbox]);
        // full cover removes everything
        assert!(own.remove(&gbox).is_empty());
    }

    #[test]
    fn remove_2d_cover_is_disjoint_and_complete() {
        let outer = Box2::new([0, 0], [9, 9]);
        let hole = Box2::new([3, 3], [6, 6]);
        let parts = outer.remove(&hole);

        let total: i64 = parts.iter().map(|b| b.n_cells()).sum();
        assert_eq!(total, outer.n_cells() - hole.n_cells());
        for (i, a) in parts.iter().enumerate() {
            assert_eq!(a.intersection(&hole), None);
            for b in parts.iter().skip(i + 1) {
                assert_eq!(a.intersection(b), None);
            }
        }
    }

    #[test]
    fn points_walk_row_major() {
        let pts: Vec<_> = Box2::new([0, 0], [1, 1]).points().collect();
        assert_eq!(pts, vec![[0, 0], [0, 1], [1, 0], [1, 1]]);
        assert_eq!(Box1::span(3, 5).points().count(), 3);
    }
}
