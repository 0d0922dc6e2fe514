// src/particles.rs
//
// Particle storage indexed by integer cell. Unlike field data there is no
// dense array: particles are a dynamic list keyed by spatial selection, and
// ghost particles are produced by copying and shifting rather than by halo
// arrays.

use crate::boxm::Box;

/// One macro-particle: owning cell, in-cell position, velocity and weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle<const D: usize> {
    /// Cell index the particle currently lives in.
    pub icell: [i32; D],
    /// Position within the cell, each component in `[0, 1)`.
    pub delta: [f64; D],
    pub v: [f64; 3],
    pub weight: f64,
    pub charge: f64,
}

/// Dynamic particle list with box-keyed selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Particles<const D: usize> {
    pub particles: Vec<Particle<D>>,
}

impl<const D: usize> Particles<D> {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    /// Deterministic seeding: one particle at the center of every cell of
    /// `region`, unit weight, zero velocity. Used by hierarchy builders that
    /// only need populated geometry, not a physical distribution.
    pub fn one_per_cell(region: &Box<D>) -> Self {
        let shape = region.shape();
        let mut particles = Vec::with_capacity(region.n_cells() as usize);
        let mut icell = region.lower;
        loop {
            particles.push(Particle {
                icell,
                delta: [0.5; D],
                v: [0.0; 3],
                weight: 1.0,
                charge: 1.0,
            });
            // odometer increment over the region, axis D-1 fastest
            let mut d = D;
            loop {
                if d == 0 {
                    return Self { particles };
                }
                d -= 1;
                icell[d] += 1;
                if icell[d] - region.lower[d] < shape[d] {
                    break;
                }
                icell[d] = region.lower[d];
            }
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particles whose cell lies inside `selection`.
    pub fn select(&self, selection: &Box<D>) -> Particles<D> {
        Particles {
            particles: self
                .particles
                .iter()
                .filter(|p| selection.contains_point(p.icell))
                .copied()
                .collect(),
        }
    }

    /// Copy of this list with every cell index translated by `offset`.
    pub fn shift_icell(&self, offset: [i32; D]) -> Particles<D> {
        let mut shifted = self.clone();
        for p in &mut shifted.particles {
            for d in 0..D {
                p.icell[d] += offset[d];
            }
        }
        shifted
    }

    pub fn add(&mut self, other: Particles<D>) {
        self.particles.extend(other.particles);
    }
}

/// Duplicate border-cell particles across the periodic boundary.
///
/// For each periodic dimension, the `ghost_width` outermost cell layers on
/// each side of `domain_box` are copied and shifted by one domain length, so
/// ghost cells just outside the domain hold the particles wrapping around
/// from the opposite side.
pub fn periodic_duplicate<const D: usize>(
    particles: &mut Particles<D>,
    domain_box: &Box<D>,
    periodic: [bool; D],
    ghost_width: i32,
) {
    assert!(ghost_width >= 1);
    let extend = ghost_width - 1;
    for d in 0..D {
        if !periodic[d] {
            continue;
        }
        let length = domain_box.shape()[d];

        let mut upper_slab = *domain_box;
        upper_slab.lower[d] = domain_box.upper[d] - extend;
        let mut lower_slab = *domain_box;
        lower_slab.upper[d] = domain_box.lower[d] + extend;

        let mut down = [0; D];
        down[d] = -length;
        let mut up = [0; D];
        up[d] = length;

        let from_upper = particles.select(&upper_slab).shift_icell(down);
        let from_lower = particles.select(&lower_slab).shift_icell(up);
        particles.add(from_upper);
        particles.add(from_lower);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxm::{Box1, Box2};

    #[test]
    fn one_per_cell_covers_the_region() {
        let p = Particles::one_per_cell(&Box1::span(0, 4));
        assert_eq!(p.len(), 5);
        assert_eq!(p.particles[0].icell, [0]);
        assert_eq!(p.particles[4].icell, [4]);

        let p2 = Particles::one_per_cell(&Box2::new([0, 0], [2, 1]));
        assert_eq!(p2.len(), 6);
        assert!(p2.particles.iter().any(|p| p.icell == [2, 1]));
    }

    #[test]
    fn select_is_keyed_by_cell() {
        let p = Particles::one_per_cell(&Box1::span(0, 9));
        let sel = p.select(&Box1::span(8, 12));
        assert_eq!(sel.len(), 2);
        assert!(sel.particles.iter().all(|p| p.icell[0] >= 8));
    }

    #[test]
    fn shift_translates_cells() {
        let p = Particles::one_per_cell(&Box1::span(0, 1)).shift_icell([-65]);
        assert_eq!(p.particles[0].icell, [-65]);
        assert_eq!(p.particles[1].icell, [-64]);
    }

    #[test]
    fn periodic_duplicate_wraps_border_cells() {
        let domain = Box1::span(0, 64);
        let mut p = Particles::one_per_cell(&domain);
        let n0 = p.len();

        periodic_duplicate(&mut p, &domain, [true], 1);

        // one layer each side: cell 64 copied to -1, cell 0 copied to 65
        assert_eq!(p.len(), n0 + 2);
        assert_eq!(p.select(&Box1::span(-1, -1)).len(), 1);
        assert_eq!(p.select(&Box1::span(65, 65)).len(), 1);
    }

    #[test]
    fn periodic_duplicate_skips_open_dims() {
        let domain = Box1::span(0, 9);
        let mut p = Particles::one_per_cell(&domain);
        let n0 = p.len();
        periodic_duplicate(&mut p, &domain, [false], 1);
        assert_eq!(p.len(), n0);
    }
}
