// src/patchdata.rs
//
// Per-quantity data attached to a patch. Field data is a dense row-major
// array over the quantity's ghost box (primal axes carry one extra node);
// particle data is a dynamic list with box-keyed selection.

use crate::boxm::Box;
use crate::error::{AmrError, AmrResult};
use crate::gridlayout::{field_ghost_width, particle_ghost_width, yee_centerings, Centering, GridLayout};
use crate::particles::Particles;

/// Dense field values for one quantity over a patch's ghost box.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData<const D: usize> {
    pub name: String,
    pub layout: GridLayout<D>,
    pub centerings: [Centering; D],
    /// Row-major (axis 0 outermost) over [`FieldData::alloc_shape`].
    pub data: Vec<f64>,
}

impl<const D: usize> FieldData<D> {
    pub fn new(layout: GridLayout<D>, name: &str, data: Vec<f64>) -> AmrResult<Self> {
        let centerings = yee_centerings::<D>(name)?;
        let fd = Self {
            name: name.to_string(),
            layout,
            centerings,
            data,
        };
        let expected: usize = fd.alloc_shape().iter().product();
        if fd.data.len() != expected {
            return Err(AmrError::SizeMismatch {
                name: name.to_string(),
                expected,
                actual: fd.data.len(),
            });
        }
        Ok(fd)
    }

    /// Zero-filled field over the quantity's ghost box.
    pub fn zeros(layout: GridLayout<D>, name: &str) -> AmrResult<Self> {
        let centerings = yee_centerings::<D>(name)?;
        let gw = field_ghost_width(layout.interp_order);
        let shape = layout.cell_box.shape();
        let mut n = 1usize;
        for d in 0..D {
            n *= (shape[d] + primal_extra(centerings[d]) + 2 * gw) as usize;
        }
        Self::new(layout, name, vec![0.0; n])
    }

    #[inline]
    pub fn ghost_width(&self) -> i32 {
        field_ghost_width(self.layout.interp_order)
    }

    /// Allocated array extent per axis: cell count, plus one node on primal
    /// axes, plus the halo on both sides.
    pub fn alloc_shape(&self) -> [usize; D] {
        let gw = self.ghost_width();
        let shape = self.layout.cell_box.shape();
        let mut s = [0usize; D];
        for d in 0..D {
            s[d] = (shape[d] + primal_extra(self.centerings[d]) + 2 * gw) as usize;
        }
        s
    }

    /// Index-space box covered by the dataset: the cell box grown by the
    /// halo, extended by one on the upper side of primal axes (nodes).
    pub fn ghost_box(&self) -> Box<D> {
        let gw = self.ghost_width();
        let mut b = self.layout.cell_box.grow(gw);
        for d in 0..D {
            b.upper[d] += primal_extra(self.centerings[d]);
        }
        b
    }

    pub fn primal_directions(&self) -> [bool; D] {
        let mut p = [false; D];
        for d in 0..D {
            p[d] = self.centerings[d].is_primal();
        }
        p
    }

    /// Flat offset of a local (array) index.
    #[inline]
    pub fn flat(&self, local: [usize; D]) -> usize {
        let shape = self.alloc_shape();
        let mut idx = 0usize;
        for d in 0..D {
            debug_assert!(local[d] < shape[d]);
            idx = idx * shape[d] + local[d];
        }
        idx
    }

    /// Local array index of a global (index-space) position.
    #[inline]
    pub fn local(&self, global: [i32; D]) -> [usize; D] {
        let gw = self.ghost_width();
        let mut l = [0usize; D];
        for d in 0..D {
            let off = global[d] - self.layout.cell_box.lower[d] + gw;
            debug_assert!(off >= 0);
            l[d] = off as usize;
        }
        l
    }

    /// Value at a global index-space position.
    #[inline]
    pub fn at(&self, global: [i32; D]) -> f64 {
        self.data[self.flat(self.local(global))]
    }

    #[inline]
    pub fn set(&mut self, global: [i32; D], value: f64) {
        let idx = self.flat(self.local(global));
        self.data[idx] = value;
    }
}

#[inline]
fn primal_extra(c: Centering) -> i32 {
    if c.is_primal() {
        1
    } else {
        0
    }
}

/// One particle population over a patch's ghost box.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleData<const D: usize> {
    /// Population name, e.g. "particles" or "protons".
    pub pop: String,
    pub layout: GridLayout<D>,
    pub mass: f64,
    pub particles: Particles<D>,
}

impl<const D: usize> ParticleData<D> {
    pub fn new(layout: GridLayout<D>, pop: &str, mass: f64, particles: Particles<D>) -> Self {
        Self {
            pop: pop.to_string(),
            layout,
            mass,
            particles,
        }
    }

    #[inline]
    pub fn ghost_width(&self) -> i32 {
        particle_ghost_width(self.layout.interp_order)
    }

    pub fn ghost_box(&self) -> Box<D> {
        self.layout.cell_box.grow(self.ghost_width())
    }
}

/// A quantity's values over one patch: either a dense field or a particle
/// population.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchData<const D: usize> {
    Field(FieldData<D>),
    Particles(ParticleData<D>),
}

impl<const D: usize> PatchData<D> {
    pub fn name(&self) -> &str {
        match self {
            PatchData::Field(f) => &f.name,
            PatchData::Particles(p) => &p.pop,
        }
    }

    pub fn layout(&self) -> &GridLayout<D> {
        match self {
            PatchData::Field(f) => &f.layout,
            PatchData::Particles(p) => &p.layout,
        }
    }

    pub fn ghost_box(&self) -> Box<D> {
        match self {
            PatchData::Field(f) => f.ghost_box(),
            PatchData::Particles(p) => p.ghost_box(),
        }
    }

    pub fn as_field(&self) -> Option<&FieldData<D>> {
        match self {
            PatchData::Field(f) => Some(f),
            PatchData::Particles(_) => None,
        }
    }

    pub fn as_particles(&self) -> Option<&ParticleData<D>> {
        match self {
            PatchData::Particles(p) => Some(p),
            PatchData::Field(_) => None,
        }
    }

    pub fn as_field_mut(&mut self) -> Option<&mut FieldData<D>> {
        match self {
            PatchData::Field(f) => Some(f),
            PatchData::Particles(_) => None,
        }
    }

    pub fn as_particles_mut(&mut self) -> Option<&mut ParticleData<D>> {
        match self {
            PatchData::Particles(p) => Some(p),
            PatchData::Field(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxm::Box1;

    fn layout(lower: i32, upper: i32) -> GridLayout<1> {
        GridLayout::new(Box1::span(lower, upper), [0.0], [1.0], 1).unwrap()
    }

    #[test]
    fn alloc_shape_counts_nodes_and_halo() {
        // 33 cells, ghost width 5
        let bx = FieldData::zeros(layout(0, 32), "Bx").unwrap();
        assert_eq!(bx.alloc_shape(), [33 + 1 + 10]); // primal: one extra node
        let by = FieldData::zeros(layout(0, 32), "By").unwrap();
        assert_eq!(by.alloc_shape(), [33 + 10]);
    }

    #[test]
    fn ghost_box_extends_primal_axes_by_one_node() {
        let bx = FieldData::zeros(layout(0, 32), "Bx").unwrap();
        assert_eq!(bx.ghost_box(), Box1::span(-5, 38));
        let ex = FieldData::zeros(layout(0, 32), "Ex").unwrap();
        assert_eq!(ex.ghost_box(), Box1::span(-5, 37));
    }

    #[test]
    fn new_rejects_mismatched_dataset_length() {
        let err = FieldData::new(layout(0, 9), "By", vec![0.0; 7]).unwrap_err();
        assert!(matches!(err, AmrError::SizeMismatch { expected: 20, .. }));
    }

    #[test]
    fn global_indexing_round_trips() {
        let mut by = FieldData::zeros(layout(10, 19), "By").unwrap();
        by.set([10], 1.5); // first interior cell
        by.set([5], -2.0); // ghost cell
        assert_eq!(by.at([10]), 1.5);
        assert_eq!(by.at([5]), -2.0);
        assert_eq!(by.local([10]), [5]);
    }

    #[test]
    fn particle_data_ghost_box_uses_particle_width() {
        let pd = ParticleData::new(layout(0, 32), "particles", 1.0, Particles::new());
        assert_eq!(pd.ghost_box(), Box1::span(-1, 33));
    }

    #[test]
    fn two_dim_flat_indexing_is_row_major() {
        use crate::boxm::Box2;
        let layout2 =
            GridLayout::new(Box2::new([0, 0], [3, 2]), [0.0, 0.0], [1.0, 1.0], 1).unwrap();
        let rho = FieldData::zeros(layout2, "rho").unwrap();
        // alloc shape: (4+1+10, 3+1+10) = (15, 14)
        assert_eq!(rho.alloc_shape(), [15, 14]);
        assert_eq!(rho.flat([0, 1]), 1);
        assert_eq!(rho.flat([1, 0]), 14);
    }
}
