// src/lib.rs

pub mod boxm;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gridlayout;
pub mod hierarchy;
pub mod particles;
pub mod patchdata;
pub mod snapshot;
pub mod transfer;

pub use boxm::{Box, Box1, Box2};
pub use config::{build_hierarchy, Boundary, HierarchyConfig};
pub use error::{AmrError, AmrResult};
pub use geometry::{
    hierarchy_overlaps, level_ghost_boxes, particle_ghost_area_boxes, touch_domain_border,
    Overlap, PatchGhostBoxes, QuantityGhostBoxes, Side,
};
pub use gridlayout::{Centering, GridLayout};
pub use hierarchy::{Patch, PatchHierarchy, PatchLevel};
pub use particles::{Particle, Particles};
pub use patchdata::{FieldData, ParticleData, PatchData};
pub use transfer::{coarsen, refine, refine_time_interpolate, time_interpolate};
