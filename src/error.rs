// src/error.rs

use thiserror::Error;

/// Result alias used throughout the crate.
pub type AmrResult<T> = Result<T, AmrError>;

/// Errors surfaced by hierarchy construction, geometry queries and transfer
/// operators.
///
/// Absence of a geometric overlap is *not* an error: geometry functions
/// return empty results for that case and callers branch on emptiness.
#[derive(Debug, Error)]
pub enum AmrError {
    #[error("unsupported dimension {dim} for {op} (only 1 and 2 are supported)")]
    UnsupportedDim { op: &'static str, dim: usize },

    #[error("unsupported refinement ratio {0} (only 2 is supported)")]
    UnsupportedRatio(u32),

    #[error("invalid interpolation order {0} (expected 1..=4)")]
    InvalidInterpOrder(u8),

    #[error("unknown quantity '{0}'")]
    UnknownQuantity(String),

    #[error("box {lower:?}..={upper:?} is not aligned to ratio {ratio}")]
    MisalignedBox {
        lower: Vec<i32>,
        upper: Vec<i32>,
        ratio: u32,
    },

    #[error("dataset size mismatch for '{name}': expected {expected}, got {actual}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no snapshot at time '{0}'")]
    MissingTime(String),

    #[error("no level {level} at time '{time}'")]
    MissingLevel { level: usize, time: String },

    #[error("patch '{patch}' carries no data for quantity '{quantity}'")]
    MissingData { patch: String, quantity: String },

    #[error("level ghost boxes are undefined for level 0")]
    CoarsestLevelGhosts,

    #[error("patch interiors overlap on level {level}: '{first}' and '{second}'")]
    OverlappingPatches {
        level: usize,
        first: String,
        second: String,
    },

    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
