//! Error types for the vineyard engine
//!
//! Every mutating operation validates its input completely before touching
//! any state, so an `Err` always means the engine is exactly as it was
//! before the call.

use thiserror::Error;

use crate::topology::SimplexId;

/// Errors surfaced by the simplex store, the reducer and the vineyard engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VineyardError {
    #[error("Inconsistent boundary for simplex {simplex}: face {face} {reason}")]
    InconsistentBoundary {
        simplex: SimplexId,
        face: SimplexId,
        reason: String,
    },

    #[error("Simplex {0} is already present in the filtration")]
    DuplicateSimplex(SimplexId),

    #[error("Invalid transposition at position {position}: {lower} is a face of {upper}")]
    InvalidTransposition {
        position: usize,
        lower: SimplexId,
        upper: SimplexId,
    },

    #[error("Index {index} out of range (valid range is 0..{len})")]
    OutOfRangeIndex { index: usize, len: usize },

    #[error("Unsupported coefficient field: {0}")]
    UnsupportedCoefficient(String),

    #[error("Unknown simplex: {0}")]
    UnknownSimplex(SimplexId),

    #[error("Unknown vine: {0}")]
    UnknownVine(usize),

    #[error("Invalid vertex values: expected {expected}, found {found}")]
    InvalidVertexValues { expected: usize, found: usize },

    #[error("Vertex {vertex} has non-finite value {value}")]
    NonFiniteVertexValue { vertex: usize, value: f64 },
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, VineyardError>;
