//! Topology Module: Filtrations, Reduction and Transpositions
//!
//! The combinatorial core of the vineyard engine:
//! - Simplex store with a total order compatible with the face relation
//! - Coefficient fields and sparse columns
//! - R = D·V decomposition of the boundary matrix
//! - Adjacent transpositions that keep the decomposition reduced
//! - Persistence pairs, diagrams and Betti numbers
//!
//! ## Mathematical Background
//!
//! For a filtration σ₀, σ₁, …, σₙ₋₁ the boundary matrix D has a 1 (or ±1)
//! at (i, j) when σᵢ is a codimension-1 face of σⱼ. Reducing D by left-to-
//! right column additions gives R = D·V, and the lowest nonzero row of each
//! nonzero R column pairs a birth with a death. Swapping two adjacent
//! simplices changes this pairing in a controlled way; updating R and V
//! costs O(n) instead of a full O(n³) reduction.

mod betti;
mod column;
mod diagram;
mod field;
mod reduction;
mod simplex;
mod transposition;

pub use betti::{BettiCurve, BettiNumbers};
pub use column::SparseColumn;
pub use diagram::{DiagramPoint, PersistenceDiagram, PersistencePair};
pub use field::{BinaryField, Field, PrimeField, MAX_PRIME};
pub use reduction::ReducedMatrix;
pub use simplex::{Filtration, Simplex, SimplexId, SimplexRecord};
pub use transposition::{Transposition, TranspositionCase};

pub(crate) use transposition::transpose;
