//! # TDA-Vineyards
//!
//! Persistent Homology under Changing Filtrations: Vines and Vineyards
//! via Adjacent Transpositions
//!
//! ## Theoretical Framework
//!
//! A filtration of a simplicial complex is a total order σ₀, σ₁, …, σₙ₋₁
//! in which every simplex follows its faces. Its persistence diagram pairs
//! the simplex that creates each homology class with the one that destroys
//! it. When the order changes over time, the diagrams form a *vineyard*:
//! each point traces a curve (a *vine*), and the curves stay continuous as
//! long as pair identity is tracked through the moments where two pairs
//! exchange partners.
//!
//! ### Methodology
//!
//! 1. **Boundary Matrix Reduction**: R = D·V with R reduced and V unit
//!    upper-triangular; zero columns of R mark births, pivots mark deaths
//!
//! 2. **Adjacent Transpositions**: swapping σᵢ and σᵢ₊₁ is repaired with at
//!    most two column additions, so a swap costs time proportional to the
//!    columns it touches, independent of the size of the complex
//!
//! 3. **Vine Tracking**: every pair carries a token that survives switches
//!    in the pairing
//!
//! 4. **Lower-Star Vineyards**: vertex functions moving through keyframes,
//!    with vertex crossings found by a kinetic sort
//!
//! ## Example
//!
//! ```
//! use tda_vineyards::{SimplexId, SimplexRecord, Vineyard, VineyardConfig};
//!
//! let records = vec![
//!     SimplexRecord::vertex(0),
//!     SimplexRecord::vertex(1),
//!     SimplexRecord::new(2, 1, [0, 1]),
//! ];
//! let mut vineyard: Vineyard = Vineyard::from_records(records, VineyardConfig::default()).unwrap();
//!
//! let before = vineyard.vine_of(SimplexId(1)).unwrap();
//! let swap = vineyard.transpose(0).unwrap();
//! assert!(swap.switched());
//! // The finite vine now follows vertex 0
//! assert_eq!(vineyard.vine_of(SimplexId(0)).unwrap(), before);
//! ```
//!
//! ## References
//!
//! - Cohen-Steiner, Edelsbrunner, Morozov, "Vines and Vineyards by
//!   Updating Persistence in Linear Time" (2006)
//! - Edelsbrunner & Harer, "Computational Topology" (2010)
//! - Edelsbrunner, Letscher, Zomorodian, "Topological Persistence and
//!   Simplification" (2002)

pub mod config;
pub mod error;
pub mod lower_star;
pub mod topology;
pub mod vineyard;

// Re-exports from config and error
pub use config::{Coefficients, SnapshotPolicy, VineyardConfig};
pub use error::{Result, VineyardError};

// Re-exports from topology
pub use topology::{
    // Filtration
    Filtration,
    Simplex,
    SimplexId,
    SimplexRecord,
    // Coefficients and reduction
    BinaryField,
    Field,
    PrimeField,
    ReducedMatrix,
    SparseColumn,
    // Transpositions
    Transposition,
    TranspositionCase,
    // Diagrams
    BettiCurve,
    BettiNumbers,
    DiagramPoint,
    PersistenceDiagram,
    PersistencePair,
};

// Re-exports from vineyard
pub use vineyard::{
    DiagramSnapshot,
    Evaluator,
    StoredValues,
    TranspositionEvent,
    Vine,
    VineId,
    VineSample,
    Vineyard,
};

// Re-exports from lower_star
pub use lower_star::{KineticEvent, KineticSort, LowerStarVineyard};
