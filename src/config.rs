//! Engine configuration
//!
//! A vineyard is configured once, at construction time. The coefficient
//! field is validated before any reduction work starts; everything else only
//! affects what is recorded and reported.

use serde::{Deserialize, Serialize};

/// Coefficient field requested for the boundary matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coefficients {
    /// Z/2Z, the usual choice for persistence
    #[default]
    Binary,
    /// Z/pZ for a prime p
    Prime(u32),
    /// Rationals (no exact arithmetic available)
    Rational,
    /// Floating point reals (no exact arithmetic available)
    Real,
}

/// When the engine stores full diagram snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Only on explicit `record_diagram` calls
    #[default]
    Manual,
    /// After every applied transposition (costs O(n) per transposition)
    EveryTransposition,
}

/// Configuration for a vineyard engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VineyardConfig {
    /// Coefficient field for the boundary matrix
    pub coefficients: Coefficients,
    /// Snapshot recording policy
    pub snapshot_policy: SnapshotPolicy,
    /// Re-check the unique-pivot invariant after every transposition
    pub verify_invariants: bool,
    /// Highest homology dimension reported in diagrams and vine exports
    pub max_dimension: Option<usize>,
}

impl Default for VineyardConfig {
    fn default() -> Self {
        Self {
            coefficients: Coefficients::Binary,
            snapshot_policy: SnapshotPolicy::Manual,
            verify_invariants: false,
            max_dimension: None,
        }
    }
}

impl VineyardConfig {
    /// Configuration over Z/pZ
    pub fn with_prime(p: u32) -> Self {
        Self {
            coefficients: Coefficients::Prime(p),
            ..Self::default()
        }
    }

    /// Whether homology of dimension `d` is reported
    pub fn reports_dimension(&self, d: usize) -> bool {
        self.max_dimension.map_or(true, |max| d <= max)
    }
}
