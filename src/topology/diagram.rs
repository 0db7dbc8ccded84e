//! Persistence Pairs and Diagrams
//!
//! The pairing read off a reduced matrix, in two forms:
//!
//! - `PersistencePair`: positions and identifiers of the birth and death
//!   simplices (the combinatorial answer, independent of values)
//! - `PersistenceDiagram`: (birth, death) values per homology dimension,
//!   each point tagged with the vine it belongs to
//!
//! Every simplex appears in exactly one pair, either as the creator of a
//! class or as the simplex that kills one. Points with birth == death
//! (zero persistence) are kept so that the number of points per dimension
//! is conserved across transpositions; use `off_diagonal` to drop them.
//!
//! ## Summaries
//!
//! Persistence entropy and total persistence follow the usual conventions
//! (natural log, finite points only).

use serde::{Deserialize, Serialize};

use super::betti::BettiNumbers;
use super::simplex::SimplexId;
use crate::vineyard::VineId;

/// A (birth, death) pairing in terms of filtration positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersistencePair {
    /// Homology dimension (dimension of the birth simplex)
    pub dimension: usize,
    pub birth: usize,
    /// None for an essential class
    pub death: Option<usize>,
    pub birth_id: SimplexId,
    pub death_id: Option<SimplexId>,
    pub vine: VineId,
}

impl PersistencePair {
    pub fn is_essential(&self) -> bool {
        self.death.is_none()
    }
}

/// A point of a persistence diagram
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagramPoint {
    pub birth: f64,
    /// `f64::INFINITY` for essential classes
    pub death: f64,
    pub dimension: usize,
    pub vine: VineId,
}

impl DiagramPoint {
    pub fn persistence(&self) -> f64 {
        if self.death.is_infinite() {
            f64::INFINITY
        } else {
            self.death - self.birth
        }
    }

    pub fn is_essential(&self) -> bool {
        self.death.is_infinite()
    }

    pub fn is_diagonal(&self) -> bool {
        self.death == self.birth
    }

    /// Whether the class is alive at filtration value `epsilon`
    pub fn is_alive_at(&self, epsilon: f64) -> bool {
        self.birth <= epsilon && epsilon < self.death
    }
}

/// Persistence diagram of one filtration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceDiagram {
    pub points: Vec<DiagramPoint>,
}

impl PersistenceDiagram {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Highest dimension with at least one point
    pub fn max_dimension(&self) -> Option<usize> {
        self.points.iter().map(|p| p.dimension).max()
    }

    /// Points of dimension d
    pub fn dim(&self, d: usize) -> Vec<&DiagramPoint> {
        self.points.iter().filter(|p| p.dimension == d).collect()
    }

    /// Finite points of dimension d
    pub fn finite(&self, d: usize) -> Vec<&DiagramPoint> {
        self.points
            .iter()
            .filter(|p| p.dimension == d && !p.is_essential())
            .collect()
    }

    /// Essential points of dimension d
    pub fn essential(&self, d: usize) -> Vec<&DiagramPoint> {
        self.points
            .iter()
            .filter(|p| p.dimension == d && p.is_essential())
            .collect()
    }

    /// Copy of the diagram without zero-persistence points
    pub fn off_diagonal(&self) -> PersistenceDiagram {
        PersistenceDiagram {
            points: self.points.iter().filter(|p| !p.is_diagonal()).copied().collect(),
        }
    }

    /// Persistence entropy for dimension d
    pub fn persistence_entropy(&self, d: usize) -> f64 {
        let lifetimes: Vec<f64> = self
            .finite(d)
            .into_iter()
            .map(DiagramPoint::persistence)
            .filter(|&p| p > 0.0)
            .collect();

        let total: f64 = lifetimes.iter().sum();
        if total <= 0.0 {
            return 0.0;
        }

        let mut entropy = 0.0;
        for p in lifetimes {
            let prob = p / total;
            entropy -= prob * prob.ln();
        }
        entropy
    }

    /// Total persistence for dimension d
    pub fn total_persistence(&self, d: usize) -> f64 {
        self.finite(d).into_iter().map(DiagramPoint::persistence).sum()
    }

    /// Number of finite points with positive persistence in dimension d
    pub fn count(&self, d: usize) -> usize {
        self.finite(d).into_iter().filter(|p| p.persistence() > 0.0).count()
    }

    /// Betti numbers at filtration value `epsilon`
    pub fn betti_at(&self, epsilon: f64) -> BettiNumbers {
        BettiNumbers::from_diagram(self, epsilon)
    }

    /// Points sorted by (dimension, birth, death), vine tags dropped.
    ///
    /// Two orders with the same diagram give equal multisets.
    pub fn sorted_pairs(&self) -> Vec<(usize, f64, f64)> {
        let mut pairs: Vec<_> = self
            .points
            .iter()
            .map(|p| (p.dimension, p.birth, p.death))
            .collect();
        pairs.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(a.1.total_cmp(&b.1))
                .then(a.2.total_cmp(&b.2))
        });
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(dimension: usize, birth: f64, death: f64) -> DiagramPoint {
        DiagramPoint {
            birth,
            death,
            dimension,
            vine: VineId(0),
        }
    }

    fn sample() -> PersistenceDiagram {
        PersistenceDiagram {
            points: vec![
                point(0, 0.0, f64::INFINITY),
                point(0, 0.0, 1.0),
                point(0, 0.0, 1.0),
                point(1, 1.0, 1.0),
                point(1, 1.0, 2.0),
            ],
        }
    }

    #[test]
    fn test_filters() {
        let pd = sample();
        assert_eq!(pd.dim(0).len(), 3);
        assert_eq!(pd.finite(0).len(), 2);
        assert_eq!(pd.essential(0).len(), 1);
        assert_eq!(pd.off_diagonal().len(), 4);
        assert_eq!(pd.count(1), 1);
        assert_eq!(pd.max_dimension(), Some(1));
    }

    #[test]
    fn test_entropy_of_equal_lifetimes() {
        let pd = sample();
        // Two equal finite lifetimes: ln 2
        assert!((pd.persistence_entropy(0) - 2.0_f64.ln()).abs() < 1e-12);
        assert_eq!(pd.persistence_entropy(1), 0.0);
        assert!((pd.total_persistence(0) - 2.0).abs() < 1e-12);
        assert_eq!(pd.persistence_entropy(5), 0.0);
    }

    #[test]
    fn test_sorted_pairs_ignore_point_order() {
        let pd = sample();
        let mut reversed = pd.clone();
        reversed.points.reverse();
        assert_eq!(pd.sorted_pairs(), reversed.sorted_pairs());
    }

    #[test]
    fn test_alive_interval_is_half_open() {
        let p = point(0, 0.0, 1.0);
        assert!(p.is_alive_at(0.0));
        assert!(!p.is_alive_at(1.0));
        assert!(point(0, 0.0, f64::INFINITY).is_alive_at(1e9));
    }
}
