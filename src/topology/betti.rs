//! Betti Numbers: Topological Invariants
//!
//! The k-th Betti number βₖ counts the number of k-dimensional
//! "holes" in a topological space:
//!
//! - β₀: Number of connected components
//! - β₁: Number of 1-dimensional loops/cycles
//! - β₂: Number of 2-dimensional voids/cavities
//!
//! Read off a persistence diagram: βₖ(ε) is the number of k-dimensional
//! points with birth ≤ ε < death.

use serde::{Deserialize, Serialize};

use super::diagram::PersistenceDiagram;

/// Betti numbers at a specific filtration value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BettiNumbers {
    pub beta_0: usize,  // Connected components
    pub beta_1: usize,  // Loops
    pub beta_2: usize,  // Voids
    pub epsilon: f64,   // Filtration value
}

impl BettiNumbers {
    pub fn new(beta_0: usize, beta_1: usize, beta_2: usize, epsilon: f64) -> Self {
        Self { beta_0, beta_1, beta_2, epsilon }
    }

    /// Count the classes of a diagram alive at `epsilon`
    pub fn from_diagram(diagram: &PersistenceDiagram, epsilon: f64) -> Self {
        let alive = |d: usize| {
            diagram
                .points
                .iter()
                .filter(|p| p.dimension == d && p.is_alive_at(epsilon))
                .count()
        };
        Self::new(alive(0), alive(1), alive(2), epsilon)
    }

    /// Total topological complexity
    pub fn total(&self) -> usize {
        self.beta_0 + self.beta_1 + self.beta_2
    }

    /// Euler characteristic χ = β₀ - β₁ + β₂
    pub fn euler_characteristic(&self) -> i64 {
        self.beta_0 as i64 - self.beta_1 as i64 + self.beta_2 as i64
    }
}

/// Betti curve: sequence of Betti numbers across filtration values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BettiCurve {
    pub values: Vec<BettiNumbers>,
}

impl BettiCurve {
    /// Evaluate the diagram at each of the given filtration values
    pub fn compute(diagram: &PersistenceDiagram, epsilons: &[f64]) -> Self {
        let values = epsilons
            .iter()
            .map(|&epsilon| BettiNumbers::from_diagram(diagram, epsilon))
            .collect();

        Self { values }
    }

    /// Get β₀ curve
    pub fn beta_0_curve(&self) -> Vec<(f64, usize)> {
        self.values.iter().map(|b| (b.epsilon, b.beta_0)).collect()
    }

    /// Get β₁ curve
    pub fn beta_1_curve(&self) -> Vec<(f64, usize)> {
        self.values.iter().map(|b| (b.epsilon, b.beta_1)).collect()
    }

    /// Integrated β₁ (area under curve, trapezoid rule)
    pub fn integrated_beta_1(&self) -> f64 {
        if self.values.len() < 2 {
            return 0.0;
        }

        self.values
            .windows(2)
            .map(|w| {
                let de = w[1].epsilon - w[0].epsilon;
                de * (w[1].beta_1 + w[0].beta_1) as f64 / 2.0
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::diagram::DiagramPoint;
    use crate::vineyard::VineId;

    fn square_diagram() -> PersistenceDiagram {
        let point = |dimension, birth, death| DiagramPoint {
            birth,
            death,
            dimension,
            vine: VineId(0),
        };
        PersistenceDiagram {
            points: vec![
                point(0, 0.0, f64::INFINITY),
                point(0, 0.0, 1.0),
                point(0, 0.0, 1.0),
                point(0, 0.0, 1.0),
                point(1, 1.0, 2.0_f64.sqrt()),
            ],
        }
    }

    #[test]
    fn test_betti_at_values() {
        let pd = square_diagram();
        let before = BettiNumbers::from_diagram(&pd, 0.5);
        assert_eq!((before.beta_0, before.beta_1), (4, 0));

        let loop_open = pd.betti_at(1.2);
        assert_eq!((loop_open.beta_0, loop_open.beta_1), (1, 1));
        assert_eq!(loop_open.euler_characteristic(), 0);

        let filled = pd.betti_at(2.0);
        assert_eq!(filled.total(), 1);
    }

    #[test]
    fn test_integrated_beta_1() {
        let pd = square_diagram();
        let curve = BettiCurve::compute(&pd, &[0.0, 1.0, 1.2, 2.0]);
        assert_eq!(curve.beta_1_curve().len(), 4);
        assert_eq!(curve.beta_0_curve()[0], (0.0, 4));
        // Trapezoids: 0.5 * 1.0 * (0 + 1) + 0.5 * 0.2 * (1 + 1) + 0.5 * 0.8 * (1 + 0)
        assert!((curve.integrated_beta_1() - 1.1).abs() < 1e-12);
    }
}
