//! Vine Tracker
//!
//! Follows the identity of persistence pairs through a sequence of
//! transpositions. Each positive simplex starts one vine; the simplex that
//! kills it carries the same token. A transposition that switches the
//! pairing swaps the tokens of the two transposed simplices, so each vine
//! stays on its own side of the crossing and its curve is continuous.
//!
//! Values are read through an `Evaluator`: the time stamp of the current
//! order and the filtration value of each simplex at its current position.
//! The tracker never touches the matrix; it only reads the pairing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::VineyardConfig;
use crate::topology::{
    DiagramPoint, Field, Filtration, PersistenceDiagram, PersistencePair, ReducedMatrix, Simplex,
    Transposition,
};

/// Stable identifier of a vine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VineId(pub usize);

impl fmt::Display for VineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Supplies time stamps and simplex values for vine samples
pub trait Evaluator {
    /// Time of the current order
    fn time(&self) -> f64;

    /// Filtration value of a simplex sitting at `position`
    fn value(&self, simplex: &Simplex, position: usize) -> f64;
}

/// Reads the values stored on the simplices, falling back to the current
/// position for simplices without one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredValues {
    pub time: f64,
}

impl StoredValues {
    pub fn at(time: f64) -> Self {
        Self { time }
    }
}

impl Evaluator for StoredValues {
    fn time(&self) -> f64 {
        self.time
    }

    fn value(&self, simplex: &Simplex, position: usize) -> f64 {
        simplex.value().unwrap_or(position as f64)
    }
}

/// One point on a vine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VineSample {
    pub time: f64,
    pub birth: f64,
    /// `f64::INFINITY` while the class is essential
    pub death: f64,
}

impl VineSample {
    pub fn is_infinite(&self) -> bool {
        self.death.is_infinite()
    }
}

/// Trajectory of one persistence pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vine {
    pub id: VineId,
    /// Dimension of the birth simplex
    pub dimension: usize,
    pub samples: Vec<VineSample>,
}

impl Vine {
    pub fn last(&self) -> Option<&VineSample> {
        self.samples.last()
    }

    /// Samples as a flat `[birth, death, time, ...]` list
    pub fn flatten(&self, discard_infinite: bool) -> Vec<f64> {
        self.samples
            .iter()
            .filter(|s| !(discard_infinite && s.is_infinite()))
            .flat_map(|s| [s.birth, s.death, s.time])
            .collect()
    }
}

/// Full diagram stored at a given time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramSnapshot {
    pub time: f64,
    pub diagram: PersistenceDiagram,
}

/// Token per simplex plus the history of every vine
#[derive(Debug, Clone, Default)]
pub(crate) struct VineTracker {
    vines: Vec<Vine>,
    /// slot -> vine token
    tokens: Vec<VineId>,
    snapshots: Vec<DiagramSnapshot>,
}

impl VineTracker {
    /// Assign one vine per positive simplex, in filtration order, and take
    /// the first sample of each
    pub(crate) fn start<F: Field, E: Evaluator>(
        filtration: &Filtration,
        matrix: &ReducedMatrix<F>,
        evaluator: &E,
    ) -> Self {
        let mut tracker = Self {
            vines: Vec::new(),
            tokens: vec![VineId(0); filtration.len()],
            snapshots: Vec::new(),
        };

        for position in 0..filtration.len() {
            let slot = filtration.slot_at(position);
            if !matrix.is_positive(slot) {
                continue;
            }
            let id = VineId(tracker.vines.len());
            tracker.vines.push(Vine {
                id,
                dimension: filtration.simplex(slot).dimension(),
                samples: Vec::new(),
            });
            tracker.tokens[slot] = id;
            if let Some(death) = matrix.pivot_of(slot) {
                tracker.tokens[death] = id;
            }
        }

        tracker.sample_all(filtration, matrix, evaluator);
        tracker
    }

    pub(crate) fn vines(&self) -> &[Vine] {
        &self.vines
    }

    pub(crate) fn vine(&self, id: VineId) -> Option<&Vine> {
        self.vines.get(id.0)
    }

    pub(crate) fn token(&self, slot: usize) -> VineId {
        self.tokens[slot]
    }

    pub(crate) fn snapshots(&self) -> &[DiagramSnapshot] {
        &self.snapshots
    }

    /// Update tokens after a transposition and sample the touched vines
    pub(crate) fn observe<F: Field, E: Evaluator>(
        &mut self,
        transposition: &Transposition,
        filtration: &Filtration,
        matrix: &ReducedMatrix<F>,
        evaluator: &E,
    ) {
        let (a, b) = transposition.slots;
        if transposition.switched() {
            self.tokens.swap(a, b);
        }

        self.sample_slot(a, filtration, matrix, evaluator);
        if self.tokens[a] != self.tokens[b] {
            self.sample_slot(b, filtration, matrix, evaluator);
        }
    }

    /// Append one sample to every vine
    pub(crate) fn sample_all<F: Field, E: Evaluator>(
        &mut self,
        filtration: &Filtration,
        matrix: &ReducedMatrix<F>,
        evaluator: &E,
    ) {
        for slot in 0..filtration.len() {
            if matrix.is_positive(slot) {
                self.sample_slot(slot, filtration, matrix, evaluator);
            }
        }
    }

    /// Sample every vine and store the diagram
    pub(crate) fn record<F: Field, E: Evaluator>(
        &mut self,
        filtration: &Filtration,
        matrix: &ReducedMatrix<F>,
        evaluator: &E,
        config: &VineyardConfig,
    ) {
        self.sample_all(filtration, matrix, evaluator);
        let diagram = self.diagram(filtration, matrix, evaluator, config);
        self.snapshots.push(DiagramSnapshot {
            time: evaluator.time(),
            diagram,
        });
    }

    /// Current pairing, ordered by birth position
    pub(crate) fn pairs<F: Field>(
        &self,
        filtration: &Filtration,
        matrix: &ReducedMatrix<F>,
    ) -> Vec<PersistencePair> {
        (0..filtration.len())
            .map(|position| filtration.slot_at(position))
            .filter(|&slot| matrix.is_positive(slot))
            .map(|birth| {
                let death = matrix.pivot_of(birth);
                PersistencePair {
                    dimension: filtration.simplex(birth).dimension(),
                    birth: filtration.position(birth),
                    death: death.map(|d| filtration.position(d)),
                    birth_id: filtration.simplex(birth).id(),
                    death_id: death.map(|d| filtration.simplex(d).id()),
                    vine: self.tokens[birth],
                }
            })
            .collect()
    }

    /// Current diagram, restricted to the configured dimensions
    pub(crate) fn diagram<F: Field, E: Evaluator>(
        &self,
        filtration: &Filtration,
        matrix: &ReducedMatrix<F>,
        evaluator: &E,
        config: &VineyardConfig,
    ) -> PersistenceDiagram {
        let points = self
            .pairs(filtration, matrix)
            .into_iter()
            .filter(|pair| config.reports_dimension(pair.dimension))
            .map(|pair| {
                DiagramPoint {
                    birth: value_at(filtration, evaluator, filtration.slot_at(pair.birth)),
                    death: pair.death.map_or(f64::INFINITY, |d| {
                        value_at(filtration, evaluator, filtration.slot_at(d))
                    }),
                    dimension: pair.dimension,
                    vine: pair.vine,
                }
            })
            .collect();

        PersistenceDiagram { points }
    }

    /// Push the current (birth, death) of the pair containing `slot`
    fn sample_slot<F: Field, E: Evaluator>(
        &mut self,
        slot: usize,
        filtration: &Filtration,
        matrix: &ReducedMatrix<F>,
        evaluator: &E,
    ) {
        let (birth, death) = if matrix.is_positive(slot) {
            (Some(slot), matrix.pivot_of(slot))
        } else {
            (matrix.low_of(slot), Some(slot))
        };
        let Some(birth) = birth else {
            return;
        };

        let sample = VineSample {
            time: evaluator.time(),
            birth: value_at(filtration, evaluator, birth),
            death: death.map_or(f64::INFINITY, |d| value_at(filtration, evaluator, d)),
        };
        let id = self.tokens[slot];
        if let Some(vine) = self.vines.get_mut(id.0) {
            vine.samples.push(sample);
        }
    }
}

fn value_at<E: Evaluator>(filtration: &Filtration, evaluator: &E, slot: usize) -> f64 {
    evaluator.value(filtration.simplex(slot), filtration.position(slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{BinaryField, SimplexRecord};

    fn path() -> Filtration {
        Filtration::from_records([
            SimplexRecord::vertex(0),
            SimplexRecord::vertex(1),
            SimplexRecord::vertex(2),
            SimplexRecord::new(3, 1, [0, 1]),
            SimplexRecord::new(4, 1, [1, 2]),
        ])
        .unwrap()
    }

    #[test]
    fn test_one_vine_per_positive_simplex() {
        let f = path();
        let m = ReducedMatrix::reduce(&f, BinaryField);
        let tracker = VineTracker::start(&f, &m, &StoredValues::at(0.0));

        assert_eq!(tracker.vines().len(), 3);
        // Vertex 1 and the edge that kills it share a token
        assert_eq!(tracker.token(1), tracker.token(3));
        assert_eq!(tracker.token(2), tracker.token(4));
        assert_ne!(tracker.token(1), tracker.token(2));

        let first = tracker.vine(tracker.token(1)).unwrap().samples[0];
        assert_eq!((first.time, first.birth, first.death), (0.0, 1.0, 3.0));
        assert!(tracker.vine(VineId(0)).unwrap().samples[0].is_infinite());
    }

    #[test]
    fn test_diagram_respects_max_dimension() {
        // Filled triangle: three dimension-0 pairs and one dimension-1 pair
        let f = Filtration::from_records([
            SimplexRecord::vertex(0),
            SimplexRecord::vertex(1),
            SimplexRecord::vertex(2),
            SimplexRecord::new(3, 1, [0, 1]),
            SimplexRecord::new(4, 1, [1, 2]),
            SimplexRecord::new(5, 1, [0, 2]),
            SimplexRecord::new(6, 2, [4, 5, 3]),
        ])
        .unwrap();
        let m = ReducedMatrix::reduce(&f, BinaryField);
        let tracker = VineTracker::start(&f, &m, &StoredValues::at(0.0));

        let all = tracker.diagram(&f, &m, &StoredValues::at(0.0), &VineyardConfig::default());
        assert_eq!(all.len(), 4);
        assert_eq!(all.finite(1).len(), 1);

        let config = VineyardConfig {
            max_dimension: Some(0),
            ..VineyardConfig::default()
        };
        let low = tracker.diagram(&f, &m, &StoredValues::at(0.0), &config);
        assert_eq!(low.len(), 3);
        assert!(low.dim(1).is_empty());
        assert_eq!(low.essential(0).len(), 1);
        // The pairing itself is not filtered
        assert_eq!(tracker.pairs(&f, &m).len(), 4);
    }

    #[test]
    fn test_flatten_drops_infinite_samples() {
        let vine = Vine {
            id: VineId(0),
            dimension: 0,
            samples: vec![
                VineSample { time: 0.0, birth: 0.0, death: f64::INFINITY },
                VineSample { time: 1.0, birth: 0.0, death: 2.0 },
            ],
        };
        assert_eq!(vine.flatten(true), vec![0.0, 2.0, 1.0]);
        assert_eq!(vine.flatten(false).len(), 6);
        assert_eq!(VineId(4).to_string(), "v4");
    }
}
