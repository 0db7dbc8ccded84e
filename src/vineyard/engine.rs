//! Vineyard Engine
//!
//! Owns one filtration, its reduced matrix and its vine history, and is the
//! only thing that mutates them. Every operation runs synchronously on the
//! caller's thread; independent engines share nothing and can run on
//! separate threads.
//!
//! ## Time stamps
//!
//! Each transposition appends samples to the (at most two) vines it
//! touches. The sample time comes from the evaluator passed in; the plain
//! `transpose` uses the number of transpositions applied so far, so the
//! k-th swap is stamped `k`.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::tracker::{DiagramSnapshot, Evaluator, StoredValues, Vine, VineId, VineTracker};
use crate::config::{SnapshotPolicy, VineyardConfig};
use crate::error::{Result, VineyardError};
use crate::topology::{
    transpose, BinaryField, Field, Filtration, PersistenceDiagram, PersistencePair, ReducedMatrix,
    Simplex, SimplexId, SimplexRecord, Transposition,
};

/// One request of a transposition stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TranspositionEvent {
    /// Swap the simplices at `position` and `position + 1`
    pub position: usize,
    /// Time stamp for the vine samples (defaults to the step count)
    #[serde(default)]
    pub time: Option<f64>,
}

impl TranspositionEvent {
    pub fn new(position: usize) -> Self {
        Self { position, time: None }
    }

    pub fn at(position: usize, time: f64) -> Self {
        Self {
            position,
            time: Some(time),
        }
    }
}

/// Persistence of a filtration maintained under adjacent transpositions
#[derive(Debug, Clone)]
pub struct Vineyard<F: Field = BinaryField> {
    config: VineyardConfig,
    filtration: Filtration,
    matrix: ReducedMatrix<F>,
    tracker: VineTracker,
    /// Transpositions applied so far
    steps: usize,
}

impl<F: Field> Vineyard<F> {
    /// Reduce the boundary matrix of `filtration` and start one vine per
    /// birth. Fails with `UnsupportedCoefficient` before any reduction work
    /// if the configured field is not available for `F`.
    pub fn new(filtration: Filtration, config: VineyardConfig) -> Result<Self> {
        let field = F::from_coefficients(&config.coefficients)?;
        let matrix = ReducedMatrix::reduce(&filtration, field);
        let tracker = VineTracker::start(&filtration, &matrix, &StoredValues::at(0.0));

        info!(
            simplices = filtration.len(),
            vines = tracker.vines().len(),
            characteristic = matrix.field().characteristic(),
            "Vineyard initialized"
        );

        Ok(Self {
            config,
            filtration,
            matrix,
            tracker,
            steps: 0,
        })
    }

    /// Build the filtration from records listed in filtration order
    pub fn from_records(
        records: impl IntoIterator<Item = SimplexRecord>,
        config: VineyardConfig,
    ) -> Result<Self> {
        let filtration = Filtration::from_records(records)?;
        Self::new(filtration, config)
    }

    pub fn config(&self) -> &VineyardConfig {
        &self.config
    }

    pub fn filtration(&self) -> &Filtration {
        &self.filtration
    }

    pub fn matrix(&self) -> &ReducedMatrix<F> {
        &self.matrix
    }

    pub fn len(&self) -> usize {
        self.filtration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtration.is_empty()
    }

    /// Number of transpositions applied so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn position_of(&self, id: SimplexId) -> Result<usize> {
        self.filtration.position_of(id)
    }

    pub fn simplex_at(&self, position: usize) -> Result<&Simplex> {
        self.filtration.simplex_at(position)
    }

    /// Position of the pivot row of the column at `position`
    pub fn low(&self, position: usize) -> Result<Option<usize>> {
        self.filtration.check_position(position)?;
        let slot = self.filtration.slot_at(position);
        Ok(self.matrix.low_of(slot).map(|row| self.filtration.position(row)))
    }

    /// Whether the R-column at `position` is zero (the simplex is a birth)
    pub fn is_zero(&self, position: usize) -> Result<bool> {
        self.filtration.check_position(position)?;
        Ok(self.matrix.is_positive(self.filtration.slot_at(position)))
    }

    /// Swap positions `i` and `i + 1`, stamped with the step count
    pub fn transpose(&mut self, i: usize) -> Result<Transposition> {
        let time = (self.steps + 1) as f64;
        self.transpose_with(i, &StoredValues::at(time))
    }

    /// Same as `transpose`; the name used by the simplex store
    pub fn swap_adjacent(&mut self, i: usize) -> Result<Transposition> {
        self.transpose(i)
    }

    /// Swap positions `i` and `i + 1`, stamped with `time`
    pub fn transpose_at(&mut self, i: usize, time: f64) -> Result<Transposition> {
        self.transpose_with(i, &StoredValues::at(time))
    }

    /// Swap positions `i` and `i + 1`, sampling vines through `evaluator`.
    ///
    /// Fails with `OutOfRangeIndex` or `InvalidTransposition` without
    /// changing anything.
    pub fn transpose_with<E: Evaluator>(&mut self, i: usize, evaluator: &E) -> Result<Transposition> {
        let transposition = transpose(&mut self.filtration, &mut self.matrix, i)?;
        self.steps += 1;

        self.tracker
            .observe(&transposition, &self.filtration, &self.matrix, evaluator);

        if self.config.verify_invariants && !self.matrix.is_consistent(&self.filtration) {
            error!(
                position = i,
                case = transposition.case.label(),
                "Reduction invariant violated after transposition"
            );
            debug_assert!(false, "reduction invariant violated at position {i}");
        }

        if self.config.snapshot_policy == SnapshotPolicy::EveryTransposition {
            self.tracker
                .record(&self.filtration, &self.matrix, evaluator, &self.config);
        }

        Ok(transposition)
    }

    /// Apply a stream of transpositions in order.
    ///
    /// Stops at the first rejected event and returns its error; the events
    /// before it stay applied.
    pub fn apply(
        &mut self,
        events: impl IntoIterator<Item = TranspositionEvent>,
    ) -> Result<Vec<Transposition>> {
        events
            .into_iter()
            .map(|event| match event.time {
                Some(time) => self.transpose_at(event.position, time),
                None => self.transpose(event.position),
            })
            .collect()
    }

    pub fn set_value(&mut self, id: SimplexId, value: f64) -> Result<()> {
        self.filtration.set_value(id, value)
    }

    pub fn set_values(&mut self, values: impl IntoIterator<Item = (SimplexId, f64)>) -> Result<()> {
        self.filtration.set_values(values)
    }

    /// Current pairing, ordered by birth position
    pub fn pairs(&self) -> Vec<PersistencePair> {
        self.tracker.pairs(&self.filtration, &self.matrix)
    }

    /// Current diagram from the stored simplex values
    pub fn diagram(&self) -> PersistenceDiagram {
        self.diagram_with(&StoredValues::at(self.steps as f64))
    }

    pub fn diagram_with<E: Evaluator>(&self, evaluator: &E) -> PersistenceDiagram {
        self.tracker
            .diagram(&self.filtration, &self.matrix, evaluator, &self.config)
    }

    /// Sample every vine at `time` and store the diagram
    pub fn record_diagram(&mut self, time: f64) {
        self.record_diagram_with(&StoredValues::at(time));
    }

    pub fn record_diagram_with<E: Evaluator>(&mut self, evaluator: &E) {
        self.tracker
            .record(&self.filtration, &self.matrix, evaluator, &self.config);
    }

    pub fn snapshots(&self) -> &[DiagramSnapshot] {
        self.tracker.snapshots()
    }

    /// All vines, in the order their births first appeared
    pub fn vines(&self) -> &[Vine] {
        self.tracker.vines()
    }

    pub fn vine(&self, id: VineId) -> Result<&Vine> {
        self.tracker.vine(id).ok_or(VineyardError::UnknownVine(id.0))
    }

    /// Vine the simplex currently belongs to
    pub fn vine_of(&self, id: SimplexId) -> Result<VineId> {
        let slot = self.filtration.slot_of(id)?;
        Ok(self.tracker.token(slot))
    }

    pub fn vines_in_dimension(&self, d: usize) -> Vec<&Vine> {
        self.vines().iter().filter(|v| v.dimension == d).collect()
    }

    /// Highest dimension to export: the configured one, else the top of the complex
    fn export_dimension(&self) -> usize {
        let top = self.vines().iter().map(|v| v.dimension).max().unwrap_or(0);
        self.config.max_dimension.map_or(top, |max| max.min(top))
    }

    /// Vines grouped by dimension, each flattened to `[birth, death, time, ...]`
    pub fn export_vines(&self, discard_infinite: bool) -> Vec<Vec<Vec<f64>>> {
        (0..=self.export_dimension())
            .map(|d| {
                self.vines_in_dimension(d)
                    .into_iter()
                    .map(|vine| vine.flatten(discard_infinite))
                    .filter(|flat| !flat.is_empty())
                    .collect()
            })
            .collect()
    }

    /// Diagrams at the integer times `0..count`, grouped by dimension, each
    /// flattened to `[birth, death, ...]`.
    ///
    /// Read back from the vines: for every vine the last sample taken at
    /// integer time `t` contributes one point to diagram `t`.
    pub fn export_diagrams(&self, discard_infinite: bool, count: usize) -> Vec<Vec<Vec<f64>>> {
        (0..=self.export_dimension())
            .map(|d| {
                let mut diagrams = vec![Vec::new(); count];
                for vine in self.vines_in_dimension(d) {
                    let mut latest: Vec<Option<(f64, f64)>> = vec![None; count];
                    for sample in &vine.samples {
                        if sample.time < 0.0 || sample.time.fract() != 0.0 {
                            continue;
                        }
                        let t = sample.time as usize;
                        if t < count {
                            latest[t] = Some((sample.birth, sample.death));
                        }
                    }
                    for (t, point) in latest.into_iter().enumerate() {
                        if let Some((birth, death)) = point {
                            if !(discard_infinite && death.is_infinite()) {
                                diagrams[t].extend([birth, death]);
                            }
                        }
                    }
                }
                diagrams
            })
            .collect()
    }

    /// Re-check the reduction invariants against the current order
    pub fn check_invariants(&self) -> bool {
        self.matrix.is_consistent(&self.filtration)
    }
}
