//! Simplex Store and Filtration Order
//!
//! Holds the simplices of a complex together with their current total
//! order. Positions run over `0..n` and every simplex sits strictly after
//! all of its faces. The only way to change the order is an adjacent swap
//! of two simplices that are not faces of one another.
//!
//! Internally each simplex lives in a fixed *slot* (its insertion index).
//! Slots never move; the order is a pair of inverse permutations between
//! slots and positions. Everything downstream (matrix columns, vines) is
//! keyed by slot, so a swap only touches two entries of each permutation.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VineyardError};

/// Caller-chosen identifier of a simplex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimplexId(pub u64);

impl fmt::Display for SimplexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Input record for one simplex: identifier, dimension and boundary faces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplexRecord {
    pub id: SimplexId,
    pub dimension: usize,
    /// Codimension-1 faces, in orientation order
    pub boundary: Vec<SimplexId>,
}

impl SimplexRecord {
    pub fn new(id: u64, dimension: usize, boundary: impl IntoIterator<Item = u64>) -> Self {
        Self {
            id: SimplexId(id),
            dimension,
            boundary: boundary.into_iter().map(SimplexId).collect(),
        }
    }

    /// A 0-simplex
    pub fn vertex(id: u64) -> Self {
        Self::new(id, 0, [])
    }
}

/// A simplex stored in the filtration
#[derive(Debug, Clone)]
pub struct Simplex {
    id: SimplexId,
    dimension: usize,
    /// Boundary faces as given by the caller
    boundary: Vec<SimplexId>,
    /// Slots of the boundary faces (same order as `boundary`)
    faces: Vec<usize>,
    /// Caller-supplied filtration value; `None` reports the current position
    value: Option<f64>,
}

impl Simplex {
    pub fn id(&self) -> SimplexId {
        self.id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn boundary(&self) -> &[SimplexId] {
        &self.boundary
    }

    /// Caller-supplied value, if any
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub(crate) fn face_slots(&self) -> &[usize] {
        &self.faces
    }
}

/// Simplices and their current total order
#[derive(Debug, Clone, Default)]
pub struct Filtration {
    simplices: Vec<Simplex>,
    slots: HashMap<SimplexId, usize>,
    /// position -> slot
    order: Vec<usize>,
    /// slot -> position
    positions: Vec<usize>,
}

impl Filtration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filtration from records listed in filtration order
    pub fn from_records(records: impl IntoIterator<Item = SimplexRecord>) -> Result<Self> {
        let mut filtration = Self::new();
        for record in records {
            filtration.insert(record)?;
        }
        Ok(filtration)
    }

    /// Append a simplex at the end of the order.
    ///
    /// Without a value of its own it is reported at its current position,
    /// wherever later swaps move it. Fails with `InconsistentBoundary` if a
    /// face is missing, has the wrong dimension, or the number of faces does
    /// not match the dimension; the store is unchanged on failure.
    pub fn insert(&mut self, record: SimplexRecord) -> Result<usize> {
        self.push(record, None)
    }

    /// Append a simplex with an explicit filtration value
    pub fn insert_with_value(&mut self, record: SimplexRecord, value: f64) -> Result<usize> {
        self.push(record, Some(value))
    }

    fn push(&mut self, record: SimplexRecord, value: Option<f64>) -> Result<usize> {
        if self.slots.contains_key(&record.id) {
            return Err(VineyardError::DuplicateSimplex(record.id));
        }

        let expected_faces = if record.dimension == 0 { 0 } else { record.dimension + 1 };
        if record.boundary.len() != expected_faces {
            let face = record.boundary.first().copied().unwrap_or(record.id);
            return Err(VineyardError::InconsistentBoundary {
                simplex: record.id,
                face,
                reason: format!(
                    "is part of a boundary with {} faces, expected {}",
                    record.boundary.len(),
                    expected_faces
                ),
            });
        }

        let mut faces = Vec::with_capacity(record.boundary.len());
        for &face in &record.boundary {
            let slot = match self.slots.get(&face) {
                Some(&slot) => slot,
                None => {
                    return Err(VineyardError::InconsistentBoundary {
                        simplex: record.id,
                        face,
                        reason: "is not present in the filtration".to_string(),
                    })
                }
            };
            if self.simplices[slot].dimension + 1 != record.dimension {
                return Err(VineyardError::InconsistentBoundary {
                    simplex: record.id,
                    face,
                    reason: format!(
                        "has dimension {}, expected {}",
                        self.simplices[slot].dimension,
                        record.dimension - 1
                    ),
                });
            }
            if faces.contains(&slot) {
                return Err(VineyardError::InconsistentBoundary {
                    simplex: record.id,
                    face,
                    reason: "is listed twice".to_string(),
                });
            }
            faces.push(slot);
        }

        // Appending keeps every face strictly before the new simplex
        let slot = self.simplices.len();
        self.slots.insert(record.id, slot);
        self.simplices.push(Simplex {
            id: record.id,
            dimension: record.dimension,
            boundary: record.boundary,
            faces,
            value,
        });
        self.order.push(slot);
        self.positions.push(slot);

        Ok(slot)
    }

    pub fn len(&self) -> usize {
        self.simplices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simplices.is_empty()
    }

    /// Current position of a simplex
    pub fn position_of(&self, id: SimplexId) -> Result<usize> {
        self.slot_of(id).map(|slot| self.positions[slot])
    }

    /// Simplex at a position
    pub fn simplex_at(&self, position: usize) -> Result<&Simplex> {
        self.check_position(position)?;
        Ok(&self.simplices[self.order[position]])
    }

    /// Simplex by identifier
    pub fn get(&self, id: SimplexId) -> Result<&Simplex> {
        self.slot_of(id).map(|slot| &self.simplices[slot])
    }

    /// Simplices in filtration order
    pub fn iter(&self) -> impl Iterator<Item = &Simplex> + '_ {
        self.order.iter().map(move |&slot| &self.simplices[slot])
    }

    /// Identifiers in filtration order
    pub fn ids(&self) -> Vec<SimplexId> {
        self.iter().map(Simplex::id).collect()
    }

    /// Exchange the simplices at positions `i` and `i + 1`.
    ///
    /// Rejected with `InvalidTransposition` when the lower simplex is a face
    /// of the upper one; the order is untouched on failure.
    pub fn swap_adjacent(&mut self, i: usize) -> Result<()> {
        self.check_swap(i)?;
        self.relabel(i);
        Ok(())
    }

    /// Validate a swap without performing it; returns the slots at `i` and `i + 1`
    pub(crate) fn check_swap(&self, i: usize) -> Result<(usize, usize)> {
        let n = self.len();
        if n < 2 || i > n - 2 {
            return Err(VineyardError::OutOfRangeIndex {
                index: i,
                len: n.saturating_sub(1),
            });
        }

        let lower = self.order[i];
        let upper = self.order[i + 1];
        if self.is_face(lower, upper) || self.is_face(upper, lower) {
            let (face, coface) = if self.is_face(lower, upper) {
                (lower, upper)
            } else {
                (upper, lower)
            };
            return Err(VineyardError::InvalidTransposition {
                position: i,
                lower: self.simplices[face].id,
                upper: self.simplices[coface].id,
            });
        }

        Ok((lower, upper))
    }

    /// Swap positions `i` and `i + 1` without validation
    pub(crate) fn relabel(&mut self, i: usize) {
        self.order.swap(i, i + 1);
        self.positions[self.order[i]] = i;
        self.positions[self.order[i + 1]] = i + 1;
    }

    pub fn set_value(&mut self, id: SimplexId, value: f64) -> Result<()> {
        let slot = self.slot_of(id)?;
        self.simplices[slot].value = Some(value);
        Ok(())
    }

    /// Set values for many simplices at once (all ids are checked first)
    pub fn set_values(&mut self, values: impl IntoIterator<Item = (SimplexId, f64)>) -> Result<()> {
        let updates = values
            .into_iter()
            .map(|(id, value)| self.slot_of(id).map(|slot| (slot, value)))
            .collect::<Result<Vec<_>>>()?;
        for (slot, value) in updates {
            self.simplices[slot].value = Some(value);
        }
        Ok(())
    }

    pub(crate) fn check_position(&self, position: usize) -> Result<()> {
        if position >= self.len() {
            return Err(VineyardError::OutOfRangeIndex {
                index: position,
                len: self.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn slot_of(&self, id: SimplexId) -> Result<usize> {
        self.slots
            .get(&id)
            .copied()
            .ok_or(VineyardError::UnknownSimplex(id))
    }

    pub(crate) fn slot_at(&self, position: usize) -> usize {
        self.order[position]
    }

    pub(crate) fn position(&self, slot: usize) -> usize {
        self.positions[slot]
    }

    pub(crate) fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub(crate) fn simplex(&self, slot: usize) -> &Simplex {
        &self.simplices[slot]
    }

    /// Whether `face` is in the boundary of `coface`
    fn is_face(&self, face: usize, coface: usize) -> bool {
        self.simplices[coface].faces.contains(&face)
    }
}
