//! Boundary Matrix Reduction
//!
//! Maintains the decomposition R = D·V of the boundary matrix D of a
//! filtration:
//!
//! - R is *reduced*: no two nonzero columns share the same `low`
//! - V is invertible upper-triangular with unit diagonal
//!
//! A simplex whose R-column is zero is *positive* (it creates a class); a
//! column with `low = r` pairs the positive simplex at row `r` with the
//! simplex owning the column. Positive simplices whose row is nobody's
//! pivot are essential.
//!
//! Columns are stored per simplex slot; `low` is resolved through the
//! current slot -> position table of the filtration.
//!
//! ## Reference
//!
//! Edelsbrunner, Letscher, Zomorodian (2002). "Topological Persistence
//! and Simplification". Discrete & Computational Geometry.

use std::collections::HashSet;

use tracing::{info, trace};

use super::column::SparseColumn;
use super::field::Field;
use super::simplex::Filtration;

/// Reduced boundary matrix R together with the column operations V
#[derive(Debug, Clone)]
pub struct ReducedMatrix<F: Field> {
    field: F,
    /// R columns, by slot
    r: Vec<SparseColumn<F::Elem>>,
    /// V columns, by slot
    v: Vec<SparseColumn<F::Elem>>,
    /// slot -> row slot of its pivot
    low: Vec<Option<usize>>,
    /// row slot -> column slot whose pivot it is
    pivot: Vec<Option<usize>>,
}

impl<F: Field> ReducedMatrix<F> {
    /// Build and reduce the boundary matrix of a filtration.
    ///
    /// Columns are processed in position order; each one is reduced by the
    /// column already owning its current low until it vanishes or its low is
    /// unclaimed.
    pub fn reduce(filtration: &Filtration, field: F) -> Self {
        let n = filtration.len();
        let positions = filtration.positions();

        let mut matrix = Self {
            r: vec![SparseColumn::new(); n],
            v: vec![SparseColumn::new(); n],
            low: vec![None; n],
            pivot: vec![None; n],
            field,
        };

        for position in 0..n {
            let slot = filtration.slot_at(position);
            let simplex = filtration.simplex(slot);

            let mut boundary = SparseColumn::from_entries(
                &matrix.field,
                simplex
                    .face_slots()
                    .iter()
                    .enumerate()
                    .map(|(k, &face)| (face, matrix.field.sign(k))),
            );
            let mut chain = SparseColumn::unit(&matrix.field, slot);

            while let Some((low, coefficient)) = boundary.low(positions) {
                let Some(owner) = matrix.pivot[low] else {
                    break;
                };
                let owner_coefficient = matrix.r[owner]
                    .get(low)
                    .unwrap_or_else(|| matrix.field.one());
                let scale = matrix
                    .field
                    .neg(matrix.field.div(coefficient, owner_coefficient));
                boundary.add_scaled(&matrix.field, scale, &matrix.r[owner]);
                chain.add_scaled(&matrix.field, scale, &matrix.v[owner]);
            }

            if let Some((low, _)) = boundary.low(positions) {
                matrix.pivot[low] = Some(slot);
                matrix.low[slot] = Some(low);
            }

            matrix.r[slot] = boundary;
            matrix.v[slot] = chain;
        }

        info!(
            simplices = n,
            pairs = matrix.low.iter().flatten().count(),
            "Reduced boundary matrix"
        );

        matrix
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    /// Row slot of the pivot of a column
    pub(crate) fn low_of(&self, slot: usize) -> Option<usize> {
        self.low[slot]
    }

    /// Column slot whose pivot is the given row
    pub(crate) fn pivot_of(&self, row: usize) -> Option<usize> {
        self.pivot[row]
    }

    pub(crate) fn is_positive(&self, slot: usize) -> bool {
        self.r[slot].is_zero()
    }

    /// Column of R for the simplex in `slot` (its insertion index)
    pub fn r_column(&self, slot: usize) -> &SparseColumn<F::Elem> {
        &self.r[slot]
    }

    /// Column of V for the simplex in `slot`
    pub fn v_column(&self, slot: usize) -> &SparseColumn<F::Elem> {
        &self.v[slot]
    }

    /// `R[row, column]`
    pub(crate) fn r_entry(&self, row: usize, column: usize) -> Option<F::Elem> {
        self.r[column].get(row)
    }

    /// `V[row, column]`
    pub(crate) fn v_entry(&self, row: usize, column: usize) -> Option<F::Elem> {
        self.v[column].get(row)
    }

    /// `R[dst] += scale * R[src]` and `V[dst] += scale * V[src]`.
    ///
    /// Pivot bookkeeping is not touched; callers re-link the affected
    /// columns once the whole update is done.
    pub(crate) fn add_column(&mut self, dst: usize, src: usize, scale: F::Elem) {
        debug_assert_ne!(dst, src, "cannot add a column to itself");
        trace!(dst, src, "Column addition");

        let (r_src, v_src) = (self.r[src].clone(), self.v[src].clone());
        self.r[dst].add_scaled(&self.field, scale, &r_src);
        self.v[dst].add_scaled(&self.field, scale, &v_src);
    }

    /// Recompute `low` for the given columns and rebuild their pivot links
    pub(crate) fn relink(&mut self, slots: &[usize], positions: &[usize]) {
        let mut seen = HashSet::with_capacity(slots.len());
        let slots: Vec<usize> = slots.iter().copied().filter(|s| seen.insert(*s)).collect();

        for &slot in &slots {
            if let Some(row) = self.low[slot].take() {
                if self.pivot[row] == Some(slot) {
                    self.pivot[row] = None;
                }
            }
        }
        for &slot in &slots {
            if let Some((row, _)) = self.r[slot].low(positions) {
                debug_assert!(
                    self.pivot[row].is_none(),
                    "row {row} is already the pivot of column {:?}",
                    self.pivot[row]
                );
                self.low[slot] = Some(row);
                self.pivot[row] = Some(slot);
            }
        }
    }

    /// Check the reduction invariants against the current order:
    /// cached lows match the columns, no two columns share a low, pivot rows
    /// belong to positive simplices, and V is unit upper-triangular.
    pub fn is_consistent(&self, filtration: &Filtration) -> bool {
        let positions = filtration.positions();
        let mut rows = HashSet::new();

        for slot in 0..self.len() {
            let low = self.r[slot].low(positions).map(|(row, _)| row);
            if low != self.low[slot] {
                return false;
            }
            if let Some(row) = low {
                if !rows.insert(row)
                    || self.pivot[row] != Some(slot)
                    || !self.r[row].is_zero()
                    || positions[row] >= positions[slot]
                {
                    return false;
                }
            }
            if self.v[slot].get(slot) != Some(self.field.one()) {
                return false;
            }
            if self.v[slot].iter().any(|(row, _)| positions[row] > positions[slot]) {
                return false;
            }
        }

        true
    }
}
