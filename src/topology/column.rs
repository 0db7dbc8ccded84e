//! Sparse matrix columns
//!
//! Rows are keyed by simplex *slot*, not by filtration position, so a
//! transposition never has to rewrite column contents. The pivot (`low`) of
//! a column is the entry whose slot currently has the highest position.

use std::collections::BTreeMap;

use super::field::Field;

/// Sparse column over a coefficient field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseColumn<E> {
    /// Non-zero entries, row slot -> coefficient
    entries: BTreeMap<usize, E>,
}

impl<E: Copy + Eq> SparseColumn<E> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn from_entries<F>(field: &F, entries: impl IntoIterator<Item = (usize, E)>) -> Self
    where
        F: Field<Elem = E>,
    {
        let mut column = Self::new();
        for (row, coefficient) in entries {
            column.add_entry(field, row, coefficient);
        }
        column
    }

    /// Column with a single unit entry (identity column of V)
    pub fn unit<F: Field<Elem = E>>(field: &F, row: usize) -> Self {
        Self::from_entries(field, [(row, field.one())])
    }

    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, row: usize) -> Option<E> {
        self.entries.get(&row).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, E)> + '_ {
        self.entries.iter().map(|(&row, &c)| (row, c))
    }

    /// Row slot with the highest current position, with its coefficient
    pub fn low(&self, positions: &[usize]) -> Option<(usize, E)> {
        self.entries
            .iter()
            .max_by_key(|&(&row, _)| positions[row])
            .map(|(&row, &c)| (row, c))
    }

    /// Add `coefficient` to the entry at `row`, dropping it if it cancels
    pub fn add_entry<F: Field<Elem = E>>(&mut self, field: &F, row: usize, coefficient: E) {
        if field.is_zero(coefficient) {
            return;
        }
        let updated = match self.entries.get(&row) {
            Some(&current) => field.add(current, coefficient),
            None => coefficient,
        };
        if field.is_zero(updated) {
            self.entries.remove(&row);
        } else {
            self.entries.insert(row, updated);
        }
    }

    /// `self += scale * other`
    pub fn add_scaled<F: Field<Elem = E>>(&mut self, field: &F, scale: E, other: &SparseColumn<E>) {
        if field.is_zero(scale) {
            return;
        }
        for (&row, &c) in &other.entries {
            self.add_entry(field, row, field.mul(scale, c));
        }
    }
}

impl<E: Copy + Eq> Default for SparseColumn<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::field::{BinaryField, PrimeField};

    #[test]
    fn test_binary_addition_is_symmetric_difference() {
        let f = BinaryField;
        let mut a = SparseColumn::from_entries(&f, [(0, true), (2, true)]);
        let b = SparseColumn::from_entries(&f, [(2, true), (3, true)]);
        a.add_scaled(&f, true, &b);
        assert_eq!(a.iter().map(|(r, _)| r).collect::<Vec<_>>(), vec![0, 3]);
        let same = a.clone();
        a.add_scaled(&f, true, &same);
        assert!(a.is_zero());
    }

    #[test]
    fn test_low_follows_positions_not_slots() {
        let f = BinaryField;
        let column = SparseColumn::from_entries(&f, [(0, true), (1, true)]);
        assert_eq!(column.low(&[0, 1]).map(|(r, _)| r), Some(1));
        // Slot 0 now sits after slot 1
        assert_eq!(column.low(&[1, 0]).map(|(r, _)| r), Some(0));
        assert_eq!(SparseColumn::<bool>::new().low(&[0]), None);
    }

    #[test]
    fn test_prime_scaled_addition_cancels() {
        let f = PrimeField::new(5).unwrap();
        let mut a = SparseColumn::from_entries(&f, [(1, 2), (4, 3)]);
        let b = SparseColumn::from_entries(&f, [(1, 1), (2, 4)]);
        // a - 2b clears row 1
        a.add_scaled(&f, f.neg(2), &b);
        assert_eq!(a.get(1), None);
        assert_eq!(a.get(2), Some(f.mul(f.neg(2), 4)));
        assert_eq!(a.get(4), Some(3));
    }
}
