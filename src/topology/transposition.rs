//! Transposition Engine
//!
//! Swaps two adjacent simplices σᵢ, σᵢ₊₁ of the filtration and repairs the
//! decomposition R = D·V so that R stays reduced and V stays unit
//! upper-triangular. Writing P for the permutation exchanging i and i+1,
//! P·R·P = (P·D·P)(P·V·P) holds trivially; the work is to fix the two ways
//! this can fail:
//!
//! - V[i, i+1] ≠ 0 makes P·V·P lower-triangular in one entry, cleared by
//!   adding column i of V into column i+1 (and of R alongside);
//! - exchanging rows i and i+1 of R can give two columns the same `low`,
//!   cleared by adding the earlier column into the later one.
//!
//! Which repair applies depends on the signs of σᵢ and σᵢ₊₁ (positive =
//! zero R-column). The cases follow Cohen-Steiner, Edelsbrunner, Morozov
//! (2006), "Vines and Vineyards by Updating Persistence in Linear Time".
//! Some cases *switch* the pairing: the two simplices exchange partners,
//! which is what the vine tracker follows through a crossing.
//!
//! The cost of a transposition is proportional to the size of the (at most
//! four) columns it touches, independent of the size of the complex.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::field::Field;
use super::reduction::ReducedMatrix;
use super::simplex::{Filtration, SimplexId};
use crate::error::Result;

/// Which repair a transposition needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranspositionCase {
    /// Simplices of different dimension; plain relabel
    DimensionMismatch,
    /// Case 1.1.1: both positive, both killed, the earlier killer absorbed
    /// into the later one; pairing kept
    PositiveAbsorbForward,
    /// Case 1.1.2: both positive, both killed, the later killer absorbed into
    /// the earlier one; pairing switches
    PositiveAbsorbBackward,
    /// Case 1.2: both positive, plain relabel
    PositiveRelabel,
    /// Case 1.2 (special): the lower simplex is essential and the upper one's
    /// killer also contains it; plain relabel, pairing switches
    PositiveEssentialSwitch,
    /// Case 2.2: both negative, plain relabel
    NegativeRelabel,
    /// Case 2.1.1: both negative, V cleared by one addition; pairing kept
    NegativeAbsorb,
    /// Case 2.1.2: both negative, two additions; pairing switches
    NegativeSwitch,
    /// Case 3.2: negative then positive, plain relabel
    NegativePositiveRelabel,
    /// Case 3.1: negative then positive, two additions; pairing switches
    NegativePositiveSwitch,
    /// Case 4: positive then negative, V cleared; plain relabel in R
    PositiveNegative,
}

impl TranspositionCase {
    /// Short case code in the numbering of the vineyards paper
    pub fn label(&self) -> &'static str {
        match self {
            TranspositionCase::DimensionMismatch => "0",
            TranspositionCase::PositiveAbsorbForward => "1.1.1",
            TranspositionCase::PositiveAbsorbBackward => "1.1.2",
            TranspositionCase::PositiveRelabel => "1.2",
            TranspositionCase::PositiveEssentialSwitch => "1.2s",
            TranspositionCase::NegativeRelabel => "2.2",
            TranspositionCase::NegativeAbsorb => "2.1.1",
            TranspositionCase::NegativeSwitch => "2.1.2",
            TranspositionCase::NegativePositiveRelabel => "3.2",
            TranspositionCase::NegativePositiveSwitch => "3.1",
            TranspositionCase::PositiveNegative => "4",
        }
    }

    /// Whether the two simplices exchanged partners
    pub fn switches_pairing(&self) -> bool {
        matches!(
            self,
            TranspositionCase::PositiveAbsorbBackward
                | TranspositionCase::PositiveEssentialSwitch
                | TranspositionCase::NegativeSwitch
                | TranspositionCase::NegativePositiveSwitch
        )
    }

    /// Number of column additions performed on R
    pub fn r_additions(&self) -> usize {
        match self {
            TranspositionCase::PositiveAbsorbForward
            | TranspositionCase::PositiveAbsorbBackward
            | TranspositionCase::NegativeAbsorb => 1,
            TranspositionCase::NegativeSwitch | TranspositionCase::NegativePositiveSwitch => 2,
            _ => 0,
        }
    }
}

impl fmt::Display for TranspositionCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one applied transposition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transposition {
    /// The swap exchanged positions `position` and `position + 1`
    pub position: usize,
    /// Simplex that was at `position` (now at `position + 1`)
    pub lower: SimplexId,
    /// Simplex that was at `position + 1` (now at `position`)
    pub upper: SimplexId,
    pub case: TranspositionCase,
    #[serde(skip)]
    pub(crate) slots: (usize, usize),
}

impl Transposition {
    pub fn switched(&self) -> bool {
        self.case.switches_pairing()
    }
}

/// Swap positions `i` and `i + 1` and repair the reduction.
///
/// The swap is validated against the filtration first; on error neither the
/// order nor the matrix is touched.
pub(crate) fn transpose<F: Field>(
    filtration: &mut Filtration,
    matrix: &mut ReducedMatrix<F>,
    i: usize,
) -> Result<Transposition> {
    let (a, b) = filtration.check_swap(i)?;
    let field = matrix.field().clone();

    // Columns whose pivots are the two rows being exchanged
    let killer_of_a = matrix.pivot_of(a);
    let killer_of_b = matrix.pivot_of(b);

    let case = if filtration.simplex(a).dimension() != filtration.simplex(b).dimension() {
        filtration.relabel(i);
        TranspositionCase::DimensionMismatch
    } else {
        match (matrix.is_positive(a), matrix.is_positive(b)) {
            (true, true) => {
                clear_chain_entry(matrix, &field, a, b);
                let case = match (killer_of_a, killer_of_b) {
                    (_, None) => TranspositionCase::PositiveRelabel,
                    (k, Some(l)) => match (k, matrix.r_entry(a, l)) {
                        (_, None) => TranspositionCase::PositiveRelabel,
                        (None, Some(_)) => TranspositionCase::PositiveEssentialSwitch,
                        (Some(k), Some(e)) => {
                            let pivot_k = pivot_coefficient(matrix, &field, k, a);
                            if filtration.position(k) < filtration.position(l) {
                                // Clear row i of l using k
                                matrix.add_column(l, k, field.neg(field.div(e, pivot_k)));
                                TranspositionCase::PositiveAbsorbForward
                            } else {
                                // Clear row i of k using l; k's low moves to row i+1
                                matrix.add_column(k, l, field.neg(field.div(pivot_k, e)));
                                TranspositionCase::PositiveAbsorbBackward
                            }
                        }
                    },
                };
                filtration.relabel(i);
                case
            }
            (false, false) => match matrix.v_entry(a, b) {
                None => {
                    filtration.relabel(i);
                    TranspositionCase::NegativeRelabel
                }
                Some(c) => {
                    let a_dies_first = match (matrix.low_of(a), matrix.low_of(b)) {
                        (Some(low_a), Some(low_b)) => {
                            filtration.position(low_a) < filtration.position(low_b)
                        }
                        _ => true,
                    };
                    matrix.add_column(b, a, field.neg(c));
                    filtration.relabel(i);
                    if a_dies_first {
                        TranspositionCase::NegativeAbsorb
                    } else {
                        // Both columns now share low(a); the earlier one (b) fixes the later
                        matrix.add_column(a, b, field.inv(c));
                        TranspositionCase::NegativeSwitch
                    }
                }
            },
            (false, true) => match matrix.v_entry(a, b) {
                None => {
                    filtration.relabel(i);
                    TranspositionCase::NegativePositiveRelabel
                }
                Some(c) => {
                    // b's column becomes -c·R[a]; adding it back zeroes a
                    matrix.add_column(b, a, field.neg(c));
                    filtration.relabel(i);
                    matrix.add_column(a, b, field.inv(c));
                    TranspositionCase::NegativePositiveSwitch
                }
            },
            (true, false) => {
                clear_chain_entry(matrix, &field, a, b);
                filtration.relabel(i);
                TranspositionCase::PositiveNegative
            }
        }
    };

    let mut affected = vec![a, b];
    affected.extend(killer_of_a);
    affected.extend(killer_of_b);
    matrix.relink(&affected, filtration.positions());

    let transposition = Transposition {
        position: i,
        lower: filtration.simplex(a).id(),
        upper: filtration.simplex(b).id(),
        case,
        slots: (a, b),
    };
    debug!(
        position = i,
        case = case.label(),
        lower = %transposition.lower,
        upper = %transposition.upper,
        switched = case.switches_pairing(),
        "Transposition"
    );

    Ok(transposition)
}

/// Zero `V[a, b]` by subtracting a multiple of column `a` (R[a] is zero
/// whenever this is called, so only V changes)
fn clear_chain_entry<F: Field>(matrix: &mut ReducedMatrix<F>, field: &F, a: usize, b: usize) {
    if let Some(c) = matrix.v_entry(a, b) {
        matrix.add_column(b, a, field.neg(c));
    }
}

fn pivot_coefficient<F: Field>(matrix: &ReducedMatrix<F>, field: &F, column: usize, row: usize) -> F::Elem {
    matrix.r_entry(row, column).unwrap_or_else(|| field.one())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VineyardError;
    use crate::topology::field::{BinaryField, PrimeField};
    use crate::topology::simplex::SimplexRecord;

    /// Pairs as (birth id, death id) sorted, essentials with death None
    fn pairing<F: Field>(f: &Filtration, m: &ReducedMatrix<F>) -> Vec<(u64, Option<u64>)> {
        let mut pairs: Vec<_> = (0..f.len())
            .filter(|&s| m.is_positive(s))
            .map(|s| {
                (
                    f.simplex(s).id().0,
                    m.pivot_of(s).map(|d| f.simplex(d).id().0),
                )
            })
            .collect();
        pairs.sort();
        pairs
    }

    fn fresh_pairing(f: &Filtration) -> Vec<(u64, Option<u64>)> {
        let fresh = Filtration::from_records(f.iter().map(|s| SimplexRecord {
            id: s.id(),
            dimension: s.dimension(),
            boundary: s.boundary().to_vec(),
        }))
        .unwrap();
        pairing(&fresh, &ReducedMatrix::reduce(&fresh, BinaryField))
    }

    /// Two vertices a, b and edge ab, then vertices c, d and edge cd
    fn two_edges() -> Filtration {
        Filtration::from_records([
            SimplexRecord::vertex(0),
            SimplexRecord::vertex(1),
            SimplexRecord::new(2, 1, [0, 1]),
            SimplexRecord::vertex(3),
            SimplexRecord::vertex(4),
            SimplexRecord::new(5, 1, [3, 4]),
        ])
        .unwrap()
    }

    #[test]
    fn test_dimension_mismatch_is_relabel() {
        let mut f = two_edges();
        let mut m = ReducedMatrix::reduce(&f, BinaryField);
        // edge 2 (pos 2) and vertex 3 (pos 3)
        let t = transpose(&mut f, &mut m, 2).unwrap();
        assert_eq!(t.case, TranspositionCase::DimensionMismatch);
        assert_eq!(t.lower, SimplexId(2));
        assert_eq!(t.upper, SimplexId(3));
        assert!(m.is_consistent(&f));
        assert_eq!(pairing(&f, &m), fresh_pairing(&f));
    }

    #[test]
    fn test_face_swap_leaves_everything_untouched() {
        let mut f = two_edges();
        let mut m = ReducedMatrix::reduce(&f, BinaryField);
        let before = pairing(&f, &m);
        let err = transpose(&mut f, &mut m, 1).unwrap_err();
        assert!(matches!(err, VineyardError::InvalidTransposition { .. }));
        assert_eq!(f.ids(), (0..6).map(SimplexId).collect::<Vec<_>>());
        assert_eq!(pairing(&f, &m), before);
        assert!(matches!(
            transpose(&mut f, &mut m, 5),
            Err(VineyardError::OutOfRangeIndex { .. })
        ));
    }

    #[test]
    fn test_vertex_crossing_switches_pairing() {
        // a, b, c with edges ab (pos 3) and bc (pos 4)
        let mut f = Filtration::from_records([
            SimplexRecord::vertex(0),
            SimplexRecord::vertex(1),
            SimplexRecord::vertex(2),
            SimplexRecord::new(3, 1, [0, 1]),
            SimplexRecord::new(4, 1, [1, 2]),
        ])
        .unwrap();
        let mut m = ReducedMatrix::reduce(&f, BinaryField);
        assert_eq!(pairing(&f, &m), vec![(0, None), (1, Some(3)), (2, Some(4))]);

        // Swap vertices a and b: a essential, b killed by ab which contains a
        let t = transpose(&mut f, &mut m, 0).unwrap();
        assert_eq!(t.case, TranspositionCase::PositiveEssentialSwitch);
        assert!(t.switched());
        assert_eq!(pairing(&f, &m), vec![(0, Some(3)), (1, None), (2, Some(4))]);
        assert!(m.is_consistent(&f));
    }

    #[test]
    fn test_absorb_backward_switches_pairing() {
        // Vertices a, b, c; edge bc dies before ab
        let mut f = Filtration::from_records([
            SimplexRecord::vertex(0),
            SimplexRecord::vertex(1),
            SimplexRecord::vertex(2),
            SimplexRecord::new(3, 1, [1, 2]),
            SimplexRecord::new(4, 1, [0, 1]),
        ])
        .unwrap();
        let mut m = ReducedMatrix::reduce(&f, BinaryField);
        assert_eq!(pairing(&f, &m), vec![(0, None), (1, Some(4)), (2, Some(3))]);

        // b (pos 1) killed by ab (pos 4), c (pos 2) killed by bc (pos 3);
        // bc contains b, the killer of c comes first
        let t = transpose(&mut f, &mut m, 1).unwrap();
        assert_eq!(t.case, TranspositionCase::PositiveAbsorbBackward);
        assert_eq!(pairing(&f, &m), vec![(0, None), (1, Some(3)), (2, Some(4))]);
        assert_eq!(pairing(&f, &m), fresh_pairing(&f));
        assert!(m.is_consistent(&f));
    }

    #[test]
    fn test_absorb_forward_keeps_pairing() {
        let mut f = Filtration::from_records([
            SimplexRecord::vertex(0),
            SimplexRecord::vertex(1),
            SimplexRecord::vertex(2),
            SimplexRecord::new(3, 1, [0, 1]),
            SimplexRecord::new(4, 1, [1, 2]),
        ])
        .unwrap();
        let mut m = ReducedMatrix::reduce(&f, BinaryField);
        // b killed by ab (pos 3), c killed by bc (pos 4) which contains b
        let t = transpose(&mut f, &mut m, 1).unwrap();
        assert_eq!(t.case, TranspositionCase::PositiveAbsorbForward);
        assert!(!t.switched());
        assert_eq!(pairing(&f, &m), vec![(0, None), (1, Some(3)), (2, Some(4))]);
        assert_eq!(pairing(&f, &m), fresh_pairing(&f));
        assert!(m.is_consistent(&f));
    }

    /// Square a-b-c-d with diagonal ac and both triangles
    fn square(last_edges: [u64; 2]) -> Filtration {
        let mut records = vec![
            SimplexRecord::vertex(0),
            SimplexRecord::vertex(1),
            SimplexRecord::vertex(2),
            SimplexRecord::vertex(3),
            SimplexRecord::new(10, 1, [0, 1]),
            SimplexRecord::new(11, 1, [1, 2]),
            SimplexRecord::new(12, 1, [2, 3]),
            SimplexRecord::new(13, 1, [0, 3]),
            SimplexRecord::new(14, 1, [0, 2]),
        ];
        let triangles = [
            SimplexRecord::new(20, 2, [11, 14, 10]),
            SimplexRecord::new(21, 2, [12, 13, 14]),
        ];
        for id in last_edges {
            records.push(triangles[(id - 20) as usize].clone());
        }
        Filtration::from_records(records).unwrap()
    }

    #[test]
    fn test_negative_triangles_switch() {
        let mut f = square([20, 21]);
        let mut m = ReducedMatrix::reduce(&f, BinaryField);
        // Loops born at 13 and 14; triangle 20 kills 14, triangle 21 kills 13
        let before = pairing(&f, &m);
        assert!(before.contains(&(14, Some(20))));
        assert!(before.contains(&(13, Some(21))));

        let t = transpose(&mut f, &mut m, 9).unwrap();
        assert!(matches!(
            t.case,
            TranspositionCase::NegativeRelabel
                | TranspositionCase::NegativeAbsorb
                | TranspositionCase::NegativeSwitch
        ));
        assert_eq!(pairing(&f, &m), fresh_pairing(&f));
        assert!(m.is_consistent(&f));
    }

    #[test]
    fn test_every_valid_swap_matches_fresh_reduction() {
        for field_prime in [2u32, 3, 5] {
            let mut f = square([21, 20]);
            let field = PrimeField::new(field_prime).unwrap();
            let mut m = ReducedMatrix::reduce(&f, field);
            // Sweep bubble passes across the whole order
            for _ in 0..3 {
                for i in 0..f.len() - 1 {
                    if transpose(&mut f, &mut m, i).is_ok() {
                        assert!(m.is_consistent(&f), "inconsistent after swap at {i}");
                        assert_eq!(pairing(&f, &m), fresh_pairing(&f), "swap at {i}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_case_table() {
        assert_eq!(TranspositionCase::NegativeSwitch.r_additions(), 2);
        assert_eq!(TranspositionCase::PositiveRelabel.r_additions(), 0);
        assert!(!TranspositionCase::PositiveNegative.switches_pairing());
        assert_eq!(TranspositionCase::NegativePositiveSwitch.to_string(), "3.1");
    }
}
