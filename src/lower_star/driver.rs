//! Lower-Star Vineyard
//!
//! Vineyard of a simplicial complex filtered by a function on its vertices.
//! A simplex enters with its highest vertex (its *attachment*), so its value
//! is the max of its vertex values and the filtration is grouped into one
//! block per vertex, in vertex order.
//!
//! Between two keyframes every vertex value moves linearly. Whenever two
//! vertices a < b swap in the vertex order, their blocks are reshuffled by
//! adjacent transpositions:
//!
//! 1. the vertex b moves in front of a and a's whole block;
//! 2. each simplex attached to b either contains a, in which case it now
//!    belongs to a and stays where it is, or it moves in front of a's block.
//!
//! Vine samples taken during the motion carry time `k + t` for the k-th
//! keyframe interval and parameter t, and read interpolated values. After
//! each interval the full diagram is recorded at time `k + 1`.

use std::collections::HashMap;

use ndarray::Array2;
use tracing::{debug, info};

use super::kinetic::KineticSort;
use crate::config::VineyardConfig;
use crate::error::{Result, VineyardError};
use crate::topology::{BinaryField, Field, Filtration, Simplex, SimplexId, SimplexRecord};
use crate::vineyard::{Evaluator, Vineyard};

/// Values of a lower-star filtration part way through a keyframe interval
struct KineticEvaluator<'a> {
    time: f64,
    t: f64,
    sort: &'a KineticSort,
    simplices: &'a [Vec<usize>],
}

impl Evaluator for KineticEvaluator<'_> {
    fn time(&self) -> f64 {
        self.time
    }

    fn value(&self, simplex: &Simplex, _position: usize) -> f64 {
        lower_star_value(&self.simplices[simplex.id().0 as usize], |v| {
            self.sort.value(v, self.t)
        })
    }
}

fn lower_star_value(vertices: &[usize], value: impl Fn(usize) -> f64) -> f64 {
    vertices
        .iter()
        .map(|&v| value(v))
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Vineyard of a vertex function moving through keyframes
#[derive(Debug, Clone)]
pub struct LowerStarVineyard<F: Field = BinaryField> {
    vineyard: Vineyard<F>,
    /// Sorted vertex tuple of each simplex, indexed by simplex id
    simplices: Vec<Vec<usize>>,
    /// Vertex each simplex is attached to
    attachment: Vec<usize>,
    /// The 0-simplex of each vertex
    vertex_simplex: Vec<SimplexId>,
    /// rank -> vertex
    vertex_order: Vec<usize>,
    /// Current vertex values
    values: Vec<f64>,
    /// Keyframe intervals processed so far
    time_count: usize,
}

impl<F: Field> LowerStarVineyard<F> {
    /// Build the lower-star filtration of `complex` for the vertex `values`.
    ///
    /// The complex lists simplices as vertex tuples; simplex `i` gets
    /// identifier `SimplexId(i)`. Every face of every simplex must be listed,
    /// and the 0-simplices must be exactly the vertices `0..values.len()`.
    pub fn new(complex: Vec<Vec<usize>>, values: &[f64], config: VineyardConfig) -> Result<Self> {
        check_finite(values)?;
        let simplices = normalize(complex)?;
        let vertex_simplex = vertex_simplices(&simplices, values.len())?;

        let mut vertex_order: Vec<usize> = (0..values.len()).collect();
        vertex_order.sort_by(|&u, &w| values[u].total_cmp(&values[w]).then(u.cmp(&w)));
        let mut rank = vec![0; values.len()];
        for (r, &v) in vertex_order.iter().enumerate() {
            rank[v] = r;
        }

        let attachment: Vec<usize> = simplices
            .iter()
            .map(|vertices| {
                vertices
                    .iter()
                    .copied()
                    .max_by_key(|&v| rank[v])
                    .unwrap_or_default()
            })
            .collect();

        let mut order: Vec<usize> = (0..simplices.len()).collect();
        order.sort_by(|&s, &t| {
            rank[attachment[s]]
                .cmp(&rank[attachment[t]])
                .then(simplices[s].len().cmp(&simplices[t].len()))
                .then(simplices[s].cmp(&simplices[t]))
        });

        let index: HashMap<&[usize], usize> = simplices
            .iter()
            .enumerate()
            .map(|(i, vertices)| (vertices.as_slice(), i))
            .collect();

        let mut filtration = Filtration::new();
        for &s in &order {
            let record = SimplexRecord {
                id: SimplexId(s as u64),
                dimension: simplices[s].len() - 1,
                boundary: boundary_of(s, &simplices[s], &index)?,
            };
            let value = values[attachment[s]];
            filtration.insert_with_value(record, value)?;
        }

        let vineyard = Vineyard::new(filtration, config)?;
        info!(
            vertices = values.len(),
            simplices = simplices.len(),
            "Lower-star filtration built"
        );

        Ok(Self {
            vineyard,
            simplices,
            attachment,
            vertex_simplex,
            vertex_order,
            values: values.to_vec(),
            time_count: 0,
        })
    }

    /// Build from the first row of `keyframes` and run through the others.
    ///
    /// Rows are keyframes, columns are vertices.
    pub fn from_keyframes(
        complex: Vec<Vec<usize>>,
        keyframes: &Array2<f64>,
        config: VineyardConfig,
    ) -> Result<Self> {
        for row in keyframes.rows() {
            check_finite(&row.to_vec())?;
        }
        let mut rows = keyframes.rows().into_iter();
        let first = rows.next().ok_or(VineyardError::InvalidVertexValues {
            expected: 1,
            found: 0,
        })?;

        let mut lsv = Self::new(complex, &first.to_vec(), config)?;
        for row in rows {
            lsv.compute_vineyard(&row.to_vec())?;
        }
        Ok(lsv)
    }

    pub fn vineyard(&self) -> &Vineyard<F> {
        &self.vineyard
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Vertices in increasing order of value
    pub fn vertex_order(&self) -> &[usize] {
        &self.vertex_order
    }

    /// Vertex a simplex is currently attached to
    pub fn attachment(&self, id: SimplexId) -> Result<usize> {
        self.attachment
            .get(id.0 as usize)
            .copied()
            .ok_or(VineyardError::UnknownSimplex(id))
    }

    /// Number of keyframe intervals processed
    pub fn time_count(&self) -> usize {
        self.time_count
    }

    /// Move the vertex values linearly to `next_values`, updating the
    /// vineyard at every change in the vertex order. Returns the number of
    /// simplex transpositions performed.
    pub fn compute_vineyard(&mut self, next_values: &[f64]) -> Result<usize> {
        if next_values.len() != self.values.len() {
            return Err(VineyardError::InvalidVertexValues {
                expected: self.values.len(),
                found: next_values.len(),
            });
        }
        check_finite(next_values)?;

        let mut sort = KineticSort::new(self.vertex_order.clone(), &self.values, next_values);
        let time_offset = self.time_count as f64;
        let mut events = 0;
        let mut transpositions = 0;

        while let Some(event) = sort.next_swap() {
            let evaluator = KineticEvaluator {
                time: time_offset + event.time,
                t: event.time,
                sort: &sort,
                simplices: &self.simplices,
            };
            transpositions += transpose_vertices(
                &mut self.vineyard,
                &mut self.attachment,
                &self.simplices,
                &self.vertex_simplex,
                event.lower,
                event.upper,
                &evaluator,
            )?;
            self.vertex_order.swap(event.rank, event.rank + 1);
            events += 1;
        }

        self.values = next_values.to_vec();
        self.time_count += 1;

        let values = &self.values;
        let updates: Vec<(SimplexId, f64)> = self
            .simplices
            .iter()
            .enumerate()
            .map(|(i, vertices)| (SimplexId(i as u64), lower_star_value(vertices, |v| values[v])))
            .collect();
        self.vineyard.set_values(updates)?;
        self.vineyard.record_diagram(self.time_count as f64);

        info!(
            keyframe = self.time_count,
            events,
            transpositions,
            "Processed keyframe"
        );
        Ok(transpositions)
    }
}

/// Let `b` overtake `a` (adjacent in the vertex order, a first).
///
/// Returns the number of simplex transpositions performed.
fn transpose_vertices<F: Field, E: Evaluator>(
    vineyard: &mut Vineyard<F>,
    attachment: &mut [usize],
    simplices: &[Vec<usize>],
    vertex_simplex: &[SimplexId],
    a: usize,
    b: usize,
    evaluator: &E,
) -> Result<usize> {
    let id_at = |vineyard: &Vineyard<F>, position: usize| -> Result<usize> {
        Ok(vineyard.simplex_at(position)?.id().0 as usize)
    };

    let a_position = vineyard.position_of(vertex_simplex[a])?;
    let b_position = vineyard.position_of(vertex_simplex[b])?;
    let mut count = 0;

    // Move the vertex b in front of a's block
    for position in (a_position..b_position).rev() {
        vineyard.transpose_with(position, evaluator)?;
        count += 1;
    }

    // Simplices after b's old position are still in place
    let mut j = b_position + 1;
    while j < vineyard.len() {
        let simplex = id_at(vineyard, j)?;
        if attachment[simplex] != b {
            break;
        }
        if simplices[simplex].contains(&a) {
            attachment[simplex] = a;
            j += 1;
            continue;
        }

        let mut position = j;
        while attachment[id_at(vineyard, position - 1)?] != b {
            vineyard.transpose_with(position - 1, evaluator)?;
            position -= 1;
            count += 1;
        }
        j += 1;
    }

    debug!(a, b, transpositions = count, "Vertex transposition");
    Ok(count)
}

/// Reject NaN and infinite vertex values
fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(vertex) => Err(VineyardError::NonFiniteVertexValue {
            vertex,
            value: values[vertex],
        }),
        None => Ok(()),
    }
}

/// Sort every tuple; reject empty tuples and repeated vertices
fn normalize(complex: Vec<Vec<usize>>) -> Result<Vec<Vec<usize>>> {
    complex
        .into_iter()
        .enumerate()
        .map(|(i, mut vertices)| {
            let id = SimplexId(i as u64);
            let given = vertices.len();
            vertices.sort_unstable();
            vertices.dedup();
            if vertices.is_empty() || vertices.len() != given {
                return Err(VineyardError::InconsistentBoundary {
                    simplex: id,
                    face: id,
                    reason: "has an empty or repeated vertex list".to_string(),
                });
            }
            Ok(vertices)
        })
        .collect()
}

/// The 0-simplex of every vertex, checking they cover exactly `0..n`
fn vertex_simplices(simplices: &[Vec<usize>], n: usize) -> Result<Vec<SimplexId>> {
    let mut found: Vec<Option<SimplexId>> = vec![None; n];
    let mut seen = HashMap::new();

    for (i, vertices) in simplices.iter().enumerate() {
        let id = SimplexId(i as u64);
        if seen.insert(vertices.as_slice(), id).is_some() {
            return Err(VineyardError::DuplicateSimplex(id));
        }
        if let Some(&v) = vertices.iter().find(|&&v| v >= n) {
            return Err(VineyardError::InvalidVertexValues {
                expected: v + 1,
                found: n,
            });
        }
        if let [v] = vertices.as_slice() {
            found[*v] = Some(id);
        }
    }

    let count = found.iter().flatten().count();
    if count != n {
        return Err(VineyardError::InvalidVertexValues {
            expected: count,
            found: n,
        });
    }
    Ok(found.into_iter().flatten().collect())
}

/// Faces in orientation order: face k drops the k-th vertex
fn boundary_of(
    s: usize,
    vertices: &[usize],
    index: &HashMap<&[usize], usize>,
) -> Result<Vec<SimplexId>> {
    if vertices.len() == 1 {
        return Ok(Vec::new());
    }
    (0..vertices.len())
        .map(|k| {
            let face: Vec<usize> = vertices
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != k)
                .map(|(_, &v)| v)
                .collect();
            index
                .get(face.as_slice())
                .map(|&f| SimplexId(f as u64))
                .ok_or_else(|| VineyardError::InconsistentBoundary {
                    simplex: SimplexId(s as u64),
                    face: SimplexId(s as u64),
                    reason: format!("is missing its face {face:?}"),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::PrimeField;
    use ndarray::array;

    fn edge() -> Vec<Vec<usize>> {
        vec![vec![0], vec![1], vec![0, 1]]
    }

    /// Filled triangle plus a pendant edge to vertex 3
    fn kite() -> Vec<Vec<usize>> {
        vec![
            vec![0],
            vec![1],
            vec![2],
            vec![3],
            vec![0, 1],
            vec![1, 2],
            vec![0, 2],
            vec![2, 3],
            vec![0, 1, 2],
        ]
    }

    #[test]
    fn test_initial_order_groups_by_attachment() {
        let lsv: LowerStarVineyard =
            LowerStarVineyard::new(kite(), &[0.3, 0.1, 0.2, 0.0], VineyardConfig::default()).unwrap();
        assert_eq!(lsv.vertex_order(), &[3, 1, 2, 0]);

        let ids: Vec<u64> = lsv.vineyard().filtration().ids().iter().map(|id| id.0).collect();
        // 3 | 1 | 2, [1,2], [2,3] | 0, [0,1], [0,2], [0,1,2]
        assert_eq!(ids, vec![3, 1, 2, 5, 7, 0, 4, 6, 8]);
        assert_eq!(lsv.attachment(SimplexId(8)).unwrap(), 0);
        assert!(lsv.vineyard().check_invariants());
    }

    #[test]
    fn test_vertex_swap_follows_the_essential_class() {
        let mut lsv: LowerStarVineyard =
            LowerStarVineyard::new(edge(), &[0.0, 1.0], VineyardConfig::default()).unwrap();
        let essential = lsv.vineyard().vine_of(SimplexId(0)).unwrap();

        let transpositions = lsv.compute_vineyard(&[1.0, 0.0]).unwrap();
        assert_eq!(transpositions, 1);
        assert_eq!(lsv.vertex_order(), &[1, 0]);
        assert_eq!(lsv.attachment(SimplexId(2)).unwrap(), 0);
        assert_eq!(lsv.vineyard().vine_of(SimplexId(1)).unwrap(), essential);

        // The essential vine dips to the crossing value and comes back
        let births: Vec<(f64, f64)> = lsv
            .vineyard()
            .vine(essential)
            .unwrap()
            .samples
            .iter()
            .map(|s| (s.time, s.birth))
            .collect();
        assert_eq!(births, vec![(0.0, 0.0), (0.5, 0.5), (1.0, 0.0)]);
        assert_eq!(lsv.vineyard().snapshots().len(), 1);
        assert_eq!(lsv.time_count(), 1);
    }

    #[test]
    fn test_keyframes_match_fresh_filtration() {
        let keyframes = array![
            [0.0, 1.0, 2.0, 3.0],
            [2.5, 0.5, 3.5, 1.5],
            [1.25, 3.75, 0.25, 2.75],
        ];
        let lsv: LowerStarVineyard =
            LowerStarVineyard::from_keyframes(kite(), &keyframes, VineyardConfig::default()).unwrap();
        assert!(lsv.vineyard().check_invariants());
        assert_eq!(lsv.vineyard().snapshots().len(), 2);

        let last = keyframes.row(2).to_vec();
        let fresh: LowerStarVineyard =
            LowerStarVineyard::new(kite(), &last, VineyardConfig::default()).unwrap();
        assert_eq!(lsv.vertex_order(), fresh.vertex_order());
        assert_eq!(
            lsv.vineyard().diagram().off_diagonal().sorted_pairs(),
            fresh.vineyard().diagram().off_diagonal().sorted_pairs()
        );
    }

    #[test]
    fn test_prime_field_lower_star() {
        let keyframes = array![[0.0, 1.0, 2.0, 3.0], [3.0, 2.0, 1.0, 0.0]];
        let lsv = LowerStarVineyard::<PrimeField>::from_keyframes(
            kite(),
            &keyframes,
            VineyardConfig::with_prime(5),
        )
        .unwrap();
        assert!(lsv.vineyard().check_invariants());
        let dgm = lsv.vineyard().diagram();
        assert_eq!(dgm.essential(0).len(), 1);
        assert_eq!(dgm.essential(0)[0].birth, 0.0);
    }

    #[test]
    fn test_malformed_input() {
        let config = VineyardConfig::default;
        assert!(matches!(
            LowerStarVineyard::<BinaryField>::new(edge(), &[0.0], config()),
            Err(VineyardError::InvalidVertexValues { expected: 2, found: 1 })
        ));
        assert!(matches!(
            LowerStarVineyard::<BinaryField>::new(vec![vec![0], vec![0, 1]], &[0.0, 1.0], config()),
            Err(VineyardError::InvalidVertexValues { .. })
        ));
        assert!(matches!(
            LowerStarVineyard::<BinaryField>::new(
                vec![vec![0], vec![1], vec![2], vec![0, 1, 2]],
                &[0.0, 1.0, 2.0],
                config()
            ),
            Err(VineyardError::InconsistentBoundary { .. })
        ));
        assert!(matches!(
            LowerStarVineyard::<BinaryField>::new(vec![vec![0], vec![0, 0]], &[0.0], config()),
            Err(VineyardError::InconsistentBoundary { .. })
        ));

        let mut lsv: LowerStarVineyard = LowerStarVineyard::new(edge(), &[0.0, 1.0], config()).unwrap();
        assert_eq!(
            lsv.compute_vineyard(&[1.0, 2.0, 3.0]).unwrap_err(),
            VineyardError::InvalidVertexValues { expected: 2, found: 3 }
        );
        assert!(LowerStarVineyard::<BinaryField>::from_keyframes(
            edge(),
            &Array2::zeros((0, 2)),
            config()
        )
        .is_err());
    }

    #[test]
    fn test_non_finite_values_are_rejected_untouched() {
        let config = VineyardConfig::default;
        assert!(matches!(
            LowerStarVineyard::<BinaryField>::new(edge(), &[0.0, f64::INFINITY], config()),
            Err(VineyardError::NonFiniteVertexValue { vertex: 1, .. })
        ));

        let mut lsv: LowerStarVineyard = LowerStarVineyard::new(edge(), &[0.0, 1.0], config()).unwrap();
        assert!(matches!(
            lsv.compute_vineyard(&[f64::NAN, 0.5]),
            Err(VineyardError::NonFiniteVertexValue { vertex: 0, .. })
        ));
        assert_eq!(lsv.values(), &[0.0, 1.0]);
        assert_eq!(lsv.time_count(), 0);
        assert!(lsv.vineyard().snapshots().is_empty());

        let keyframes = array![[0.0, 1.0], [1.0, 0.0], [f64::NAN, 0.0]];
        assert!(matches!(
            LowerStarVineyard::<BinaryField>::from_keyframes(edge(), &keyframes, config()),
            Err(VineyardError::NonFiniteVertexValue { vertex: 0, .. })
        ));
    }
}
