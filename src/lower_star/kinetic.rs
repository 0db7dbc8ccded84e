//! Kinetic Sort of Vertex Trajectories
//!
//! Keeps vertices sorted by value while every value moves linearly from a
//! start to an end keyframe over t ∈ [0, 1). Only adjacent pairs can change
//! order next, so each adjacent pair has at most one pending event: the
//! time its lower vertex is overtaken. Events live in a min-heap keyed by
//! time; a version counter per adjacent pair invalidates stale entries
//! instead of removing them.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

/// Adjacent swap reported by the kinetic sort
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KineticEvent {
    /// Parameter in [0, 1) at which the swap happens
    pub time: f64,
    /// Rank of `lower` before the swap
    pub rank: usize,
    /// Vertex that was ahead and gets overtaken
    pub lower: usize,
    /// Vertex that overtakes
    pub upper: usize,
}

/// Vertices ordered by linearly interpolated values
#[derive(Debug, Clone)]
pub struct KineticSort {
    /// rank -> vertex
    order: Vec<usize>,
    start: Vec<f64>,
    slope: Vec<f64>,
    /// Pending events: (time, rank of the pair, version of the pair)
    queue: BinaryHeap<Reverse<(OrderedFloat<f64>, usize, u64)>>,
    /// Version per adjacent pair (rank, rank + 1)
    versions: Vec<u64>,
    now: f64,
}

impl KineticSort {
    /// `order` lists the vertices sorted by their `start` values
    pub fn new(order: Vec<usize>, start: &[f64], end: &[f64]) -> Self {
        let slope = start.iter().zip(end).map(|(s, e)| e - s).collect();
        let pairs = order.len().saturating_sub(1);

        let mut sort = Self {
            order,
            start: start.to_vec(),
            slope,
            queue: BinaryHeap::new(),
            versions: vec![0; pairs],
            now: 0.0,
        };
        for rank in 0..pairs {
            sort.schedule(rank);
        }
        sort
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Value of a vertex at parameter `t`
    pub fn value(&self, vertex: usize, t: f64) -> f64 {
        self.start[vertex] + self.slope[vertex] * t
    }

    /// Start value of every vertex
    pub fn start(&self) -> &[f64] {
        &self.start
    }

    pub fn slope(&self) -> &[f64] {
        &self.slope
    }

    /// Pop the next swap before t = 1 and apply it to the order
    pub fn next_swap(&mut self) -> Option<KineticEvent> {
        while let Some(Reverse((time, rank, version))) = self.queue.pop() {
            if self.versions[rank] != version {
                continue;
            }
            let time = time.into_inner();
            if time >= 1.0 {
                // Everything left in the queue is later still
                self.queue.clear();
                return None;
            }

            let event = KineticEvent {
                time,
                rank,
                lower: self.order[rank],
                upper: self.order[rank + 1],
            };
            self.now = time;
            self.order.swap(rank, rank + 1);

            let pairs = self.versions.len();
            for neighbour in [rank.checked_sub(1), Some(rank), Some(rank + 1)]
                .into_iter()
                .flatten()
                .filter(|&r| r < pairs)
            {
                self.versions[neighbour] += 1;
                self.schedule(neighbour);
            }
            return Some(event);
        }
        None
    }

    /// Queue the crossing of the pair at (rank, rank + 1), if it ever happens
    fn schedule(&mut self, rank: usize) {
        let (u, w) = (self.order[rank], self.order[rank + 1]);
        let closing = self.slope[u] - self.slope[w];
        if closing.is_nan() || closing <= 0.0 {
            return;
        }
        let crossing = (self.start[w] - self.start[u]) / closing;
        if !crossing.is_finite() {
            return;
        }
        let time = crossing.max(self.now);
        self.queue
            .push(Reverse((OrderedFloat(time), rank, self.versions[rank])));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(sort: &mut KineticSort) -> Vec<KineticEvent> {
        std::iter::from_fn(|| sort.next_swap()).collect()
    }

    #[test]
    fn test_single_crossing() {
        // Vertex 0 rises from 0 to 2, vertex 1 falls from 1 to 0
        let mut sort = KineticSort::new(vec![0, 1], &[0.0, 1.0], &[2.0, 0.0]);
        let events = drain(&mut sort);
        assert_eq!(events.len(), 1);
        assert!((events[0].time - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!((events[0].lower, events[0].upper), (0, 1));
        assert_eq!(sort.order(), &[1, 0]);
    }

    #[test]
    fn test_full_reversal_sorts_end_values() {
        let start = [0.0, 1.0, 2.0, 3.0];
        let end = [3.5, 2.5, 1.5, 0.5];
        let mut sort = KineticSort::new(vec![0, 1, 2, 3], &start, &end);
        let events = drain(&mut sort);
        // Every pair crosses exactly once
        assert_eq!(events.len(), 6);
        assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(sort.order(), &[3, 2, 1, 0]);
    }

    #[test]
    fn test_parallel_and_late_crossings_are_skipped() {
        // 0 and 1 move in parallel; 2 meets 1 only at t = 1
        let start = [0.0, 1.0, 3.0];
        let end = [1.0, 2.0, 2.0];
        let mut sort = KineticSort::new(vec![0, 1, 2], &start, &end);
        assert!(sort.next_swap().is_none());
        assert_eq!(sort.order(), &[0, 1, 2]);
        assert_eq!(sort.value(2, 0.5), 2.5);
    }

    #[test]
    fn test_nan_trajectory_schedules_nothing() {
        let mut sort = KineticSort::new(vec![0, 1], &[0.0, 1.0], &[f64::NAN, 0.5]);
        assert!(sort.next_swap().is_none());
        assert_eq!(sort.order(), &[0, 1]);
    }
}
