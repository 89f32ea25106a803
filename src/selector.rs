//! Nearest-K selection over the grouped coordinates.
//!
//! Streams the groups in first-seen order and keeps a max-heap of at most `k`
//! candidates keyed by distance to the origin. A new coordinate replaces the
//! current farthest only when it is strictly closer, so on equal distances
//! the earlier coordinate stays.

use crate::catalog::LocationGroups;
use crate::geo::{haversine_km, Coordinate};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A selected coordinate and its distance to the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub distance_km: f64,
    pub coordinate: Coordinate,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_km.total_cmp(&other.distance_km)
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The at-most-`k` coordinates nearest the origin, closest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Largest distance held, if any.
    pub fn max_distance(&self) -> Option<f64> {
        self.candidates.last().map(|c| c.distance_km)
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Pick the `k` group coordinates closest to `origin`.
pub fn select(groups: &LocationGroups, origin: Coordinate, k: usize) -> CandidateSet {
    select_from(groups.coordinates(), origin, k.min(groups.len()))
}

/// Same as [`select`] over any coordinate stream.
pub fn select_from<I>(coordinates: I, origin: Coordinate, k: usize) -> CandidateSet
where
    I: IntoIterator<Item = Coordinate>,
{
    if k == 0 {
        return CandidateSet::default();
    }

    let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
    for coordinate in coordinates {
        let candidate = Candidate { distance_km: haversine_km(coordinate, origin), coordinate };
        if heap.len() < k {
            heap.push(candidate);
            continue;
        }
        let closer = heap
            .peek()
            .is_some_and(|max| candidate.distance_km < max.distance_km);
        if closer {
            heap.pop();
            heap.push(candidate);
        }
    }

    CandidateSet { candidates: heap.into_sorted_vec() }
}
