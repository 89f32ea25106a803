//! Visiting order for the connecting line.
//!
//! This is a star ordering: the origin, then every selected point by
//! ascending distance from the origin. It is not a tour, and points that are
//! not spread radially around the origin produce crossing segments.

use crate::geo::{haversine_km, Coordinate};
use crate::selector::CandidateSet;

/// Origin followed by the selected coordinates, nearest first.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedRoute {
    points: Vec<Coordinate>,
}

/// A line between two consecutive route points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Coordinate,
    pub to: Coordinate,
    pub distance_km: f64,
}

impl OrderedRoute {
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn origin(&self) -> Coordinate {
        self.points[0]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the route holds no points, including the origin.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consecutive pairs with their haversine distance.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|pair| Segment {
            from: pair[0],
            to: pair[1],
            distance_km: haversine_km(pair[0], pair[1]),
        })
    }
}

/// Build the route from the selected candidates.
pub fn order(candidates: &CandidateSet, origin: Coordinate) -> OrderedRoute {
    let mut sorted: Vec<_> = candidates.iter().collect();
    sorted.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    let mut points = Vec::with_capacity(sorted.len() + 1);
    points.push(origin);
    points.extend(sorted.into_iter().map(|c| c.coordinate));
    OrderedRoute { points }
}
