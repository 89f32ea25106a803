//! Core types for the location subsystem.

use crate::geo::Coordinate;
use std::fmt;
use thiserror::Error;

/// Where a resolved coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Cache,
    Geocoder,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "Cache"),
            Self::Geocoder => write!(f, "Geocoder"),
        }
    }
}

/// A coordinate together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub coordinate: Coordinate,
    pub source: LocationSource,
}

/// Geocoding failures.
///
/// `Network` is the only transient kind; the others are final answers for
/// the query that produced them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    #[error("Location not found: '{0}'")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid geocoder response: {0}")]
    InvalidResponse(String),
}

impl GeocodeError {
    /// Whether retrying the same query may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
