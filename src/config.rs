//! Run configuration assembled from the command line and environment.

use crate::error::AtlasError;
use crate::geo::Coordinate;
use crate::location::{GeocoderConfig, RetryPolicy};
use crate::map::MapStyle;
use crate::pipeline::PipelineConfig;
use std::path::PathBuf;

/// Everything needed for one run.
#[derive(Debug, Clone)]
pub struct AtlasConfig {
    pub catalog: PathBuf,
    pub output: PathBuf,
    pub pipeline: PipelineConfig,
    pub geocoder: GeocoderConfig,
    pub retry: RetryPolicy,
    pub style: MapStyle,
}

/// Check that an origin is a real point on the globe.
pub fn validate_origin(lat: f64, lon: f64) -> Result<Coordinate, AtlasError> {
    let origin = Coordinate::new(lat, lon);
    if !origin.is_valid() {
        return Err(AtlasError::InvalidOrigin { lat, lon });
    }
    Ok(origin)
}
