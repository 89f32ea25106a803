//! Fatal errors for a run. Per-row problems never reach this type.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Cannot read catalog {path:?}: {source}")]
    ReadCatalog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write map to {path:?}: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid origin ({lat}, {lon}). Lat: -90..90, Lon: -180..180")]
    InvalidOrigin { lat: f64, lon: f64 },
}

impl AtlasError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ReadCatalog { .. } | Self::WriteOutput { .. } => 1,
            Self::InvalidOrigin { .. } => 2,
        }
    }
}
