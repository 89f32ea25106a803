//! Scan → select → order, without touching the filesystem.

use crate::catalog::{self, LocationGroups, ScanOptions, ScanStats};
use crate::geo::Coordinate;
use crate::location::{Geocoder, LocationResolver};
use crate::route::{self, OrderedRoute};
use crate::selector::{self, CandidateSet};
use tracing::info;

pub const DEFAULT_PROCESSED_LOCATIONS: usize = 70;
pub const DEFAULT_MARKERS: usize = 10;

/// Everything a run needs besides the catalog and the resolver.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub year: String,
    pub origin: Coordinate,
    pub processed_locations: usize,
    pub markers: usize,
    pub print_films: bool,
}

impl PipelineConfig {
    pub fn new(year: impl Into<String>, origin: Coordinate) -> Self {
        Self {
            year: year.into(),
            origin,
            processed_locations: DEFAULT_PROCESSED_LOCATIONS,
            markers: DEFAULT_MARKERS,
            print_films: false,
        }
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            year: self.year.clone(),
            cap: self.processed_locations,
            print_films: self.print_films,
        }
    }
}

/// Result of a run, ready for the map assembler.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub groups: LocationGroups,
    pub candidates: CandidateSet,
    pub route: OrderedRoute,
    pub stats: ScanStats,
}

pub fn run<I, S, G>(lines: I, config: &PipelineConfig, resolver: &mut LocationResolver<G>) -> PipelineOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    G: Geocoder,
{
    let (groups, stats) = catalog::scan(lines, &config.scan_options(), resolver);
    info!(
        groups = groups.len(),
        qualifying = stats.qualifying,
        lookups = resolver.lookups(),
        "catalog scanned"
    );

    let candidates = selector::select(&groups, config.origin, config.markers);
    let route = route::order(&candidates, config.origin);

    PipelineOutput { groups, candidates, route, stats }
}
