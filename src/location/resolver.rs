//! Location resolver: cache in front of a geocoder, with retries.
//!
//! Flow: cache → geocoder (retry while the error is transient) → error

use super::cache::GeoCache;
use super::providers::Geocoder;
use super::types::{GeocodeError, LocationSource, Resolved};
use crate::geo::Coordinate;
use std::time::Duration;
use tracing::{debug, warn};

/// How transient geocoder failures are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0, base_delay: Duration::ZERO }
    }

    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, base_delay: Duration::from_millis(500) }
    }
}

/// Resolves free-text locations to coordinates.
pub struct LocationResolver<G: Geocoder> {
    geocoder: G,
    cache: GeoCache,
    retry: RetryPolicy,
    lookups: u64,
}

impl<G: Geocoder> LocationResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self::with_cache(geocoder, GeoCache::new())
    }

    /// Create a resolver with a specific cache (for testing).
    pub fn with_cache(geocoder: G, cache: GeoCache) -> Self {
        Self {
            geocoder,
            cache,
            retry: RetryPolicy::default(),
            lookups: 0,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve a location to a coordinate.
    pub fn resolve(&mut self, query: &str) -> Result<Coordinate, GeocodeError> {
        self.resolve_with_source(query).map(|r| r.coordinate)
    }

    /// Resolve and report whether the answer came from the cache.
    pub fn resolve_with_source(&mut self, query: &str) -> Result<Resolved, GeocodeError> {
        if let Some(coordinate) = self.cache.get(query) {
            return Ok(Resolved { coordinate, source: LocationSource::Cache });
        }

        let coordinate = self.lookup(query)?;
        self.cache.put(query, coordinate);
        debug!(query, %coordinate, "geocoded");
        Ok(Resolved { coordinate, source: LocationSource::Geocoder })
    }

    fn lookup(&mut self, query: &str) -> Result<Coordinate, GeocodeError> {
        let mut attempt = 0;
        loop {
            self.lookups += 1;
            match self.geocoder.geocode(query) {
                Ok(c) => return Ok(c),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    warn!(query, error = %e, attempt, ?delay, "geocoder failed, retrying");
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Number of calls made to the geocoder so far.
    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }
}
