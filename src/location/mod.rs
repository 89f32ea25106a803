//! Location subsystem: turns filming-location text into coordinates.
//!
//! Provides the geocoder seam, the Nominatim provider, an in-memory TTL
//! cache and the resolver that ties them together.

pub mod cache;
pub mod providers;
pub mod resolver;
pub mod types;

pub use cache::{Clock, GeoCache, ManualClock, SystemClock};
pub use providers::{Geocoder, GeocoderConfig, Nominatim};
pub use resolver::{LocationResolver, RetryPolicy};
pub use types::{GeocodeError, LocationSource, Resolved};
