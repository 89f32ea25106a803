//! Film Atlas: maps the filming locations of a given year that lie nearest to
//! a chosen point.
//!
//! The pipeline scans a `name\tlocation` catalog, geocodes each matching row,
//! keeps the `k` closest coordinates and orders them into a path from the
//! origin. The [`map`] module turns that into a Leaflet page.

pub mod catalog;
pub mod config;
pub mod error;
pub mod geo;
pub mod location;
pub mod map;
pub mod pipeline;
pub mod route;
pub mod selector;
