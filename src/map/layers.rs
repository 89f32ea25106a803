//! Shapes the pipeline output into the three map layers.

use crate::catalog::LocationGroups;
use crate::geo::Coordinate;
use crate::route::OrderedRoute;
use crate::selector::CandidateSet;
use rand::Rng;
use serde::Serialize;

/// Maximum display offset, in degrees, applied to each marker axis.
pub const JITTER_DEGREES: f64 = 0.001;
pub const DEFAULT_ZOOM: u8 = 10;
pub const ORIGIN_RADIUS: u32 = 10;
pub const ORIGIN_POPUP: &str = "Your location";

/// Marker colours as (name, hex).
pub const PALETTE: &[(&str, &str)] = &[
    ("darkpurple", "#5b396b"),
    ("cadetblue", "#436978"),
    ("darkred", "#a23336"),
    ("green", "#72b026"),
    ("lightgray", "#a3a3a3"),
    ("darkgreen", "#728224"),
    ("pink", "#ff91ea"),
    ("purple", "#d252b9"),
    ("beige", "#ffcb92"),
    ("lightgreen", "#bbf970"),
    ("red", "#d63e2a"),
    ("darkblue", "#0067a3"),
    ("lightblue", "#8adaff"),
    ("gray", "#575757"),
    ("blue", "#38aadd"),
    ("white", "#fbfbfb"),
    ("orange", "#f69730"),
    ("black", "#303030"),
    ("lightred", "#ff8e7f"),
];

/// Base map preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapStyle {
    #[default]
    Standard,
    Terrain,
}

/// Tile source for a style.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TileLayer {
    pub url: &'static str,
    pub attribution: &'static str,
    pub max_zoom: u8,
}

impl MapStyle {
    pub fn tiles(self) -> TileLayer {
        match self {
            Self::Standard => TileLayer {
                url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
                attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors",
                max_zoom: 19,
            },
            Self::Terrain => TileLayer {
                url: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
                attribution: "Map data: &copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors, SRTM | Map style: &copy; <a href=\"https://opentopomap.org\">OpenTopoMap</a> (CC-BY-SA)",
                max_zoom: 17,
            },
        }
    }
}

/// One film marker.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub popup: String,
    pub color: &'static str,
}

/// One line of the connecting path.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PathSegment {
    pub from: [f64; 2],
    pub to: [f64; 2],
    pub distance_km: f64,
    pub popup: String,
}

/// The circle drawn at the user's location.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OriginMarker {
    pub lat: f64,
    pub lon: f64,
    pub radius: u32,
    pub popup: &'static str,
    pub color: &'static str,
    pub fill_color: &'static str,
    pub fill_opacity: f64,
}

/// Everything the HTML renderer needs.
#[derive(Debug, Clone, Serialize)]
pub struct MapDocument {
    pub center: [f64; 2],
    pub zoom: u8,
    pub tiles: TileLayer,
    pub markers: Vec<Marker>,
    pub segments: Vec<PathSegment>,
    pub origin: OriginMarker,
}

impl MapDocument {
    /// Build the layers. `rng` drives jitter and colours only.
    pub fn assemble<R: Rng>(
        groups: &LocationGroups,
        candidates: &CandidateSet,
        route: &OrderedRoute,
        style: MapStyle,
        rng: &mut R,
    ) -> Self {
        let mut markers = Vec::new();
        for candidate in candidates {
            let names = groups.get(&candidate.coordinate).unwrap_or(&[]);
            for name in names {
                let spot = jitter(candidate.coordinate, rng);
                markers.push(Marker {
                    lat: spot.lat,
                    lon: spot.lon,
                    popup: popup_label(name),
                    color: random_color(rng),
                });
            }
        }

        let segments = route
            .segments()
            .map(|s| PathSegment {
                from: [s.from.lat, s.from.lon],
                to: [s.to.lat, s.to.lon],
                distance_km: s.distance_km,
                popup: format!("{} kilometres", s.distance_km),
            })
            .collect();

        let origin = route.origin();
        Self {
            center: [origin.lat, origin.lon],
            zoom: DEFAULT_ZOOM,
            tiles: style.tiles(),
            markers,
            segments,
            origin: OriginMarker {
                lat: origin.lat,
                lon: origin.lon,
                radius: ORIGIN_RADIUS,
                popup: ORIGIN_POPUP,
                fill_color: random_color(rng),
                color: random_color(rng),
                fill_opacity: 0.5,
            },
        }
    }
}

/// Offset each axis independently by up to ±[`JITTER_DEGREES`].
pub fn jitter<R: Rng>(c: Coordinate, rng: &mut R) -> Coordinate {
    Coordinate::new(
        c.lat + rng.random_range(-JITTER_DEGREES..=JITTER_DEGREES),
        c.lon + rng.random_range(-JITTER_DEGREES..=JITTER_DEGREES),
    )
}

fn random_color<R: Rng>(rng: &mut R) -> &'static str {
    PALETTE[rng.random_range(0..PALETTE.len())].1
}

/// Popup text for a film: episode markers `{#1.2}` lose their hash.
pub fn popup_label(name: &str) -> String {
    name.replace("{#", "{")
}
