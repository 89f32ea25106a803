//! Renders a [`MapDocument`] as a standalone Leaflet page.

use super::layers::MapDocument;
use crate::error::AtlasError;
use std::fs;
use std::path::Path;

/// Fixed artifact name, written to the working directory.
pub const OUTPUT_FILE: &str = "Map_project.html";

const LEAFLET_VERSION: &str = "1.9.4";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Film locations</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.js"></script>
<style>
  html, body, #map { height: 100%; margin: 0; }
  .film-pin { width: 14px; height: 14px; border-radius: 50% 50% 50% 0;
              transform: rotate(-45deg); border: 1px solid #222; opacity: 0.85; }
</style>
</head>
<body>
<div id="map"></div>
<script>
const doc = __DATA__;
const text = (s) => { const el = document.createElement("div"); el.textContent = s; return el; };

const map = L.map("map").setView(doc.center, doc.zoom);
L.tileLayer(doc.tiles.url, { attribution: doc.tiles.attribution, maxZoom: doc.tiles.max_zoom }).addTo(map);

const line = L.featureGroup();
for (const s of doc.segments) {
  L.polyline([s.from, s.to]).bindPopup(text(s.popup)).addTo(line);
}

const films = L.featureGroup();
for (const m of doc.markers) {
  const icon = L.divIcon({
    className: "",
    html: `<div class="film-pin" style="background:${m.color}"></div>`,
    iconSize: [14, 14],
    iconAnchor: [7, 14],
  });
  L.marker([m.lat, m.lon], { icon }).bindPopup(text(m.popup)).addTo(films);
}

const you = L.featureGroup();
L.circleMarker([doc.origin.lat, doc.origin.lon], {
  radius: doc.origin.radius,
  color: doc.origin.color,
  fillColor: doc.origin.fill_color,
  fillOpacity: doc.origin.fill_opacity,
}).bindPopup(text(doc.origin.popup)).addTo(you);

line.addTo(map);
films.addTo(map);
you.addTo(map);
L.control.layers(null, { "Line": line, "Films locations": films, "Your location": you }).addTo(map);
</script>
</body>
</html>
"#;

/// Produce the HTML page for a map.
pub fn render_html(doc: &MapDocument) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string(doc)?.replace("</", "<\\/");
    Ok(TEMPLATE
        .replace("__LEAFLET__", LEAFLET_VERSION)
        .replace("__DATA__", &data))
}

/// Write the rendered page to `path`.
pub fn write_document(path: &Path, html: &str) -> Result<(), AtlasError> {
    fs::write(path, html).map_err(|source| AtlasError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}
