//! Map assembly: layers built from the pipeline output, and their HTML form.

pub mod layers;
pub mod render;

pub use layers::{MapDocument, MapStyle};
pub use render::{render_html, write_document, OUTPUT_FILE};
