use anyhow::Context;
use clap::Parser;
use film_atlas::catalog;
use film_atlas::config::{validate_origin, AtlasConfig};
use film_atlas::error::AtlasError;
use film_atlas::location::providers::{DEFAULT_NOMINATIM_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use film_atlas::location::{GeocoderConfig, LocationResolver, Nominatim, RetryPolicy};
use film_atlas::map::{self, MapDocument, MapStyle};
use film_atlas::pipeline::{self, PipelineConfig, DEFAULT_MARKERS, DEFAULT_PROCESSED_LOCATIONS};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Film Atlas: map the filming locations nearest to you
///
/// Reads a tab-separated `title\tlocation` catalog, keeps the titles tagged
/// with YEAR, geocodes them and draws the closest ones on an HTML map.
///
/// Examples:
///   film-atlas 2000 48.85 2.35 locations.list
///   film-atlas 1999 40.71 -74.00 locations.list --markers 5 --map_style
#[derive(Parser)]
#[command(name = "film-atlas", version, about, long_about = None, allow_negative_numbers = true)]
struct Cli {
    /// Year to look for, matched as "(YEAR)" inside the title.
    year: String,

    /// Your latitude (-90 to 90).
    coordinate_one: f64,

    /// Your longitude (-180 to 180).
    coordinate_two: f64,

    /// Path to the tab-separated locations catalog.
    path: PathBuf,

    /// Stop scanning after this many distinct locations.
    #[arg(long = "processed_locations", default_value_t = DEFAULT_PROCESSED_LOCATIONS)]
    processed_locations: usize,

    /// Number of nearest locations to draw.
    #[arg(long, default_value_t = DEFAULT_MARKERS)]
    markers: usize,

    /// Use the terrain base map.
    #[arg(long = "map_style")]
    map_style: bool,

    /// Log every film added to the map.
    #[arg(long = "print_film")]
    print_film: bool,

    /// Nominatim base URL.
    #[arg(long, env = "FILM_ATLAS_NOMINATIM_URL", default_value = DEFAULT_NOMINATIM_URL)]
    nominatim_url: String,

    /// User-Agent sent to the geocoder.
    #[arg(long, env = "FILM_ATLAS_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Per-request geocoder timeout in seconds.
    #[arg(long, env = "FILM_ATLAS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Retries for transient geocoder failures.
    #[arg(long, env = "FILM_ATLAS_RETRIES", default_value_t = 2)]
    retries: u32,

    /// Where to write the map.
    #[arg(long, env = "FILM_ATLAS_OUTPUT", default_value = map::OUTPUT_FILE)]
    output: PathBuf,

    /// Verbose logging.
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<AtlasConfig, AtlasError> {
        let origin = validate_origin(self.coordinate_one, self.coordinate_two)?;
        let pipeline = PipelineConfig {
            processed_locations: self.processed_locations,
            markers: self.markers,
            print_films: self.print_film,
            ..PipelineConfig::new(self.year, origin)
        };
        Ok(AtlasConfig {
            catalog: self.path,
            output: self.output,
            pipeline,
            geocoder: GeocoderConfig {
                base_url: self.nominatim_url,
                user_agent: self.user_agent,
                timeout: Duration::from_secs(self.timeout_secs),
            },
            retry: RetryPolicy { max_retries: self.retries, ..RetryPolicy::default() },
            style: if self.map_style { MapStyle::Terrain } else { MapStyle::Standard },
        })
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "film_atlas=debug" } else { "film_atlas=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        let code = e.downcast_ref::<AtlasError>().map_or(1, AtlasError::exit_code);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let started = Instant::now();
    let config = cli.into_config()?;
    info!(origin = %config.pipeline.origin, year = %config.pipeline.year, "starting, please wait");

    // ── Scan, select, order ─────────────────────────────────────

    let text = catalog::read_catalog(&config.catalog)?;
    let mut resolver =
        LocationResolver::new(Nominatim::new(&config.geocoder)).with_retry(config.retry);
    let out = pipeline::run(text.lines(), &config.pipeline, &mut resolver);

    if out.stats.dropped() > 0 {
        warn!(
            not_found = out.stats.dropped_not_found,
            transient = out.stats.dropped_transient,
            "{} rows dropped because their location could not be geocoded",
            out.stats.dropped()
        );
    }
    if out.candidates.is_empty() {
        warn!("no locations selected, the map will only show your position");
    }

    // ── Render ──────────────────────────────────────────────────

    let doc = MapDocument::assemble(
        &out.groups,
        &out.candidates,
        &out.route,
        config.style,
        &mut rand::rng(),
    );
    let html = map::render_html(&doc).context("Failed to serialize map data")?;
    map::write_document(&config.output, &html)?;

    info!(
        path = %config.output.display(),
        markers = doc.markers.len(),
        lookups = resolver.lookups(),
        elapsed = ?started.elapsed(),
        "map written, enjoy"
    );
    Ok(())
}
