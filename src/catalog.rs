//! Catalog scanning: reads `name\tlocation` rows, keeps the ones tagged with
//! the requested year and groups film names by resolved coordinate.

use crate::error::AtlasError;
use crate::geo::Coordinate;
use crate::location::{GeocodeError, Geocoder, LocationResolver, LocationSource};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub name: String,
    pub location: String,
}

/// Split a line into its two tab-separated fields.
///
/// The line is trimmed first. Anything other than exactly two fields is
/// rejected.
pub fn parse_record(line: &str) -> Option<RawRecord> {
    let mut fields = line.trim().split('\t');
    let name = fields.next()?;
    let location = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    Some(RawRecord { name: name.to_string(), location: location.to_string() })
}

/// `"1999"` → `"(1999)"`. Rows match when the name contains this tag anywhere.
pub fn year_tag(year: &str) -> String {
    format!("({})", year)
}

/// Shortened retry query: the last two `", "`-separated segments.
///
/// `"Stage 5, Warner Bros. Burbank Studios, Burbank, California, USA"`
/// becomes `"California, USA"`. Returns None when there are fewer than two
/// segments.
pub fn fallback_query(location: &str) -> Option<String> {
    let parts: Vec<&str> = location.split(", ").collect();
    if parts.len() < 2 {
        return None;
    }
    Some(format!("{}, {}", parts[parts.len() - 2], parts[parts.len() - 1]))
}

/// Read a catalog file as UTF-8, silently dropping invalid byte sequences.
pub fn read_catalog(path: &Path) -> Result<String, AtlasError> {
    let bytes = fs::read(path).map_err(|source| AtlasError::ReadCatalog {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode_ignoring_errors(&bytes))
}

fn decode_ignoring_errors(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Film names grouped by coordinate, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct LocationGroups {
    order: Vec<Coordinate>,
    names: HashMap<Coordinate, Vec<String>>,
}

impl LocationGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` to the group at `coordinate`, creating it if needed.
    pub fn insert(&mut self, coordinate: Coordinate, name: impl Into<String>) {
        let name = name.into();
        match self.names.get_mut(&coordinate) {
            Some(names) => names.push(name),
            None => {
                self.order.push(coordinate);
                self.names.insert(coordinate, vec![name]);
            }
        }
    }

    pub fn get(&self, coordinate: &Coordinate) -> Option<&[String]> {
        self.names.get(coordinate).map(Vec::as_slice)
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.names.contains_key(coordinate)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Coordinates in first-seen order.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.order.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, &[String])> + '_ {
        self.order
            .iter()
            .map(move |c| (*c, self.names.get(c).map(Vec::as_slice).unwrap_or(&[])))
    }
}

/// Scan parameters.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Bare year, e.g. `"2000"`. Wrapped in parentheses before matching.
    pub year: String,
    /// Group cap. Scanning stops once more than `cap` groups exist, so up to
    /// `cap + 1` groups can be returned.
    pub cap: usize,
    /// Log the name of every grouped row.
    pub print_films: bool,
}

/// Counters collected while scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub lines: usize,
    pub malformed: usize,
    pub qualifying: usize,
    pub resolved_primary: usize,
    pub resolved_fallback: usize,
    pub cache_hits: usize,
    pub dropped_not_found: usize,
    pub dropped_transient: usize,
    pub cap_reached: bool,
}

impl ScanStats {
    pub fn dropped(&self) -> usize {
        self.dropped_not_found + self.dropped_transient
    }

    fn record_drop(&mut self, err: &GeocodeError) {
        if err.is_transient() {
            self.dropped_transient += 1;
        } else {
            self.dropped_not_found += 1;
        }
    }
}

/// Scan `lines` and group qualifying rows by resolved coordinate.
pub fn scan<I, S, G>(
    lines: I,
    options: &ScanOptions,
    resolver: &mut LocationResolver<G>,
) -> (LocationGroups, ScanStats)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    G: Geocoder,
{
    let tag = year_tag(&options.year);
    let mut groups = LocationGroups::new();
    let mut stats = ScanStats::default();

    for line in lines {
        stats.lines += 1;
        let record = match parse_record(line.as_ref()) {
            Some(r) => r,
            None => {
                stats.malformed += 1;
                continue;
            }
        };
        if !record.name.contains(&tag) {
            continue;
        }
        stats.qualifying += 1;

        if groups.len() > options.cap {
            stats.cap_reached = true;
            debug!(cap = options.cap, groups = groups.len(), "group cap reached, stopping scan");
            break;
        }

        let resolved = match resolver.resolve_with_source(&record.location) {
            Ok(r) => {
                stats.resolved_primary += 1;
                r
            }
            Err(primary) => {
                debug!(location = %record.location, error = %primary, "primary lookup failed");
                let Some(short) = fallback_query(&record.location) else {
                    stats.record_drop(&primary);
                    continue;
                };
                match resolver.resolve_with_source(&short) {
                    Ok(r) => {
                        stats.resolved_fallback += 1;
                        r
                    }
                    Err(e) => {
                        debug!(location = %short, error = %e, "fallback lookup failed, dropping row");
                        stats.record_drop(&e);
                        continue;
                    }
                }
            }
        };
        if resolved.source == LocationSource::Cache {
            stats.cache_hits += 1;
        }

        groups.insert(resolved.coordinate, record.name.as_str());
        if options.print_films {
            info!("{}", record.name);
        }
    }

    (groups, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::resolver::tests::FakeGeocoder;
    use crate::location::{GeoCache, RetryPolicy};
    use std::io::Write;

    fn resolver(geocoder: FakeGeocoder) -> LocationResolver<FakeGeocoder> {
        LocationResolver::with_cache(geocoder, GeoCache::new()).with_retry(RetryPolicy::none())
    }

    fn options(year: &str, cap: usize) -> ScanOptions {
        ScanOptions { year: year.to_string(), cap, print_films: false }
    }

    #[test]
    fn test_parse_record() {
        let r = parse_record("Alpha (2000)\tParis, France\n").unwrap();
        assert_eq!(r.name, "Alpha (2000)");
        assert_eq!(r.location, "Paris, France");
    }

    #[test]
    fn test_parse_record_rejects_wrong_field_count() {
        assert!(parse_record("no tabs here").is_none());
        assert!(parse_record("a\tb\tc").is_none());
        assert!(parse_record("").is_none());
    }

    #[test]
    fn test_year_tag_is_loose_substring() {
        let tag = year_tag("1999");
        assert_eq!(tag, "(1999)");
        assert!("The Matrix (1999)".contains(&tag));
        assert!("Odd (1999) {#2.1}".contains(&tag));
        assert!(!"Sequel 1999".contains(&tag));
    }

    #[test]
    fn test_fallback_query() {
        assert_eq!(
            fallback_query("Stage 5, Warner Bros. Burbank Studios, Burbank, California, USA"),
            Some("California, USA".to_string())
        );
        assert_eq!(fallback_query("Paris, France"), Some("Paris, France".to_string()));
        assert_eq!(fallback_query("Antarctica"), None);
    }

    #[test]
    fn test_scan_filters_by_year_and_groups() {
        let geocoder = FakeGeocoder::default()
            .with("Paris, France", 48.8566, 2.3522)
            .with("Berlin, Germany", 52.52, 13.405)
            .with("Lyon, France", 45.764, 4.8357);
        let lines = [
            "Alpha (2000)\tParis, France",
            "Beta (1999)\tBerlin, Germany",
            "Gamma (2000)\tLyon, France",
        ];
        let (groups, stats) = scan(lines, &options("2000", 70), &mut resolver(geocoder));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get(&Coordinate::new(48.8566, 2.3522)).unwrap(), ["Alpha (2000)"]);
        assert!(!groups.contains(&Coordinate::new(52.52, 13.405)));
        assert_eq!(stats.qualifying, 2);
        assert_eq!(stats.lines, 3);
    }

    #[test]
    fn test_shared_coordinate_keeps_both_names_in_order() {
        let geocoder = FakeGeocoder::default()
            .with("Soho, London, UK", 51.5136, -0.1365)
            .with("Soho Square, London, UK", 51.5136, -0.1365);
        let lines = [
            "First (2005)\tSoho, London, UK",
            "Second (2005)\tSoho Square, London, UK",
        ];
        let (groups, _) = scan(lines, &options("2005", 70), &mut resolver(geocoder));

        assert_eq!(groups.len(), 1);
        let names = groups.get(&Coordinate::new(51.5136, -0.1365)).unwrap();
        assert_eq!(names, ["First (2005)", "Second (2005)"]);
    }

    #[test]
    fn test_fallback_to_last_two_segments() {
        let geocoder = FakeGeocoder::default().with("California, USA", 36.7, -119.4);
        let lines = ["Film (2010)\tBackyard, 12 Elm St, California, USA"];
        let (groups, stats) = scan(lines, &options("2010", 70), &mut resolver(geocoder.clone()));

        assert_eq!(groups.len(), 1);
        assert_eq!(stats.resolved_fallback, 1);
        assert_eq!(
            *geocoder.calls.borrow(),
            vec!["Backyard, 12 Elm St, California, USA".to_string(), "California, USA".to_string()]
        );
    }

    #[test]
    fn test_unresolvable_rows_are_dropped_and_counted() {
        let geocoder = FakeGeocoder::default()
            .failing("Mars", GeocodeError::NotFound("Mars".into()))
            .failing("Nowhere, Land", GeocodeError::Network("reset".into()));
        let lines = ["A (2001)\tMars", "B (2001)\tNowhere, Land", "garbage line"];
        let (groups, stats) = scan(lines, &options("2001", 70), &mut resolver(geocoder));

        assert!(groups.is_empty());
        assert_eq!(stats.dropped_not_found, 1);
        // the fallback for "Nowhere, Land" is the same text and fails the same way
        assert_eq!(stats.dropped_transient, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.dropped(), 2);
    }

    #[test]
    fn test_cap_admits_one_extra_group_then_stops() {
        let geocoder = FakeGeocoder::default()
            .with("a, x", 1.0, 1.0)
            .with("b, x", 2.0, 2.0)
            .with("c, x", 3.0, 3.0)
            .with("d, x", 4.0, 4.0);
        let lines = ["A (1990)\ta, x", "B (1990)\tb, x", "C (1990)\tc, x", "D (1990)\td, x"];
        let fake = geocoder.clone();
        let (groups, stats) = scan(lines, &options("1990", 2), &mut resolver(geocoder));

        assert_eq!(groups.len(), 3);
        assert!(stats.cap_reached);
        assert!(!fake.calls.borrow().contains(&"d, x".to_string()));
    }

    #[test]
    fn test_cap_stops_even_for_known_coordinates() {
        let geocoder = FakeGeocoder::default().with("a, x", 1.0, 1.0).with("b, x", 2.0, 2.0);
        let lines = ["A (1990)\ta, x", "B (1990)\tb, x", "C (1990)\ta, x"];
        let (groups, _) = scan(lines, &options("1990", 1), &mut resolver(geocoder));

        assert_eq!(groups.get(&Coordinate::new(1.0, 1.0)).unwrap(), ["A (1990)"]);
    }

    #[test]
    fn test_repeated_location_uses_cache() {
        let geocoder = FakeGeocoder::default().with("Rome, Italy", 41.9, 12.5);
        let lines = ["A (1960)\tRome, Italy", "B (1960)\tRome, Italy"];
        let fake = geocoder.clone();
        let (groups, stats) = scan(lines, &options("1960", 70), &mut resolver(geocoder));

        assert_eq!(groups.len(), 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(fake.call_count(), 1);
    }

    #[test]
    fn test_read_catalog_drops_invalid_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Caf\xe9 (1999)\tMontr\xe9al, Canada\n").unwrap();
        let text = read_catalog(file.path()).unwrap();
        assert_eq!(text, "Caf (1999)\tMontral, Canada\n");

        let record = parse_record(text.lines().next().unwrap()).unwrap();
        assert_eq!(record.location, "Montral, Canada");
        assert!(!record.location.contains('\u{FFFD}'));
    }

    #[test]
    fn test_decode_keeps_valid_multibyte_text() {
        assert_eq!(decode_ignoring_errors("Zürich, Schweiz".as_bytes()), "Zürich, Schweiz");
        assert_eq!(decode_ignoring_errors(b"\xff\xfeok\xc3"), "ok");
    }

    #[test]
    fn test_print_films_does_not_change_results() {
        let geocoder = FakeGeocoder::default()
            .with("Paris, France", 48.8566, 2.3522)
            .with("California, USA", 36.7, -119.4)
            .failing("Mars", GeocodeError::NotFound("Mars".into()));
        let lines = [
            "Alpha (2000)\tParis, France",
            "Beta (2000)\tBackyard, California, USA",
            "Gamma (2000)\tMars",
            "Delta (2000)\tParis, France",
            "not a row",
        ];

        let quiet = scan(lines, &options("2000", 70), &mut resolver(geocoder.clone()));
        let loud_options = ScanOptions { print_films: true, ..options("2000", 70) };
        let loud = scan(lines, &loud_options, &mut resolver(geocoder));

        assert_eq!(quiet.1, loud.1);
        assert_eq!(quiet.0.len(), loud.0.len());
        assert!(quiet.0.iter().eq(loud.0.iter()));
    }

    #[test]
    fn test_read_catalog_missing_file() {
        let err = read_catalog(Path::new("/definitely/not/here.list")).unwrap_err();
        assert!(matches!(err, AtlasError::ReadCatalog { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}
