//! Places of interest from a spreadsheet exported as CSV.

use anyhow::{Context, Result};
use como_llego_transit::features::{point_feature, PLACE_KIND_KEY, PLACE_KIND_TEACHING};
use como_llego_transit::GeoPoint;
use geojson::{Feature, JsonObject};
use regex::Regex;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

pub const ORIGIN_KEY: &str = "origen_lugar";
pub const DEFAULT_ORIGIN: &str = "excel_lugares_interes";

const LAT_COLUMNS: [&str; 3] = ["latitud", "lat", "latitude"];
const LON_COLUMNS: [&str; 4] = ["longitud", "long", "lon", "longitude"];
const COORDINATES_COLUMN: &str = "coordenadas";

static WKT_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)POINT\s*\(\s*([^\s,]+)\s+([^\s,]+)\s*\)").expect("WKT pattern is valid")
});

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("number pattern is valid")
});

/// Parse a number as typed into a spreadsheet: inner spaces are ignored and
/// a lone decimal comma is accepted ("-34,92"). Only the leading number is
/// read, so trailing units or symbols ("-34.92°") are dropped.
pub fn parse_number_flexible(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let normalized = if compact.contains(',') && !compact.contains('.') {
        compact.replacen(',', ".", 1)
    } else {
        compact
    };

    LEADING_NUMBER
        .find(&normalized)?
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse a free-form coordinate cell.
///
/// Accepts WKT `POINT(lon lat)`, or latitude then longitude separated by a
/// comma, a semicolon or whitespace.
pub fn parse_coordinates(raw: &str) -> Option<GeoPoint> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = WKT_POINT.captures(s) {
        let lon = parse_number_flexible(&caps[1])?;
        let lat = parse_number_flexible(&caps[2])?;
        return GeoPoint::checked(lat, lon).ok();
    }

    let s = s.replace(';', ",");
    let parts: Vec<&str> = if s.contains(',') {
        s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect()
    } else {
        s.split_whitespace().collect()
    };

    if parts.len() < 2 {
        return None;
    }

    let lat = parse_number_flexible(parts[0])?;
    let lon = parse_number_flexible(parts[1])?;
    GeoPoint::checked(lat, lon).ok()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportStats {
    pub row_count: usize,
    pub added_count: usize,
    pub skipped_count: usize,
}

/// Index of the first header (case-insensitive, trimmed) among `names`.
fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().to_lowercase() == *name)
    })
}

fn row_location(
    row: &csv::StringRecord,
    lat_col: Option<usize>,
    lon_col: Option<usize>,
    coords_col: Option<usize>,
) -> Option<GeoPoint> {
    let from_columns = match (lat_col, lon_col) {
        (Some(lat), Some(lon)) => {
            let lat = row.get(lat).and_then(parse_number_flexible);
            let lon = row.get(lon).and_then(parse_number_flexible);
            match (lat, lon) {
                (Some(lat), Some(lon)) => GeoPoint::checked(lat, lon).ok(),
                _ => None,
            }
        }
        _ => None,
    };

    from_columns.or_else(|| row.get(coords_col?).and_then(parse_coordinates))
}

/// Convert every row with a usable location into a Point feature carrying
/// all of the row's cells as properties.
pub fn features_from_csv<R: Read>(reader: R, origin: &str) -> Result<(Vec<Feature>, ImportStats)> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let lat_col = find_column(&headers, &LAT_COLUMNS);
    let lon_col = find_column(&headers, &LON_COLUMNS);
    let coords_col = find_column(&headers, &[COORDINATES_COLUMN]);

    if lat_col.is_none() && coords_col.is_none() {
        log::warn!("  No latitude or coordenadas column found; every row will be skipped");
    }

    let mut stats = ImportStats::default();
    let mut features = Vec::new();

    for (i, record) in csv_reader.records().enumerate() {
        let row = record.with_context(|| format!("Failed to read CSV row {}", i + 2))?;
        stats.row_count += 1;

        let Some(location) = row_location(&row, lat_col, lon_col, coords_col) else {
            log::debug!("Skipping row {}: no usable coordinates", i + 2);
            stats.skipped_count += 1;
            continue;
        };

        let mut properties = JsonObject::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            properties.insert(header.clone(), Value::from(cell));
        }
        properties.insert(PLACE_KIND_KEY.to_string(), Value::from(PLACE_KIND_TEACHING));
        properties.insert(ORIGIN_KEY.to_string(), Value::from(origin));

        features.push(point_feature(location, properties));
    }

    stats.added_count = features.len();
    Ok((features, stats))
}

pub fn read_places_csv(path: &Path, origin: &str) -> Result<(Vec<Feature>, ImportStats)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open sheet: {}", path.display()))?;
    features_from_csv(file, origin)
        .with_context(|| format!("Failed to import places from: {}", path.display()))
}
