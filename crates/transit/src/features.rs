//! GeoJSON feature utilities: coordinate extraction, tagging, route
//! extraction, route clipping and facility annotation over collections.
//!
//! Every function here takes features by reference and returns new values;
//! nothing is mutated in place.

use geojson::feature::Id;
use geojson::{Feature, Geometry, JsonObject, Value as GeoValue};
use rayon::prelude::*;
use serde_json::Value;

use crate::config::ProximityConfig;
use crate::error::CoordinateError;
use crate::identifiers::FacilityId;
use crate::labels::DeriveFn;
use crate::matching::{match_facility, AnnotationUpdate, MergeAction};
use crate::models::{BoundingBox, Facility, GeoPoint, Polyline, Route, Segment};
use crate::spatial::clip::clip_vertices;
use crate::spatial::simplify::simplify;

/// Property keys tried, in order, when a feature has no Point geometry
pub const LAT_KEYS: [&str; 3] = ["latitud", "lat", "latitude"];
pub const LON_KEYS: [&str; 3] = ["longitud", "lng", "longitude"];

pub const PLACE_KIND_KEY: &str = "tipo_lugar";
pub const PLACE_KIND_TEACHING: &str = "lugar_interes_docente";

// ============================================================================
// Coordinates and properties
// ============================================================================

/// Numeric value of a JSON number or numeric string.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// First property among `keys` holding a non-empty value.
fn lookup<'a>(properties: &'a JsonObject, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| properties.get(*k)).find(|v| match v {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

/// Location of a point feature.
///
/// Uses the Point geometry when present, otherwise the latitude/longitude
/// properties (see [`LAT_KEYS`], [`LON_KEYS`]).
pub fn extract_point(feature: &Feature) -> Result<GeoPoint, CoordinateError> {
    if let Some(Geometry {
        value: GeoValue::Point(position),
        ..
    }) = &feature.geometry
    {
        return GeoPoint::from_position(position);
    }

    let properties = feature.properties.as_ref().ok_or(CoordinateError::Missing)?;
    let lat = lookup(properties, &LAT_KEYS).ok_or(CoordinateError::Missing)?;
    let lon = lookup(properties, &LON_KEYS).ok_or(CoordinateError::Missing)?;

    GeoPoint::checked(
        coerce_number(lat).unwrap_or(f64::NAN),
        coerce_number(lon).unwrap_or(f64::NAN),
    )
}

/// Free-text form of a property; null and missing values yield `None`.
///
/// Arrays and objects come back as their JSON text so that existing content
/// is never mistaken for an empty field.
pub fn text_property(feature: &Feature, key: &str) -> Option<String> {
    match feature.properties.as_ref()?.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Copy of `feature` with `key` set to `value`.
pub fn tag_feature(feature: &Feature, key: &str, value: impl Into<Value>) -> Feature {
    let mut tagged = feature.clone();
    tagged
        .properties
        .get_or_insert_with(JsonObject::new)
        .insert(key.to_string(), value.into());
    tagged
}

pub fn point_feature(point: GeoPoint, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoValue::Point(point.to_position()))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Rebuild a place-of-interest feature as a Point tagged with `kind`.
pub fn normalize_place(feature: &Feature, kind: &str) -> Result<Feature, CoordinateError> {
    let point = extract_point(feature)?;
    let mut properties = feature.properties.clone().unwrap_or_default();
    properties.insert(PLACE_KIND_KEY.to_string(), Value::from(kind));

    Ok(Feature {
        id: feature.id.clone(),
        ..point_feature(point, properties)
    })
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IntegrateStats {
    pub base_count: usize,
    pub added_count: usize,
    pub skipped_count: usize,
}

impl IntegrateStats {
    pub fn log_summary(&self) {
        log::info!("=== Integration Statistics ===");
        log::info!("Original facilities: {}", self.base_count);
        log::info!("Places added: {}", self.added_count);
        if self.skipped_count > 0 {
            log::warn!("Places skipped (no usable coordinate): {}", self.skipped_count);
        }
    }
}

/// Normalize places of interest, dropping those without a usable location.
/// Returns the normalized features and the number dropped.
pub fn normalize_places(places: &[Feature]) -> (Vec<Feature>, usize) {
    let mut skipped = 0;
    let normalized = places
        .iter()
        .enumerate()
        .filter_map(|(i, place)| match normalize_place(place, PLACE_KIND_TEACHING) {
            Ok(f) => Some(f),
            Err(e) => {
                log::debug!("Skipping place #{}: {}", i, e);
                skipped += 1;
                None
            }
        })
        .collect();
    (normalized, skipped)
}

/// Normalize every place and append the usable ones after `base`.
pub fn integrate_places(base: &[Feature], places: &[Feature]) -> (Vec<Feature>, IntegrateStats) {
    let (normalized, skipped_count) = normalize_places(places);
    let stats = IntegrateStats {
        base_count: base.len(),
        added_count: normalized.len(),
        skipped_count,
    };
    (concat_features(base, normalized), stats)
}

/// `base` followed by `extra`.
pub fn concat_features(base: &[Feature], extra: Vec<Feature>) -> Vec<Feature> {
    let mut merged = Vec::with_capacity(base.len() + extra.len());
    merged.extend_from_slice(base);
    merged.extend(extra);
    merged
}

// ============================================================================
// Routes
// ============================================================================

/// Parse a line's positions, keeping failures as `None` so callers can split
/// around them.
fn line_vertices(line: &[Vec<f64>]) -> Vec<Option<GeoPoint>> {
    line.iter()
        .map(|position| match GeoPoint::from_position(position) {
            Ok(p) => Some(p),
            Err(e) => {
                log::debug!("Skipping route vertex: {}", e);
                None
            }
        })
        .collect()
}

/// Lines of a LineString or MultiLineString geometry, split around
/// unparseable vertices.
fn route_lines(geometry: &Geometry) -> Option<Vec<Polyline>> {
    let world = BoundingBox::world();
    match &geometry.value {
        GeoValue::LineString(line) => Some(clip_vertices(line_vertices(line), &world)),
        GeoValue::MultiLineString(lines) => Some(
            lines
                .iter()
                .flat_map(|line| clip_vertices(line_vertices(line), &world))
                .collect(),
        ),
        _ => None,
    }
}

/// Build a route from a line feature. Other geometry types yield `None`.
pub fn route_from_feature(feature: &Feature, derive: DeriveFn) -> Option<Route> {
    let lines = route_lines(feature.geometry.as_ref()?)?;
    let empty = JsonObject::new();
    let (label, key) = derive(feature.properties.as_ref().unwrap_or(&empty));
    Some(Route::new(label, key, lines))
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RouteStats {
    pub feature_count: usize,
    pub route_count: usize,
    pub segment_count: usize,
}

/// Routes and their flattened segment list from a route collection.
pub fn segments_from_features(features: &[Feature], derive: DeriveFn) -> (Vec<Segment>, RouteStats) {
    let routes: Vec<Route> = features
        .iter()
        .filter_map(|f| route_from_feature(f, derive))
        .collect();

    let segments: Vec<Segment> = routes.iter().flat_map(Route::segments).collect();

    let stats = RouteStats {
        feature_count: features.len(),
        route_count: routes.len(),
        segment_count: segments.len(),
    };
    (segments, stats)
}

/// Clip every line of a route feature to the configured box and simplify
/// what remains.
///
/// A LineString stays a LineString when a single run survives and becomes a
/// MultiLineString when it was split. MultiLineStrings stay
/// MultiLineStrings. Returns `None` when nothing drawable is left.
pub fn clip_route_feature(feature: &Feature, config: &ProximityConfig) -> Option<Feature> {
    let clip_line = |line: &[Vec<f64>]| clip_and_simplify(line_vertices(line), config);

    let value = match &feature.geometry.as_ref()?.value {
        GeoValue::LineString(line) => {
            if line.len() < 2 {
                return None;
            }
            let mut runs = clip_line(line);
            match runs.len() {
                0 => return None,
                1 => GeoValue::LineString(to_positions(&runs.remove(0))),
                _ => GeoValue::MultiLineString(runs.iter().map(|r| to_positions(r)).collect()),
            }
        }
        GeoValue::MultiLineString(lines) => {
            let runs: Vec<Polyline> = lines
                .iter()
                .filter(|line| line.len() >= 2)
                .flat_map(|line| clip_line(line))
                .collect();
            if runs.is_empty() {
                return None;
            }
            GeoValue::MultiLineString(runs.iter().map(|r| to_positions(r)).collect())
        }
        _ => return None,
    };

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: feature.id.clone(),
        properties: Some(feature.properties.clone().unwrap_or_default()),
        foreign_members: None,
    })
}

fn to_positions(line: &[GeoPoint]) -> Vec<Vec<f64>> {
    line.iter().map(|p| p.to_position()).collect()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClipStats {
    pub input_count: usize,
    pub output_count: usize,
}

pub fn clip_route_features(features: &[Feature], config: &ProximityConfig) -> (Vec<Feature>, ClipStats) {
    let clipped: Vec<Feature> = features
        .iter()
        .filter_map(|f| clip_route_feature(f, config))
        .collect();

    let stats = ClipStats {
        input_count: features.len(),
        output_count: clipped.len(),
    };
    (clipped, stats)
}

/// [`clip_vertices`] followed by simplification of each run. Unparseable
/// vertices (`None`) split the line like out-of-box ones.
pub fn clip_and_simplify<I>(vertices: I, config: &ProximityConfig) -> Vec<Polyline>
where
    I: IntoIterator<Item = Option<GeoPoint>>,
{
    clip_vertices(vertices, &config.bbox)
        .iter()
        .map(|run| simplify(run, config.simplify_tolerance_m))
        .filter(|run| run.len() > 1)
        .collect()
}

// ============================================================================
// Facilities
// ============================================================================

fn facility_id(feature: &Feature, index: usize) -> FacilityId {
    match &feature.id {
        Some(Id::String(s)) => FacilityId::new(s),
        Some(Id::Number(n)) => FacilityId::new(n.to_string()),
        None => FacilityId::new(format!("#{}", index)),
    }
}

/// Read a facility out of a point feature.
pub fn facility_from_feature(
    feature: &Feature,
    index: usize,
    annotation_field: &str,
) -> Result<Facility, CoordinateError> {
    let location = extract_point(feature)?;
    Ok(Facility::new(
        facility_id(feature, index),
        location,
        text_property(feature, annotation_field),
    ))
}

#[derive(Debug, Clone, PartialEq)]
pub enum FacilityOutcome {
    /// No usable coordinate
    Skipped(CoordinateError),
    /// No route within the far radius
    Unmatched,
    Updated(AnnotationUpdate),
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnnotateStats {
    pub facility_count: usize,
    pub segment_count: usize,
    pub set_count: usize,
    pub replaced_count: usize,
    pub appended_count: usize,
    pub unmatched_count: usize,
    pub skipped_count: usize,
}

impl AnnotateStats {
    pub fn annotated_count(&self) -> usize {
        self.set_count + self.replaced_count + self.appended_count
    }

    pub fn log_summary(&self) {
        log::info!("=== Annotation Statistics ===");
        log::info!("Facilities: {}", self.facility_count);
        log::info!("Route segments: {}", self.segment_count);
        log::info!(
            "Annotated: {} ({} new, {} replaced, {} appended)",
            self.annotated_count(),
            self.set_count,
            self.replaced_count,
            self.appended_count
        );
        log::info!("Kept unchanged (no route in range): {}", self.unmatched_count);
        if self.skipped_count > 0 {
            log::warn!("Skipped (no usable coordinate): {}", self.skipped_count);
        }
    }
}

/// Match every facility against the segments.
///
/// Facilities are matched in parallel; outcomes come back in input order.
pub fn match_features(
    features: &[Feature],
    segments: &[Segment],
    config: &ProximityConfig,
) -> Vec<FacilityOutcome> {
    features
        .par_iter()
        .enumerate()
        .map(|(i, feature)| {
            match facility_from_feature(feature, i, &config.annotation_field) {
                Ok(facility) => match match_facility(&facility, segments, config) {
                    Some(update) => FacilityOutcome::Updated(update),
                    None => FacilityOutcome::Unmatched,
                },
                Err(e) => {
                    log::debug!("Skipping facility #{}: {}", i, e);
                    FacilityOutcome::Skipped(e)
                }
            }
        })
        .collect()
}

/// Annotate a facility collection, returning the new features.
///
/// Only the annotation field of matched facilities changes; every other
/// feature and property is copied through.
pub fn annotate_features(
    features: &[Feature],
    segments: &[Segment],
    config: &ProximityConfig,
) -> (Vec<Feature>, AnnotateStats) {
    let outcomes = match_features(features, segments, config);

    let mut stats = AnnotateStats {
        facility_count: features.len(),
        segment_count: segments.len(),
        ..Default::default()
    };

    let annotated = features
        .iter()
        .zip(outcomes)
        .map(|(feature, outcome)| match outcome {
            FacilityOutcome::Skipped(_) => {
                stats.skipped_count += 1;
                feature.clone()
            }
            FacilityOutcome::Unmatched => {
                stats.unmatched_count += 1;
                feature.clone()
            }
            FacilityOutcome::Updated(update) => {
                match update.merged.action {
                    MergeAction::Set => stats.set_count += 1,
                    MergeAction::Replaced => stats.replaced_count += 1,
                    MergeAction::Appended => stats.appended_count += 1,
                }
                tag_feature(feature, &config.annotation_field, update.merged.text)
            }
        })
        .collect();

    (annotated, stats)
}
