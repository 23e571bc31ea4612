//! Core data types for route geometries and facilities.

use geo::Point;
use std::fmt;

use crate::error::CoordinateError;
use crate::identifiers::*;

// ============================================================================
// Points and boxes
// ============================================================================

/// A WGS84 position in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a point, rejecting non-finite or out-of-range values.
    pub fn checked(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite { lat, lon });
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::OutOfRange { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Parse a GeoJSON position (`[lon, lat, ...]`).
    pub fn from_position(position: &[f64]) -> Result<Self, CoordinateError> {
        match position {
            [lon, lat, ..] => Self::checked(*lat, *lon),
            _ => Err(CoordinateError::TooFewComponents(position.len())),
        }
    }

    /// GeoJSON position, longitude first.
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

impl From<Point> for GeoPoint {
    fn from(point: Point) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<GeoPoint> for Point {
    fn from(point: GeoPoint) -> Self {
        Point::new(point.lon, point.lat)
    }
}

/// Geographic bounding box, inclusive on all four bounds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// A box covering every valid coordinate.
    pub fn world() -> Self {
        Self::new(-90.0, 90.0, -180.0, 180.0)
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }

    pub fn is_inverted(&self) -> bool {
        !(self.min_lat <= self.max_lat && self.min_lon <= self.max_lon)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat [{}, {}] lon [{}, {}]",
            self.min_lat, self.max_lat, self.min_lon, self.max_lon
        )
    }
}

// ============================================================================
// Routes and segments
// ============================================================================

/// Ordered vertices of a line. May be empty or a single point after clipping.
pub type Polyline = Vec<GeoPoint>;

/// A transit route: one or more lines sharing a label and key.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub label: RouteLabel,
    pub key: RouteKey,
    pub lines: Vec<Polyline>,
}

impl Route {
    pub fn new(label: RouteLabel, key: RouteKey, lines: Vec<Polyline>) -> Self {
        Self { label, key, lines }
    }

    /// Every edge of every line, in line order then vertex order.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.lines.iter().flat_map(move |line| {
            line.windows(2)
                .map(move |pair| Segment::new(pair[0], pair[1], self.label.clone(), self.key.clone()))
        })
    }
}

/// One edge of a route polyline.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub label: RouteLabel,
    pub key: RouteKey,
}

impl Segment {
    pub fn new(start: GeoPoint, end: GeoPoint, label: RouteLabel, key: RouteKey) -> Self {
        Self {
            start,
            end,
            label,
            key,
        }
    }
}

// ============================================================================
// Facilities
// ============================================================================

/// A point of interest that receives "how to get there" annotations.
#[derive(Clone, Debug, PartialEq)]
pub struct Facility {
    pub id: FacilityId,
    pub location: GeoPoint,
    /// Existing free-text annotation, possibly curated by hand
    pub annotation: Option<String>,
}

impl Facility {
    pub fn new(id: FacilityId, location: GeoPoint, annotation: Option<String>) -> Self {
        Self {
            id,
            location,
            annotation,
        }
    }
}

/// A candidate association between a facility and a route.
#[derive(Clone, Debug, PartialEq)]
pub struct ProximityMatch {
    pub label: RouteLabel,
    pub key: RouteKey,
    pub distance_m: f64,
}
