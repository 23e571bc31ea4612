//! Geometry and facility models.

pub mod types;

// Re-exports for convenience
pub use types::{BoundingBox, Facility, GeoPoint, Polyline, ProximityMatch, Route, Segment};
