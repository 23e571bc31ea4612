//! # como-llego-transit
//!
//! Spatial matching between facilities (schools, places of interest) and
//! bus route geometries, producing "how to get there" annotations.
//!
//! ## Features
//!
//! - **Geodesy**: Haversine distances and point-to-segment distances
//! - **Line simplification**: minimum-spacing vertex filtering
//! - **Clipping**: split routes to the runs inside a bounding box
//! - **Matching**: near/walkable tiers, dedup by route label, conservative
//!   merge with hand-written annotations
//! - **GeoJSON utilities**: coordinate extraction, tagging, concatenation
//!
//! ## Example
//!
//! ```
//! use como_llego_transit::prelude::*;
//!
//! let facility = Facility::new(
//!     FacilityId::new("escuela-1"),
//!     GeoPoint::new(-34.90, -57.95),
//!     Some("Llegada en auto.".into()),
//! );
//!
//! // Route 12 runs east-west about 100 m north of the school
//! let lat = -34.90 + meters_to_degrees_lat(100.0);
//! let route = Route::new(
//!     RouteLabel::new("12"),
//!     RouteKey::new("12"),
//!     vec![vec![GeoPoint::new(lat, -57.96), GeoPoint::new(lat, -57.94)]],
//! );
//! let segments: Vec<Segment> = route.segments().collect();
//!
//! let update = match_facility(&facility, &segments, &ProximityConfig::default()).unwrap();
//! assert_eq!(
//!     update.merged.text,
//!     "Llegada en auto. Colectivos cerca (≤ 300 m): 12"
//! );
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod identifiers;
pub mod labels;
pub mod matching;
pub mod models;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::config::ProximityConfig;
    pub use crate::error::{ConfigError, CoordinateError};
    pub use crate::identifiers::*;
    pub use crate::matching::{
        find_nearby_routes, match_facility, merge_annotation, AnnotationUpdate, MergeAction,
        NearbyRoutes, Tier,
    };
    pub use crate::models::types::*;
    pub use crate::spatial::clip::clip_to_bbox;
    pub use crate::spatial::queries::{
        great_circle_distance, meters_to_degrees_lat, point_to_segment_distance,
    };
    pub use crate::spatial::simplify::simplify;
}

pub use prelude::*;
