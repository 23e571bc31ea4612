//! Geodesy primitives and polyline operations.

pub mod clip;
pub mod queries;
pub mod simplify;

pub use clip::clip_to_bbox;
pub use queries::{great_circle_distance, point_to_segment_distance, EARTH_RADIUS_M};
pub use simplify::simplify;
