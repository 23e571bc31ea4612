//! Error types.
//!
//! Nothing in the matching core aborts a batch: these errors describe why a
//! single record was skipped, or why a configuration is unusable.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("Position has {0} components, expected at least 2")]
    TooFewComponents(usize),

    #[error("Coordinate is missing")]
    Missing,

    #[error("Coordinate is not a finite number (lat {lat}, lon {lon})")]
    NonFinite { lat: f64, lon: f64 },

    #[error("Coordinate out of range (lat {lat}, lon {lon})")]
    OutOfRange { lat: f64, lon: f64 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Near radius ({near} m) must not exceed far radius ({far} m)")]
    RadiiOrder { near: f64, far: f64 },

    #[error("Invalid {name}: {value}")]
    InvalidValue { name: &'static str, value: f64 },

    #[error("Bounding box is inverted: {0}")]
    InvertedBoundingBox(String),
}
