//! Tunable parameters for matching, simplification and clipping.
//!
//! The defaults encode the policy used for the La Plata school dataset.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::BoundingBox;

pub const DEFAULT_NEAR_RADIUS_M: f64 = 300.0;
pub const DEFAULT_FAR_RADIUS_M: f64 = 1000.0;
pub const DEFAULT_BLOCK_LENGTH_M: f64 = 100.0;
pub const DEFAULT_SIMPLIFY_TOLERANCE_M: f64 = 20.0;
pub const DEFAULT_ANNOTATION_FIELD: &str = "COMO LLEGO";

/// Greater La Plata area.
pub const DEFAULT_BBOX: BoundingBox = BoundingBox {
    min_lat: -35.20,
    max_lat: -34.60,
    min_lon: -58.30,
    max_lon: -57.30,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Routes within this distance are reported as "near"
    pub near_radius_m: f64,
    /// Routes within this distance (and beyond near) are "walkable"
    pub far_radius_m: f64,
    /// Meters per city block, for the walking-distance hint
    pub block_length_m: f64,
    /// Minimum spacing between kept vertices when simplifying routes
    pub simplify_tolerance_m: f64,
    pub bbox: BoundingBox,
    /// Property that holds the facility's "how to get there" text
    pub annotation_field: String,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            near_radius_m: DEFAULT_NEAR_RADIUS_M,
            far_radius_m: DEFAULT_FAR_RADIUS_M,
            block_length_m: DEFAULT_BLOCK_LENGTH_M,
            simplify_tolerance_m: DEFAULT_SIMPLIFY_TOLERANCE_M,
            bbox: DEFAULT_BBOX,
            annotation_field: DEFAULT_ANNOTATION_FIELD.to_string(),
        }
    }
}

impl ProximityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("near radius", self.near_radius_m),
            ("far radius", self.far_radius_m),
            ("simplify tolerance", self.simplify_tolerance_m),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { name, value });
            }
        }

        if !self.block_length_m.is_finite() || self.block_length_m <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "block length",
                value: self.block_length_m,
            });
        }

        if self.near_radius_m > self.far_radius_m {
            return Err(ConfigError::RadiiOrder {
                near: self.near_radius_m,
                far: self.far_radius_m,
            });
        }

        if self.bbox.is_inverted() {
            return Err(ConfigError::InvertedBoundingBox(self.bbox.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ProximityConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.near_radius_m, 300.0);
        assert_eq!(config.far_radius_m, 1000.0);
        assert_eq!(config.block_length_m, 100.0);
        assert_eq!(config.simplify_tolerance_m, 20.0);
        assert_eq!(config.annotation_field, "COMO LLEGO");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ProximityConfig =
            serde_json::from_str(r#"{ "near_radius_m": 250.0 }"#).unwrap();
        assert_eq!(config.near_radius_m, 250.0);
        assert_eq!(config.far_radius_m, 1000.0);
        assert_eq!(config.bbox, DEFAULT_BBOX);
    }

    #[test]
    fn test_validation_errors() {
        let config = ProximityConfig {
            near_radius_m: 1500.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::RadiiOrder { .. })));

        let config = ProximityConfig {
            block_length_m: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let config = ProximityConfig {
            bbox: BoundingBox::new(-34.0, -35.0, -58.0, -57.0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedBoundingBox(_))
        ));
    }
}
