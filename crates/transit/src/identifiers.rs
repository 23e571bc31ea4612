//! Type-safe identifiers for routes and facilities.
//!
//! All identifiers use Arc<str> so that a route's label can be shared by
//! every segment cut from its geometry without copying the string.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

macro_rules! impl_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_identifier!(
    /// Human-readable route name shown in annotations (e.g. "73", "214 B").
    RouteLabel
);
impl_identifier!(
    /// Identity of a route, derived from its reference code when one exists.
    RouteKey
);
impl_identifier!(FacilityId);

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    #[test]
    fn test_segment_labels_share_storage() {
        let label = RouteLabel::new("214 B");
        let per_segment: Vec<RouteLabel> = (0..3).map(|_| label.clone()).collect();

        assert!(per_segment.iter().all(|l| Arc::ptr_eq(&l.0, &label.0)));
        assert_eq!(per_segment[0], RouteLabel::new("214 B"));
        assert_ne!(label, RouteLabel::new("214"));
    }

    #[test]
    fn test_label_lookup_by_value() {
        let mut closest: HashMap<RouteLabel, f64> = HashMap::new();
        closest.insert(RouteLabel::new("73"), 120.0);

        assert_eq!(closest.get(&RouteLabel::new("73")), Some(&120.0));
        assert_eq!(format!("Línea {}", RouteLabel::new("73")), "Línea 73");
    }
}
