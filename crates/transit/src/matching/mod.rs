//! Nearest-route matching for facilities.
//!
//! Every segment is measured against the facility (brute force), bucketed
//! into the near or walkable tier, deduplicated by route label, and turned
//! into a message that is merged into the facility's existing annotation.

pub mod annotation;

use hashbrown::HashMap;

use crate::config::ProximityConfig;
use crate::identifiers::{FacilityId, RouteLabel};
use crate::models::{Facility, GeoPoint, ProximityMatch, Segment};
use crate::spatial::queries::point_to_segment_distance;

pub use annotation::{merge_annotation, MergeAction, MergedAnnotation};

/// Distance tier of a set of matches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    /// Within the near radius
    Near,
    /// Beyond the near radius but within the far radius
    Walkable,
}

/// Routes found around a facility, all from the same tier.
#[derive(Clone, Debug, PartialEq)]
pub struct NearbyRoutes {
    pub tier: Tier,
    /// One entry per label, at that label's minimum distance, in the order
    /// the label was first seen during the scan
    pub matches: Vec<ProximityMatch>,
}

impl NearbyRoutes {
    pub fn message(&self, config: &ProximityConfig) -> String {
        match self.tier {
            Tier::Near => annotation::format_near(&self.matches, config),
            Tier::Walkable => annotation::format_walkable(&self.matches, config),
        }
    }
}

/// Result of matching one facility, ready to be written back.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationUpdate {
    pub facility_id: FacilityId,
    pub nearby: NearbyRoutes,
    pub merged: MergedAnnotation,
}

/// Keeps one match per label, retaining first-seen order.
#[derive(Default)]
struct Bucket {
    matches: Vec<ProximityMatch>,
    index: HashMap<RouteLabel, usize>,
}

impl Bucket {
    fn offer(&mut self, segment: &Segment, distance_m: f64) {
        match self.index.get(&segment.label) {
            Some(&i) => {
                // Strictly closer only, so ties keep the earlier segment
                if distance_m < self.matches[i].distance_m {
                    self.matches[i].distance_m = distance_m;
                    self.matches[i].key = segment.key.clone();
                }
            }
            None => {
                self.index.insert(segment.label.clone(), self.matches.len());
                self.matches.push(ProximityMatch {
                    label: segment.label.clone(),
                    key: segment.key.clone(),
                    distance_m,
                });
            }
        }
    }
}

/// Scan `segments` around `location` and return the closest non-empty tier.
///
/// A distance equal to a radius belongs to that radius' tier. Returns `None`
/// when no segment lies within `far_radius_m`.
pub fn find_nearby_routes(
    location: GeoPoint,
    segments: &[Segment],
    near_radius_m: f64,
    far_radius_m: f64,
) -> Option<NearbyRoutes> {
    let mut near = Bucket::default();
    let mut walkable = Bucket::default();

    for segment in segments {
        let d = point_to_segment_distance(location, segment.start, segment.end);
        if d <= near_radius_m {
            near.offer(segment, d);
        } else if d <= far_radius_m {
            walkable.offer(segment, d);
        }
    }

    if !near.matches.is_empty() {
        Some(NearbyRoutes {
            tier: Tier::Near,
            matches: near.matches,
        })
    } else if !walkable.matches.is_empty() {
        Some(NearbyRoutes {
            tier: Tier::Walkable,
            matches: walkable.matches,
        })
    } else {
        None
    }
}

/// Compute the new annotation for a facility.
///
/// Returns `None` when no route is within the far radius; the facility's
/// text must then be left untouched.
pub fn match_facility(
    facility: &Facility,
    segments: &[Segment],
    config: &ProximityConfig,
) -> Option<AnnotationUpdate> {
    let nearby = find_nearby_routes(
        facility.location,
        segments,
        config.near_radius_m,
        config.far_radius_m,
    )?;

    let message = nearby.message(config);
    let merged = merge_annotation(facility.annotation.as_deref(), &message);

    log::debug!(
        "Facility {}: {} route(s) {:?}, {:?}",
        facility.id,
        nearby.matches.len(),
        nearby.tier,
        merged.action
    );

    Some(AnnotationUpdate {
        facility_id: facility.id.clone(),
        nearby,
        merged,
    })
}
