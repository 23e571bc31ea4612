//! Distance calculations on a spherical Earth.
//!
//! Point-to-point distances use the Haversine formula. Point-to-segment
//! distances project all three points onto 3-D Cartesian coordinates and
//! measure against the straight chord between the segment endpoints, which is
//! a flat-chord approximation: the chord sags below the surface arc by about
//! `L² / 8R` for a segment of length `L`, so the error grows with segment
//! length. At the sub-kilometer ranges used for matching it stays well below
//! a millimeter for city-block segments.

use crate::models::GeoPoint;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points in meters
pub fn great_circle_distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).to_radians();
    let delta_lon = (p2.lon - p1.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

fn to_cartesian(p: GeoPoint) -> [f64; 3] {
    let phi = p.lat.to_radians();
    let lambda = p.lon.to_radians();
    [
        EARTH_RADIUS_M * phi.cos() * lambda.cos(),
        EARTH_RADIUS_M * phi.cos() * lambda.sin(),
        EARTH_RADIUS_M * phi.sin(),
    ]
}

/// Distance in meters from `point` to the segment `a`-`b`.
///
/// The projection parameter is clamped to `[0, 1]`, so points beyond either
/// end measure against that endpoint. A degenerate segment (both endpoints
/// map to the same Cartesian position) falls back to
/// [`great_circle_distance`].
pub fn point_to_segment_distance(point: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
    let pa = to_cartesian(a);
    let pb = to_cartesian(b);
    let pp = to_cartesian(point);

    let ab = [pb[0] - pa[0], pb[1] - pa[1], pb[2] - pa[2]];
    let ap = [pp[0] - pa[0], pp[1] - pa[1], pp[2] - pa[2]];

    let ab_ab = ab[0] * ab[0] + ab[1] * ab[1] + ab[2] * ab[2];
    if ab_ab == 0.0 {
        return great_circle_distance(point, a);
    }

    let ab_ap = ab[0] * ap[0] + ab[1] * ap[1] + ab[2] * ap[2];
    let t = (ab_ap / ab_ab).clamp(0.0, 1.0);

    let closest = [pa[0] + t * ab[0], pa[1] + t * ab[1], pa[2] + t * ab[2]];
    let dx = pp[0] - closest[0];
    let dy = pp[1] - closest[1];
    let dz = pp[2] - closest[2];

    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Convert meters to degrees of latitude (for building test geometry and
/// rough offsets)
pub fn meters_to_degrees_lat(meters: f64) -> f64 {
    (meters / EARTH_RADIUS_M).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{HaversineDistance, Point};

    fn facility() -> GeoPoint {
        GeoPoint::new(-34.90, -57.95)
    }

    #[test]
    fn test_great_circle_distance() {
        // Distance from NYC to LA is approximately 3,936 km
        let nyc = GeoPoint::new(40.7128, -74.0060);
        let la = GeoPoint::new(34.0522, -118.2437);

        let dist = great_circle_distance(nyc, la);
        assert!((dist - 3_936_000.0).abs() < 50_000.0); // Within 50km
    }

    #[test]
    fn test_distance_symmetry_and_identity() {
        let points = [
            facility(),
            GeoPoint::new(-34.921, -57.954),
            GeoPoint::new(51.5, -0.12),
            GeoPoint::new(-89.9, 179.9),
        ];

        for p in points {
            assert_eq!(great_circle_distance(p, p), 0.0);
            for q in points {
                assert!((great_circle_distance(p, q) - great_circle_distance(q, p)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_agrees_with_geo_haversine() {
        // geo uses a slightly larger mean radius, so compare relatively
        let a = facility();
        let b = GeoPoint::new(-34.921, -57.954);
        let ours = great_circle_distance(a, b);
        let theirs = Point::from(a).haversine_distance(&Point::from(b));
        assert_relative_eq!(ours, theirs, max_relative = 1e-5);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = great_circle_distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert_relative_eq!(d, 111_194.93, epsilon = 0.01);
        assert_relative_eq!(meters_to_degrees_lat(d), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_segment_is_point_distance() {
        let p = facility();
        for a in [
            GeoPoint::new(-34.9012, -57.9531),
            GeoPoint::new(-34.95, -57.90),
            p,
        ] {
            assert_eq!(point_to_segment_distance(p, a, a), great_circle_distance(p, a));
        }
    }

    #[test]
    fn test_perpendicular_distance() {
        // East-west segment 150 m north of the facility
        let p = facility();
        let lat = p.lat + meters_to_degrees_lat(150.0);
        let a = GeoPoint::new(lat, -57.96);
        let b = GeoPoint::new(lat, -57.94);

        let d = point_to_segment_distance(p, a, b);
        assert_relative_eq!(d, 150.0, epsilon = 0.5);
    }

    #[test]
    fn test_projection_clamps_to_endpoint() {
        // Segment lies entirely east of the facility; nearest point is `a`
        let p = facility();
        let a = GeoPoint::new(p.lat, -57.94);
        let b = GeoPoint::new(p.lat, -57.93);

        let d = point_to_segment_distance(p, a, b);
        assert_relative_eq!(d, great_circle_distance(p, a), max_relative = 1e-6);
    }

    #[test]
    fn test_point_on_segment() {
        let p = facility();
        let a = GeoPoint::new(-34.91, p.lon);
        let b = GeoPoint::new(-34.89, p.lon);
        // Only the chord sagitta (about 0.1 m over 2.2 km) separates them
        assert!(point_to_segment_distance(p, a, b) < 0.2);
    }

    #[test]
    fn test_bounded_by_endpoint_distances() {
        let p = facility();
        let ring = [
            GeoPoint::new(-34.9031, -57.9488),
            GeoPoint::new(-34.8977, -57.9522),
            GeoPoint::new(-34.8992, -57.9571),
            GeoPoint::new(-34.9048, -57.9540),
            GeoPoint::new(-34.9001, -57.9463),
        ];

        for a in ring {
            for b in ring {
                let d = point_to_segment_distance(p, a, b);
                let bound = great_circle_distance(p, a).max(great_circle_distance(p, b));
                assert!(d >= 0.0);
                assert!(d <= bound + 1e-3, "{} > {}", d, bound);
            }
        }
    }
}
