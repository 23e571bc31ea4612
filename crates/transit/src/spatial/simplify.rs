//! Minimum-spacing line simplification.
//!
//! Walks the line keeping a vertex only when it lies at least `tolerance_m`
//! from the previously kept one. The first and last vertices always survive.
//! Unlike Douglas-Peucker this never looks at perpendicular offsets, so sharp
//! corners closer than the tolerance are cut.

use crate::models::{GeoPoint, Polyline};
use crate::spatial::queries::great_circle_distance;

/// Simplify a polyline so consecutive kept vertices are at least
/// `tolerance_m` meters apart.
///
/// Lines of two or fewer points are returned unchanged. The final vertex is
/// appended even when it is closer than the tolerance, unless it coincides
/// with the last kept vertex. If that leaves fewer than two points (a closed
/// loop shorter than the tolerance) the first two input points are returned
/// so the result stays drawable.
pub fn simplify(line: &[GeoPoint], tolerance_m: f64) -> Polyline {
    if line.len() <= 2 {
        return line.to_vec();
    }

    let first = line[0];
    let last_orig = line[line.len() - 1];

    let mut result = Vec::with_capacity(line.len());
    result.push(first);
    let mut last_kept = first;

    for &current in &line[1..line.len() - 1] {
        if great_circle_distance(last_kept, current) >= tolerance_m {
            result.push(current);
            last_kept = current;
        }
    }

    if last_kept != last_orig {
        result.push(last_orig);
    }

    if result.len() < 2 {
        return line[..2].to_vec();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::queries::meters_to_degrees_lat;

    /// Points marching north from the facility area, `step` meters apart
    fn northward(count: usize, step: f64) -> Polyline {
        (0..count)
            .map(|i| GeoPoint::new(-34.9 + meters_to_degrees_lat(step * i as f64), -57.95))
            .collect()
    }

    #[test]
    fn test_short_lines_unchanged() {
        let p = GeoPoint::new(-34.9, -57.95);
        let q = GeoPoint::new(-34.9, -57.9500001);

        assert!(simplify(&[], 20.0).is_empty());
        assert_eq!(simplify(&[p], 20.0), vec![p]);
        assert_eq!(simplify(&[p, q], 20.0), vec![p, q]);
        assert_eq!(simplify(&[p, q], 0.0), vec![p, q]);
    }

    #[test]
    fn test_drops_dense_vertices() {
        let line = northward(11, 5.0); // 50 m total, a vertex every 5 m
        let simplified = simplify(&line, 18.0);

        // Kept at 0, 20, 40 m and the forced final vertex at 50 m
        assert_eq!(simplified.len(), 4);
        assert_eq!(simplified[1], line[4]);
        assert_eq!(simplified[2], line[8]);
        assert_eq!(simplified[3], line[10]);
    }

    #[test]
    fn test_keeps_endpoints() {
        for (count, step, tol) in [(3, 1.0, 20.0), (10, 30.0, 20.0), (25, 7.0, 50.0), (5, 1.0, 1000.0)] {
            let line = northward(count, step);
            let simplified = simplify(&line, tol);

            assert_eq!(simplified.first(), line.first());
            assert_eq!(simplified.last(), line.last());
            assert!(simplified.len() <= line.len());
            assert!(simplified.len() >= 2);
        }
    }

    #[test]
    fn test_sparse_line_unchanged() {
        let line = northward(6, 25.0);
        assert_eq!(simplify(&line, 20.0), line);
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        let line = northward(3, 20.0);
        let simplified = simplify(&line, great_circle_distance(line[0], line[1]));
        assert_eq!(simplified.len(), 3);
    }

    #[test]
    fn test_collapsed_loop_keeps_two_points() {
        let a = GeoPoint::new(-34.9, -57.95);
        let b = GeoPoint::new(-34.90001, -57.95);
        let c = GeoPoint::new(-34.90001, -57.95001);

        let simplified = simplify(&[a, b, c, a], 20.0);
        assert_eq!(simplified, vec![a, b]);
    }

    #[test]
    fn test_repeat_simplification_is_stable() {
        // Not guaranteed in general; holds for this irregular sample
        let line: Polyline = [0.0, 3.0, 19.0, 22.0, 41.0, 45.0, 80.0, 95.0, 101.0, 140.0, 151.0]
            .iter()
            .map(|m| GeoPoint::new(-34.9 + meters_to_degrees_lat(*m), -57.95))
            .collect();

        let once = simplify(&line, 20.0);
        let twice = simplify(&once, 20.0);
        assert_eq!(once, twice);
    }
}
