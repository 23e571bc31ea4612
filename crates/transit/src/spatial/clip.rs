//! Bounding-box clipping for polylines.
//!
//! Clipping is vertex based: vertices outside the box are dropped and the
//! line is split wherever that happens. No intersection points are inserted
//! on the box edges.

use crate::models::{BoundingBox, GeoPoint, Polyline};

/// Split `line` into the runs of consecutive vertices that fall inside
/// `bbox` (bounds inclusive).
///
/// Runs shorter than two vertices are discarded since a one-point line is
/// not drawable.
pub fn clip_to_bbox(line: &[GeoPoint], bbox: &BoundingBox) -> Vec<Polyline> {
    clip_vertices(line.iter().map(|p| Some(*p)), bbox)
}

/// Like [`clip_to_bbox`], but over vertices that may have failed to parse.
/// A missing vertex breaks the current run just like an out-of-box one.
pub fn clip_vertices<I>(vertices: I, bbox: &BoundingBox) -> Vec<Polyline>
where
    I: IntoIterator<Item = Option<GeoPoint>>,
{
    let mut runs = Vec::new();
    let mut current: Polyline = Vec::new();

    for vertex in vertices {
        match vertex {
            Some(point) if bbox.contains(&point) => current.push(point),
            _ => {
                if current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }

    if current.len() > 1 {
        runs.push(current);
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(-35.20, -34.60, -58.30, -57.30)
    }

    fn inside(i: usize) -> GeoPoint {
        GeoPoint::new(-34.9 + i as f64 * 0.001, -57.95)
    }

    fn outside() -> GeoPoint {
        GeoPoint::new(-34.0, -57.95)
    }

    #[test]
    fn test_fully_inside() {
        let line = vec![inside(0), inside(1), inside(2)];
        assert_eq!(clip_to_bbox(&line, &bbox()), vec![line]);
    }

    #[test]
    fn test_world_box_keeps_line() {
        let line = vec![outside(), inside(0), GeoPoint::new(10.0, 20.0)];
        assert_eq!(clip_to_bbox(&line, &BoundingBox::world()), vec![line]);
    }

    #[test]
    fn test_fully_outside() {
        let line = vec![outside(), outside()];
        assert!(clip_to_bbox(&line, &bbox()).is_empty());
        assert!(clip_to_bbox(&[], &bbox()).is_empty());
    }

    #[test]
    fn test_splits_on_exit() {
        let line = vec![
            inside(0),
            inside(1),
            outside(),
            inside(2),
            inside(3),
            inside(4),
        ];

        let runs = clip_to_bbox(&line, &bbox());
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec![inside(0), inside(1)]);
        assert_eq!(runs[1], vec![inside(2), inside(3), inside(4)]);
    }

    #[test]
    fn test_single_vertex_runs_dropped() {
        let line = vec![outside(), inside(0), outside(), inside(1), outside(), inside(2)];
        assert!(clip_to_bbox(&line, &bbox()).is_empty());
    }

    #[test]
    fn test_runs_have_at_least_two_points() {
        let line: Vec<GeoPoint> = (0..40)
            .map(|i| if i % 3 == 0 || i % 7 == 0 { outside() } else { inside(i) })
            .collect();

        for run in clip_to_bbox(&line, &bbox()) {
            assert!(run.len() >= 2);
        }
    }

    #[test]
    fn test_boundary_is_inside() {
        let line = vec![GeoPoint::new(-35.20, -58.30), GeoPoint::new(-34.60, -57.30)];
        assert_eq!(clip_to_bbox(&line, &bbox()).len(), 1);
    }

    #[test]
    fn test_missing_vertex_breaks_run() {
        let vertices = vec![Some(inside(0)), Some(inside(1)), None, Some(inside(2)), Some(inside(3))];
        let runs = clip_vertices(vertices, &bbox());
        assert_eq!(runs.len(), 2);
    }
}
