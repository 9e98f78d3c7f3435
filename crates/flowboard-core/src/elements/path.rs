//! Freehand path payload.

use super::SerializableColor;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Points of a freehand stroke, stored relative to the element's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathContent {
    /// Points relative to the bounding box origin.
    pub points: Vec<Point>,
    /// Stroke width in scene units.
    pub stroke_width: f64,
    /// Stroke color.
    pub stroke_color: SerializableColor,
}

impl PathContent {
    /// Normalize absolute scene points into a box origin, box size and relative points.
    ///
    /// Returns `None` for fewer than two points.
    pub fn from_scene_points(
        points: &[Point],
        stroke_width: f64,
        stroke_color: SerializableColor,
    ) -> Option<(Point, Size, Self)> {
        if points.len() < 2 {
            return None;
        }
        let bounds = points_bounds(points);
        let origin = Point::new(bounds.x0, bounds.y0);
        let relative = points.iter().map(|p| (*p - origin).to_point()).collect();
        Some((
            origin,
            bounds.size(),
            Self {
                points: relative,
                stroke_width,
                stroke_color,
            },
        ))
    }

    /// Rescale relative points from one box size to another.
    ///
    /// A zero extent on an axis leaves that axis untouched.
    pub fn rescale(&mut self, from: Size, to: Size) {
        let sx = if from.width > f64::EPSILON {
            to.width / from.width
        } else {
            1.0
        };
        let sy = if from.height > f64::EPSILON {
            to.height / from.height
        } else {
            1.0
        };
        for point in &mut self.points {
            point.x *= sx;
            point.y *= sy;
        }
    }

    /// Absolute points for an element anchored at `origin`.
    pub fn scene_points(&self, origin: Point) -> impl Iterator<Item = Point> + '_ {
        let offset = origin.to_vec2();
        self.points.iter().map(move |p| *p + offset)
    }

    /// Check whether `point` lies within `tolerance` of the stroke.
    pub fn hit_test(&self, origin: Point, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + self.stroke_width / 2.0;
        let local = (point - origin).to_point();
        point_to_polyline_dist(local, &self.points) <= reach
    }
}

/// Min/max bounding box of a point list.
pub fn points_bounds(points: &[Point]) -> Rect {
    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;

    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    if points.is_empty() {
        Rect::ZERO
    } else {
        Rect::new(min_x, min_y, max_x, max_y)
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (point - *only).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black() -> SerializableColor {
        SerializableColor::black()
    }

    #[test]
    fn test_single_point_is_rejected() {
        assert!(PathContent::from_scene_points(&[Point::new(5.0, 5.0)], 2.0, black()).is_none());
        assert!(PathContent::from_scene_points(&[], 2.0, black()).is_none());
    }

    #[test]
    fn test_points_are_relative_to_bounds() {
        let points = [
            Point::new(10.0, 40.0),
            Point::new(60.0, 20.0),
            Point::new(30.0, 90.0),
        ];
        let (origin, size, path) = PathContent::from_scene_points(&points, 2.0, black()).unwrap();
        assert_eq!(origin, Point::new(10.0, 20.0));
        assert_eq!(size, Size::new(50.0, 70.0));
        assert_eq!(path.points[0], Point::new(0.0, 20.0));
        assert_eq!(path.points[1], Point::new(50.0, 0.0));

        let absolute: Vec<Point> = path.scene_points(origin).collect();
        assert_eq!(absolute, points.to_vec());
    }

    #[test]
    fn test_rescale() {
        let mut path = PathContent {
            points: vec![Point::new(0.0, 0.0), Point::new(50.0, 50.0)],
            stroke_width: 2.0,
            stroke_color: black(),
        };
        path.rescale(Size::new(50.0, 50.0), Size::new(100.0, 25.0));
        assert_eq!(path.points[1], Point::new(100.0, 25.0));
    }

    #[test]
    fn test_rescale_flat_axis() {
        let mut path = PathContent {
            points: vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0)],
            stroke_width: 2.0,
            stroke_color: black(),
        };
        path.rescale(Size::new(50.0, 0.0), Size::new(100.0, 20.0));
        assert_eq!(path.points[1], Point::new(100.0, 0.0));
    }

    #[test]
    fn test_hit_test() {
        let path = PathContent {
            points: vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            stroke_width: 2.0,
            stroke_color: black(),
        };
        let origin = Point::new(10.0, 10.0);
        assert!(path.hit_test(origin, Point::new(60.0, 10.0), 5.0));
        assert!(!path.hit_test(origin, Point::new(60.0, 30.0), 5.0));
    }
}
