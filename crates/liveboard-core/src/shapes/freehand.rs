//! Freehand drawing shape.

use super::{ShapeId, ShapeKind, ShapeStyle, ShapeTrait};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A freehand stroke (series of points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freehand {
    pub(crate) id: ShapeId,
    /// Points in the stroke, in canvas coordinates.
    pub points: Vec<Point>,
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Freehand {
    /// Create a new empty stroke.
    pub fn new() -> Self {
        Self::from_points(Vec::new())
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>) -> Self {
        let mut style = ShapeStyle::default();
        style.stroke = style.fill.take();
        style.stroke_width = 2.0;
        Self {
            id: Uuid::new_v4(),
            points,
            rotation: 0.0,
            style,
        }
    }

    pub(crate) fn reconstruct(
        id: ShapeId,
        points: Vec<Point>,
        rotation: f64,
        style: ShapeStyle,
    ) -> Self {
        Self {
            id,
            points,
            rotation,
            style,
        }
    }

    /// Add a point to the stroke. Consecutive duplicates are dropped.
    pub fn add_point(&mut self, point: Point) {
        if self.points.last() != Some(&point) {
            self.points.push(point);
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Simplify the stroke by removing redundant points.
    pub fn simplify(&mut self, tolerance: f64) {
        if self.points.len() < 3 {
            return;
        }
        self.points = rdp_simplify(&self.points, tolerance);
    }
}

impl Default for Freehand {
    fn default() -> Self {
        Self::new()
    }
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let (max_index, max_dist) = points[1..points.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, perpendicular_distance(*p, first, last)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

/// Perpendicular distance from `point` to the line through `start` and `end`.
fn perpendicular_distance(point: Point, start: Point, end: Point) -> f64 {
    let line = end - start;
    let len = line.hypot();
    if len < f64::EPSILON {
        return (point - start).hypot();
    }
    (point - start).cross(line).abs() / len
}

impl ShapeTrait for Freehand {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::FreeDraw
    }

    fn bounds(&self) -> Rect {
        let mut iter = self.points.iter();
        let Some(first) = iter.next() else {
            return Rect::ZERO;
        };
        iter.fold(Rect::from_points(*first, *first), |acc, p| acc.union_pt(*p))
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }

    fn set_size(&mut self, width: f64, height: f64) -> bool {
        let bounds = self.bounds();
        if bounds.width() < f64::EPSILON || bounds.height() < f64::EPSILON {
            return false;
        }
        let (sx, sy) = (width / bounds.width(), height / bounds.height());
        let origin = bounds.origin();
        for point in &mut self.points {
            let d = *point - origin;
            *point = origin + Vec2::new(d.x * sx, d.y * sy);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freehand_creation() {
        let freehand = Freehand::new();
        assert!(freehand.is_empty());
        assert!(freehand.style.fill.is_none());
    }

    #[test]
    fn test_add_points() {
        let mut freehand = Freehand::new();
        freehand.add_point(Point::new(0.0, 0.0));
        freehand.add_point(Point::new(0.0, 0.0));
        freehand.add_point(Point::new(10.0, 10.0));
        assert_eq!(freehand.len(), 2);
    }

    #[test]
    fn test_bounds() {
        let freehand = Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 50.0),
            Point::new(50.0, 100.0),
        ]);

        let bounds = freehand.bounds();
        assert!((bounds.x0).abs() < f64::EPSILON);
        assert!((bounds.y0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 100.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_simplify() {
        let mut freehand = Freehand::from_points(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.1),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.1),
            Point::new(4.0, 0.0),
        ]);

        freehand.simplify(0.5);
        assert_eq!(freehand.len(), 2);
    }

    #[test]
    fn test_set_size_scales_points() {
        let mut freehand =
            Freehand::from_points(vec![Point::new(10.0, 10.0), Point::new(20.0, 30.0)]);
        assert!(freehand.set_size(20.0, 40.0));
        assert_eq!(freehand.points[1], Point::new(30.0, 50.0));

        let mut flat = Freehand::from_points(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert!(!flat.set_size(5.0, 5.0));
    }
}
