//! Straight line shape.

use super::{ShapeId, ShapeKind, ShapeStyle, ShapeTrait};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line segment between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub(crate) id: ShapeId,
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Line {
    /// Create a new line. Lines are stroked, not filled.
    pub fn new(start: Point, end: Point) -> Self {
        let mut style = ShapeStyle::default();
        style.stroke = style.fill.take();
        style.stroke_width = 2.0;
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            rotation: 0.0,
            style,
        }
    }

    pub(crate) fn reconstruct(
        id: ShapeId,
        start: Point,
        end: Point,
        rotation: f64,
        style: ShapeStyle,
    ) -> Self {
        Self {
            id,
            start,
            end,
            rotation,
            style,
        }
    }

    /// Length of the segment.
    pub fn length(&self) -> f64 {
        (self.end - self.start).hypot()
    }
}

impl ShapeTrait for Line {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Line
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }

    fn set_size(&mut self, width: f64, height: f64) -> bool {
        // Start stays fixed; the end keeps its direction on each axis.
        let sign = |d: f64| if d < 0.0 { -1.0 } else { 1.0 };
        let delta = self.end - self.start;
        self.end = Point::new(
            self.start.x + sign(delta.x) * width,
            self.start.y + sign(delta.y) * height,
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_bounds() {
        let line = Line::new(Point::new(100.0, 0.0), Point::new(0.0, 50.0));
        let b = line.bounds();
        assert!(b.x0.abs() < f64::EPSILON);
        assert!((b.x1 - 100.0).abs() < f64::EPSILON);
        assert!((b.y1 - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_line_is_stroked() {
        let line = Line::new(Point::ZERO, Point::new(1.0, 1.0));
        assert!(line.style.fill.is_none());
        assert!(line.style.stroke.is_some());
    }

    #[test]
    fn test_line_set_size() {
        let mut line = Line::new(Point::new(10.0, 10.0), Point::new(110.0, 60.0));
        line.set_size(200.0, 100.0);
        assert!((line.end.x - 210.0).abs() < f64::EPSILON);
        assert!((line.end.y - 110.0).abs() < f64::EPSILON);
        assert!((line.start.x - 10.0).abs() < f64::EPSILON);
    }
}
