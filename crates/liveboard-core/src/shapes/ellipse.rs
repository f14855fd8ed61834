//! Ellipse shape.

use super::{ShapeId, ShapeKind, ShapeStyle, ShapeTrait};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ellipse inscribed in its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    /// Top-left corner of the bounding box.
    pub position: Point,
    /// Horizontal diameter.
    pub width: f64,
    /// Vertical diameter.
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Ellipse {
    /// Create a new ellipse from its bounding box.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Create a circle of the given radius whose bounding box starts at `position`.
    pub fn circle(position: Point, radius: f64) -> Self {
        Self::new(position, radius * 2.0, radius * 2.0)
    }

    pub(crate) fn reconstruct(
        id: ShapeId,
        origin: Point,
        size: Size,
        rotation: f64,
        style: ShapeStyle,
    ) -> Self {
        Self {
            id,
            position: origin,
            width: size.width,
            height: size.height,
            rotation,
            style,
        }
    }

    /// Center of the ellipse.
    pub fn center(&self) -> Point {
        self.bounds().center()
    }
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Ellipse
    }

    fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, (self.width, self.height))
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn set_size(&mut self, width: f64, height: f64) -> bool {
        self.width = width;
        self.height = height;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle() {
        let e = Ellipse::circle(Point::new(0.0, 0.0), 50.0);
        assert!((e.width - 100.0).abs() < f64::EPSILON);
        let c = e.center();
        assert!((c.x - 50.0).abs() < f64::EPSILON);
        assert!((c.y - 50.0).abs() < f64::EPSILON);
    }
}
