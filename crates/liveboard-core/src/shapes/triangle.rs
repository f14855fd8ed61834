//! Triangle shape.

use super::{ShapeId, ShapeKind, ShapeStyle, ShapeTrait};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isosceles triangle with its apex at the top-center of its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub(crate) id: ShapeId,
    pub position: Point,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    pub style: ShapeStyle,
}

impl Triangle {
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

    /// The three vertices: apex, bottom-right, bottom-left.
    pub fn vertices(&self) -> [Point; 3] {
        let Point { x, y } = self.position;
        [
            Point::new(x + self.width / 2.0, y),
            Point::new(x + self.width, y + self.height),
            Point::new(x, y + self.height),
        ]
    }
}

impl ShapeTrait for Triangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Triangle
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
    fn test_vertices() {
        let t = Triangle::new(Point::new(0.0, 0.0), 100.0, 50.0);
        let [apex, right, left] = t.vertices();
        assert!((apex.x - 50.0).abs() < f64::EPSILON);
        assert!((right.y - 50.0).abs() < f64::EPSILON);
        assert!(left.x.abs() < f64::EPSILON);
    }
}
