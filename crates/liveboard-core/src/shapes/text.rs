//! Text shape.

use super::{ShapeId, ShapeKind, ShapeStyle, ShapeTrait};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Average glyph advance relative to the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.6;
/// Line height relative to the font size.
const LINE_HEIGHT_FACTOR: f64 = 1.16;

/// A single- or multi-line text label. Its box follows from content and font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Position (top-left corner of text bounding box).
    pub position: Point,
    /// The text content.
    pub content: String,
    #[serde(default)]
    pub rotation: f64,
    /// Style properties. Font settings live here.
    pub style: ShapeStyle,
}

impl Text {
    /// Create a new text shape.
    pub fn new(position: Point, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content,
            rotation: 0.0,
            style: ShapeStyle::default(),
        }
    }

    pub(crate) fn reconstruct(
        id: ShapeId,
        position: Point,
        content: String,
        rotation: f64,
        style: ShapeStyle,
    ) -> Self {
        Self {
            id,
            position,
            content,
            rotation,
            style,
        }
    }

    /// Builder-style font size override.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.style.font_size = size;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn approximate_width(&self) -> f64 {
        let widest = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        widest as f64 * self.style.font_size * CHAR_WIDTH_FACTOR
    }

    fn approximate_height(&self) -> f64 {
        let mut lines = self.content.lines().count().max(1);
        if self.content.ends_with('\n') {
            lines += 1;
        }
        lines as f64 * self.style.font_size * LINE_HEIGHT_FACTOR
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Text
    }

    fn bounds(&self) -> Rect {
        Rect::from_origin_size(
            self.position,
            (self.approximate_width(), self.approximate_height()),
        )
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

    fn set_size(&mut self, _width: f64, _height: f64) -> bool {
        false
    }
}
