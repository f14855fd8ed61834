//! Image shape referencing an external source.

use super::{ShapeId, ShapeKind, ShapeStyle, ShapeTrait};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An image placed on the board. Pixels are never stored; `src` is a URL or data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    /// Image source (URL or data URI).
    pub src: String,
    /// Style properties (stroke used for optional border).
    pub style: ShapeStyle,
}

impl Image {
    /// Create an image at its natural size.
    pub fn new(position: Point, src: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            rotation: 0.0,
            src: src.into(),
            style: ShapeStyle {
                fill: None,
                ..ShapeStyle::default()
            },
        }
    }

    pub(crate) fn reconstruct(
        id: ShapeId,
        origin: Point,
        size: Size,
        rotation: f64,
        src: String,
        style: ShapeStyle,
    ) -> Self {
        Self {
            id,
            position: origin,
            width: size.width,
            height: size.height,
            rotation,
            src,
            style,
        }
    }

    /// Scale the image to fit within max dimensions while preserving aspect ratio.
    pub fn fit_within(mut self, max_width: f64, max_height: f64) -> Self {
        if self.width <= 0.0 || self.height <= 0.0 {
            self.width = max_width;
            self.height = max_height;
            return self;
        }
        let aspect = self.width / self.height;
        if aspect > max_width / max_height {
            self.width = max_width;
            self.height = max_width / aspect;
        } else {
            self.height = max_height;
            self.width = max_height * aspect;
        }
        self
    }
}

impl ShapeTrait for Image {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn kind(&self) -> ShapeKind {
        ShapeKind::Image
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
