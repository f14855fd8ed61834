//! Shape definitions for the whiteboard.
//!
//! Shapes form a closed set of variants. Every variant carries its own
//! geometry, a rotation in degrees and a [`ShapeStyle`]. Attribute edits
//! coming from the attribute panel are dispatched uniformly through
//! [`Shape::set_property`].

mod ellipse;
mod freehand;
mod image;
mod line;
mod rectangle;
mod text;
mod triangle;

pub use ellipse::Ellipse;
pub use freehand::Freehand;
pub use image::Image;
pub use line::Line;
pub use rectangle::Rectangle;
pub use text::Text;
pub use triangle::Triangle;

use kurbo::{Point, Rect, Size, Vec2};
use peniko::Color;
use peniko::color::{Srgb, parse_color};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for shapes.
///
/// Assigned once when the shape is first created and kept across every
/// serialize/deserialize round trip. It doubles as the key of the shape in
/// the shared document.
pub type ShapeId = Uuid;

/// Errors raised when a property edit cannot be applied to a shape.
#[derive(Debug, Error, PartialEq)]
pub enum PropertyError {
    #[error("Unknown property: {0}")]
    Unknown(String),
    #[error("Invalid value for {property}: {value}")]
    InvalidValue { property: String, value: String },
    #[error("Property {property} does not apply to {kind:?}")]
    NotApplicable { property: String, kind: ShapeKind },
}

/// Closed set of shape kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Triangle,
    Line,
    FreeDraw,
    Image,
    Text,
}

impl ShapeKind {
    /// Tag used in serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Line => "line",
            ShapeKind::FreeDraw => "freedraw",
            ShapeKind::Image => "image",
            ShapeKind::Text => "text",
        }
    }

    /// Parse a record tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "rectangle" => Some(ShapeKind::Rectangle),
            "ellipse" => Some(ShapeKind::Ellipse),
            "triangle" => Some(ShapeKind::Triangle),
            "line" => Some(ShapeKind::Line),
            "freedraw" => Some(ShapeKind::FreeDraw),
            "image" => Some(ShapeKind::Image),
            "text" => Some(ShapeKind::Text),
            _ => None,
        }
    }
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse any CSS color string (`#abc`, `#aabbcc`, `rgb(...)`, named colors).
    pub fn parse(input: &str) -> Option<Self> {
        let color = parse_color(input.trim()).ok()?;
        Some(color.to_alpha_color::<Srgb>().into())
    }

    /// Lowercase hex form; the alpha byte is only written when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

/// Default fill and stroke color for new shapes.
pub const DEFAULT_COLOR: SerializableColor = SerializableColor {
    r: 0xaa,
    g: 0xbb,
    b: 0xcc,
    a: 0xff,
};

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Fill color (None = no fill).
    pub fill: Option<SerializableColor>,
    /// Stroke color (None = no stroke).
    pub stroke: Option<SerializableColor>,
    /// Stroke width.
    pub stroke_width: f64,
    /// Font size in pixels. Only rendered for text.
    pub font_size: f64,
    /// Font family name.
    pub font_family: String,
    /// CSS-style font weight (`"400"`, `"bold"`...).
    pub font_weight: String,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: Some(DEFAULT_COLOR),
            stroke: None,
            stroke_width: 1.0,
            font_size: 36.0,
            font_family: "Helvetica".to_string(),
            font_weight: "400".to_string(),
        }
    }
}

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Get the shape kind.
    fn kind(&self) -> ShapeKind;

    /// Get the axis-aligned bounding box (ignoring rotation).
    fn bounds(&self) -> Rect;

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;

    /// Move the shape by an offset.
    fn translate(&mut self, delta: Vec2);

    /// Stretch the shape so its bounding box has the given size, keeping
    /// the top-left corner in place. Returns false if the shape has no
    /// free size (text).
    fn set_size(&mut self, width: f64, height: f64) -> bool;
}

/// Enum wrapper for all shape types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Triangle(Triangle),
    Line(Line),
    FreeDraw(Freehand),
    Image(Image),
    Text(Text),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Rectangle($s) => $body,
            Shape::Ellipse($s) => $body,
            Shape::Triangle($s) => $body,
            Shape::Line($s) => $body,
            Shape::FreeDraw($s) => $body,
            Shape::Image($s) => $body,
            Shape::Text($s) => $body,
        }
    };
}

impl Shape {
    pub fn id(&self) -> ShapeId {
        dispatch!(self, s => s.id())
    }

    pub fn kind(&self) -> ShapeKind {
        dispatch!(self, s => s.kind())
    }

    pub fn bounds(&self) -> Rect {
        dispatch!(self, s => s.bounds())
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => s.style())
    }

    /// Stored width and height. Boxed kinds report their own fields so the
    /// value does not pick up rounding from `bounds()`.
    pub fn size(&self) -> Size {
        match self {
            Shape::Rectangle(r) => Size::new(r.width, r.height),
            Shape::Ellipse(e) => Size::new(e.width, e.height),
            Shape::Triangle(t) => Size::new(t.width, t.height),
            Shape::Image(i) => Size::new(i.width, i.height),
            Shape::Line(_) | Shape::FreeDraw(_) | Shape::Text(_) => self.bounds().size(),
        }
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => s.style_mut())
    }

    pub fn translate(&mut self, delta: Vec2) {
        dispatch!(self, s => s.translate(delta))
    }

    pub fn set_size(&mut self, width: f64, height: f64) -> bool {
        dispatch!(self, s => s.set_size(width, height))
    }

    /// Rotation angle in degrees.
    pub fn rotation(&self) -> f64 {
        dispatch!(self, s => s.rotation)
    }

    /// Set the rotation angle in degrees.
    pub fn set_rotation(&mut self, rotation: f64) {
        dispatch!(self, s => s.rotation = rotation)
    }

    /// Regenerate the shape's ID with a new unique identifier.
    /// Used when pasting so the copy does not collide with its source.
    pub fn regenerate_id(&mut self) {
        let new_id = Uuid::new_v4();
        dispatch!(self, s => s.id = new_id)
    }

    /// Move the shape so its bounding box starts at `position`.
    pub fn move_to(&mut self, position: Point) {
        let origin = self.bounds().origin();
        self.translate(position - origin);
    }

    /// Apply an attribute edit by property name.
    ///
    /// Returns `Ok(false)` when the property already had that value so the
    /// caller can skip the storage write.
    pub fn set_property(&mut self, property: &str, value: &str) -> Result<bool, PropertyError> {
        let invalid = || PropertyError::InvalidValue {
            property: property.to_string(),
            value: value.to_string(),
        };
        let number = || value.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        let color = || {
            if value.trim().is_empty() {
                Some(None)
            } else {
                SerializableColor::parse(value).map(Some)
            }
        };

        let not_applicable = |kind| PropertyError::NotApplicable {
            property: property.to_string(),
            kind,
        };

        let before = self.clone();
        if property.starts_with("font") && self.kind() != ShapeKind::Text {
            return Err(not_applicable(self.kind()));
        }
        match property {
            "width" | "height" => {
                let v = number().filter(|v| *v >= 0.0).ok_or_else(invalid)?;
                let size = self.size();
                let (w, h) = if property == "width" {
                    (v, size.height)
                } else {
                    (size.width, v)
                };
                if !self.set_size(w, h) {
                    return Err(not_applicable(self.kind()));
                }
            }
            "left" | "top" => {
                let v = number().ok_or_else(invalid)?;
                let origin = self.bounds().origin();
                let target = if property == "left" {
                    Point::new(v, origin.y)
                } else {
                    Point::new(origin.x, v)
                };
                self.move_to(target);
            }
            "angle" => {
                let v = number().ok_or_else(invalid)?;
                self.set_rotation(v);
            }
            "fill" => self.style_mut().fill = color().ok_or_else(invalid)?,
            "stroke" => self.style_mut().stroke = color().ok_or_else(invalid)?,
            "strokeWidth" => {
                self.style_mut().stroke_width = number().filter(|v| *v >= 0.0).ok_or_else(invalid)?
            }
            "fontSize" => {
                self.style_mut().font_size = number().filter(|v| *v > 0.0).ok_or_else(invalid)?
            }
            "fontFamily" => self.style_mut().font_family = value.to_string(),
            "fontWeight" => self.style_mut().font_weight = value.to_string(),
            "text" => match self {
                Shape::Text(t) => t.content = value.to_string(),
                other => return Err(not_applicable(other.kind())),
            },
            _ => return Err(PropertyError::Unknown(property.to_string())),
        }
        Ok(*self != before)
    }

    /// Follow the pointer while the shape is being drawn from `origin`.
    pub fn drag_to(&mut self, origin: Point, pointer: Point) {
        let rect = Rect::from_points(origin, pointer);
        match self {
            Shape::Rectangle(r) => {
                r.position = rect.origin();
                r.width = rect.width();
                r.height = rect.height();
            }
            Shape::Ellipse(e) => {
                e.position = rect.origin();
                e.width = rect.width();
                e.height = rect.height();
            }
            Shape::Triangle(t) => {
                t.position = rect.origin();
                t.width = rect.width();
                t.height = rect.height();
            }
            Shape::Image(i) => {
                i.position = rect.origin();
                i.width = rect.width();
                i.height = rect.height();
            }
            Shape::Line(l) => {
                l.start = origin;
                l.end = pointer;
            }
            Shape::FreeDraw(f) => f.add_point(pointer),
            // Text keeps the size of its content
            Shape::Text(_) => {}
        }
    }
}
