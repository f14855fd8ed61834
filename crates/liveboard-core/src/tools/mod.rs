//! Tool modes and the local interaction state.

use crate::config::ShapeDefaults;
use crate::shapes::{
    Ellipse, Freehand, Line, Rectangle, SerializableColor, Shape, ShapeId, ShapeKind, Text,
    Triangle,
};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Toolbar entries. Shape tools draw; `Delete` and `Reset` are one-shot actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Rectangle,
    Ellipse,
    Triangle,
    Line,
    FreeDraw,
    Image,
    Text,
    Delete,
    Reset,
}

impl ToolKind {
    /// The shape this tool draws, if any.
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            ToolKind::Rectangle => Some(ShapeKind::Rectangle),
            ToolKind::Ellipse => Some(ShapeKind::Ellipse),
            ToolKind::Triangle => Some(ShapeKind::Triangle),
            ToolKind::Line => Some(ShapeKind::Line),
            ToolKind::FreeDraw => Some(ShapeKind::FreeDraw),
            ToolKind::Image => Some(ShapeKind::Image),
            ToolKind::Text => Some(ShapeKind::Text),
            ToolKind::Select | ToolKind::Delete | ToolKind::Reset => None,
        }
    }

    /// Toolbar label.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "Select",
            ToolKind::Rectangle => "Rectangle",
            ToolKind::Ellipse => "Circle",
            ToolKind::Triangle => "Triangle",
            ToolKind::Line => "Line",
            ToolKind::FreeDraw => "Free Drawing",
            ToolKind::Image => "Image",
            ToolKind::Text => "Text",
            ToolKind::Delete => "Delete",
            ToolKind::Reset => "Reset",
        }
    }
}

/// Local interaction state shared by every event handler.
///
/// Lifecycle: drawing state is cleared on tool change and on pointer-up;
/// everything is cleared on teardown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    pub selected_tool: ToolKind,
    /// The object under local editing; the reconciler never overwrites it.
    pub active_object: Option<ShapeId>,
    pub is_drawing: bool,
    /// Focus is inside an attribute field.
    pub is_editing: bool,
    /// Pointer position where the in-progress shape started.
    pub draw_origin: Option<Point>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch tools, dropping any in-progress drawing.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.selected_tool = tool;
        self.is_drawing = false;
        self.draw_origin = None;
    }

    /// Start drawing `id` from `origin`.
    pub fn begin(&mut self, id: ShapeId, origin: Point) {
        self.active_object = Some(id);
        self.is_drawing = true;
        self.draw_origin = Some(origin);
    }

    /// Finish a gesture: drawing stops and the tool returns to select.
    pub fn end(&mut self) {
        self.active_object = None;
        self.is_drawing = false;
        self.draw_origin = None;
        self.selected_tool = ToolKind::Select;
    }

    /// Forget everything (surface teardown, reset-all).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Build the shape a tool starts with at `at`, using the configured defaults.
pub fn create_shape(tool: ToolKind, at: Point, defaults: &ShapeDefaults) -> Option<Shape> {
    let size = defaults.shape_size;
    let mut shape = match tool.shape_kind()? {
        ShapeKind::Rectangle => Shape::Rectangle(Rectangle::new(at, size, size)),
        ShapeKind::Ellipse => Shape::Ellipse(Ellipse::new(at, size, size)),
        ShapeKind::Triangle => Shape::Triangle(Triangle::new(at, size, size)),
        ShapeKind::Line => Shape::Line(Line::new(at, at + Vec2::new(size, size))),
        ShapeKind::FreeDraw => Shape::FreeDraw(Freehand::from_points(vec![at])),
        ShapeKind::Text => Shape::Text(Text::new(at, defaults.text_content.clone())),
        // Images come from `insert_image`, never from a pointer gesture
        ShapeKind::Image => return None,
    };

    let style = shape.style_mut();
    match tool {
        ToolKind::Line | ToolKind::FreeDraw => {
            style.fill = None;
            style.stroke = SerializableColor::parse(&defaults.stroke);
        }
        _ => style.fill = SerializableColor::parse(&defaults.fill),
    }
    style.font_size = defaults.font_size;
    style.font_family = defaults.font_family.clone();
    style.font_weight = defaults.font_weight.clone();
    Some(shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_selection() {
        let mut state = InteractionState::new();
        assert_eq!(state.selected_tool, ToolKind::Select);

        state.set_tool(ToolKind::Rectangle);
        assert_eq!(state.selected_tool, ToolKind::Rectangle);
        assert!(!state.is_drawing);
    }

    #[test]
    fn test_gesture_lifecycle() {
        let mut state = InteractionState::new();
        state.set_tool(ToolKind::Ellipse);
        let id = uuid::Uuid::new_v4();

        state.begin(id, Point::new(1.0, 2.0));
        assert!(state.is_drawing);
        assert_eq!(state.active_object, Some(id));

        state.end();
        assert!(!state.is_drawing);
        assert_eq!(state.active_object, None);
        assert_eq!(state.selected_tool, ToolKind::Select);
    }

    #[test]
    fn test_tool_change_cancels_drawing() {
        let mut state = InteractionState::new();
        state.begin(uuid::Uuid::new_v4(), Point::ZERO);
        state.set_tool(ToolKind::Line);
        assert!(!state.is_drawing);
        assert!(state.draw_origin.is_none());
    }

    #[test]
    fn test_create_shape_defaults() {
        let defaults = ShapeDefaults::default();
        let rect = create_shape(ToolKind::Rectangle, Point::new(10.0, 10.0), &defaults).unwrap();
        let bounds = rect.bounds();
        assert!((bounds.width() - 100.0).abs() < f64::EPSILON);
        assert_eq!(rect.style().fill.map(|c| c.to_hex()).as_deref(), Some("#aabbcc"));

        let line = create_shape(ToolKind::Line, Point::ZERO, &defaults).unwrap();
        assert!(line.style().fill.is_none());
        assert!(line.style().stroke.is_some());

        let text = create_shape(ToolKind::Text, Point::ZERO, &defaults).unwrap();
        match &text {
            Shape::Text(t) => assert_eq!(t.content(), "Tap to Type"),
            other => panic!("Expected text, got {:?}", other),
        }
        assert!((text.style().font_size - 36.0).abs() < f64::EPSILON);

        assert!(create_shape(ToolKind::Select, Point::ZERO, &defaults).is_none());
        assert!(create_shape(ToolKind::Image, Point::ZERO, &defaults).is_none());
    }
}
