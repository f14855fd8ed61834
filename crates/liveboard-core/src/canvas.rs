//! Canvas engine interface and the in-memory scene.
//!
//! The engine owns the live, mutable shapes. Native handles are plain
//! [`ShapeId`]s; the engine never talks to the shared document itself.

use crate::record::{RecordError, ShapeRecord};
use crate::shapes::{PropertyError, Shape, ShapeId, ShapeKind};
use kurbo::{Point, Size, Vec2};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by scene mutations.
#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Events emitted by the canvas engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// Pointer pressed. `target` is the topmost object under the pointer.
    PointerDown {
        pointer: Point,
        target: Option<ShapeId>,
    },
    PointerMove {
        pointer: Point,
    },
    PointerUp {
        pointer: Point,
    },
    /// A drag, resize or rotate of an object finished.
    ObjectModified {
        id: ShapeId,
    },
    SelectionCreated {
        id: ShapeId,
    },
    SelectionCleared,
    /// An object is being scaled; fired repeatedly during the gesture.
    ObjectScaling {
        id: ShapeId,
    },
    /// Pointer left the canvas surface.
    PointerLeave,
}

/// The local scene graph the interaction controller drives.
pub trait CanvasEngine {
    /// Add an object, replacing any object with the same id in place.
    fn add_object(&mut self, shape: Shape);

    fn object(&self, id: ShapeId) -> Option<&Shape>;

    fn object_mut(&mut self, id: ShapeId) -> Option<&mut Shape>;

    /// Remove an object. Missing ids are ignored.
    fn remove_object(&mut self, id: ShapeId) -> Option<Shape>;

    /// Remove every object.
    fn clear_all(&mut self);

    fn resize_viewport(&mut self, width: f64, height: f64);

    fn viewport(&self) -> Size;

    /// Ids of live objects, back to front.
    fn object_ids(&self) -> Vec<ShapeId>;

    /// The currently selected object.
    fn selected(&self) -> Option<ShapeId>;

    fn set_selected(&mut self, id: Option<ShapeId>);

    /// Freehand brush mode.
    fn set_drawing_mode(&mut self, enabled: bool);

    fn is_drawing_mode(&self) -> bool;

    /// Instantiate an object from a record and add it.
    fn create_object(&mut self, record: &ShapeRecord) -> Result<ShapeId, SceneError> {
        let shape = Shape::from_record(record)?;
        let id = shape.id();
        self.add_object(shape);
        Ok(id)
    }

    /// Attribute snapshot of an object.
    fn serialize(&self, id: ShapeId) -> Option<ShapeRecord> {
        self.object(id).map(Shape::to_record)
    }

    /// Overwrite an object's attributes from a record.
    /// Returns false when the object already matched.
    fn apply_record(&mut self, record: &ShapeRecord) -> Result<bool, SceneError> {
        let shape = Shape::from_record(record)?;
        if self.object(shape.id()) == Some(&shape) {
            return Ok(false);
        }
        self.add_object(shape);
        Ok(true)
    }

    /// Set one attribute by name. Missing objects are ignored.
    fn set_property(&mut self, id: ShapeId, name: &str, value: &str) -> Result<bool, SceneError> {
        match self.object_mut(id) {
            Some(shape) => Ok(shape.set_property(name, value)?),
            None => Ok(false),
        }
    }

    fn contains(&self, id: ShapeId) -> bool {
        self.object(id).is_some()
    }

    fn kind_of(&self, id: ShapeId) -> Option<ShapeKind> {
        self.object(id).map(Shape::kind)
    }

    /// Track the pointer while an object is drawn from `origin`.
    fn update_geometry(&mut self, id: ShapeId, origin: Point, pointer: Point) -> bool {
        self.object_mut(id)
            .map(|shape| shape.drag_to(origin, pointer))
            .is_some()
    }

    /// Append a point to a freehand stroke.
    fn append_point(&mut self, id: ShapeId, point: Point) -> bool {
        match self.object_mut(id) {
            Some(Shape::FreeDraw(stroke)) => {
                stroke.add_point(point);
                true
            }
            _ => false,
        }
    }

    fn translate(&mut self, id: ShapeId, delta: Vec2) -> bool {
        self.object_mut(id).map(|shape| shape.translate(delta)).is_some()
    }
}

/// In-memory scene: shapes keyed by id plus their stacking order.
#[derive(Debug, Clone)]
pub struct Scene {
    shapes: HashMap<ShapeId, Shape>,
    /// Back to front.
    order: Vec<ShapeId>,
    viewport: Size,
    selection: Option<ShapeId>,
    drawing_mode: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            shapes: HashMap::new(),
            order: Vec::new(),
            viewport: Size::new(width, height),
            selection: None,
            drawing_mode: false,
        }
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Topmost object whose bounds contain `point`.
    pub fn object_at(&self, point: Point) -> Option<ShapeId> {
        self.order
            .iter()
            .rev()
            .copied()
            .find(|id| self.shapes.get(id).is_some_and(|s| s.bounds().contains(point)))
    }
}

impl CanvasEngine for Scene {
    fn add_object(&mut self, shape: Shape) {
        let id = shape.id();
        if self.shapes.insert(id, shape).is_none() {
            self.order.push(id);
        }
    }

    fn object(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    fn object_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    fn remove_object(&mut self, id: ShapeId) -> Option<Shape> {
        self.order.retain(|&shape_id| shape_id != id);
        if self.selection == Some(id) {
            self.selection = None;
        }
        self.shapes.remove(&id)
    }

    fn clear_all(&mut self) {
        self.shapes.clear();
        self.order.clear();
        self.selection = None;
    }

    fn resize_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width, height);
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn object_ids(&self) -> Vec<ShapeId> {
        self.order.clone()
    }

    fn selected(&self) -> Option<ShapeId> {
        self.selection
    }

    fn set_selected(&mut self, id: Option<ShapeId>) {
        self.selection = id.filter(|id| self.shapes.contains_key(id));
    }

    fn set_drawing_mode(&mut self, enabled: bool) {
        self.drawing_mode = enabled;
    }

    fn is_drawing_mode(&self) -> bool {
        self.drawing_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Freehand, Rectangle, Text};

    fn rect(x: f64, y: f64) -> Shape {
        Shape::Rectangle(Rectangle::new(Point::new(x, y), 100.0, 50.0))
    }

    #[test]
    fn test_scene_creation() {
        let scene = Scene::default();
        assert!(scene.is_empty());
        assert!((scene.viewport().width - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_and_remove() {
        let mut scene = Scene::default();
        let shape = rect(0.0, 0.0);
        let id = shape.id();
        scene.add_object(shape);
        scene.set_selected(Some(id));
        assert!(scene.contains(id));
        assert_eq!(scene.kind_of(id), Some(ShapeKind::Rectangle));

        assert!(scene.remove_object(id).is_some());
        assert!(scene.is_empty());
        assert_eq!(scene.selected(), None);
        assert!(scene.remove_object(id).is_none());
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut scene = Scene::default();
        let a = rect(0.0, 0.0);
        let b = rect(10.0, 10.0);
        let (a_id, b_id) = (a.id(), b.id());
        scene.add_object(a.clone());
        scene.add_object(b);

        let mut moved = a;
        moved.move_to(Point::new(50.0, 50.0));
        scene.add_object(moved);
        assert_eq!(scene.object_ids(), vec![a_id, b_id]);
        assert!((scene.object(a_id).unwrap().bounds().x0 - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_create_and_serialize_round_trip() {
        let mut scene = Scene::default();
        let record = Shape::Text(Text::new(Point::new(5.0, 5.0), "hey".to_string())).to_record();
        let id = scene.create_object(&record).unwrap();
        assert_eq!(scene.serialize(id), Some(record.clone()));
        assert_eq!(scene.apply_record(&record), Ok(false));
    }

    #[test]
    fn test_set_property_missing_object() {
        let mut scene = Scene::default();
        assert_eq!(scene.set_property(uuid::Uuid::new_v4(), "width", "10"), Ok(false));
    }

    #[test]
    fn test_object_at_prefers_topmost() {
        let mut scene = Scene::default();
        let below = rect(0.0, 0.0);
        let above = rect(50.0, 25.0);
        let above_id = above.id();
        scene.add_object(below);
        scene.add_object(above);
        assert_eq!(scene.object_at(Point::new(60.0, 30.0)), Some(above_id));
        assert_eq!(scene.object_at(Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn test_append_point() {
        let mut scene = Scene::default();
        let stroke = Shape::FreeDraw(Freehand::new());
        let id = stroke.id();
        scene.add_object(stroke);
        assert!(scene.append_point(id, Point::new(1.0, 1.0)));

        let other = rect(0.0, 0.0);
        let other_id = other.id();
        scene.add_object(other);
        assert!(!scene.append_point(other_id, Point::ZERO));
    }
}
