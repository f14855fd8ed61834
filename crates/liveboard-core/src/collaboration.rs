//! Sync bridge between the local scene and the shared document.
//!
//! Local mutations are serialized and upserted here; the reverse direction
//! is handled by [`crate::reconcile`].

use crate::canvas::CanvasEngine;
use crate::crdt::{DocumentError, SharedDocument};
use crate::record::ShapeRecord;
use crate::shapes::ShapeId;

/// Writes local shape state into a shared document.
pub struct SyncBridge<D: SharedDocument> {
    document: D,
}

impl<D: SharedDocument> SyncBridge<D> {
    pub fn new(document: D) -> Self {
        Self { document }
    }

    /// Get a reference to the shared document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Get a mutable reference to the shared document.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// Upsert a serialized shape under its id. `None` is a no-op.
    ///
    /// Returns whether the document changed; repeating an upsert with an
    /// unchanged record returns false and writes nothing.
    pub fn sync_record(&mut self, record: Option<&ShapeRecord>) -> Result<bool, DocumentError> {
        let Some(record) = record else {
            return Ok(false);
        };
        self.document.set(&record.id, record)
    }

    /// Serialize a live object and upsert it. Absent objects are a no-op.
    pub fn sync_shape<E: CanvasEngine>(
        &mut self,
        engine: &E,
        id: Option<ShapeId>,
    ) -> Result<bool, DocumentError> {
        let record = id.and_then(|id| engine.serialize(id));
        self.sync_record(record.as_ref())
    }

    /// Remove a shape's entry. Absent ids are a no-op.
    pub fn delete_shape(&mut self, id: ShapeId) -> Result<bool, DocumentError> {
        self.document.delete(&id.to_string())
    }

    /// Remove every entry. Returns true only when the document ended up
    /// empty; callers clear the local scene after that confirmation.
    pub fn delete_all(&mut self) -> Result<bool, DocumentError> {
        self.document.clear()?;
        let empty = self.document.is_empty();
        log::info!("Cleared shared document (empty: {})", empty);
        Ok(empty)
    }

    /// Step back in shared history; a no-op at the boundary.
    pub fn undo(&mut self) -> Result<bool, DocumentError> {
        if !self.document.can_undo() {
            return Ok(false);
        }
        self.document.undo()
    }

    /// Step forward in shared history; a no-op at the boundary.
    pub fn redo(&mut self) -> Result<bool, DocumentError> {
        if !self.document.can_redo() {
            return Ok(false);
        }
        self.document.redo()
    }

    /// Current document contents in document order.
    pub fn snapshot(&self) -> Vec<(String, ShapeRecord)> {
        self.document.entries()
    }

    /// Whether the document changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        self.document.take_changed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Scene;
    use crate::config::HistoryConfig;
    use crate::crdt::CrdtDocument;
    use crate::shapes::{Rectangle, Shape};
    use kurbo::Point;

    fn bridge() -> SyncBridge<CrdtDocument> {
        SyncBridge::new(CrdtDocument::with_history(&HistoryConfig {
            max_undo_steps: 100,
            merge_interval_ms: 0,
        }))
    }

    fn scene_with_rect() -> (Scene, ShapeId) {
        let mut scene = Scene::default();
        let shape = Shape::Rectangle(Rectangle::new(Point::new(10.0, 10.0), 100.0, 50.0));
        let id = shape.id();
        scene.add_object(shape);
        (scene, id)
    }

    #[test]
    fn test_sync_absent_object_is_noop() {
        let mut bridge = bridge();
        let scene = Scene::default();
        assert!(!bridge.sync_shape(&scene, None).unwrap());
        assert!(!bridge.sync_shape(&scene, Some(uuid::Uuid::new_v4())).unwrap());
        assert!(bridge.document().is_empty());
    }

    #[test]
    fn test_sync_is_idempotent() {
        let mut bridge = bridge();
        let (scene, id) = scene_with_rect();
        assert!(bridge.sync_shape(&scene, Some(id)).unwrap());
        let once = bridge.snapshot();
        assert!(!bridge.sync_shape(&scene, Some(id)).unwrap());
        assert_eq!(bridge.snapshot(), once);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut bridge = bridge();
        let (scene, id) = scene_with_rect();
        bridge.sync_shape(&scene, Some(id)).unwrap();
        let before = bridge.snapshot();
        assert!(!bridge.delete_shape(uuid::Uuid::new_v4()).unwrap());
        assert_eq!(bridge.snapshot(), before);
        assert!(bridge.delete_shape(id).unwrap());
        assert!(bridge.document().is_empty());
    }

    #[test]
    fn test_delete_all_reports_empty() {
        let mut bridge = bridge();
        assert!(bridge.delete_all().unwrap());

        let (scene, id) = scene_with_rect();
        bridge.sync_shape(&scene, Some(id)).unwrap();
        assert!(bridge.delete_all().unwrap());
        assert_eq!(bridge.document().len(), 0);
    }

    #[test]
    fn test_undo_redo_at_boundaries() {
        let mut bridge = bridge();
        assert!(!bridge.undo().unwrap());
        assert!(!bridge.redo().unwrap());
    }
}
