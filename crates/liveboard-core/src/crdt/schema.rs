//! Loro document schema and operations.

use super::convert::{record_from_loro, record_to_loro};
use super::{DocumentError, SharedDocument};
use crate::config::HistoryConfig;
use crate::record::ShapeRecord;
use loro::{
    Container, ExportMode, LoroDoc, LoroList, LoroMap, LoroResult, LoroValue, UndoManager,
    ValueOrContainer, VersionVector,
};

/// Key for the shapes map in the document.
pub const SHAPES_KEY: &str = "shapes";
/// Key for the list keeping shape ids in creation order.
pub const ORDER_KEY: &str = "order";

/// A CRDT-backed shared document of shape records.
///
/// Wraps a `LoroDoc` plus an `UndoManager`. The undo manager only steps
/// back transactions made by this peer, so one user's undo never reverts
/// another user's work.
pub struct CrdtDocument {
    doc: LoroDoc,
    undo_manager: UndoManager,
    /// Set on every mutation, drained by [`SharedDocument::take_changed`].
    changed: bool,
    /// Version last handed to peers by [`SharedDocument::export_pending`].
    exported: VersionVector,
}

impl CrdtDocument {
    /// Create a new empty document with default history settings.
    pub fn new() -> Self {
        Self::with_history(&HistoryConfig::default())
    }

    /// Create a new empty document.
    pub fn with_history(history: &HistoryConfig) -> Self {
        Self::from_doc(LoroDoc::new(), history)
    }

    /// Create a document from a snapshot.
    pub fn from_snapshot(bytes: &[u8], history: &HistoryConfig) -> Result<Self, DocumentError> {
        let doc = LoroDoc::new();
        doc.import(bytes)?;
        Ok(Self::from_doc(doc, history))
    }

    fn from_doc(doc: LoroDoc, history: &HistoryConfig) -> Self {
        let mut undo_manager = UndoManager::new(&doc);
        undo_manager.set_max_undo_steps(history.max_undo_steps);
        undo_manager.set_merge_interval(history.merge_interval_ms);
        let exported = doc.oplog_vv();
        Self {
            doc,
            undo_manager,
            changed: false,
            exported,
        }
    }

    fn shapes_map(&self) -> LoroMap {
        self.doc.get_map(SHAPES_KEY)
    }

    fn order_list(&self) -> LoroList {
        self.doc.get_list(ORDER_KEY)
    }

    /// Shape ids in creation order, without duplicates.
    pub fn order(&self) -> Vec<String> {
        let list = self.order_list();
        let mut result: Vec<String> = Vec::with_capacity(list.len());
        for i in 0..list.len() {
            if let Some(ValueOrContainer::Value(LoroValue::String(id))) = list.get(i) {
                let id = id.to_string();
                if !result.contains(&id) {
                    result.push(id);
                }
            }
        }
        result
    }

    fn remove_from_order(&self, id: &str) -> LoroResult<()> {
        let list = self.order_list();
        // Walk backwards so deleting keeps earlier indices valid
        for i in (0..list.len()).rev() {
            if let Some(ValueOrContainer::Value(LoroValue::String(s))) = list.get(i) {
                if s.as_ref() == id {
                    list.delete(i, 1)?;
                }
            }
        }
        Ok(())
    }

    /// Every stored shape value keyed by id.
    fn shape_values(&self) -> Option<loro::LoroMapValue> {
        match self.shapes_map().get_deep_value() {
            LoroValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Export the whole document.
    pub fn export_snapshot(&self) -> Result<Vec<u8>, DocumentError> {
        self.doc
            .export(ExportMode::Snapshot)
            .map_err(|e| DocumentError::Export(e.to_string()))
    }

    /// Export incremental updates since a version.
    pub fn export_updates(&self, since: &VersionVector) -> Result<Vec<u8>, DocumentError> {
        self.doc
            .export(ExportMode::updates(since))
            .map_err(|e| DocumentError::Export(e.to_string()))
    }

    /// Get the current version vector.
    pub fn version(&self) -> VersionVector {
        self.doc.oplog_vv()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_manager.undo_count()
    }
}

impl Default for CrdtDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedDocument for CrdtDocument {
    fn get(&self, id: &str) -> Option<ShapeRecord> {
        let shapes = self.shape_values()?;
        match shapes.get(id)? {
            LoroValue::Map(shape) => match record_from_loro(shape) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Stored shape {} does not decode: {}", id, e);
                    None
                }
            },
            _ => None,
        }
    }

    fn set(&mut self, id: &str, record: &ShapeRecord) -> Result<bool, DocumentError> {
        let shapes = self.shapes_map();
        let (shape_map, is_new) = match shapes.get(id) {
            Some(ValueOrContainer::Container(Container::Map(map))) => (map, false),
            _ => (shapes.insert_container(id, LoroMap::new())?, true),
        };

        let written = record_to_loro(record, &shape_map)?;
        if is_new {
            self.order_list().push(id)?;
        }
        if !written && !is_new {
            return Ok(false);
        }

        self.doc.commit();
        self.changed = true;
        log::debug!("Upserted shape {}", id);
        Ok(true)
    }

    fn delete(&mut self, id: &str) -> Result<bool, DocumentError> {
        let shapes = self.shapes_map();
        if shapes.get(id).is_none() {
            return Ok(false);
        }
        shapes.delete(id)?;
        self.remove_from_order(id)?;
        self.doc.commit();
        self.changed = true;
        log::debug!("Deleted shape {}", id);
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), DocumentError> {
        let list = self.order_list();
        let len = list.len();
        if len > 0 {
            list.delete(0, len)?;
        }

        let shapes = self.shapes_map();
        let keys: Vec<String> = self
            .shape_values()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        for key in &keys {
            shapes.delete(key)?;
        }

        self.doc.commit();
        self.changed = true;
        Ok(())
    }

    fn entries(&self) -> Vec<(String, ShapeRecord)> {
        let Some(shapes) = self.shape_values() else {
            return Vec::new();
        };

        let mut ids = self.order();
        ids.retain(|id| shapes.contains_key(id));
        // Keys missing from the order list (concurrent edits) go last, sorted
        let mut stray: Vec<String> = shapes.keys().filter(|k| !ids.contains(k)).cloned().collect();
        stray.sort();
        ids.extend(stray);

        ids.into_iter()
            .filter_map(|id| match shapes.get(&id) {
                Some(LoroValue::Map(shape)) => match record_from_loro(shape) {
                    Ok(record) => Some((id, record)),
                    Err(e) => {
                        log::warn!("Skipping undecodable shape {}: {}", id, e);
                        None
                    }
                },
                _ => None,
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.shapes_map().len()
    }

    fn undo(&mut self) -> Result<bool, DocumentError> {
        let done = self.undo_manager.undo()?;
        self.changed |= done;
        Ok(done)
    }

    fn redo(&mut self) -> Result<bool, DocumentError> {
        let done = self.undo_manager.redo()?;
        self.changed |= done;
        Ok(done)
    }

    fn can_undo(&self) -> bool {
        self.undo_manager.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.undo_manager.can_redo()
    }

    fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    fn export_pending(&mut self) -> Result<Option<Vec<u8>>, DocumentError> {
        let current = self.doc.oplog_vv();
        if current == self.exported {
            return Ok(None);
        }
        let bytes = self.export_updates(&self.exported)?;
        self.exported = current;
        Ok(Some(bytes))
    }

    fn import(&mut self, bytes: &[u8]) -> Result<bool, DocumentError> {
        let before = self.doc.oplog_vv();
        let in_sync = before == self.exported;
        self.doc.import(bytes)?;
        let after = self.doc.oplog_vv();
        if after == before {
            return Ok(false);
        }
        // Nothing local was pending, so the merged state needs no echo
        if in_sync {
            self.exported = after;
        }
        self.changed = true;
        Ok(true)
    }
}
