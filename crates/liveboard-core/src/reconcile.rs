//! Apply a shared-document snapshot to the local scene.
//!
//! The object currently under local editing is never overwritten or
//! removed: the local gesture wins until it is released and re-synced.

use crate::canvas::CanvasEngine;
use crate::record::ShapeRecord;
use crate::shapes::{Shape, ShapeId};
use std::collections::HashSet;

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Overwrites or removals skipped because the object is being edited.
    pub skipped: usize,
    /// Records that could not be turned into objects.
    pub failed: usize,
    /// Whether a corrective pass ran after a stale diff.
    pub resynced: bool,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0
    }
}

/// Diff `snapshot` against the live objects of `engine` and apply the
/// minimal set of adds, overwrites and removals.
pub fn reconcile<E: CanvasEngine>(
    engine: &mut E,
    snapshot: &[(String, ShapeRecord)],
    active: Option<ShapeId>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let mut wanted: HashSet<ShapeId> = HashSet::with_capacity(snapshot.len());

    for (key, record) in snapshot {
        let id = match record.shape_id() {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Ignoring document entry {}: {}", key, e);
                report.failed += 1;
                continue;
            }
        };
        wanted.insert(id);

        if !engine.contains(id) {
            match engine.create_object(record) {
                Ok(_) => report.added += 1,
                Err(e) => {
                    log::warn!("Could not create shape {}: {}", id, e);
                    report.failed += 1;
                }
            }
        } else if Some(id) == active {
            if engine.serialize(id).as_ref() != Some(record) {
                log::debug!("Skipping remote update of actively edited shape {}", id);
                report.skipped += 1;
            }
        } else {
            match engine.apply_record(record) {
                Ok(true) => report.updated += 1,
                Ok(false) => {}
                Err(e) => {
                    log::warn!("Could not update shape {}: {}", id, e);
                    report.failed += 1;
                }
            }
        }
    }

    for id in engine.object_ids() {
        if wanted.contains(&id) {
            continue;
        }
        // May be an in-progress shape that has not been upserted yet
        if Some(id) == active {
            report.skipped += 1;
            continue;
        }
        engine.remove_object(id);
        report.removed += 1;
    }

    // A created id that still is not live means the diff was stale
    let missing = snapshot.iter().any(|(_, record)| {
        record
            .shape_id()
            .is_ok_and(|id| !engine.contains(id) && Shape::from_record(record).is_ok())
    });
    if missing {
        log::warn!("Scene diverged from document after reconcile, resyncing");
        report.resynced = true;
        for (_, record) in snapshot {
            if let Ok(id) = record.shape_id() {
                if !engine.contains(id) && engine.create_object(record).is_ok() {
                    report.added += 1;
                }
            }
        }
    }

    if !report.is_noop() {
        log::debug!("Reconciled scene: {:?}", report);
    }
    report
}
