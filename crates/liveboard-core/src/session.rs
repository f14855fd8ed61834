//! Interaction controller.
//!
//! A [`Session`] is one client on the board. It owns the local scene, the
//! sync bridge to the shared document, the presence transport and the live
//! layer, and routes every event source through them:
//!
//! - canvas events: [`Session::handle_canvas_event`]
//! - keyboard: [`Session::handle_key`]
//! - toolbar: [`Session::handle_tool_selection`]
//! - the two reaction timers: [`Session::advance`]
//! - document updates and broadcasts: [`Session::poll`]
//!
//! Handlers run to completion one at a time on the caller's thread.

use crate::attributes::Attributes;
use crate::canvas::{CanvasEngine, CanvasEvent, SceneError};
use crate::collaboration::SyncBridge;
use crate::config::SessionConfig;
use crate::crdt::{DocumentError, SharedDocument};
use crate::input::{Command, KeyEvent, command_for};
use crate::presence::{
    self, ActiveUsers, CursorOverlay, CursorState, PresenceTransport, Reaction,
};
use crate::reconcile::{ReconcileReport, reconcile};
use crate::record::ShapeRecord;
use crate::shapes::{Image, Shape, ShapeId, ShapeKind};
use crate::sync::{Participant, UpdateRelay};
use crate::timer::Millis;
use crate::tools::{InteractionState, ToolKind, create_shape};
use kurbo::{Point, Vec2};
use thiserror::Error;

/// Tolerance for simplifying finished freehand strokes.
const FREEHAND_TOLERANCE: f64 = 1.0;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Clipboard does not hold a shape: {0}")]
    Clipboard(String),
}

/// Canvas context menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMenuItem {
    Chat,
    Undo,
    Redo,
    Reactions,
}

impl ContextMenuItem {
    pub const ALL: [ContextMenuItem; 4] = [
        ContextMenuItem::Chat,
        ContextMenuItem::Undo,
        ContextMenuItem::Redo,
        ContextMenuItem::Reactions,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ContextMenuItem::Chat => "Chat",
            ContextMenuItem::Undo => "Undo",
            ContextMenuItem::Redo => "Redo",
            ContextMenuItem::Reactions => "Reactions",
        }
    }

    pub fn shortcut(&self) -> &'static str {
        match self {
            ContextMenuItem::Chat => "/",
            ContextMenuItem::Undo => "⌘ + Z",
            ContextMenuItem::Redo => "⌘ + Y",
            ContextMenuItem::Reactions => "E",
        }
    }
}

/// Drag of an existing object in select mode.
#[derive(Debug, Clone, Copy)]
struct DragState {
    id: ShapeId,
    last: Point,
    moved: bool,
}

/// One client of a collaborative board.
pub struct Session<E: CanvasEngine, D: SharedDocument, T: PresenceTransport + UpdateRelay> {
    engine: E,
    bridge: SyncBridge<D>,
    /// `None` once the session is closed.
    transport: Option<T>,
    live: presence::LiveLayer,
    interaction: InteractionState,
    attributes: Attributes,
    config: SessionConfig,
    drag: Option<DragState>,
    /// Serialized record of the last copied shape.
    clipboard: Option<String>,
    image_requested: bool,
    /// A remote update to the active object was held back and must be
    /// applied once the object is released.
    held_back: bool,
    now: Millis,
}

impl<E: CanvasEngine, D: SharedDocument, T: PresenceTransport + UpdateRelay> Session<E, D, T> {
    /// Open a session at clock time `now`. Timers start immediately.
    pub fn new(mut engine: E, document: D, transport: T, config: SessionConfig, now: Millis) -> Self {
        engine.resize_viewport(config.viewport.width, config.viewport.height);
        let mut live = presence::LiveLayer::new(&config.reactions, &config.chat);
        live.start(now);
        log::info!("Opened session for connection {}", transport.connection_id());
        Self {
            engine,
            bridge: SyncBridge::new(document),
            transport: Some(transport),
            live,
            interaction: InteractionState::new(),
            attributes: Attributes::default(),
            config,
            drag: None,
            clipboard: None,
            image_requested: false,
            held_back: false,
            now,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable scene access for host-driven gestures. Report them with
    /// `ObjectScaling` while in progress and `ObjectModified` when done.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn document(&self) -> &D {
        self.bridge.document()
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn selected_tool(&self) -> ToolKind {
        self.interaction.selected_tool
    }

    /// Values for the attribute panel.
    pub fn current_attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn cursor_state(&self) -> &CursorState {
        self.live.state()
    }

    pub fn reactions(&self) -> &[Reaction] {
        self.live.reactions()
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// Whether the host should open an image picker. Cleared on read.
    pub fn take_image_request(&mut self) -> bool {
        std::mem::take(&mut self.image_requested)
    }

    /// `(id, kind)` for each document entry in document order.
    pub fn layers(&self) -> Vec<(String, ShapeKind)> {
        self.bridge
            .snapshot()
            .into_iter()
            .map(|(id, record)| (id, record.kind))
            .collect()
    }

    pub fn active_users_list(&self) -> ActiveUsers {
        let others = self.transport.as_ref().map(|t| t.others()).unwrap_or_default();
        presence::active_users(&others)
    }

    pub fn cursor_overlays(&self) -> Vec<CursorOverlay> {
        let others = self.transport.as_ref().map(|t| t.others()).unwrap_or_default();
        presence::cursor_overlays(&others)
    }

    // --- Canvas events ---------------------------------------------------

    pub fn handle_canvas_event(&mut self, event: CanvasEvent) -> Result<(), SessionError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };

        match event {
            CanvasEvent::PointerDown { pointer, target } => {
                self.live.pointer_down(pointer, transport);
                self.pointer_down(pointer, target);
            }
            CanvasEvent::PointerMove { pointer } => {
                self.live.pointer_move(pointer, transport);
                self.pointer_move(pointer)?;
            }
            CanvasEvent::PointerUp { pointer } => {
                self.live.pointer_up();
                self.pointer_up(pointer)?;
            }
            CanvasEvent::PointerLeave => self.live.pointer_leave(transport),
            CanvasEvent::ObjectModified { id } => {
                self.bridge.sync_shape(&self.engine, Some(id))?;
                // The transform is over; only a selection keeps protecting it
                if self.interaction.active_object == Some(id) && self.is_idle() {
                    self.release_active(self.engine.selected());
                }
            }
            CanvasEvent::SelectionCreated { id } => self.select(id),
            CanvasEvent::SelectionCleared => {
                self.engine.set_selected(None);
                if self.is_idle() {
                    self.release_active(None);
                }
            }
            CanvasEvent::ObjectScaling { id } => {
                if let Some(shape) = self.engine.object(id) {
                    self.attributes.update_size(shape);
                    self.interaction.active_object = Some(id);
                }
            }
        }
        Ok(())
    }

    fn pointer_down(&mut self, pointer: Point, target: Option<ShapeId>) {
        let tool = self.interaction.selected_tool;
        let Some(kind) = tool.shape_kind().filter(|k| *k != ShapeKind::Image) else {
            // Select mode: grab the target for dragging
            if let Some(id) = target.filter(|id| self.engine.contains(*id)) {
                self.select(id);
                self.interaction.active_object = Some(id);
                self.drag = Some(DragState {
                    id,
                    last: pointer,
                    moved: false,
                });
            }
            return;
        };

        // Clicking an existing shape of the tool's kind selects it
        if let Some(id) = target.filter(|id| self.engine.kind_of(*id) == Some(kind)) {
            self.interaction.is_drawing = false;
            self.select(id);
            return;
        }

        if tool == ToolKind::FreeDraw {
            self.engine.set_drawing_mode(true);
        }
        if let Some(shape) = create_shape(tool, pointer, &self.config.defaults) {
            let id = shape.id();
            self.engine.add_object(shape);
            self.interaction.begin(id, pointer);
            log::debug!("Started {:?} {} at ({}, {})", kind, id, pointer.x, pointer.y);
        }
    }

    fn pointer_move(&mut self, pointer: Point) -> Result<(), SessionError> {
        if self.interaction.is_drawing {
            let (Some(id), Some(origin)) = (self.interaction.active_object, self.interaction.draw_origin)
            else {
                return Ok(());
            };
            if self.interaction.selected_tool == ToolKind::FreeDraw {
                self.engine.append_point(id, pointer);
            } else {
                self.engine.update_geometry(id, origin, pointer);
            }
            // Every move is a full upsert so peers see the shape grow
            self.bridge.sync_shape(&self.engine, Some(id))?;
            return Ok(());
        }

        if let Some(drag) = self.drag.as_mut() {
            let delta: Vec2 = pointer - drag.last;
            drag.last = pointer;
            drag.moved |= delta != Vec2::ZERO;
            self.engine.translate(drag.id, delta);
        }
        Ok(())
    }

    fn pointer_up(&mut self, pointer: Point) -> Result<(), SessionError> {
        if let Some(drag) = self.drag.take() {
            if drag.moved || drag.last != pointer {
                self.engine.translate(drag.id, pointer - drag.last);
                self.handle_canvas_event(CanvasEvent::ObjectModified { id: drag.id })?;
            }
            return Ok(());
        }

        if !self.interaction.is_drawing {
            return Ok(());
        }
        let id = self.interaction.active_object;
        if self.interaction.selected_tool == ToolKind::FreeDraw {
            if let Some(id) = id {
                if let Some(Shape::FreeDraw(stroke)) = self.engine.object_mut(id) {
                    stroke.simplify(FREEHAND_TOLERANCE);
                }
            }
            self.engine.set_drawing_mode(false);
        }
        self.bridge.sync_shape(&self.engine, id)?;
        self.interaction.end();
        if let Some(id) = id {
            log::debug!("Finished shape {}", id);
        }
        Ok(())
    }

    /// No draw or drag gesture is in flight.
    fn is_idle(&self) -> bool {
        !self.interaction.is_drawing && self.drag.is_none()
    }

    /// Hand protection over to `next` and apply any remote state that was
    /// held back for the previous active object.
    fn release_active(&mut self, next: Option<ShapeId>) {
        if self.interaction.active_object == next {
            return;
        }
        self.interaction.active_object = next;
        if self.held_back {
            self.reconcile_scene(next);
        }
    }

    fn select(&mut self, id: ShapeId) {
        self.engine.set_selected(Some(id));
        if self.is_idle() && self.engine.selected() == Some(id) {
            self.release_active(Some(id));
        }
        if !self.interaction.is_editing {
            if let Some(shape) = self.engine.object(id) {
                self.attributes = Attributes::from_shape(shape);
            }
        }
    }

    // --- Keyboard ----------------------------------------------------------

    pub fn handle_key(&mut self, event: &KeyEvent) -> Result<(), SessionError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        // The chat input has focus while chatting
        if self.live.chat_key(event, transport) {
            return Ok(());
        }

        let Some(command) = command_for(event) else {
            return Ok(());
        };
        match command {
            Command::DeleteSelection => {
                if !self.interaction.is_editing {
                    self.delete_selection()?;
                }
            }
            Command::Undo => self.undo()?,
            Command::Redo => self.redo()?,
            Command::Copy => self.copy(),
            Command::Cut => self.cut()?,
            Command::Paste => {
                self.paste()?;
            }
            Command::OpenChat => self.live.open_chat(),
            Command::CloseChat => self.live.close_chat(transport),
            Command::OpenReactions => self.live.open_reaction_selector(),
        }
        Ok(())
    }

    pub fn context_menu(&mut self, item: ContextMenuItem) -> Result<(), SessionError> {
        if self.is_closed() {
            return Ok(());
        }
        match item {
            ContextMenuItem::Chat => self.live.open_chat(),
            ContextMenuItem::Undo => self.undo()?,
            ContextMenuItem::Redo => self.redo()?,
            ContextMenuItem::Reactions => self.live.open_reaction_selector(),
        }
        Ok(())
    }

    /// Pick a reaction in the selector.
    pub fn select_reaction(&mut self, reaction: &str) {
        if !self.is_closed() {
            self.live.select_reaction(reaction);
        }
    }

    pub fn undo(&mut self) -> Result<(), SessionError> {
        if self.bridge.undo()? {
            self.apply_history();
        }
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), SessionError> {
        if self.bridge.redo()? {
            self.apply_history();
        }
        Ok(())
    }

    /// Undo and redo are local intent: they reach a selected object too,
    /// only a gesture in flight stays protected.
    fn apply_history(&mut self) {
        self.bridge.take_changed();
        let gesture = if self.is_idle() {
            None
        } else {
            self.interaction.active_object
        };
        self.reconcile_scene(gesture);
    }

    /// Remove the selected (or actively edited) object locally and from storage.
    pub fn delete_selection(&mut self) -> Result<bool, SessionError> {
        let Some(id) = self.engine.selected().or(self.interaction.active_object) else {
            return Ok(false);
        };
        self.engine.remove_object(id);
        self.bridge.delete_shape(id)?;
        if self.interaction.active_object == Some(id) {
            self.interaction.active_object = None;
            self.interaction.is_drawing = false;
        }
        self.drag = None;
        self.attributes = Attributes::default();
        log::debug!("Deleted shape {}", id);
        Ok(true)
    }

    // --- Clipboard -----------------------------------------------------------

    pub fn copy(&mut self) {
        let Some(record) = self.engine.selected().and_then(|id| self.engine.serialize(id)) else {
            return;
        };
        match serde_json::to_string(&record) {
            Ok(json) => self.clipboard = Some(json),
            Err(e) => log::warn!("Could not copy shape {}: {}", record.id, e),
        }
    }

    pub fn cut(&mut self) -> Result<(), SessionError> {
        self.copy();
        if self.clipboard.is_some() {
            self.delete_selection()?;
        }
        Ok(())
    }

    /// Re-create the copied shape with a fresh id, offset from the source.
    pub fn paste(&mut self) -> Result<Option<ShapeId>, SessionError> {
        let Some(json) = self.clipboard.as_deref() else {
            return Ok(None);
        };
        let record: ShapeRecord =
            serde_json::from_str(json).map_err(|e| SessionError::Clipboard(e.to_string()))?;
        let mut shape = Shape::from_record(&record).map_err(SceneError::from)?;
        shape.regenerate_id();
        let offset = self.config.defaults.paste_offset;
        shape.translate(Vec2::new(offset, offset));

        let id = shape.id();
        let pasted = shape.to_record();
        self.engine.add_object(shape);
        self.bridge.sync_record(Some(&pasted))?;
        self.select(id);
        // Next paste cascades from this copy
        self.clipboard = serde_json::to_string(&pasted).ok();
        Ok(Some(id))
    }

    // --- Toolbar -------------------------------------------------------------

    pub fn handle_tool_selection(&mut self, tool: ToolKind) -> Result<(), SessionError> {
        if self.is_closed() {
            return Ok(());
        }
        self.drag = None;
        match tool {
            ToolKind::Reset => {
                self.reset_all()?;
            }
            ToolKind::Delete => {
                self.delete_selection()?;
                self.interaction.set_tool(ToolKind::Select);
            }
            ToolKind::Image => {
                self.interaction.set_tool(ToolKind::Image);
                self.engine.set_drawing_mode(false);
                self.image_requested = true;
            }
            ToolKind::FreeDraw => {
                self.interaction.set_tool(tool);
                self.engine.set_drawing_mode(true);
            }
            _ => {
                self.interaction.set_tool(tool);
                self.engine.set_drawing_mode(false);
            }
        }
        Ok(())
    }

    /// Clear the shared document, then the local scene once the document
    /// confirms it is empty.
    pub fn reset_all(&mut self) -> Result<bool, SessionError> {
        if !self.bridge.delete_all()? {
            log::warn!("Shared document not empty after clear; keeping local scene");
            return Ok(false);
        }
        self.engine.clear_all();
        self.interaction.reset();
        self.attributes = Attributes::default();
        self.drag = None;
        log::info!("Board reset");
        Ok(true)
    }

    /// Add an image scaled to the configured box, then sync it.
    pub fn insert_image(
        &mut self,
        src: &str,
        natural_width: f64,
        natural_height: f64,
    ) -> Result<Option<ShapeId>, SessionError> {
        if self.is_closed() {
            return Ok(None);
        }
        let size = self.config.defaults.image_box;
        let image = Image::new(Point::ZERO, src, natural_width, natural_height).fit_within(size, size);
        let shape = Shape::Image(image);
        let id = shape.id();
        self.engine.add_object(shape);
        self.bridge.sync_shape(&self.engine, Some(id))?;
        self.image_requested = false;
        self.interaction.set_tool(ToolKind::Select);
        log::debug!("Inserted image {}", id);
        Ok(Some(id))
    }

    // --- Attribute panel -------------------------------------------------------

    /// Focus entered (true) or left (false) an attribute field.
    pub fn attribute_focus(&mut self, focused: bool) {
        self.interaction.is_editing = focused;
    }

    /// Apply a panel edit to the selected object and sync it.
    pub fn edit_attribute(&mut self, property: &str, value: &str) -> Result<bool, SessionError> {
        if self.is_closed() {
            return Ok(false);
        }
        self.interaction.is_editing = true;
        self.attributes.set(property, value);
        let Some(id) = self.engine.selected().or(self.interaction.active_object) else {
            return Ok(false);
        };
        if !self.engine.set_property(id, property, value)? {
            return Ok(false);
        }
        self.bridge.sync_shape(&self.engine, Some(id))?;
        Ok(true)
    }

    // --- Transforms ------------------------------------------------------------

    /// Resize an object the way a scaling handle does: the object is
    /// protected while scaling and synced once the gesture ends.
    pub fn scale_object(
        &mut self,
        id: ShapeId,
        width: f64,
        height: f64,
    ) -> Result<bool, SessionError> {
        self.transform(id, &[("width", width), ("height", height)])
    }

    /// Rotate an object to `angle` degrees.
    pub fn rotate_object(&mut self, id: ShapeId, angle: f64) -> Result<bool, SessionError> {
        self.transform(id, &[("angle", angle)])
    }

    fn transform(&mut self, id: ShapeId, changes: &[(&str, f64)]) -> Result<bool, SessionError> {
        if self.is_closed() || !self.engine.contains(id) {
            return Ok(false);
        }
        let mut changed = false;
        for (property, value) in changes {
            changed |= self.engine.set_property(id, property, &value.to_string())?;
        }
        self.handle_canvas_event(CanvasEvent::ObjectScaling { id })?;
        self.handle_canvas_event(CanvasEvent::ObjectModified { id })?;
        Ok(changed)
    }

    // --- Clock, relay and teardown ---------------------------------------------

    /// Advance the session clock and run due timer ticks.
    pub fn advance(&mut self, now: Millis) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        self.now = self.now.max(now);
        self.live.receive(self.now, transport);
        self.live.tick(self.now, transport);
    }

    /// Exchange document updates and broadcasts, then reconcile if the
    /// document changed. Returns whether anything was sent or received.
    pub fn poll(&mut self) -> Result<bool, SessionError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(false);
        };
        let mut moved = false;

        for update in transport.drain_updates() {
            match self.bridge.document_mut().import(&update) {
                Ok(changed) => moved |= changed,
                Err(e) => log::warn!("Dropping undecodable remote update: {}", e),
            }
        }
        if let Some(update) = self.bridge.document_mut().export_pending()? {
            transport.send_update(update);
            moved = true;
        }
        moved |= self.live.receive(self.now, transport) > 0;

        self.refresh();
        Ok(moved)
    }

    /// Reconcile the scene with the document if it changed since last time.
    fn refresh(&mut self) -> Option<ReconcileReport> {
        if !self.bridge.take_changed() {
            return None;
        }
        Some(self.reconcile_scene(self.interaction.active_object))
    }

    fn reconcile_scene(&mut self, protected: Option<ShapeId>) -> ReconcileReport {
        let snapshot = self.bridge.snapshot();
        let report = reconcile(&mut self.engine, &snapshot, protected);
        self.held_back = report.skipped > 0;
        if let Some(id) = self.interaction.active_object {
            if !self.engine.contains(id) {
                self.interaction.active_object = None;
            }
        }
        if let Some(id) = self.engine.selected() {
            self.select(id);
        }
        report
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if !self.is_closed() {
            self.engine.resize_viewport(width, height);
        }
    }

    /// Tear the surface down: stop timers, leave the room and release the
    /// scene. Later events are ignored.
    pub fn close(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            return;
        };
        self.live.stop();
        self.live.pointer_leave(&mut transport);
        drop(transport);
        self.engine.clear_all();
        self.interaction.reset();
        self.drag = None;
        log::info!("Closed session");
    }
}

impl<E, D, T> Participant for Session<E, D, T>
where
    E: CanvasEngine,
    D: SharedDocument,
    T: PresenceTransport + UpdateRelay,
{
    type Error = SessionError;

    fn sync(&mut self) -> Result<bool, SessionError> {
        self.poll()
    }
}
