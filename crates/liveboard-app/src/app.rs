//! Headless driver: two peers in a loopback room replaying a scripted session.

use kurbo::Point;
use liveboard_core::canvas::{CanvasEngine, CanvasEvent, Scene};
use liveboard_core::config::SessionConfig;
use liveboard_core::crdt::{CrdtDocument, SharedDocument};
use liveboard_core::input::{Key, KeyEvent, Modifiers};
use liveboard_core::session::{Session, SessionError};
use liveboard_core::shapes::ShapeId;
use liveboard_core::sync::{LoopbackConnection, LoopbackRoom};
use liveboard_core::timer::Millis;
use liveboard_core::tools::ToolKind;
use std::path::Path;
use thiserror::Error;

type Peer = Session<Scene, CrdtDocument, LoopbackConnection>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Script step failed: {0}")]
    Script(String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub room: String,
    pub session: SessionConfig,
    /// Simulated time between scripted steps.
    pub step_ms: Millis,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room: "liveboard".to_string(),
            session: SessionConfig::default(),
            step_ms: 16,
        }
    }
}

impl AppConfig {
    /// Load session tunables from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path)?;
        let session = SessionConfig::from_json(&json)?;
        log::info!("Loaded config from {:?}", path);
        Ok(Self {
            session,
            ..Self::default()
        })
    }
}

/// What the scripted run ended with.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub shapes: usize,
    pub converged: bool,
    pub reactions_seen: usize,
}

/// The headless application.
pub struct App {
    config: AppConfig,
    room: LoopbackRoom,
    alice: Peer,
    bob: Peer,
    now: Millis,
}

impl App {
    /// Create a new application with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a new application with custom configuration.
    pub fn with_config(config: AppConfig) -> Self {
        let room = LoopbackRoom::new(config.room.clone());
        let alice = Self::join(&room, &config);
        let bob = Self::join(&room, &config);
        Self {
            config,
            room,
            alice,
            bob,
            now: 0,
        }
    }

    fn join(room: &LoopbackRoom, config: &AppConfig) -> Peer {
        let session = config.session.clone();
        let document = CrdtDocument::with_history(&session.history);
        let viewport = &session.viewport;
        let scene = Scene::new(viewport.width, viewport.height);
        Session::new(scene, document, room.connect(), session, 0)
    }

    /// Run the script and report the final state.
    pub fn run(&mut self) -> Result<RunSummary, AppError> {
        log::info!("Replaying session in room {:?}", self.room.name());

        let id = self.draw_rectangle()?;
        self.drag(id)?;
        self.undo()?;
        self.chat()?;
        let reactions_seen = self.reactions()?;

        let shapes = self.alice.document().len();
        let converged = self.alice.document().entries() == self.bob.document().entries();
        for (id, kind) in self.bob.layers() {
            log::info!("Layer {:?} {}", kind, id);
        }
        self.alice.close();
        self.bob.close();
        Ok(RunSummary {
            shapes,
            converged,
            reactions_seen,
        })
    }

    fn step(&mut self) -> Result<(), AppError> {
        self.now += self.config.step_ms;
        self.alice.advance(self.now);
        self.bob.advance(self.now);
        self.room.pump(&mut [&mut self.alice, &mut self.bob])?;
        Ok(())
    }

    fn pointer(peer: &mut Peer, event: CanvasEvent) -> Result<(), AppError> {
        peer.handle_canvas_event(event)?;
        Ok(())
    }

    fn draw_rectangle(&mut self) -> Result<ShapeId, AppError> {
        self.alice.handle_tool_selection(ToolKind::Rectangle)?;
        let start = Point::new(10.0, 10.0);
        Self::pointer(&mut self.alice, CanvasEvent::PointerDown {
            pointer: start,
            target: None,
        })?;
        for i in 1..=4 {
            let t = i as f64 / 4.0;
            let pointer = Point::new(10.0 + 100.0 * t, 10.0 + 50.0 * t);
            Self::pointer(&mut self.alice, CanvasEvent::PointerMove { pointer })?;
            self.step()?;
        }
        Self::pointer(&mut self.alice, CanvasEvent::PointerUp {
            pointer: Point::new(110.0, 60.0),
        })?;
        self.step()?;

        let id = self
            .alice
            .engine()
            .object_ids()
            .last()
            .copied()
            .ok_or_else(|| AppError::Script("rectangle was not created".to_string()))?;
        log::info!(
            "Alice drew {}; Bob sees {} shape(s)",
            id,
            self.bob.engine().object_ids().len()
        );
        Ok(id)
    }

    fn drag(&mut self, id: ShapeId) -> Result<(), AppError> {
        Self::pointer(&mut self.alice, CanvasEvent::PointerDown {
            pointer: Point::new(50.0, 30.0),
            target: Some(id),
        })?;
        Self::pointer(&mut self.alice, CanvasEvent::PointerMove {
            pointer: Point::new(60.0, 40.0),
        })?;
        Self::pointer(&mut self.alice, CanvasEvent::PointerUp {
            pointer: Point::new(60.0, 40.0),
        })?;
        self.step()?;
        if let Some(record) = self.bob.document().get(&id.to_string()) {
            log::info!("After drag Bob has {} at ({}, {})", id, record.left, record.top);
        }
        Ok(())
    }

    fn undo(&mut self) -> Result<(), AppError> {
        let ctrl_z = KeyEvent::new(Key::Character('z'), Modifiers::CTRL);
        self.alice.handle_key(&ctrl_z)?;
        self.step()?;
        log::info!("Undo applied; document has {} shape(s)", self.bob.document().len());
        Ok(())
    }

    fn chat(&mut self) -> Result<(), AppError> {
        Self::pointer(&mut self.bob, CanvasEvent::PointerMove {
            pointer: Point::new(200.0, 120.0),
        })?;
        self.bob.handle_key(&KeyEvent::char('/'))?;
        for c in "hi there".chars() {
            self.bob.handle_key(&KeyEvent::char(c))?;
        }
        for overlay in self.alice.cursor_overlays() {
            log::info!(
                "Alice sees connection {} at ({}, {}) saying {:?}",
                overlay.connection_id,
                overlay.cursor.x,
                overlay.cursor.y,
                overlay.message
            );
        }
        self.bob.handle_key(&KeyEvent::plain(Key::Enter))?;
        self.bob.handle_key(&KeyEvent::plain(Key::Escape))?;
        Ok(())
    }

    /// Hold a reaction for half a second, return how many Alice received.
    fn reactions(&mut self) -> Result<usize, AppError> {
        self.bob.handle_key(&KeyEvent::char('e'))?;
        self.bob.select_reaction("🎉");
        Self::pointer(&mut self.bob, CanvasEvent::PointerDown {
            pointer: Point::new(200.0, 120.0),
            target: None,
        })?;
        let until = self.now + 500;
        while self.now < until {
            self.step()?;
        }
        Self::pointer(&mut self.bob, CanvasEvent::PointerUp {
            pointer: Point::new(200.0, 120.0),
        })?;
        let seen = self.alice.reactions().len();
        log::info!("Alice received {} reaction(s)", seen);
        Ok(seen)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_run_converges() {
        let mut config = AppConfig::default();
        // Keep the drag and the creation as separate undo steps
        config.session.history.merge_interval_ms = 0;
        let mut app = App::with_config(config);
        let summary = app.run().unwrap();
        assert!(summary.converged);
        assert_eq!(summary.shapes, 1);
        assert!(summary.reactions_seen > 0);
    }

    #[test]
    fn test_config_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"chat": {"max_message_len": 10}}"#).unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.session.chat.max_message_len, 10);
        assert_eq!(config.session.reactions.lifetime_ms, 4000);

        assert!(AppConfig::from_file(&dir.path().join("missing.json")).is_err());
    }
}
