//! Liveboard Core Library
//!
//! Synchronization engine for the Liveboard collaborative whiteboard: the
//! bridge between a local scene and a replicated shape document, the
//! reconciler that applies remote state without clobbering local gestures,
//! and the ephemeral presence layer (cursors, chat, reactions).

pub mod attributes;
pub mod canvas;
pub mod collaboration;
pub mod config;
pub mod crdt;
pub mod input;
pub mod presence;
pub mod reconcile;
pub mod record;
pub mod session;
pub mod shapes;
pub mod sync;
pub mod timer;
pub mod tools;

pub use attributes::Attributes;
pub use canvas::{CanvasEngine, CanvasEvent, Scene, SceneError};
pub use collaboration::SyncBridge;
pub use config::SessionConfig;
pub use crdt::{CrdtDocument, DocumentError, SharedDocument};
pub use input::{Command, Key, KeyEvent, Modifiers};
pub use presence::{CursorState, LiveLayer, PresenceTransport, ReactionEvent};
pub use reconcile::{ReconcileReport, reconcile};
pub use record::{Payload, RecordError, ShapeRecord};
pub use session::{ContextMenuItem, Session, SessionError};
pub use shapes::{Shape, ShapeId, ShapeKind};
pub use sync::{LoopbackConnection, LoopbackRoom, Participant, UpdateRelay};
pub use timer::{IntervalTimer, Millis};
pub use tools::{InteractionState, ToolKind};
