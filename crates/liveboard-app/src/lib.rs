//! Liveboard Application
//!
//! Headless shell around the core: wires peers to a loopback room,
//! replays a scripted session and documents the keyboard surface.

mod app;
mod shortcuts;

pub use app::{App, AppConfig, AppError, RunSummary};
pub use shortcuts::{Shortcut, ShortcutRegistry};
