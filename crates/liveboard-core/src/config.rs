//! Session tunables.
//!
//! Every group deserializes with `#[serde(default)]`, so a JSON file only
//! needs to name the values it overrides.

use serde::{Deserialize, Serialize};

/// Reaction timing, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// How often a held reaction emits a new event.
    pub emit_interval_ms: u64,
    /// How often expired reactions are swept.
    pub gc_interval_ms: u64,
    /// How long a reaction stays visible.
    pub lifetime_ms: u64,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            emit_interval_ms: 100,
            gc_interval_ms: 1000,
            lifetime_ms: 4000,
        }
    }
}

/// Undo history settings for the shared document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_undo_steps: usize,
    /// Local edits closer together than this are merged into one undo step.
    pub merge_interval_ms: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo_steps: 100,
            merge_interval_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Longest chat message accepted, in characters.
    pub max_message_len: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_len: 50,
        }
    }
}

/// Defaults applied to newly created shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeDefaults {
    pub fill: String,
    pub stroke: String,
    pub font_size: f64,
    pub font_family: String,
    pub font_weight: String,
    /// Edge length of a shape created by a click without drag.
    pub shape_size: f64,
    pub text_content: String,
    /// Images are scaled to fit a square of this size.
    pub image_box: f64,
    /// Offset applied to pasted shapes on both axes.
    pub paste_offset: f64,
}

impl Default for ShapeDefaults {
    fn default() -> Self {
        Self {
            fill: "#aabbcc".to_string(),
            stroke: "#aabbcc".to_string(),
            font_size: 36.0,
            font_family: "Helvetica".to_string(),
            font_weight: "400".to_string(),
            shape_size: 100.0,
            text_content: "Tap to Type".to_string(),
            image_box: 200.0,
            paste_offset: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// All tunables of a collaborative session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub reactions: ReactionConfig,
    pub history: HistoryConfig,
    pub chat: ChatConfig,
    pub defaults: ShapeDefaults,
    pub viewport: ViewportConfig,
}

impl SessionConfig {
    /// Parse a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
