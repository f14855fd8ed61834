//! Ephemeral presence, cursor chat and flying reactions.
//!
//! Nothing here touches the shared document. Presence is owned by its
//! connection and read-only to everybody else; reaction events are
//! fire-and-forget and may be dropped.

use crate::config::{ChatConfig, ReactionConfig};
use crate::input::{Key, KeyEvent};
use crate::timer::{IntervalTimer, Millis};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Connection identifier assigned by the transport.
pub type ConnectionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

impl From<Point> for CursorPosition {
    fn from(point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

/// Presence state of one connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Partial presence update. `None` leaves a field untouched,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresencePatch {
    pub cursor: Option<Option<CursorPosition>>,
    pub message: Option<Option<String>>,
}

impl PresencePatch {
    pub fn cursor(cursor: Option<CursorPosition>) -> Self {
        Self {
            cursor: Some(cursor),
            ..Self::default()
        }
    }

    pub fn message(message: Option<String>) -> Self {
        Self {
            message: Some(message),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = Some(message);
        self
    }

    /// Apply the patch in place.
    pub fn apply(self, presence: &mut Presence) {
        if let Some(cursor) = self.cursor {
            presence.cursor = cursor;
        }
        if let Some(message) = self.message {
            presence.message = message;
        }
    }
}

/// Another connection in the room.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub connection_id: ConnectionId,
    pub presence: Presence,
}

/// Broadcast payload for a reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub x: f64,
    pub y: f64,
    pub value: String,
}

/// A reaction in the locally rendered list.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub point: Point,
    pub value: String,
    pub timestamp: Millis,
}

/// Presence and broadcast channel of one connection.
pub trait PresenceTransport {
    fn connection_id(&self) -> ConnectionId;

    fn my_presence(&self) -> Presence;

    fn update_my_presence(&mut self, patch: PresencePatch);

    /// Every other connection, ordered by id.
    fn others(&self) -> Vec<Peer>;

    /// Send to every other connection. Delivery is best effort.
    fn broadcast(&mut self, event: ReactionEvent);

    /// Events broadcast by others since the last call.
    fn drain_broadcasts(&mut self) -> Vec<ReactionEvent>;
}

/// Cursor chat / reaction mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CursorState {
    #[default]
    Hidden,
    Chat {
        message: String,
        previous_message: Option<String>,
    },
    ReactionSelector,
    Reaction {
        reaction: String,
        is_pressed: bool,
    },
}

/// Reactions offered by the picker.
pub const REACTIONS: [&str; 7] = ["👍", "🔥", "😍", "👀", "😱", "🙁", "🎉"];

/// Colors for other users' cursors, picked by connection id.
pub const CURSOR_COLORS: [&str; 8] = [
    "#DC2626", "#D97706", "#059669", "#7C3AED", "#DB2777", "#2563EB", "#0891B2", "#65A30D",
];

const NAME_ADJECTIVES: [&str; 8] = [
    "Happy", "Brave", "Quiet", "Swift", "Clever", "Gentle", "Lucky", "Sunny",
];
const NAME_NOUNS: [&str; 8] = [
    "Otter", "Falcon", "Panda", "Fox", "Koala", "Heron", "Lynx", "Badger",
];

/// A cursor to draw for another connection.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorOverlay {
    pub connection_id: ConnectionId,
    pub cursor: CursorPosition,
    pub message: Option<String>,
    pub color: &'static str,
}

/// Header avatars: the local user, up to three others, and the overflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveUsers {
    pub names: Vec<String>,
    pub overflow: usize,
}

/// Display name for a connection.
pub fn display_name(connection_id: ConnectionId) -> String {
    let i = connection_id as usize;
    format!(
        "{} {}",
        NAME_ADJECTIVES[i % NAME_ADJECTIVES.len()],
        NAME_NOUNS[(i / NAME_ADJECTIVES.len()) % NAME_NOUNS.len()]
    )
}

/// Maximum number of other users shown by name.
const VISIBLE_USERS: usize = 3;

pub fn active_users(others: &[Peer]) -> ActiveUsers {
    let mut names = vec!["You".to_string()];
    names.extend(
        others
            .iter()
            .take(VISIBLE_USERS)
            .map(|peer| display_name(peer.connection_id)),
    );
    ActiveUsers {
        names,
        overflow: others.len().saturating_sub(VISIBLE_USERS),
    }
}

pub fn cursor_overlays(others: &[Peer]) -> Vec<CursorOverlay> {
    others
        .iter()
        .filter_map(|peer| {
            let cursor = peer.presence.cursor?;
            Some(CursorOverlay {
                connection_id: peer.connection_id,
                cursor,
                message: peer.presence.message.clone(),
                color: CURSOR_COLORS[peer.connection_id as usize % CURSOR_COLORS.len()],
            })
        })
        .collect()
}

/// The live layer on top of the canvas: cursor chat, reaction picker and
/// the list of flying reactions.
#[derive(Debug, Clone)]
pub struct LiveLayer {
    state: CursorState,
    reactions: Vec<Reaction>,
    emit_timer: IntervalTimer,
    gc_timer: IntervalTimer,
    lifetime: Millis,
    max_message_len: usize,
}

impl LiveLayer {
    pub fn new(reactions: &ReactionConfig, chat: &ChatConfig) -> Self {
        Self {
            state: CursorState::Hidden,
            reactions: Vec::new(),
            emit_timer: IntervalTimer::new(reactions.emit_interval_ms),
            gc_timer: IntervalTimer::new(reactions.gc_interval_ms),
            lifetime: reactions.lifetime_ms,
            max_message_len: chat.max_message_len,
        }
    }

    /// Start both timers.
    pub fn start(&mut self, now: Millis) {
        self.emit_timer.start(now);
        self.gc_timer.start(now);
    }

    /// Stop both timers; ticks no longer fire.
    pub fn stop(&mut self) {
        self.emit_timer.stop();
        self.gc_timer.stop();
    }

    pub fn is_running(&self) -> bool {
        self.emit_timer.is_running() || self.gc_timer.is_running()
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    /// Reactions currently on screen, oldest first.
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn open_chat(&mut self) {
        self.state = CursorState::Chat {
            message: String::new(),
            previous_message: None,
        };
    }

    /// Hide the chat and clear our presence message.
    pub fn close_chat<T: PresenceTransport>(&mut self, transport: &mut T) {
        transport.update_my_presence(PresencePatch::message(None));
        self.state = CursorState::Hidden;
    }

    pub fn open_reaction_selector(&mut self) {
        self.state = CursorState::ReactionSelector;
    }

    pub fn select_reaction(&mut self, reaction: impl Into<String>) {
        self.state = CursorState::Reaction {
            reaction: reaction.into(),
            is_pressed: false,
        };
    }

    /// Feed a key to the chat input. Returns false when not chatting.
    pub fn chat_key<T: PresenceTransport>(&mut self, event: &KeyEvent, transport: &mut T) -> bool {
        let CursorState::Chat {
            message,
            previous_message,
        } = &mut self.state
        else {
            return false;
        };

        match &event.key {
            Key::Escape => {
                self.close_chat(transport);
                return true;
            }
            Key::Enter => {
                *previous_message = Some(std::mem::take(message));
                return true;
            }
            Key::Backspace => {
                message.pop();
            }
            Key::Character(c) => {
                if message.chars().count() >= self.max_message_len {
                    return true;
                }
                message.push(*c);
            }
            Key::Delete => return true,
        }

        // Typing replaces the committed bubble
        *previous_message = None;
        transport.update_my_presence(PresencePatch::message(Some(message.clone())));
        true
    }

    pub fn pointer_move<T: PresenceTransport>(&mut self, point: Point, transport: &mut T) {
        // The picker pins the cursor while it is open
        if self.state == CursorState::ReactionSelector && transport.my_presence().cursor.is_some() {
            return;
        }
        transport.update_my_presence(PresencePatch::cursor(Some(point.into())));
    }

    pub fn pointer_down<T: PresenceTransport>(&mut self, point: Point, transport: &mut T) {
        transport.update_my_presence(PresencePatch::cursor(Some(point.into())));
        if let CursorState::Reaction { is_pressed, .. } = &mut self.state {
            *is_pressed = true;
        }
    }

    pub fn pointer_up(&mut self) {
        if let CursorState::Reaction { is_pressed, .. } = &mut self.state {
            *is_pressed = false;
        }
    }

    /// Pointer left the surface: we are no longer present.
    pub fn pointer_leave<T: PresenceTransport>(&mut self, transport: &mut T) {
        self.state = CursorState::Hidden;
        transport.update_my_presence(PresencePatch::cursor(None).with_message(None));
    }

    /// Append reactions broadcast by peers, stamped with the receive time.
    pub fn receive<T: PresenceTransport>(&mut self, now: Millis, transport: &mut T) -> usize {
        let incoming = transport.drain_broadcasts();
        let count = incoming.len();
        self.reactions.extend(incoming.into_iter().map(|event| Reaction {
            point: Point::new(event.x, event.y),
            value: event.value,
            timestamp: now,
        }));
        count
    }

    /// Run every timer tick that fell due up to `now`.
    pub fn tick<T: PresenceTransport>(&mut self, now: Millis, transport: &mut T) {
        for tick in self.emit_timer.due(now) {
            self.emit(tick, transport);
        }
        for tick in self.gc_timer.due(now) {
            self.collect(tick);
        }
    }

    fn emit<T: PresenceTransport>(&mut self, at: Millis, transport: &mut T) {
        let CursorState::Reaction {
            reaction,
            is_pressed: true,
        } = &self.state
        else {
            return;
        };
        let Some(cursor) = transport.my_presence().cursor else {
            return;
        };

        self.reactions.push(Reaction {
            point: Point::new(cursor.x, cursor.y),
            value: reaction.clone(),
            timestamp: at,
        });
        transport.broadcast(ReactionEvent {
            x: cursor.x,
            y: cursor.y,
            value: reaction.clone(),
        });
        log::debug!("Emitted reaction {} at ({}, {})", reaction, cursor.x, cursor.y);
    }

    fn collect(&mut self, at: Millis) {
        let cutoff = at.saturating_sub(self.lifetime);
        let before = self.reactions.len();
        self.reactions.retain(|r| r.timestamp > cutoff);
        let expired = before - self.reactions.len();
        if expired > 0 {
            log::debug!("Expired {} reactions", expired);
        }
    }
}
