//! In-process room for collaboration.
//!
//! A [`LoopbackRoom`] stands in for the hosted presence service and the
//! document relay: every [`LoopbackConnection`] gets its own presence
//! record, a broadcast inbox and a queue of document updates from peers.
//! Everything is single-threaded; queued items are picked up when the
//! owning session polls.

use crate::presence::{
    ConnectionId, Peer, Presence, PresencePatch, PresenceTransport, ReactionEvent,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

/// Upper bound on relay rounds in [`LoopbackRoom::pump`].
pub const MAX_PUMP_ROUNDS: usize = 16;

/// Relay for encoded shared-document updates.
pub trait UpdateRelay {
    /// Hand local changes to every other connection.
    fn send_update(&mut self, update: Vec<u8>);

    /// Updates from peers since the last call, in arrival order.
    fn drain_updates(&mut self) -> Vec<Vec<u8>>;
}

/// Something attached to a room that can exchange pending traffic.
pub trait Participant {
    type Error;

    /// Send and receive whatever is pending. Returns whether anything moved.
    fn sync(&mut self) -> Result<bool, Self::Error>;
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

#[derive(Debug, Default)]
struct PeerSlot {
    presence: Presence,
    broadcasts: VecDeque<ReactionEvent>,
    updates: VecDeque<Vec<u8>>,
}

#[derive(Debug, Default)]
struct RoomState {
    name: String,
    next_id: ConnectionId,
    peers: BTreeMap<ConnectionId, PeerSlot>,
    /// Every document update ever relayed, replayed to late joiners.
    history: Vec<Vec<u8>>,
}

/// A shared room. Cloning yields another handle to the same room.
#[derive(Debug, Clone, Default)]
pub struct LoopbackRoom {
    inner: Rc<RefCell<RoomState>>,
}

impl LoopbackRoom {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RoomState {
                name: name.into(),
                ..RoomState::default()
            })),
        }
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Join with an empty presence. Document history is queued for the
    /// new connection so it catches up on its first poll.
    pub fn connect(&self) -> LoopbackConnection {
        let mut room = self.inner.borrow_mut();
        let id = room.next_id;
        room.next_id += 1;
        let slot = PeerSlot {
            updates: room.history.iter().cloned().collect(),
            ..PeerSlot::default()
        };
        room.peers.insert(id, slot);
        log::info!("Connection {} joined room {:?} ({} connected)", id, room.name, room.peers.len());
        LoopbackConnection {
            id,
            room: Rc::clone(&self.inner),
            state: ConnectionState::Connected,
        }
    }

    /// Number of live connections.
    pub fn peer_count(&self) -> usize {
        self.inner.borrow().peers.len()
    }

    /// Let every participant exchange pending traffic until the room is
    /// quiet. Returns the number of rounds that moved something.
    pub fn pump<P: Participant>(&self, participants: &mut [&mut P]) -> Result<usize, P::Error> {
        let mut busy_rounds = 0;
        for _ in 0..MAX_PUMP_ROUNDS {
            let mut moved = false;
            for participant in participants.iter_mut() {
                moved |= participant.sync()?;
            }
            if !moved {
                return Ok(busy_rounds);
            }
            busy_rounds += 1;
        }
        log::warn!("Room did not settle after {} rounds", MAX_PUMP_ROUNDS);
        Ok(busy_rounds)
    }
}

/// One connection to a [`LoopbackRoom`].
#[derive(Debug)]
pub struct LoopbackConnection {
    id: ConnectionId,
    room: Rc<RefCell<RoomState>>,
    state: ConnectionState,
}

impl LoopbackConnection {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Leave the room; our presence record is destroyed.
    pub fn disconnect(&mut self) {
        if !self.is_connected() {
            return;
        }
        self.state = ConnectionState::Disconnected;
        let mut room = self.room.borrow_mut();
        room.peers.remove(&self.id);
        log::info!("Connection {} left room {:?}", self.id, room.name);
    }
}

impl Drop for LoopbackConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl PresenceTransport for LoopbackConnection {
    fn connection_id(&self) -> ConnectionId {
        self.id
    }

    fn my_presence(&self) -> Presence {
        self.room
            .borrow()
            .peers
            .get(&self.id)
            .map(|slot| slot.presence.clone())
            .unwrap_or_default()
    }

    fn update_my_presence(&mut self, patch: PresencePatch) {
        if let Some(slot) = self.room.borrow_mut().peers.get_mut(&self.id) {
            patch.apply(&mut slot.presence);
        }
    }

    fn others(&self) -> Vec<Peer> {
        self.room
            .borrow()
            .peers
            .iter()
            .filter(|(id, _)| **id != self.id)
            .map(|(id, slot)| Peer {
                connection_id: *id,
                presence: slot.presence.clone(),
            })
            .collect()
    }

    fn broadcast(&mut self, event: ReactionEvent) {
        if !self.is_connected() {
            return;
        }
        let mut room = self.room.borrow_mut();
        for (_, slot) in room.peers.iter_mut().filter(|(id, _)| **id != self.id) {
            slot.broadcasts.push_back(event.clone());
        }
    }

    fn drain_broadcasts(&mut self) -> Vec<ReactionEvent> {
        self.room
            .borrow_mut()
            .peers
            .get_mut(&self.id)
            .map(|slot| slot.broadcasts.drain(..).collect())
            .unwrap_or_default()
    }
}

impl UpdateRelay for LoopbackConnection {
    fn send_update(&mut self, update: Vec<u8>) {
        if !self.is_connected() {
            return;
        }
        let mut room = self.room.borrow_mut();
        for (_, slot) in room.peers.iter_mut().filter(|(id, _)| **id != self.id) {
            slot.updates.push_back(update.clone());
        }
        log::debug!("Connection {} relayed {} bytes", self.id, update.len());
        room.history.push(update);
    }

    fn drain_updates(&mut self) -> Vec<Vec<u8>> {
        self.room
            .borrow_mut()
            .peers
            .get_mut(&self.id)
            .map(|slot| slot.updates.drain(..).collect())
            .unwrap_or_default()
    }
}
