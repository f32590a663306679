//! Local projection of the room the player is sitting in.
//!
//! The server is authoritative: a full snapshot replaces everything,
//! incremental events patch the occupant list in place. Entries without an id
//! are malformed and dropped without touching state.

use std::collections::HashSet;

use lobo_core::protocol::{RoomSnapshot, ServerEvent};
use lobo_core::room::{Occupant, PLACEHOLDER_ROOM_NAME, room_name_or_placeholder};

/// Capacity assumed until the server tells us otherwise.
pub const DEFAULT_CAPACITY: usize = 8;

/// Result of removing an occupant by kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Nobody with that id was seated.
    Absent,
    /// Another occupant was removed.
    Other,
    /// The local player was removed; the caller should leave the room screen.
    Local,
}

/// What an event did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomChange {
    Unchanged,
    Updated,
    LocalRemoved,
}

#[derive(Debug, Clone)]
pub struct RoomView {
    room_id: Option<String>,
    name: String,
    capacity: usize,
    occupants: Vec<Occupant>,
    leader_id: Option<String>,
    local_id: String,
    /// Occupants that died this match; they stay dead across snapshots.
    fallen: HashSet<String>,
}

impl RoomView {
    pub fn new(local_id: impl Into<String>) -> Self {
        Self {
            room_id: None,
            name: PLACEHOLDER_ROOM_NAME.to_string(),
            capacity: DEFAULT_CAPACITY,
            occupants: Vec::new(),
            leader_id: None,
            local_id: local_id.into(),
            fallen: HashSet::new(),
        }
    }

    // -- accessors -----------------------------------------------------------

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn occupants(&self) -> &[Occupant] {
        &self.occupants
    }

    pub fn local_id(&self) -> &str {
        &self.local_id
    }

    pub fn leader_id(&self) -> Option<&str> {
        self.leader_id.as_deref()
    }

    pub fn occupant(&self, id: &str) -> Option<&Occupant> {
        self.occupants.iter().find(|o| o.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.occupants.iter().position(|o| o.id == id)
    }

    pub fn local(&self) -> Option<&Occupant> {
        self.occupant(&self.local_id)
    }

    pub fn is_leader(&self, id: &str) -> bool {
        self.leader_id.as_deref() == Some(id)
    }

    pub fn local_is_leader(&self) -> bool {
        self.is_leader(&self.local_id)
    }

    pub fn is_alive(&self, id: &str) -> bool {
        self.occupant(id).is_some_and(|o| o.is_alive)
    }

    pub fn ready_count(&self) -> usize {
        self.occupants.iter().filter(|o| o.is_ready).count()
    }

    /// Occupants padded with empty seats up to capacity.
    pub fn slots(&self) -> Vec<Option<&Occupant>> {
        let mut slots: Vec<Option<&Occupant>> = self.occupants.iter().map(Some).collect();
        slots.resize(self.capacity.max(self.occupants.len()), None);
        slots
    }

    /// The "start match" action is enabled exactly when everyone is ready.
    pub fn can_start(&self) -> bool {
        !self.occupants.is_empty() && self.occupants.iter().all(|o| o.is_ready)
    }

    // -- mutations -----------------------------------------------------------

    /// Replace occupants and leader wholesale. Server order is kept exactly;
    /// entries without an id, and repeated ids, are skipped.
    pub fn apply_snapshot(&mut self, snapshot: &RoomSnapshot) {
        let mut seen = HashSet::new();
        let mut occupants = Vec::with_capacity(snapshot.players.len());
        for payload in &snapshot.players {
            let Some(mut occupant) = Occupant::from_payload(payload) else {
                tracing::debug!("snapshot entry without id dropped");
                continue;
            };
            if !seen.insert(occupant.id.clone()) {
                continue;
            }
            if !occupant.is_alive {
                self.fallen.insert(occupant.id.clone());
            }
            if self.fallen.contains(&occupant.id) {
                occupant.is_alive = false;
            }
            // The role is private to this client and never comes back in a
            // snapshot.
            if let Some(previous) = self.occupant(&occupant.id) {
                occupant.role = previous.role;
            }
            occupants.push(occupant);
        }

        if snapshot.id.is_some() {
            self.room_id = snapshot.id.clone();
        }
        self.name = room_name_or_placeholder(snapshot.name.as_deref());
        self.occupants = occupants;
        self.leader_id = snapshot.leader.clone();
        let announced = snapshot
            .max_players
            .map_or(self.capacity, |max| max as usize);
        self.capacity = announced.max(self.occupants.len());
    }

    /// Append an occupant unless one with the same id is already seated.
    pub fn apply_join(&mut self, mut occupant: Occupant) -> bool {
        if self.occupant(&occupant.id).is_some() {
            return false;
        }
        if !occupant.is_alive {
            self.fallen.insert(occupant.id.clone());
        }
        if self.fallen.contains(&occupant.id) {
            occupant.is_alive = false;
        }
        self.occupants.push(occupant);
        self.capacity = self.capacity.max(self.occupants.len());
        true
    }

    /// Remove the occupant with `id`, keeping everyone else in order.
    pub fn apply_leave(&mut self, id: &str) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|o| o.id != id);
        before != self.occupants.len()
    }

    pub fn apply_ready_change(&mut self, id: &str, ready: bool) -> bool {
        match self.occupants.iter_mut().find(|o| o.id == id) {
            Some(o) if o.is_ready != ready => {
                o.is_ready = ready;
                true
            }
            _ => false,
        }
    }

    /// Remove a kicked occupant. A kick naming the local player always
    /// reports [`Removal::Local`], even if a snapshot already dropped us.
    pub fn apply_kick(&mut self, id: &str) -> Removal {
        let removed = self.apply_leave(id);
        if id == self.local_id {
            Removal::Local
        } else if removed {
            Removal::Other
        } else {
            Removal::Absent
        }
    }

    /// Record the local player's role.
    pub(crate) fn set_local_role(&mut self, role: lobo_core::role::Role) {
        let local_id = self.local_id.clone();
        if let Some(o) = self.occupants.iter_mut().find(|o| o.id == local_id) {
            o.role = Some(role);
        }
    }

    /// Forget per-match state (deaths, roles) when a match ends.
    pub fn reset_match(&mut self) {
        self.fallen.clear();
        for o in &mut self.occupants {
            o.is_alive = true;
            o.role = None;
        }
    }

    /// Leave the room locally: forget everything but our identity.
    pub fn clear(&mut self) {
        *self = Self::new(std::mem::take(&mut self.local_id));
    }

    /// Apply a membership-related server event. Malformed payloads and
    /// unrelated events leave the view untouched.
    pub fn apply_event(&mut self, event: &ServerEvent) -> RoomChange {
        let changed = match event {
            ServerEvent::RoomUpdated(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            ServerEvent::PlayerJoined(payload) => match Occupant::from_payload(payload) {
                Some(occupant) => self.apply_join(occupant),
                None => {
                    tracing::debug!("jugadorUnido without id dropped");
                    false
                }
            },
            ServerEvent::PlayerLeft(player) => match player.id.as_deref() {
                Some(id) => self.apply_leave(id),
                None => {
                    tracing::debug!("jugadorSalido without id dropped");
                    false
                }
            },
            ServerEvent::ReadyChanged(change) => match (change.user_id.as_deref(), change.ready) {
                (Some(id), Some(ready)) => self.apply_ready_change(id, ready),
                _ => {
                    tracing::debug!("estadoCambiado without id or state dropped");
                    false
                }
            },
            ServerEvent::Kicked(kick) => match kick.kicked_id.as_deref() {
                Some(id) => match self.apply_kick(id) {
                    Removal::Local => return RoomChange::LocalRemoved,
                    Removal::Other => true,
                    Removal::Absent => false,
                },
                None => {
                    tracing::debug!("expulsadoDeSala without id dropped");
                    false
                }
            },
            _ => false,
        };
        if changed {
            RoomChange::Updated
        } else {
            RoomChange::Unchanged
        }
    }
}
