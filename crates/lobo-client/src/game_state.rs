use std::collections::VecDeque;

use lobo_core::protocol::{
    InvitationPayload, RoomSummary, ServerEvent, id_from_value, message_of,
};
use lobo_core::role::Role;
use lobo_core::room::room_name_or_placeholder;

use crate::phase_timer::Phase;
use crate::room_view::{RoomChange, RoomView};
use crate::vote::VoteRound;

/// How many events the log keeps.
pub const EVENT_LOG_LIMIT: usize = 100;

/// Semantic category for log entries. The front-end decides how to style each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    System,
    Chat,
    Room,
    Game,
    Error,
    Info,
}

/// A structured client-side event, appended to the log as things happen.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Connected,
    RoomListed { count: usize },
    RoomCreated { room_id: Option<String> },
    RoomUpdated { name: String, occupants: usize },
    PlayerJoined { id: String, name: String },
    PlayerLeft { id: String, name: String },
    ReadyChanged { id: String, name: String, ready: bool },
    PlayerKicked { id: String, name: String },
    /// We were kicked; the front-end should leave the room screen.
    RemovedFromRoom,
    RoleAssigned { role: Option<Role>, raw: String },
    Narration { text: String },
    PhaseChanged { phase: Phase },
    VoteCast { seat: usize, name: Option<String> },
    Invitation { room_id: Option<String>, inviter: Option<String> },
    ServerError { message: String },
    /// A local action was rejected or failed.
    Notice { text: String },
    Disconnected,
    /// Free-form local feedback.
    Text { text: String, category: LogCategory },
}

impl GameEvent {
    pub fn category(&self) -> LogCategory {
        match self {
            Self::Connected | Self::PhaseChanged { .. } => LogCategory::System,

            Self::RoomListed { .. }
            | Self::RoomCreated { .. }
            | Self::RoomUpdated { .. }
            | Self::PlayerJoined { .. }
            | Self::PlayerLeft { .. }
            | Self::ReadyChanged { .. }
            | Self::PlayerKicked { .. }
            | Self::RemovedFromRoom => LogCategory::Room,

            Self::RoleAssigned { .. } | Self::Narration { .. } | Self::VoteCast { .. } => {
                LogCategory::Game
            }

            Self::ServerError { .. } | Self::Notice { .. } | Self::Disconnected => {
                LogCategory::Error
            }

            Self::Invitation { .. } => LogCategory::Info,
            Self::Text { category, .. } => *category,
        }
    }
}

/// What an applied event changed. Front-ends use the flags to decide what to
/// re-render or animate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateChanged {
    /// The occupant list, readiness or leader changed.
    pub room: bool,
    /// The room listing changed.
    pub rooms: bool,
    /// Our role was assigned.
    pub role: bool,
    /// Day/night flipped.
    pub phase: bool,
    /// A vote round opened, closed or received a vote.
    pub vote: bool,
    /// We were removed from the room.
    pub removed: bool,
}

impl StateChanged {
    pub fn any(self) -> bool {
        self.room || self.rooms || self.role || self.phase || self.vote || self.removed
    }
}

/// Everything the client tracks about the session.
#[derive(Debug, Clone)]
pub struct ClientGameState {
    pub events: VecDeque<GameEvent>,
    pub room: RoomView,
    pub rooms: Vec<RoomSummary>,
    pub role: Option<Role>,
    pub phase: Phase,
    /// Present only during a day-phase vote.
    pub vote: Option<VoteRound>,
    pub in_match: bool,
    pub connected: bool,
    pub invitations: Vec<InvitationPayload>,
}

impl ClientGameState {
    pub fn new(local_id: &str) -> Self {
        Self {
            events: VecDeque::new(),
            room: RoomView::new(local_id),
            rooms: Vec::new(),
            role: None,
            phase: Phase::Night,
            vote: None,
            in_match: false,
            connected: false,
            invitations: Vec::new(),
        }
    }

    /// Append an event, keeping the last [`EVENT_LOG_LIMIT`].
    pub fn add_event(&mut self, event: GameEvent) {
        self.events.push_back(event);
        if self.events.len() > EVENT_LOG_LIMIT {
            self.events.pop_front();
        }
    }

    pub fn add_message(&mut self, text: String, category: LogCategory) {
        self.add_event(GameEvent::Text { text, category });
    }

    /// Display name of an occupant, or their id when not seated.
    pub fn occupant_name(&self, id: &str) -> String {
        self.room
            .occupant(id)
            .map_or_else(|| id.to_string(), |o| o.display_name.clone())
    }

    /// Record the role for this match. A role is assigned once: later
    /// assignments in the same match are ignored.
    fn assign_role(&mut self, raw: &str) -> bool {
        if self.role.is_some() {
            tracing::warn!(role = raw, "role already assigned this match; ignoring");
            return false;
        }
        let role = Role::parse(raw);
        if role.is_none() {
            tracing::warn!(role = raw, "unknown role assigned");
        }
        self.role = role;
        if let Some(role) = role {
            self.room.set_local_role(role);
        }
        self.in_match = true;
        self.add_event(GameEvent::RoleAssigned {
            role,
            raw: raw.to_string(),
        });
        true
    }

    /// Switch the local phase. Day opens a fresh vote round, night discards it.
    pub fn set_phase(&mut self, phase: Phase) -> StateChanged {
        let mut changed = StateChanged::default();
        if self.phase == phase {
            return changed;
        }
        self.phase = phase;
        self.vote = match phase {
            Phase::Day if self.in_match => Some(VoteRound::new()),
            _ => None,
        };
        self.add_event(GameEvent::PhaseChanged { phase });
        changed.phase = true;
        changed.vote = true;
        changed
    }

    /// The match is over: forget the role and per-match room state.
    pub fn end_match(&mut self) {
        self.role = None;
        self.in_match = false;
        self.vote = None;
        self.phase = Phase::Night;
        self.room.reset_match();
    }

    /// Apply a server event.
    pub fn apply_server_event(&mut self, event: &ServerEvent) -> StateChanged {
        let mut changed = StateChanged::default();

        match event {
            ServerEvent::RoomList(rooms) => {
                self.rooms = rooms.clone();
                self.add_event(GameEvent::RoomListed { count: rooms.len() });
                changed.rooms = true;
            }
            ServerEvent::RoomUpdated(_) => {
                self.room.apply_event(event);
                self.add_event(GameEvent::RoomUpdated {
                    name: self.room.name().to_string(),
                    occupants: self.room.occupants().len(),
                });
                changed.room = true;
            }
            ServerEvent::PlayerJoined(player) => {
                if self.room.apply_event(event) == RoomChange::Updated
                    && let Some(id) = &player.id
                {
                    let name = self.occupant_name(id);
                    self.add_event(GameEvent::PlayerJoined {
                        id: id.clone(),
                        name,
                    });
                    changed.room = true;
                }
            }
            ServerEvent::PlayerLeft(player) => {
                let name = player.id.as_deref().map(|id| self.occupant_name(id));
                if self.room.apply_event(event) == RoomChange::Updated
                    && let (Some(id), Some(name)) = (&player.id, name)
                {
                    self.add_event(GameEvent::PlayerLeft {
                        id: id.clone(),
                        name,
                    });
                    changed.room = true;
                }
            }
            ServerEvent::ReadyChanged(change) => {
                if self.room.apply_event(event) == RoomChange::Updated
                    && let (Some(id), Some(ready)) = (&change.user_id, change.ready)
                {
                    let name = self.occupant_name(id);
                    self.add_event(GameEvent::ReadyChanged {
                        id: id.clone(),
                        name,
                        ready,
                    });
                    changed.room = true;
                }
            }
            ServerEvent::Kicked(kick) => {
                let name = kick.kicked_id.as_deref().map(|id| self.occupant_name(id));
                match self.room.apply_event(event) {
                    RoomChange::LocalRemoved => {
                        tracing::info!("removed from room by the leader");
                        self.room.clear();
                        self.end_match();
                        self.add_event(GameEvent::RemovedFromRoom);
                        changed.room = true;
                        changed.removed = true;
                    }
                    RoomChange::Updated => {
                        if let (Some(id), Some(name)) = (&kick.kicked_id, name) {
                            self.add_event(GameEvent::PlayerKicked {
                                id: id.clone(),
                                name,
                            });
                        }
                        changed.room = true;
                    }
                    RoomChange::Unchanged => {}
                }
            }
            ServerEvent::RoleAssigned(role) => {
                changed.role = self.assign_role(role.name());
            }
            ServerEvent::InMatch(payload) => {
                self.in_match = true;
                if let Some(text) = payload.message.as_ref().filter(|m| !m.is_empty()) {
                    self.add_event(GameEvent::Narration { text: text.clone() });
                }
            }
            ServerEvent::RoomCreated(value) => {
                let room_id = id_from_value(value.clone());
                tracing::info!(room = room_id.as_deref().unwrap_or("?"), "room created");
                self.add_event(GameEvent::RoomCreated { room_id });
            }
            ServerEvent::RoomError(value) => {
                let message =
                    message_of(value).unwrap_or_else(|| "Error desconocido en la sala".to_string());
                self.add_event(GameEvent::ServerError { message });
            }
            ServerEvent::Error(payload) => {
                let message = payload
                    .message
                    .clone()
                    .unwrap_or_else(|| "Error desconocido".to_string());
                self.add_event(GameEvent::ServerError { message });
            }
            ServerEvent::FriendStatus(_) | ServerEvent::FriendStatuses(_) => {
                tracing::trace!(event = event.name(), "friend presence ignored");
            }
            ServerEvent::RoomInvitation(invitation) => {
                self.add_event(GameEvent::Invitation {
                    room_id: invitation.room_id.clone(),
                    inviter: invitation
                        .inviter_name
                        .clone()
                        .or_else(|| invitation.inviter_id.clone()),
                });
                self.invitations.push(invitation.clone());
            }
        }

        changed
    }

    /// Name of the room we are in, or of a listed room.
    pub fn room_label(summary: &RoomSummary) -> String {
        let name = room_name_or_placeholder(summary.name.as_deref());
        let max = summary
            .max_players
            .map_or_else(|| "?".to_string(), |m| m.to_string());
        format!("{name} ({}/{max})", summary.players.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobo_core::protocol::{
        KickPayload, MessagePayload, PlayerPayload, ReadyPayload, RolePayload, RoomSnapshot,
    };
    use serde_json::json;

    fn snapshot(ids: &[(&str, bool)], leader: &str) -> ServerEvent {
        ServerEvent::RoomUpdated(RoomSnapshot {
            id: Some("s1".to_string()),
            name: Some("Castronegro".to_string()),
            players: ids
                .iter()
                .map(|(id, ready)| PlayerPayload {
                    id: Some(id.to_string()),
                    name: Some(id.to_uppercase()),
                    ready: Some(*ready),
                    ..Default::default()
                })
                .collect(),
            leader: Some(leader.to_string()),
            max_players: Some(8),
        })
    }

    #[test]
    fn ready_change_enables_start() {
        let mut gs = ClientGameState::new("u1");
        gs.apply_server_event(&snapshot(&[("u1", false), ("u2", true)], "u1"));
        assert!(!gs.room.can_start());

        let changed = gs.apply_server_event(&ServerEvent::ReadyChanged(ReadyPayload {
            user_id: Some("u1".to_string()),
            ready: Some(true),
        }));
        assert!(changed.room);
        assert!(gs.room.can_start());
        assert!(matches!(
            gs.events.back(),
            Some(GameEvent::ReadyChanged { ready: true, .. })
        ));
    }

    #[test]
    fn role_is_assigned_once() {
        let mut gs = ClientGameState::new("u1");
        gs.apply_server_event(&snapshot(&[("u1", true)], "u1"));

        let first = gs.apply_server_event(&ServerEvent::RoleAssigned(RolePayload::Name(
            "Bruja".to_string(),
        )));
        assert!(first.role);
        assert_eq!(gs.role, Some(Role::Bruja));
        assert_eq!(gs.room.local().and_then(|o| o.role), Some(Role::Bruja));
        assert!(gs.in_match);

        let second = gs.apply_server_event(&ServerEvent::RoleAssigned(RolePayload::Name(
            "Lobo".to_string(),
        )));
        assert!(!second.role);
        assert_eq!(gs.role, Some(Role::Bruja));

        gs.end_match();
        assert_eq!(gs.role, None);
        assert!(gs.room.local().is_some_and(|o| o.role.is_none()));
    }

    #[test]
    fn kick_of_local_player_clears_room() {
        let mut gs = ClientGameState::new("u1");
        gs.apply_server_event(&snapshot(&[("u1", true), ("u2", false)], "u2"));
        let changed = gs.apply_server_event(&ServerEvent::Kicked(KickPayload {
            kicked_id: Some("u1".to_string()),
        }));
        assert!(changed.removed);
        assert!(gs.room.occupants().is_empty());
        assert_eq!(gs.room.local_id(), "u1");
        assert_eq!(gs.events.back(), Some(&GameEvent::RemovedFromRoom));
    }

    #[test]
    fn kick_after_snapshot_dropped_us_still_leaves_room() {
        let mut gs = ClientGameState::new("u1");
        gs.apply_server_event(&snapshot(&[("u1", true), ("u2", false)], "u2"));
        gs.apply_server_event(&snapshot(&[("u2", false)], "u2"));
        assert_eq!(gs.room.room_id(), Some("s1"));

        let changed = gs.apply_server_event(&ServerEvent::Kicked(KickPayload {
            kicked_id: Some("u1".to_string()),
        }));
        assert!(changed.removed);
        assert_eq!(gs.room.room_id(), None);
        assert!(gs.room.occupants().is_empty());
    }

    #[test]
    fn duplicate_join_logs_nothing() {
        let mut gs = ClientGameState::new("u1");
        let join = ServerEvent::PlayerJoined(PlayerPayload {
            id: Some("u2".to_string()),
            name: Some("Bea".to_string()),
            ..Default::default()
        });
        assert!(gs.apply_server_event(&join).room);
        let logged = gs.events.len();
        assert!(!gs.apply_server_event(&join).any());
        assert_eq!(gs.events.len(), logged);
    }

    #[test]
    fn day_opens_vote_and_night_discards_it() {
        let mut gs = ClientGameState::new("u1");
        gs.in_match = true;
        assert!(gs.set_phase(Phase::Day).vote);
        gs.vote.as_mut().unwrap().select(1).unwrap();
        gs.vote.as_mut().unwrap().commit();
        assert_eq!(gs.vote.as_ref().unwrap().total(), 1);

        gs.set_phase(Phase::Night);
        assert!(gs.vote.is_none());
        gs.set_phase(Phase::Day);
        assert_eq!(gs.vote.as_ref().unwrap().total(), 0);
        assert!(!gs.set_phase(Phase::Day).any());
    }

    #[test]
    fn no_vote_outside_a_match() {
        let mut gs = ClientGameState::new("u1");
        gs.set_phase(Phase::Day);
        assert!(gs.vote.is_none());
    }

    #[test]
    fn errors_are_logged() {
        let mut gs = ClientGameState::new("u1");
        gs.apply_server_event(&ServerEvent::RoomError(json!({"mensaje": "Sala llena"})));
        assert_eq!(
            gs.events.back(),
            Some(&GameEvent::ServerError {
                message: "Sala llena".to_string()
            })
        );
        gs.apply_server_event(&ServerEvent::Error(MessagePayload { message: None }));
        assert_eq!(gs.events.back().map(GameEvent::category), Some(LogCategory::Error));
    }

    #[test]
    fn narration_starts_the_match() {
        let mut gs = ClientGameState::new("u1");
        gs.apply_server_event(&ServerEvent::InMatch(MessagePayload {
            message: Some("Los lobos han elegido".to_string()),
        }));
        assert!(gs.in_match);
        assert_eq!(gs.events.back().map(GameEvent::category), Some(LogCategory::Game));
    }

    #[test]
    fn event_log_is_bounded() {
        let mut gs = ClientGameState::new("u1");
        for i in 0..(EVENT_LOG_LIMIT + 20) {
            gs.add_message(format!("m{i}"), LogCategory::Info);
        }
        assert_eq!(gs.events.len(), EVENT_LOG_LIMIT);
    }

    #[test]
    fn room_label_counts_players() {
        let summary = RoomSummary {
            name: None,
            players: vec![PlayerPayload::default(); 3],
            max_players: Some(10),
            ..Default::default()
        };
        assert_eq!(ClientGameState::room_label(&summary), "Sala sin nombre (3/10)");
    }
}
