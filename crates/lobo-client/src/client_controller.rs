//! Framework-agnostic client controller.
//!
//! Owns the [`Channel`], its [`Inbox`] and a [`ClientGameState`], providing
//! the shared dispatch logic:
//!
//! - Processing inbound traffic, updating state, then notifying the
//!   channel's named listeners.
//! - Validating player actions locally before anything goes on the wire.
//!
//! Front-ends only need to:
//! 1. Call [`ClientController::connect_ws`] to establish a connection.
//! 2. Call [`ClientController::recv`] or [`ClientController::try_recv`] to
//!    process server traffic.
//! 3. Call the action methods ([`toggle_ready`](ClientController::toggle_ready),
//!    [`start_match`](ClientController::start_match), ...) for player input.
//!
//! A rejected action never reaches the server: it is logged, recorded as a
//! [`GameEvent::Notice`] and returned as an [`ActionError`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc::error::TryRecvError;

use lobo_core::protocol::{
    ClientEvent, CreateRoom, InviteToRoom, JoinRoom, LeaveRoom, MarkReady, RoomKind, SendMessage,
    StartMatch, UserRef, validate_room_name,
};
use lobo_core::transport::Transport;

use crate::channel::{Channel, Inbound, Inbox};
use crate::error::ActionError;
use crate::game_state::{ClientGameState, GameEvent, LogCategory, StateChanged};
use crate::session::SessionContext;

/// Outcome of processing a single inbound item.
#[derive(Debug)]
pub enum PollResult {
    /// Inbound traffic was applied; the flags describe what was modified.
    Updated(StateChanged),
    /// The server closed the connection or refused it.
    Disconnected,
    /// Nothing was available.
    Empty,
}

/// Parameters for creating a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSettings {
    pub name: String,
    pub kind: RoomKind,
    pub password: Option<String>,
    pub max_players: u32,
    pub max_special_roles: u32,
    pub max_roles: BTreeMap<String, u32>,
}

impl RoomSettings {
    pub fn public(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: RoomKind::Public,
            password: None,
            max_players: 8,
            max_special_roles: 2,
            max_roles: BTreeMap::new(),
        }
    }
}

/// Owns the connection and client state, providing event dispatch logic.
pub struct ClientController {
    channel: Channel,
    inbox: Inbox,
    pub state: ClientGameState,
    session: Arc<SessionContext>,
}

impl ClientController {
    /// Create a controller over any [`Transport`] implementation.
    pub fn from_transport<T: Transport>(transport: T, session: Arc<SessionContext>) -> Self {
        let (channel, inbox) = Channel::from_transport(transport);
        Self::from_channel(channel, inbox, session)
    }

    /// Connect to a Lobo server by base URL (`http://host:port`).
    #[cfg(feature = "native")]
    pub async fn connect_ws(
        server_url: &str,
        session: Arc<SessionContext>,
    ) -> Result<Self, ActionError> {
        let (channel, inbox) = Channel::connect_ws(server_url).await?;
        Ok(Self::from_channel(channel, inbox, session))
    }

    fn from_channel(channel: Channel, inbox: Inbox, session: Arc<SessionContext>) -> Self {
        let state = ClientGameState::new(&session.user().id);
        Self {
            channel,
            inbox,
            state,
            session,
        }
    }

    /// The shared channel, for attaching listeners.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.state
    }

    /// Append a local feedback message to the event log.
    pub fn add_message(&mut self, text: String, category: LogCategory) {
        self.state.add_message(text, category);
    }

    /// Take every logged event, oldest first, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.events.drain(..).collect()
    }

    /// Try to process one inbound item without waiting.
    pub fn try_recv(&mut self) -> PollResult {
        match self.inbox.rx.try_recv() {
            Ok(inbound) => self.handle_inbound(inbound),
            Err(TryRecvError::Empty) => PollResult::Empty,
            Err(TryRecvError::Disconnected) => self.handle_disconnect(),
        }
    }

    /// Await the next inbound item. Useful in `tokio::select!` loops.
    pub async fn recv(&mut self) -> PollResult {
        match self.inbox.recv().await {
            Some(inbound) => self.handle_inbound(inbound),
            None => self.handle_disconnect(),
        }
    }

    /// Bring the local phase in line with the session's phase store.
    pub fn sync_phase(&mut self) -> StateChanged {
        self.state.set_phase(self.session.phase().get())
    }

    // -- room actions ------------------------------------------------------

    pub fn list_rooms(&mut self) -> Result<(), ActionError> {
        self.emit(ClientEvent::ListRooms)
    }

    pub fn create_room(&mut self, settings: RoomSettings) -> Result<(), ActionError> {
        let checked = validate_room_name(&settings.name).map_err(ActionError::InvalidInput);
        self.guard(checked)?;
        let event = ClientEvent::CreateRoom(CreateRoom {
            room_name: settings.name.trim().to_string(),
            kind: settings.kind,
            password: settings.password,
            max_players: settings.max_players,
            max_special_roles: settings.max_special_roles,
            user: self.session.user().payload(),
            max_roles: settings.max_roles,
        });
        self.emit(event)
    }

    pub fn join_room(&mut self, room_id: &str, password: Option<String>) -> Result<(), ActionError> {
        let checked = if room_id.trim().is_empty() {
            Err(ActionError::InvalidInput("Falta el identificador de la sala".to_string()))
        } else {
            Ok(())
        };
        self.guard(checked)?;
        self.emit(ClientEvent::JoinRoom(JoinRoom {
            room_id: room_id.trim().to_string(),
            user: self.session.user().payload(),
            password,
        }))
    }

    /// Toggle an occupant's ready flag. Only our own seat may be toggled;
    /// the local view is updated once the request is queued, before the
    /// server confirms.
    pub fn toggle_ready(&mut self, occupant_id: &str) -> Result<(), ActionError> {
        let checked = self.current_room().and_then(|room_id| {
            if occupant_id != self.state.room.local_id() {
                return Err(ActionError::NotYourSeat);
            }
            let ready = self
                .state
                .room
                .local()
                .map(|o| !o.is_ready)
                .ok_or(ActionError::NoRoom)?;
            Ok((room_id, ready))
        });
        let (room_id, ready) = self.guard(checked)?;

        self.emit(ClientEvent::MarkReady(MarkReady {
            room_id,
            user_id: occupant_id.to_string(),
            ready,
        }))?;
        self.state.room.apply_ready_change(occupant_id, ready);
        Ok(())
    }

    /// Ask the server to start the match. Leader only, and only when every
    /// occupant is ready.
    pub fn start_match(&mut self) -> Result<(), ActionError> {
        let checked = self.current_room().and_then(|room_id| {
            if !self.state.room.local_is_leader() {
                Err(ActionError::NotLeader)
            } else if !self.state.room.can_start() {
                Err(ActionError::NotAllReady)
            } else {
                Ok(room_id)
            }
        });
        let room_id = self.guard(checked)?;
        tracing::info!(room = %room_id, "starting match");
        self.emit(ClientEvent::StartMatch(StartMatch {
            room_id,
            leader_id: self.session.user().id.clone(),
        }))
    }

    /// Leave the current room. The local view is cleared as soon as the
    /// request is queued; if it can't be sent we stay seated.
    pub fn leave_room(&mut self) -> Result<(), ActionError> {
        let checked = self.current_room();
        let room_id = self.guard(checked)?;
        tracing::info!(room = %room_id, "leaving room");
        self.emit(ClientEvent::LeaveRoom(LeaveRoom {
            user_id: self.session.user().id.clone(),
            room_id,
        }))?;
        self.state.room.clear();
        self.state.end_match();
        Ok(())
    }

    /// Send a chat line. The room id doubles as the match id.
    pub fn send_chat(&mut self, text: &str) -> Result<(), ActionError> {
        let checked = self.current_room().and_then(|room_id| {
            if text.trim().is_empty() {
                Err(ActionError::EmptyMessage)
            } else {
                Ok(room_id)
            }
        });
        let match_id = self.guard(checked)?;
        self.emit(ClientEvent::SendMessage(SendMessage {
            match_id,
            player_id: self.session.user().id.clone(),
            message: text.trim().to_string(),
        }))
    }

    pub fn invite(&mut self, friend_id: &str) -> Result<(), ActionError> {
        let checked = self.current_room();
        let room_id = self.guard(checked)?;
        self.emit(ClientEvent::InviteToRoom(InviteToRoom {
            friend_id: friend_id.to_string(),
            room_id,
            inviter_id: self.session.user().id.clone(),
        }))
    }

    /// Announce ourselves so the server can route invitations and presence.
    pub fn register(&mut self) -> Result<(), ActionError> {
        self.emit(ClientEvent::RegisterUser(UserRef {
            user_id: self.session.user().id.clone(),
        }))
    }

    // -- voting (local tally) ----------------------------------------------

    /// Arm a seat as the vote target. Only living occupants can be marked.
    pub fn select_vote(&mut self, seat: usize) -> Result<(), ActionError> {
        let votable = self
            .state
            .room
            .occupants()
            .get(seat)
            .is_some_and(|o| o.is_alive);
        let checked = match self.state.vote.as_mut() {
            Some(_) if !votable => Err(ActionError::InvalidSeat(seat)),
            Some(vote) => vote.select(seat),
            None => Err(ActionError::NoVote),
        };
        self.guard(checked)
    }

    pub fn clear_vote(&mut self) {
        if let Some(vote) = self.state.vote.as_mut() {
            vote.clear_selection();
        }
    }

    /// Commit the armed selection. Returns the seat voted for, or `None` when
    /// nothing was armed.
    pub fn commit_vote(&mut self) -> Result<Option<usize>, ActionError> {
        let checked = self.state.vote.is_some().then_some(()).ok_or(ActionError::NoVote);
        self.guard(checked)?;
        let Some(seat) = self.state.vote.as_mut().and_then(|vote| vote.commit()) else {
            return Ok(None);
        };
        let name = self
            .state
            .room
            .occupants()
            .get(seat)
            .map(|o| o.display_name.clone());
        self.state.add_event(GameEvent::VoteCast { seat, name });
        Ok(Some(seat))
    }

    // -- private -----------------------------------------------------------

    fn current_room(&self) -> Result<String, ActionError> {
        self.state
            .room
            .room_id()
            .map(str::to_string)
            .ok_or(ActionError::NoRoom)
    }

    /// Record a rejected action as a notice and pass the result through.
    fn guard<T>(&mut self, result: Result<T, ActionError>) -> Result<T, ActionError> {
        if let Err(e) = &result {
            tracing::warn!(error = ?e, "action rejected");
            self.state.add_event(GameEvent::Notice {
                text: e.to_string(),
            });
        }
        result
    }

    fn emit(&mut self, event: ClientEvent) -> Result<(), ActionError> {
        let sent = self.channel.emit(&event).map_err(ActionError::from);
        self.guard(sent)
    }

    fn handle_inbound(&mut self, inbound: Inbound) -> PollResult {
        match inbound {
            Inbound::Connected => {
                tracing::info!(user = %self.session.user().id, "connected");
                self.state.connected = true;
                self.state.add_event(GameEvent::Connected);
                // A failed register is already recorded as a notice.
                let _ = self.register();
                PollResult::Updated(StateChanged::default())
            }
            Inbound::Event(event) => {
                let changed = self.state.apply_server_event(&event);
                self.channel.listeners().dispatch(&event);
                PollResult::Updated(changed)
            }
            Inbound::Refused(reason) => {
                tracing::warn!(%reason, "server refused connection");
                self.state.add_event(GameEvent::ServerError { message: reason });
                PollResult::Updated(StateChanged::default())
            }
        }
    }

    fn handle_disconnect(&mut self) -> PollResult {
        if self.state.connected {
            tracing::info!("disconnected");
            self.state.connected = false;
            self.state.add_event(GameEvent::Disconnected);
        }
        PollResult::Disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::memory::{self, ServerEnd};
    use crate::phase_timer::Phase;
    use crate::session::LocalUser;
    use crate::vote::VoteRound;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    const ROOM: &str = r#"42["actualizarSala",{"id":"s1","nombre":"Castronegro","lider":"u1","maxJugadores":6,"jugadores":[{"id":"u1","nombre":"Ana","listo":false},{"id":"u2","nombre":"Bea","listo":true}]}]"#;

    fn controller() -> (ClientController, ServerEnd) {
        let (transport, server) = memory::pair();
        let session = Arc::new(SessionContext::new(LocalUser::new("u1", "Ana")));
        (ClientController::from_transport(transport, session), server)
    }

    async fn seated() -> (ClientController, ServerEnd) {
        let (mut ctl, server) = controller();
        server.push.send(ROOM.to_string()).unwrap();
        assert!(matches!(ctl.recv().await, PollResult::Updated(c) if c.room));
        (ctl, server)
    }

    /// Nothing queued for the server: a marker frame written after the
    /// action must be the next thing the server sees.
    async fn assert_nothing_sent(ctl: &mut ClientController, server: &mut ServerEnd) {
        assert_ok!(ctl.list_rooms());
        assert_eq!(
            server.next_event_frame().await.as_deref(),
            Some(r#"42["obtenerSalas"]"#)
        );
    }

    #[tokio::test]
    async fn registers_after_namespace_connect() {
        let (mut ctl, mut server) = controller();
        server.push.send("40".to_string()).unwrap();
        ctl.recv().await;
        assert_eq!(ctl.state.events.back(), Some(&GameEvent::Connected));
        assert_eq!(
            server.next_event_frame().await.as_deref(),
            Some(r#"42["registrarUsuario",{"idUsuario":"u1"}]"#)
        );
    }

    #[tokio::test]
    async fn toggle_own_seat_is_optimistic() {
        let (mut ctl, mut server) = seated().await;
        assert!(!ctl.state.room.can_start());

        assert_ok!(ctl.toggle_ready("u1"));
        assert!(ctl.state.room.can_start());
        assert_eq!(
            server.next_event_frame().await.as_deref(),
            Some(r#"42["marcarEstado",{"idSala":"s1","idUsuario":"u1","estado":true}]"#)
        );
    }

    #[tokio::test]
    async fn toggling_another_seat_sends_nothing() {
        let (mut ctl, mut server) = seated().await;
        assert_eq!(ctl.toggle_ready("u2"), Err(ActionError::NotYourSeat));
        assert!(matches!(
            ctl.state.events.back(),
            Some(GameEvent::Notice { .. })
        ));
        assert!(ctl.state.room.occupant("u2").is_some_and(|o| o.is_ready));
        assert_nothing_sent(&mut ctl, &mut server).await;
    }

    #[tokio::test]
    async fn start_requires_everyone_ready() {
        let (mut ctl, mut server) = seated().await;
        assert_eq!(ctl.start_match(), Err(ActionError::NotAllReady));
        assert_nothing_sent(&mut ctl, &mut server).await;

        assert_ok!(ctl.toggle_ready("u1"));
        server.next_event_frame().await;
        assert_ok!(ctl.start_match());
        assert_eq!(
            server.next_event_frame().await.as_deref(),
            Some(r#"42["iniciarPartida",{"idSala":"s1","idLider":"u1"}]"#)
        );
    }

    #[tokio::test]
    async fn only_the_leader_starts() {
        let (mut ctl, mut server) = controller();
        server
            .push
            .send(ROOM.replace(r#""lider":"u1""#, r#""lider":"u2""#))
            .unwrap();
        ctl.recv().await;
        assert_eq!(ctl.start_match(), Err(ActionError::NotLeader));
        assert_nothing_sent(&mut ctl, &mut server).await;
    }

    #[tokio::test]
    async fn actions_outside_a_room_are_rejected() {
        let (mut ctl, _server) = controller();
        assert_eq!(ctl.send_chat("hola"), Err(ActionError::NoRoom));
        assert_eq!(ctl.leave_room(), Err(ActionError::NoRoom));
        assert_err!(ctl.invite("u9"));
    }

    #[tokio::test]
    async fn chat_uses_room_as_match() {
        let (mut ctl, mut server) = seated().await;
        assert_eq!(ctl.send_chat("   "), Err(ActionError::EmptyMessage));
        assert_ok!(ctl.send_chat(" buenas noches "));
        assert_eq!(
            server.next_event_frame().await.as_deref(),
            Some(r#"42["enviarMensaje",{"idPartida":"s1","idJugador":"u1","mensaje":"buenas noches"}]"#)
        );
    }

    #[tokio::test]
    async fn create_room_validates_name() {
        let (mut ctl, mut server) = controller();
        assert_err!(ctl.create_room(RoomSettings::public("  ")));
        assert_ok!(ctl.create_room(RoomSettings::public("Castronegro")));
        let frame = server.next_event_frame().await.unwrap();
        assert!(frame.starts_with(r#"42["crearSala",{"nombreSala":"Castronegro""#));
        assert!(frame.contains(r#""usuario":{"id":"u1","nombre":"Ana""#));
    }

    #[tokio::test]
    async fn leave_clears_the_view() {
        let (mut ctl, mut server) = seated().await;
        assert_ok!(ctl.leave_room());
        assert!(ctl.state.room.occupants().is_empty());
        assert_eq!(
            server.next_event_frame().await.as_deref(),
            Some(r#"42["salirDeSala",{"idUsuario":"u1","idSala":"s1"}]"#)
        );
    }

    #[tokio::test]
    async fn listeners_fire_after_state_is_updated() {
        let (mut ctl, server) = controller();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let _sub = ctl.channel().on("actualizarSala", "lobby", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        server.push.send(ROOM.to_string()).unwrap();
        ctl.recv().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(ctl.state.room.occupants().len(), 2);
    }

    #[tokio::test]
    async fn voting_follows_the_phase() {
        let (mut ctl, server) = seated().await;
        assert_eq!(ctl.select_vote(1), Err(ActionError::NoVote));

        server
            .push
            .send(r#"42["rolAsignado","Vidente"]"#.to_string())
            .unwrap();
        ctl.recv().await;
        ctl.session().phase().set(Phase::Day);
        assert!(ctl.sync_phase().vote);

        assert_eq!(ctl.commit_vote(), Ok(None));
        assert_ok!(ctl.select_vote(1));
        assert_eq!(ctl.commit_vote(), Ok(Some(1)));
        assert_eq!(
            ctl.state.events.back(),
            Some(&GameEvent::VoteCast {
                seat: 1,
                name: Some("Bea".to_string())
            })
        );
        assert_eq!(ctl.select_vote(40), Err(ActionError::InvalidSeat(40)));
    }

    #[tokio::test]
    async fn only_living_occupants_can_be_marked() {
        let (mut ctl, server) = controller();
        server
            .push
            .send(ROOM.replace(r#""listo":true}"#, r#""listo":true,"vivo":false}"#))
            .unwrap();
        ctl.recv().await;
        server
            .push
            .send(r#"42["rolAsignado","Aldeano"]"#.to_string())
            .unwrap();
        ctl.recv().await;
        ctl.session().phase().set(Phase::Day);
        assert!(ctl.sync_phase().vote);

        assert_eq!(ctl.select_vote(1), Err(ActionError::InvalidSeat(1)));
        assert_eq!(ctl.select_vote(15), Err(ActionError::InvalidSeat(15)));
        assert!(matches!(
            ctl.state.events.back(),
            Some(GameEvent::Notice { .. })
        ));
        assert_eq!(ctl.state.vote.as_ref().and_then(VoteRound::selection), None);
        assert_ok!(ctl.select_vote(0));
        assert_eq!(ctl.commit_vote(), Ok(Some(0)));
    }

    /// Drop the server and wait until the writer task has given up.
    async fn lose_connection(ctl: &mut ClientController, server: ServerEnd) {
        drop(server);
        while ctl.list_rooms().is_ok() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn unsent_ready_toggle_leaves_seat_unchanged() {
        let (mut ctl, server) = seated().await;
        lose_connection(&mut ctl, server).await;
        assert_err!(ctl.toggle_ready("u1"));
        assert!(ctl.state.room.local().is_some_and(|o| !o.is_ready));
    }

    #[tokio::test]
    async fn unsent_leave_keeps_us_seated() {
        let (mut ctl, server) = seated().await;
        lose_connection(&mut ctl, server).await;
        assert_err!(ctl.leave_room());
        assert_eq!(ctl.state.room.room_id(), Some("s1"));
        assert_eq!(ctl.state.room.occupants().len(), 2);
    }

    #[tokio::test]
    async fn disconnect_is_reported_once() {
        let (mut ctl, server) = controller();
        server.push.send("40".to_string()).unwrap();
        drop(server);
        ctl.recv().await;
        assert!(ctl.state.connected);
        assert!(matches!(ctl.recv().await, PollResult::Disconnected));
        assert!(matches!(ctl.try_recv(), PollResult::Disconnected));
        let disconnects = ctl
            .state
            .events
            .iter()
            .filter(|e| **e == GameEvent::Disconnected)
            .count();
        assert_eq!(disconnects, 1);
        assert!(!ctl.state.connected);
        assert!(ctl.drain_events().contains(&GameEvent::Disconnected));
        assert!(ctl.state.events.is_empty());
    }
}
