//! Client orchestrator: connects networking, the local timers and the
//! terminal.
//!
//! This module owns the event loop and drives:
//! - [`ClientController`] for server traffic and player actions
//! - a [`TimerDriver`] for the local day/night countdown
//! - an [`AnnouncementQueue`] ticked every frame

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use lobo_client::announcement::{Announcement, AnnouncementQueue, StageEvent};
use lobo_client::client_controller::{ClientController, PollResult, RoomSettings};
use lobo_client::config::ClientConfig;
use lobo_client::error::ActionError;
use lobo_client::game_state::{GameEvent, LogCategory};
use lobo_client::phase_timer::{Phase, PhaseTimer, TimerDriver};
use lobo_client::session::{LocalUser, SessionContext};
use lobo_core::protocol::RoomKind;

use crate::input::{Command, HELP};
use crate::render;

const FRAME: Duration = Duration::from_millis(50);

/// Where to go once connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Show the room list.
    Lobby,
    Join { room_id: String, password: Option<String> },
    Create { name: String, password: Option<String> },
}

enum Flow {
    Continue,
    Quit,
}

/// Local screen state that is not part of the game state.
struct Screen {
    queue: AnnouncementQueue,
    timer: TimerDriver,
    phase_secs: u32,
    /// Password to join with once the room we asked for is created.
    join_created: Option<Option<String>>,
}

/// Connect, go to `destination` and run until the player quits or the
/// server goes away.
pub async fn start_client(
    config: ClientConfig,
    user: LocalUser,
    destination: Destination,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Arc::new(SessionContext::new(user));
    let mut ctrl = ClientController::connect_ws(&config.server_url, Arc::clone(&session)).await?;

    // Wait for the namespace handshake before sending anything.
    while !ctrl.state.connected {
        match ctrl.recv().await {
            PollResult::Updated(_) => {
                if let Some(GameEvent::ServerError { message }) = ctrl.state.events.back() {
                    return Err(message.clone().into());
                }
            }
            PollResult::Disconnected => {
                return Err("Desconectado antes de entrar en el servidor".into());
            }
            PollResult::Empty => {}
        }
    }

    tracing::debug!(?destination, "handshake complete");

    let mut screen = Screen {
        queue: AnnouncementQueue::new(config.timing),
        timer: TimerDriver::spawn(PhaseTimer::new(config.phase_secs), session.phase().clone()),
        phase_secs: config.phase_secs,
        join_created: None,
    };

    match destination {
        Destination::Lobby => ctrl.list_rooms()?,
        Destination::Join { room_id, password } => ctrl.join_room(&room_id, password)?,
        Destination::Create { name, password } => {
            let mut settings = RoomSettings::public(name);
            if password.is_some() {
                settings.kind = RoomKind::Private;
                settings.password.clone_from(&password);
            }
            ctrl.create_room(settings)?;
            screen.join_created = Some(password);
        }
    }
    println!("Escribe /ayuda para ver los comandos.");
    flush(&mut ctrl, &mut screen);

    run_event_loop(&mut ctrl, &mut screen).await
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

async fn run_event_loop(
    ctrl: &mut ClientController,
    screen: &mut Screen,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Arc::clone(ctrl.session());
    let mut phase_rx = session.phase().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut frames = tokio::time::interval(FRAME);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            poll = ctrl.recv() => {
                match poll {
                    PollResult::Updated(changed) => {
                        if changed.role {
                            session.phase().set(Phase::Night);
                            ctrl.sync_phase();
                            session.queue_intro_once(&mut screen.queue, ctrl.state.role);
                            let mut timer = screen.timer.timer();
                            timer.reset(screen.phase_secs);
                            timer.start();
                        }
                        if changed.removed {
                            screen.timer.timer().stop();
                        }
                        flush(ctrl, screen);
                        if changed.rooms {
                            print!("{}", render::rooms(&ctrl.state.rooms));
                        }
                        if changed.room && !changed.removed {
                            print!("{}", render::room(&ctrl.state.room));
                        }
                    }
                    PollResult::Disconnected => {
                        flush(ctrl, screen);
                        break;
                    }
                    PollResult::Empty => {}
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else { break };
                // Rejected actions are already in the event log.
                let flow = handle_command(ctrl, screen, Command::parse(&line));
                flush(ctrl, screen);
                if let Ok(Flow::Quit) = flow {
                    break;
                }
            }

            Ok(()) = phase_rx.changed() => {
                let phase = *phase_rx.borrow_and_update();
                if ctrl.sync_phase().phase && ctrl.state.in_match {
                    screen.queue.push(Announcement::for_phase(phase));
                }
                flush(ctrl, screen);
            }

            _ = frames.tick() => {
                for event in screen.queue.advance(FRAME) {
                    if let StageEvent::FadeInStarted(_) = event
                        && let Some(current) = screen.queue.current()
                    {
                        println!("{}", render::announcement(current));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Print and clear the event log. Joins a room we created as soon as the
/// server confirms it.
fn flush(ctrl: &mut ClientController, screen: &mut Screen) {
    for event in ctrl.drain_events() {
        println!("{}", render::event(&event));
        if let GameEvent::RoomCreated { room_id: Some(id) } = &event
            && let Some(password) = screen.join_created.take()
        {
            // A failed join shows up in the log on the next flush.
            let _ = ctrl.join_room(id, password);
        }
    }
}

fn handle_command(
    ctrl: &mut ClientController,
    screen: &mut Screen,
    command: Command,
) -> Result<Flow, ActionError> {
    match command {
        Command::None => {}
        Command::Help => println!("{HELP}"),
        Command::ListRooms => ctrl.list_rooms()?,
        Command::Join { room_id, password } => ctrl.join_room(&room_id, password)?,
        Command::Create { name } => {
            ctrl.create_room(RoomSettings::public(name))?;
            screen.join_created = Some(None);
        }
        Command::ShowRoom => print!("{}", render::room(&ctrl.state.room)),
        Command::ShowRole => println!("{}", render::role(ctrl.state.role)),
        Command::ShowTime => {
            let timer = screen.timer.timer();
            if timer.is_active() {
                let phase = ctrl.session().phase().get();
                println!("{}: quedan {} s", phase.label(), timer.remaining());
            } else {
                println!("El reloj está parado");
            }
        }
        Command::ToggleReady => {
            let id = ctrl.session().user().id.clone();
            ctrl.toggle_ready(&id)?;
            print!("{}", render::room(&ctrl.state.room));
        }
        Command::Start => ctrl.start_match()?,
        Command::Vote(seat) => {
            ctrl.select_vote(seat)?;
            if let Some(round) = &ctrl.state.vote {
                print!("{}", render::vote(round, &ctrl.state.room));
            }
        }
        Command::ClearVote => ctrl.clear_vote(),
        Command::ConfirmVote => {
            if ctrl.commit_vote()?.is_none() {
                ctrl.add_message("No has marcado a nadie".to_string(), LogCategory::Info);
            }
            if let Some(round) = &ctrl.state.vote {
                print!("{}", render::vote(round, &ctrl.state.room));
            }
        }
        Command::Invite(friend_id) => ctrl.invite(&friend_id)?,
        Command::Skip => {
            if !screen.queue.skip() {
                ctrl.add_message("No hay ningún anuncio".to_string(), LogCategory::Info);
            }
        }
        Command::Quit => {
            // Quit even if the server can no longer be told.
            if ctrl.state.room.room_id().is_some() {
                let _ = ctrl.leave_room();
            }
            return Ok(Flow::Quit);
        }
        Command::Chat(text) => ctrl.send_chat(&text)?,
        Command::Invalid(reason) => ctrl.add_message(reason, LogCategory::Error),
    }
    Ok(Flow::Continue)
}
