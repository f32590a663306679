//! Plain-text rendering of client state for a line-oriented terminal.

use std::fmt::Write as _;

use lobo_client::announcement::Announcement;
use lobo_client::colorize::{DEFAULT_KEYWORDS, colorize, to_ansi};
use lobo_client::game_state::{ClientGameState, GameEvent, LogCategory};
use lobo_client::room_view::RoomView;
use lobo_client::vote::{MAX_RENDERED_SEATS, VoteRound, seat_positions};
use lobo_core::protocol::RoomSummary;
use lobo_core::role::{Role, UNKNOWN_ROLE};

fn highlighted(text: &str) -> String {
    to_ansi(&colorize(text, DEFAULT_KEYWORDS))
}

fn prefix(category: LogCategory) -> &'static str {
    match category {
        LogCategory::System => "[sistema]",
        LogCategory::Chat => "[chat]",
        LogCategory::Room => "[sala]",
        LogCategory::Game => "[partida]",
        LogCategory::Error => "[error]",
        LogCategory::Info => "[info]",
    }
}

pub fn event(event: &GameEvent) -> String {
    let body = match event {
        GameEvent::Connected => "Conectado al servidor".to_string(),
        GameEvent::RoomListed { count } => format!("{count} salas disponibles"),
        GameEvent::RoomCreated { room_id } => match room_id {
            Some(id) => format!("Sala creada ({id})"),
            None => "Sala creada".to_string(),
        },
        GameEvent::RoomUpdated { name, occupants } => format!("{name}: {occupants} jugadores"),
        GameEvent::PlayerJoined { name, .. } => format!("{name} se ha unido"),
        GameEvent::PlayerLeft { name, .. } => format!("{name} ha salido"),
        GameEvent::ReadyChanged { name, ready, .. } => {
            let state = if *ready { "listo" } else { "no listo" };
            format!("{name}: {state}")
        }
        GameEvent::PlayerKicked { name, .. } => format!("{name} ha sido expulsado"),
        GameEvent::RemovedFromRoom => "Has sido expulsado de la sala".to_string(),
        GameEvent::RoleAssigned { role, raw } => match role {
            Some(role) => highlighted(&format!("Tu rol: {}", role.info().display_name)),
            None => format!("Rol desconocido: {raw}"),
        },
        GameEvent::Narration { text } => highlighted(text),
        GameEvent::PhaseChanged { phase } => highlighted(&phase.label().to_lowercase()),
        GameEvent::VoteCast { seat, name } => match name {
            Some(name) => format!("Voto para {name} (asiento {})", seat + 1),
            None => format!("Voto para el asiento {}", seat + 1),
        },
        GameEvent::Invitation { room_id, inviter } => format!(
            "{} te invita a la sala {}",
            inviter.as_deref().unwrap_or("Alguien"),
            room_id.as_deref().unwrap_or("?")
        ),
        GameEvent::ServerError { message } => message.clone(),
        GameEvent::Notice { text } => text.clone(),
        GameEvent::Disconnected => "Desconectado del servidor".to_string(),
        GameEvent::Text { text, .. } => text.clone(),
    };
    format!("{} {body}", prefix(event.category()))
}

pub fn announcement(announcement: &Announcement) -> String {
    format!("\n    {}\n", highlighted(&announcement.text))
}

pub fn room(view: &RoomView) -> String {
    let mut out = format!(
        "{} ({}/{}, {} listos)\n",
        view.name(),
        view.occupants().len(),
        view.capacity(),
        view.ready_count()
    );
    for (i, slot) in view.slots().into_iter().enumerate() {
        let line = match slot {
            Some(o) => {
                let mut marks = String::new();
                if view.is_leader(&o.id) {
                    marks.push_str(" [líder]");
                }
                if o.id == view.local_id() {
                    marks.push_str(" [tú]");
                }
                if !o.is_alive {
                    marks.push_str(" [muerto]");
                }
                let ready = if o.is_ready { "✔" } else { "·" };
                format!("{ready} {}{marks}", o.display_name)
            }
            None => "  (libre)".to_string(),
        };
        let _ = writeln!(out, "  {:>2}. {line}", i + 1);
    }
    if view.local_is_leader() && view.can_start() {
        out.push_str("  Todos listos: escribe /empezar\n");
    }
    out
}

pub fn rooms(rooms: &[RoomSummary]) -> String {
    if rooms.is_empty() {
        return "No hay salas abiertas. Crea una con /crear NOMBRE\n".to_string();
    }
    let mut out = String::new();
    for summary in rooms {
        let id = summary.id.as_deref().unwrap_or("?");
        let _ = writeln!(out, "  {id}: {}", ClientGameState::room_label(summary));
    }
    out
}

pub fn role(role: Option<Role>) -> String {
    let info = role.map_or(UNKNOWN_ROLE, Role::info);
    let mut text = format!(
        "{}\n  {}\n  {}",
        info.display_name, info.ability_text, info.reminder_text
    );
    if let Some(role) = role {
        let side = if role.is_wolf() { "los lobos" } else { "la aldea" };
        let _ = write!(text, "\n  Juegas con {side}");
    }
    highlighted(&text)
}

/// Terminal cells are about twice as tall as they are wide, so the ring is
/// laid out on half-width columns and stretched back.
const CIRCLE_COLS: usize = 48;
const CIRCLE_ROWS: usize = 14;

/// The voting circle as a character grid. Each seat shows its number and
/// one `*` per vote; the armed seat is bracketed and the dead are crossed.
pub fn circle(round: &VoteRound, view: &RoomView) -> String {
    let occupants = view.occupants();
    let count = occupants.len().min(MAX_RENDERED_SEATS);
    let positions = seat_positions(count, (CIRCLE_COLS / 2) as f32, CIRCLE_ROWS as f32);
    let mut grid = vec![vec![' '; CIRCLE_COLS]; CIRCLE_ROWS];

    for (seat, (occupant, pos)) in occupants.iter().zip(positions).enumerate() {
        let number = if occupant.is_alive {
            (seat + 1).to_string()
        } else {
            format!("†{}", seat + 1)
        };
        let mut label = if round.selection() == Some(seat) {
            format!("[{number}]")
        } else {
            number
        };
        label.extend(std::iter::repeat_n('*', round.markers(seat) as usize));

        let chars: Vec<char> = label.chars().collect();
        let row = pos.y.round() as usize;
        let start = ((pos.x * 2.0).round() as usize).saturating_sub(chars.len() / 2);
        let Some(line) = grid.get_mut(row) else { continue };
        for (cell, ch) in line.iter_mut().skip(start).zip(chars) {
            *cell = ch;
        }
    }

    let mut out = String::new();
    for line in grid {
        let text: String = line.into_iter().collect();
        let text = text.trim_end();
        if !text.is_empty() {
            out.push_str(text);
            out.push('\n');
        }
    }
    out
}

pub fn vote(round: &VoteRound, view: &RoomView) -> String {
    let mut out = circle(round, view);
    out.push_str("Votos:\n");
    for (seat, votes) in round.standings() {
        let name = view
            .occupants()
            .get(seat)
            .map_or("(libre)", |o| o.display_name.as_str());
        let _ = writeln!(out, "  {:>2}. {name}: {votes}", seat + 1);
    }
    if let Some(seat) = round.selection() {
        let _ = writeln!(out, "  Marcado: asiento {} (/confirmar)", seat + 1);
    }
    out
}
