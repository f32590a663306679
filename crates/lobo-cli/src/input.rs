//! Line commands typed by the player.

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line.
    None,
    Help,
    ListRooms,
    Join { room_id: String, password: Option<String> },
    Create { name: String },
    ShowRoom,
    ShowRole,
    ShowTime,
    ToggleReady,
    Start,
    /// Arm a vote; the seat is zero-based.
    Vote(usize),
    ClearVote,
    ConfirmVote,
    Invite(String),
    Skip,
    Quit,
    Chat(String),
    /// Could not be understood; the text explains why.
    Invalid(String),
}

pub const HELP: &str = "\
/salas               lista las salas
/unirse ID [CLAVE]   entra en una sala
/crear NOMBRE        crea una sala y entra
/sala                muestra los asientos
/rol                 muestra tu rol
/tiempo              segundos hasta el cambio de fase
/listo               cambia tu estado de listo
/empezar             inicia la partida (solo el líder)
/votar N             marca el asiento N
/cancelar            quita la marca
/confirmar           confirma el voto marcado
/invitar ID          invita a un amigo
/saltar              salta el anuncio en curso
/salir               abandona la sala y cierra
cualquier otro texto se envía al chat";

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        if line.is_empty() {
            return Command::None;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Chat(line.to_string());
        };

        let mut words = rest.split_whitespace();
        let verb = words.next().unwrap_or_default().to_lowercase();
        let arg = words.next();

        match (verb.as_str(), arg) {
            ("ayuda" | "help", _) => Command::Help,
            ("salas", _) => Command::ListRooms,
            ("unirse", Some(id)) => Command::Join {
                room_id: id.to_string(),
                password: words.next().map(str::to_string),
            },
            ("crear", Some(_)) => {
                let name = rest["crear".len()..].trim().to_string();
                Command::Create { name }
            }
            ("sala", _) => Command::ShowRoom,
            ("rol", _) => Command::ShowRole,
            ("tiempo", _) => Command::ShowTime,
            ("listo", _) => Command::ToggleReady,
            ("empezar", _) => Command::Start,
            ("votar", Some(n)) => match n.parse::<usize>() {
                Ok(seat) if seat > 0 => Command::Vote(seat - 1),
                _ => Command::Invalid(format!("Asiento no válido: {n}")),
            },
            ("cancelar", _) => Command::ClearVote,
            ("confirmar", _) => Command::ConfirmVote,
            ("invitar", Some(id)) => Command::Invite(id.to_string()),
            ("saltar", _) => Command::Skip,
            ("salir", _) => Command::Quit,
            ("unirse" | "crear" | "votar" | "invitar", None) => {
                Command::Invalid(format!("Falta un argumento para /{verb}"))
            }
            _ => Command::Invalid(format!("Comando desconocido: /{verb}. Escribe /ayuda")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(Command::parse("  hola a todos "), Command::Chat("hola a todos".to_string()));
        assert_eq!(Command::parse("   "), Command::None);
    }

    #[test]
    fn seats_are_one_based_on_input() {
        assert_eq!(Command::parse("/votar 3"), Command::Vote(2));
        assert!(matches!(Command::parse("/votar 0"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/votar tres"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/votar"), Command::Invalid(_)));
    }

    #[test]
    fn join_takes_optional_password() {
        assert_eq!(
            Command::parse("/unirse s1 secreto"),
            Command::Join {
                room_id: "s1".to_string(),
                password: Some("secreto".to_string())
            }
        );
        assert_eq!(
            Command::parse("/UNIRSE s1"),
            Command::Join {
                room_id: "s1".to_string(),
                password: None
            }
        );
    }

    #[test]
    fn create_keeps_spaces_in_name() {
        assert_eq!(
            Command::parse("/crear La  aldea"),
            Command::Create {
                name: "La  aldea".to_string()
            }
        );
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert!(matches!(Command::parse("/bailar"), Command::Invalid(m) if m.contains("/bailar")));
        assert_eq!(Command::parse("/salir"), Command::Quit);
    }
}
