//! Room occupants as the client models them.

use crate::protocol::PlayerPayload;
use crate::role::Role;

/// Name shown for rooms whose name is missing or blank.
pub const PLACEHOLDER_ROOM_NAME: &str = "Sala sin nombre";

/// Name shown for occupants whose name is missing or blank.
pub const PLACEHOLDER_PLAYER_NAME: &str = "Jugador";

/// The fixed avatar set. Unknown keys map to [`Avatar::Default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Avatar {
    #[default]
    Default,
    Aldeana,
    Granjero,
    Herrera,
    Lobo,
    Anciano,
    Bruja,
}

impl Avatar {
    pub fn from_key(key: Option<&str>) -> Avatar {
        match key.map(|k| k.trim().to_lowercase()).as_deref() {
            Some("aldeana") => Avatar::Aldeana,
            Some("granjero") => Avatar::Granjero,
            Some("herrera") => Avatar::Herrera,
            Some("lobo") => Avatar::Lobo,
            Some("anciano") => Avatar::Anciano,
            Some("bruja") => Avatar::Bruja,
            _ => Avatar::Default,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Avatar::Default => "default",
            Avatar::Aldeana => "aldeana",
            Avatar::Granjero => "granjero",
            Avatar::Herrera => "herrera",
            Avatar::Lobo => "lobo",
            Avatar::Anciano => "anciano",
            Avatar::Bruja => "bruja",
        }
    }
}

/// A seat in a room.
///
/// Leadership is not stored here: it is derived from the room's leader id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    pub id: String,
    pub display_name: String,
    pub avatar: Avatar,
    pub is_ready: bool,
    pub is_alive: bool,
    /// Only ever set for the local player.
    pub role: Option<Role>,
}

impl Occupant {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar: Avatar::Default,
            is_ready: false,
            is_alive: true,
            role: None,
        }
    }

    /// Build an occupant from a wire entry. Entries without an id are
    /// malformed and yield `None`.
    pub fn from_payload(payload: &PlayerPayload) -> Option<Self> {
        let id = payload.id.clone()?;
        let display_name = payload
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(PLACEHOLDER_PLAYER_NAME)
            .to_string();
        Some(Self {
            id,
            display_name,
            avatar: Avatar::from_key(payload.avatar.as_deref()),
            is_ready: payload.ready.unwrap_or(false),
            is_alive: payload.alive.unwrap_or(true),
            role: None,
        })
    }
}

/// Resolve a room name, substituting [`PLACEHOLDER_ROOM_NAME`] when blank.
pub fn room_name_or_placeholder(name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(PLACEHOLDER_ROOM_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_avatar_maps_to_default() {
        assert_eq!(Avatar::from_key(Some("dragon")), Avatar::Default);
        assert_eq!(Avatar::from_key(None), Avatar::Default);
        assert_eq!(Avatar::from_key(Some("Bruja")), Avatar::Bruja);
        assert_eq!(Avatar::from_key(Some(Avatar::Herrera.key())), Avatar::Herrera);
    }

    #[test]
    fn payload_without_id_is_rejected() {
        let payload = PlayerPayload {
            name: Some("Ana".to_string()),
            ..Default::default()
        };
        assert_eq!(Occupant::from_payload(&payload), None);
    }

    #[test]
    fn payload_defaults() {
        let payload = PlayerPayload {
            id: Some("u1".to_string()),
            name: Some("  ".to_string()),
            ..Default::default()
        };
        let occ = Occupant::from_payload(&payload).unwrap();
        assert_eq!(occ.display_name, PLACEHOLDER_PLAYER_NAME);
        assert!(!occ.is_ready);
        assert!(occ.is_alive);
        assert_eq!(occ.avatar, Avatar::Default);
    }

    #[test]
    fn blank_room_name_uses_placeholder() {
        assert_eq!(room_name_or_placeholder(None), PLACEHOLDER_ROOM_NAME);
        assert_eq!(room_name_or_placeholder(Some(" ")), PLACEHOLDER_ROOM_NAME);
        assert_eq!(room_name_or_placeholder(Some("Castronegro")), "Castronegro");
    }
}
