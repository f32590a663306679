//! Socket.IO event vocabulary shared with the Lobo backend.
//!
//! Event names and payload field names are fixed by the server and kept in
//! Spanish on the wire; Rust-side names are translated via `serde` renames.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Normalise a backend identifier into a string.
///
/// The server is not consistent about id types: ids arrive as strings, as
/// numbers, and the room leader sometimes arrives as a full player object.
/// Blank strings and anything else yield `None`.
pub fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(mut map) => map.remove("id").and_then(id_from_value),
        _ => None,
    }
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(id_from_value))
}

// ---------------------------------------------------------------------------
// Shared payloads
// ---------------------------------------------------------------------------

/// A player entry as carried by `actualizarSala`, `listaSalas` and
/// `jugadorUnido`. Every field is optional so malformed entries survive
/// deserialization and can be dropped by the consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerPayload {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, rename = "nombre")]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, rename = "listo", alias = "estado")]
    pub ready: Option<bool>,
    #[serde(default, rename = "vivo")]
    pub alive: Option<bool>,
}

/// Full room snapshot pushed with `actualizarSala`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, rename = "nombre")]
    pub name: Option<String>,
    #[serde(default, rename = "jugadores")]
    pub players: Vec<PlayerPayload>,
    #[serde(default, rename = "lider", deserialize_with = "de_opt_id")]
    pub leader: Option<String>,
    #[serde(default, rename = "maxJugadores")]
    pub max_players: Option<u32>,
}

/// One entry of the `listaSalas` room listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, rename = "nombre")]
    pub name: Option<String>,
    #[serde(default, rename = "tipo")]
    pub kind: Option<RoomKind>,
    #[serde(default, rename = "jugadores")]
    pub players: Vec<PlayerPayload>,
    #[serde(default, rename = "maxJugadores")]
    pub max_players: Option<u32>,
}

/// Room visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomKind {
    #[serde(rename = "publica", alias = "pública")]
    Public,
    #[serde(rename = "privada")]
    Private,
}

/// `{id}` payload of `jugadorSalido`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
}

/// `{idUsuario, estado}` payload of `estadoCambiado`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadyPayload {
    #[serde(default, rename = "idUsuario", deserialize_with = "de_opt_id")]
    pub user_id: Option<String>,
    #[serde(default, rename = "estado")]
    pub ready: Option<bool>,
}

/// `{idExpulsado}` payload of `expulsadoDeSala`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KickPayload {
    #[serde(default, rename = "idExpulsado", deserialize_with = "de_opt_id")]
    pub kicked_id: Option<String>,
}

/// `{mensaje}` payload used by `enPartida` and `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(default, rename = "mensaje")]
    pub message: Option<String>,
}

/// Role assignment: the server sends either the bare role name or an
/// object wrapping it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RolePayload {
    Name(String),
    Wrapped {
        #[serde(alias = "role")]
        rol: String,
    },
}

impl RolePayload {
    pub fn name(&self) -> &str {
        match self {
            RolePayload::Name(name) => name,
            RolePayload::Wrapped { rol } => rol,
        }
    }
}

/// `invitacionSala` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvitationPayload {
    #[serde(default, rename = "idSala", deserialize_with = "de_opt_id")]
    pub room_id: Option<String>,
    #[serde(default, rename = "idInvitador", deserialize_with = "de_opt_id")]
    pub inviter_id: Option<String>,
    #[serde(default, rename = "nombreInvitador")]
    pub inviter_name: Option<String>,
}

/// The local user as sent along with `crearSala` / `unirseSala`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Extract a human-readable message from a loosely-typed error payload
/// (`errorSala` sends either a string or `{mensaje}`).
pub fn message_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("mensaje")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoom {
    #[serde(rename = "nombreSala")]
    pub room_name: String,
    #[serde(rename = "tipo")]
    pub kind: RoomKind,
    #[serde(rename = "contrasena", default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "maxJugadores")]
    pub max_players: u32,
    #[serde(rename = "maxRolesEspeciales")]
    pub max_special_roles: u32,
    #[serde(rename = "usuario")]
    pub user: UserPayload,
    /// Per-role maximum counts, keyed by wire role name.
    #[serde(rename = "maxRoles", default)]
    pub max_roles: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRoom {
    #[serde(rename = "idSala")]
    pub room_id: String,
    #[serde(rename = "usuario")]
    pub user: UserPayload,
    #[serde(rename = "contrasena", default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkReady {
    #[serde(rename = "idSala")]
    pub room_id: String,
    #[serde(rename = "idUsuario")]
    pub user_id: String,
    #[serde(rename = "estado")]
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartMatch {
    #[serde(rename = "idSala")]
    pub room_id: String,
    #[serde(rename = "idLider")]
    pub leader_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRoom {
    #[serde(rename = "idUsuario")]
    pub user_id: String,
    #[serde(rename = "idSala")]
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessage {
    #[serde(rename = "idPartida")]
    pub match_id: String,
    #[serde(rename = "idJugador")]
    pub player_id: String,
    #[serde(rename = "mensaje")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteToRoom {
    #[serde(rename = "idAmigo")]
    pub friend_id: String,
    #[serde(rename = "idSala")]
    pub room_id: String,
    #[serde(rename = "idInvitador")]
    pub inviter_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "idUsuario")]
    pub user_id: String,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events emitted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "obtenerSalas")]
    ListRooms,
    #[serde(rename = "crearSala")]
    CreateRoom(CreateRoom),
    #[serde(rename = "unirseSala")]
    JoinRoom(JoinRoom),
    #[serde(rename = "marcarEstado")]
    MarkReady(MarkReady),
    #[serde(rename = "iniciarPartida")]
    StartMatch(StartMatch),
    #[serde(rename = "salirDeSala")]
    LeaveRoom(LeaveRoom),
    #[serde(rename = "enviarMensaje")]
    SendMessage(SendMessage),
    #[serde(rename = "invitarASala")]
    InviteToRoom(InviteToRoom),
    #[serde(rename = "registrarUsuario")]
    RegisterUser(UserRef),
}

impl ClientEvent {
    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::ListRooms => "obtenerSalas",
            ClientEvent::CreateRoom(_) => "crearSala",
            ClientEvent::JoinRoom(_) => "unirseSala",
            ClientEvent::MarkReady(_) => "marcarEstado",
            ClientEvent::StartMatch(_) => "iniciarPartida",
            ClientEvent::LeaveRoom(_) => "salirDeSala",
            ClientEvent::SendMessage(_) => "enviarMensaje",
            ClientEvent::InviteToRoom(_) => "invitarASala",
            ClientEvent::RegisterUser(_) => "registrarUsuario",
        }
    }
}

/// Events pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "listaSalas")]
    RoomList(Vec<RoomSummary>),
    #[serde(rename = "actualizarSala")]
    RoomUpdated(RoomSnapshot),
    #[serde(rename = "jugadorUnido")]
    PlayerJoined(PlayerPayload),
    #[serde(rename = "jugadorSalido")]
    PlayerLeft(PlayerRef),
    #[serde(rename = "estadoCambiado")]
    ReadyChanged(ReadyPayload),
    #[serde(rename = "expulsadoDeSala")]
    Kicked(KickPayload),
    #[serde(rename = "rolAsignado")]
    RoleAssigned(RolePayload),
    #[serde(rename = "enPartida")]
    InMatch(MessagePayload),
    #[serde(rename = "salaCreada")]
    RoomCreated(Value),
    #[serde(rename = "errorSala")]
    RoomError(Value),
    #[serde(rename = "error")]
    Error(MessagePayload),
    #[serde(rename = "estadoAmigo")]
    FriendStatus(Value),
    #[serde(rename = "estadoAmigos")]
    FriendStatuses(Value),
    #[serde(rename = "invitacionSala")]
    RoomInvitation(InvitationPayload),
}

/// Every inbound event name the client understands.
pub const SERVER_EVENT_NAMES: &[&str] = &[
    "listaSalas",
    "actualizarSala",
    "jugadorUnido",
    "jugadorSalido",
    "estadoCambiado",
    "expulsadoDeSala",
    "rolAsignado",
    "enPartida",
    "salaCreada",
    "errorSala",
    "error",
    "estadoAmigo",
    "estadoAmigos",
    "invitacionSala",
];

impl ServerEvent {
    /// Wire name of this event; also the key listeners subscribe under.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::RoomList(_) => "listaSalas",
            ServerEvent::RoomUpdated(_) => "actualizarSala",
            ServerEvent::PlayerJoined(_) => "jugadorUnido",
            ServerEvent::PlayerLeft(_) => "jugadorSalido",
            ServerEvent::ReadyChanged(_) => "estadoCambiado",
            ServerEvent::Kicked(_) => "expulsadoDeSala",
            ServerEvent::RoleAssigned(_) => "rolAsignado",
            ServerEvent::InMatch(_) => "enPartida",
            ServerEvent::RoomCreated(_) => "salaCreada",
            ServerEvent::RoomError(_) => "errorSala",
            ServerEvent::Error(_) => "error",
            ServerEvent::FriendStatus(_) => "estadoAmigo",
            ServerEvent::FriendStatuses(_) => "estadoAmigos",
            ServerEvent::RoomInvitation(_) => "invitacionSala",
        }
    }
}

// ---------------------------------------------------------------------------
// Room name validation
// ---------------------------------------------------------------------------

/// Longest room name the lobby accepts.
pub const MAX_ROOM_NAME_LEN: usize = 30;

/// Validate a room name before sending `crearSala`.
///
/// Names must contain something other than whitespace and be at most
/// [`MAX_ROOM_NAME_LEN`] characters.
pub fn validate_room_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("El nombre de la sala no puede estar vacío".to_string());
    }
    if trimmed.chars().count() > MAX_ROOM_NAME_LEN {
        return Err(format!(
            "El nombre de la sala no puede superar {MAX_ROOM_NAME_LEN} caracteres"
        ));
    }
    Ok(())
}
