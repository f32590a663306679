//! Socket.IO v4 text-frame codec.
//!
//! Only the subset the client needs is handled: Engine.IO open/close/ping/
//! pong packets and Socket.IO connect/disconnect/event packets on the default
//! namespace. Binary attachments are not supported.
//!
//! ```text
//! 0{"sid":"..."}          engine open
//! 2 / 3                   ping / pong
//! 40                      namespace connect
//! 42["actualizarSala",{}] event
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::protocol::{ClientEvent, SERVER_EVENT_NAMES, ServerEvent};

/// Sent after the engine handshake to join the default namespace.
pub const CONNECT_PACKET: &str = "40";

/// Reply to an engine ping.
pub const PONG_PACKET: &str = "3";

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine handshake (`0{...}`), carrying the session parameters.
    Open(Value),
    /// Engine close (`1`).
    Close,
    /// Engine ping (`2`); must be answered with [`PONG_PACKET`].
    Ping,
    /// Engine pong (`3`).
    Pong,
    /// Namespace connected (`40`).
    Connected,
    /// Namespace disconnected (`41`).
    Disconnected,
    /// Namespace connection refused (`44`).
    ConnectError(String),
    /// A typed server event (`42[...]`).
    Event(ServerEvent),
}

/// Errors produced while decoding or encoding frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,

    #[error("unknown packet type {0:?}")]
    UnknownPacket(String),

    #[error("event frame is not a non-empty array with a name")]
    NotAnEvent,

    #[error("unknown event {0:?}")]
    UnknownEvent(String),

    #[error("malformed payload for {event}: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Decode one text frame.
pub fn decode(text: &str) -> Result<Packet, FrameError> {
    let mut chars = text.chars();
    let engine = chars.next().ok_or(FrameError::Empty)?;
    let rest = chars.as_str();

    match engine {
        '0' => Ok(Packet::Open(if rest.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(rest)?
        })),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_socket_packet(rest),
        other => Err(FrameError::UnknownPacket(other.to_string())),
    }
}

fn decode_socket_packet(text: &str) -> Result<Packet, FrameError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(FrameError::Empty)?;
    let body = strip_namespace(chars.as_str());

    match kind {
        '0' => Ok(Packet::Connected),
        '1' => Ok(Packet::Disconnected),
        '2' => decode_event(body.trim_start_matches(|c: char| c.is_ascii_digit())),
        '4' => {
            let reason = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| crate::protocol::message_of(&v))
                .unwrap_or_else(|| body.to_string());
            Ok(Packet::ConnectError(reason))
        }
        other => Err(FrameError::UnknownPacket(format!("4{other}"))),
    }
}

/// Drop a `/namespace,` prefix if present.
fn strip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.find(',') {
            Some(i) => &body[i + 1..],
            None => "",
        }
    } else {
        body
    }
}

fn decode_event(body: &str) -> Result<Packet, FrameError> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Array(mut items) = value else {
        return Err(FrameError::NotAnEvent);
    };
    if items.is_empty() {
        return Err(FrameError::NotAnEvent);
    }
    let name = match items.remove(0) {
        Value::String(name) => name,
        _ => return Err(FrameError::NotAnEvent),
    };
    if !SERVER_EVENT_NAMES.contains(&name.as_str()) {
        return Err(FrameError::UnknownEvent(name));
    }
    let data = if items.is_empty() {
        Value::Null
    } else {
        items.remove(0)
    };

    let mut tagged = serde_json::Map::new();
    tagged.insert("event".to_string(), Value::String(name.clone()));
    tagged.insert("data".to_string(), data);

    serde_json::from_value(Value::Object(tagged))
        .map(Packet::Event)
        .map_err(|source| FrameError::Payload {
            event: name,
            source,
        })
}

/// Encode a client event as a `42[...]` frame.
///
/// The payload is written straight into the array so its keys keep field
/// declaration order.
pub fn encode_event(event: &ClientEvent) -> Result<String, FrameError> {
    let name = event.name();
    let body = match event {
        ClientEvent::ListRooms => serde_json::to_string(&(name,))?,
        ClientEvent::CreateRoom(data) => serde_json::to_string(&(name, data))?,
        ClientEvent::JoinRoom(data) => serde_json::to_string(&(name, data))?,
        ClientEvent::MarkReady(data) => serde_json::to_string(&(name, data))?,
        ClientEvent::StartMatch(data) => serde_json::to_string(&(name, data))?,
        ClientEvent::LeaveRoom(data) => serde_json::to_string(&(name, data))?,
        ClientEvent::SendMessage(data) => serde_json::to_string(&(name, data))?,
        ClientEvent::InviteToRoom(data) => serde_json::to_string(&(name, data))?,
        ClientEvent::RegisterUser(data) => serde_json::to_string(&(name, data))?,
    };
    Ok(format!("42{body}"))
}
