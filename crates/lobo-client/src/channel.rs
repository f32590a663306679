//! The long-lived connection channel to the game server.
//!
//! Spawns background reader/writer tasks over a [`Transport`] and exposes:
//! - [`Channel`], a cheap-to-clone handle for emitting events and attaching
//!   named listeners. One is created per app session and shared.
//! - [`Inbox`], the single receiver of decoded inbound traffic, owned by the
//!   [`ClientController`](crate::client_controller::ClientController).
//!
//! The reader task handles the Socket.IO handshake on its own: it joins the
//! default namespace when the engine opens and answers pings, so the rest of
//! the client only ever sees typed [`ServerEvent`]s.

use tokio::sync::mpsc;

use lobo_core::frame::{self, CONNECT_PACKET, PONG_PACKET, Packet};
use lobo_core::protocol::{ClientEvent, ServerEvent};
use lobo_core::transport::{Transport, TransportError, TransportReader, TransportWriter};

use crate::listeners::{Listeners, Subscription};

/// Inbound traffic delivered to the [`Inbox`].
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The namespace handshake completed.
    Connected,
    /// A decoded server event.
    Event(ServerEvent),
    /// The server refused the namespace connection.
    Refused(String),
}

/// Receiving end of the channel. Channel close = disconnected.
pub struct Inbox {
    pub(crate) rx: mpsc::UnboundedReceiver<Inbound>,
}

/// Sending/listening handle to the connection.
#[derive(Clone)]
pub struct Channel {
    outgoing: mpsc::UnboundedSender<String>,
    listeners: Listeners,
}

impl Channel {
    /// Split `transport`, spawn the I/O tasks and return the handle pair.
    pub fn from_transport<T: Transport>(transport: T) -> (Self, Inbox) {
        let (reader, writer) = transport.split();

        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();

        spawn_reader_task(reader, in_tx, out_tx.clone());
        spawn_writer_task(writer, out_rx);

        let channel = Self {
            outgoing: out_tx,
            listeners: Listeners::new(),
        };
        (channel, Inbox { rx: in_rx })
    }

    /// Connect to a Lobo server given its base URL (`http://host:port`).
    #[cfg(feature = "native")]
    pub async fn connect_ws(server_url: &str) -> Result<(Self, Inbox), TransportError> {
        let url = lobo_core::ws_transport::socket_io_url(server_url);
        let transport = lobo_core::ws_transport::WsTransport::connect(&url).await?;
        Ok(Self::from_transport(transport))
    }

    /// Encode and enqueue an event. Non-blocking: the writer task does the I/O.
    pub fn emit(&self, event: &ClientEvent) -> Result<(), TransportError> {
        let text = frame::encode_event(event).map_err(|e| TransportError::Io(e.to_string()))?;
        tracing::debug!(event = event.name(), "emit");
        self.outgoing
            .send(text)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    /// Attach a named listener; see [`Listeners::on`].
    pub fn on<F>(&self, event: &str, owner: &str, handler: F) -> Subscription
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        self.listeners.on(event, owner, handler)
    }

    /// Detach a named listener; no-op if it isn't attached.
    pub fn off(&self, event: &str, owner: &str) -> bool {
        self.listeners.off(event, owner)
    }

    /// Detach everything `owner` registered.
    pub fn off_owner(&self, owner: &str) -> usize {
        self.listeners.off_owner(owner)
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}

impl Inbox {
    /// Await the next inbound item; `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<Inbound> {
        self.rx.recv().await
    }
}

fn spawn_reader_task<R: TransportReader>(
    mut reader: R,
    in_tx: mpsc::UnboundedSender<Inbound>,
    out_tx: mpsc::UnboundedSender<String>,
) {
    tokio::spawn(async move {
        loop {
            let text = match reader.next_frame().await {
                Ok(Some(text)) => text,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "connection read failed");
                    break;
                }
            };
            let inbound = match frame::decode(&text) {
                Ok(Packet::Open(_)) => {
                    let _ = out_tx.send(CONNECT_PACKET.to_string());
                    continue;
                }
                Ok(Packet::Ping) => {
                    let _ = out_tx.send(PONG_PACKET.to_string());
                    continue;
                }
                Ok(Packet::Pong) => continue,
                Ok(Packet::Connected) => Inbound::Connected,
                Ok(Packet::Event(event)) => Inbound::Event(event),
                Ok(Packet::ConnectError(reason)) => {
                    let _ = in_tx.send(Inbound::Refused(reason));
                    break;
                }
                Ok(Packet::Close | Packet::Disconnected) => break,
                Err(e) => {
                    tracing::debug!(error = %e, frame = %text, "dropping malformed frame");
                    continue;
                }
            };
            if in_tx.send(inbound).is_err() {
                break;
            }
        }
        // Dropping in_tx closes the inbox, signalling disconnect.
    });
}

fn spawn_writer_task<W: TransportWriter>(
    mut writer: W,
    mut out_rx: mpsc::UnboundedReceiver<String>,
) {
    tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if let Err(e) = writer.send_frame(&text).await {
                tracing::warn!(error = %e, "connection write failed");
                break;
            }
        }
    });
}


#[cfg(test)]
mod tests {
    use super::*;
    use lobo_core::protocol::PlayerRef;

    #[tokio::test]
    async fn answers_handshake_and_pings() {
        let (transport, mut server) = memory::pair();
        let (_channel, mut inbox) = Channel::from_transport(transport);

        server.push.send(r#"0{"sid":"abc"}"#.to_string()).unwrap();
        assert_eq!(server.sent.recv().await.as_deref(), Some(CONNECT_PACKET));

        server.push.send("40".to_string()).unwrap();
        assert_eq!(inbox.recv().await, Some(Inbound::Connected));

        server.push.send("2".to_string()).unwrap();
        assert_eq!(server.sent.recv().await.as_deref(), Some(PONG_PACKET));
    }

    #[tokio::test]
    async fn malformed_frames_are_skipped() {
        let (transport, server) = memory::pair();
        let (_channel, mut inbox) = Channel::from_transport(transport);

        server.push.send("42[oops".to_string()).unwrap();
        server.push.send(r#"42["bailar",{}]"#.to_string()).unwrap();
        server
            .push
            .send(r#"42["jugadorSalido",{"id":"u2"}]"#.to_string())
            .unwrap();

        assert_eq!(
            inbox.recv().await,
            Some(Inbound::Event(ServerEvent::PlayerLeft(PlayerRef {
                id: Some("u2".to_string())
            })))
        );
    }

    #[tokio::test]
    async fn emit_writes_event_frame() {
        let (transport, mut server) = memory::pair();
        let (channel, _inbox) = Channel::from_transport(transport);

        channel.emit(&ClientEvent::ListRooms).unwrap();
        assert_eq!(
            server.next_event_frame().await.as_deref(),
            Some(r#"42["obtenerSalas"]"#)
        );
    }

    #[tokio::test]
    async fn server_close_closes_inbox() {
        let (transport, server) = memory::pair();
        let (_channel, mut inbox) = Channel::from_transport(transport);
        drop(server);
        assert_eq!(inbox.recv().await, None);
    }

    #[tokio::test]
    async fn refused_connection_is_reported() {
        let (transport, server) = memory::pair();
        let (_channel, mut inbox) = Channel::from_transport(transport);
        server
            .push
            .send(r#"44{"message":"sesión inválida"}"#.to_string())
            .unwrap();
        assert_eq!(
            inbox.recv().await,
            Some(Inbound::Refused("sesión inválida".to_string()))
        );
        assert_eq!(inbox.recv().await, None);
    }
}
