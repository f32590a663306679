//! Socket.IO over a plain WebSocket (`tokio-tungstenite`). Only the
//! `websocket` Engine.IO transport is spoken; there is no long-polling
//! fallback.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::transport::{Transport, TransportError, TransportReader, TransportWriter};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build the Socket.IO WebSocket endpoint for a server base URL.
///
/// `http(s)://` is rewritten to `ws(s)://`; a URL that already names the
/// `/socket.io/` path is returned unchanged.
pub fn socket_io_url(base: &str) -> String {
    if base.contains("/socket.io/") {
        return base.to_string();
    }
    let base = base.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{base}/socket.io/?EIO=4&transport=websocket")
}

/// An open WebSocket to the game server.
pub struct WsTransport {
    stream: WsStream,
}

impl WsTransport {
    /// `url` must already be a `ws://` or `wss://` endpoint; see
    /// [`socket_io_url`].
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (stream, _response) =
            connect_async(url)
                .await
                .map_err(|e| TransportError::Connect {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        tracing::debug!(url, "WebSocket connected");
        Ok(Self { stream })
    }
}

impl Transport for WsTransport {
    type Reader = WsReader;
    type Writer = WsWriter;

    fn split(self) -> (Self::Reader, Self::Writer) {
        let (sink, stream) = self.stream.split();
        (WsReader { stream }, WsWriter { sink })
    }
}

pub struct WsReader {
    stream: SplitStream<WsStream>,
}

impl TransportReader for WsReader {
    async fn next_frame(&mut self) -> Result<Option<String>, TransportError> {
        while let Some(message) = self.stream.next().await {
            match message.map_err(|e| TransportError::Io(e.to_string()))? {
                Message::Text(text) => return Ok(Some(text.to_string())),
                Message::Close(_) => break,
                // Engine.IO pings travel as text; socket-level control
                // frames are tungstenite's business.
                _ => {}
            }
        }
        Ok(None)
    }
}

pub struct WsWriter {
    sink: SplitSink<WsStream, Message>,
}

impl TransportWriter for WsWriter {
    async fn send_frame(&mut self, frame: &str) -> Result<(), TransportError> {
        self.sink
            .send(Message::text(frame))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}
