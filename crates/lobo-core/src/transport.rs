//! How Socket.IO frames reach the server.
//!
//! The channel only needs a pipe that moves text both ways and splits into a
//! read half and a write half, one per task. The binary plugs in
//! [`WsTransport`](crate::ws_transport::WsTransport); tests plug in an
//! in-memory pair.

use std::future::Future;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The server hung up.
    #[error("connection closed")]
    ConnectionClosed,

    #[error("could not connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// Anything else the socket reports once it is open.
    #[error("{0}")]
    Io(String),
}

/// Incoming side of a connection.
pub trait TransportReader: Send + 'static {
    /// Wait for the next frame. A clean close yields `Ok(None)`.
    fn next_frame(
        &mut self,
    ) -> impl Future<Output = Result<Option<String>, TransportError>> + Send;
}

/// Outgoing side of a connection.
pub trait TransportWriter: Send + 'static {
    fn send_frame(
        &mut self,
        frame: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// An open connection, consumed by [`split`](Transport::split).
pub trait Transport: Send + 'static {
    type Reader: TransportReader;
    type Writer: TransportWriter;

    fn split(self) -> (Self::Reader, Self::Writer);
}
