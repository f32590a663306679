//! Errors raised by local player actions.
//!
//! Every variant's message is the notice shown to the player; nothing here is
//! fatal and no variant is ever retried automatically.

use lobo_core::transport::TransportError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Tried to change another occupant's ready state.
    #[error("Solo puedes cambiar tu propio estado")]
    NotYourSeat,

    #[error("Solo el líder puede iniciar la partida")]
    NotLeader,

    #[error("Todos los jugadores deben estar listos para empezar")]
    NotAllReady,

    #[error("No estás en ninguna sala")]
    NoRoom,

    #[error("No hay ninguna votación en curso")]
    NoVote,

    #[error("No se puede votar al asiento {0}")]
    InvalidSeat(usize),

    #[error("El mensaje está vacío")]
    EmptyMessage,

    #[error("{0}")]
    InvalidInput(String),

    /// Transport failure; the detail is logged, the player sees a generic
    /// notice.
    #[error("No se pudo contactar con el servidor")]
    Transport(String),
}

impl From<TransportError> for ActionError {
    fn from(e: TransportError) -> Self {
        ActionError::Transport(e.to_string())
    }
}
