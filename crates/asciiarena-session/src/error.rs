//! Error types for the session layer.

use asciiarena_match::MatchError;
use asciiarena_protocol::{LogInStatus, ProtocolError};
use asciiarena_transport::TransportError;

use crate::SessionState;

/// Errors that can end a session.
///
/// Every one of these is fatal: the session closes both channels before
/// returning it and never retries.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A channel failed to connect, send, or receive.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded or decoded, or the server sent
    /// something other than what the current state expects.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The frame listener failed during a match.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// The server answered the login request with a non-OK status.
    #[error("login rejected: {0}")]
    LoginRejected(LogInStatus),

    /// The frame listener task panicked or was cancelled.
    #[error("frame listener panicked: {0}")]
    ListenerPanicked(String),

    /// A session step was called in a state it does not belong to.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}
