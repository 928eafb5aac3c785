//! Error types for the match layer.

use asciiarena_protocol::ProtocolError;
use asciiarena_transport::TransportError;

/// Errors that end a frame listener.
///
/// Any of these is fatal for the match that owns the listener, and the
/// session treats it as fatal for itself too.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The frame channel failed or was closed under us.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A datagram could not be decoded, or was not a frame update.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The listener task panicked or was aborted.
    #[error("frame listener task failed: {0}")]
    TaskFailed(String),
}
