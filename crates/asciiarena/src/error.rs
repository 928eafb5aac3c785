//! Unified error type for the ASCIIArena client.

use asciiarena_match::MatchError;
use asciiarena_protocol::ProtocolError;
use asciiarena_session::SessionError;
use asciiarena_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `asciiarena` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// A transport-level error (connect, bind, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unexpected message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The frame listener failed during a match.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// A session-level error (rejection, wrong state).
    #[error(transparent)]
    Session(#[from] SessionError),
}
