//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. A
//! `ProtocolError` always means the bytes or the message itself were the
//! problem, never the socket underneath.

use crate::Message;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into bytes).
    ///
    /// With a closed set of plain data messages this should not happen in
    /// practice, but the codec API is fallible so we surface it anyway.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes could not be decoded into a message.
    ///
    /// Common causes: truncated datagrams, corrupt frames, unknown
    /// `"type"` tags, or missing fields. On the control channel this is
    /// fatal because the stream can no longer be trusted.
    #[cfg(feature = "json")]
    #[error("malformed message: {0}")]
    Malformed(serde_json::Error),

    /// A well-formed message arrived at a point in the protocol where a
    /// different one was expected.
    ///
    /// The codec never produces this. Callers raise it after decoding,
    /// when they match on the variant they were waiting for.
    #[error("unexpected message: expected {expected}, received {received}")]
    Unexpected {
        /// Name of the variant the caller was waiting for.
        expected: &'static str,
        /// Name of the variant that actually arrived.
        received: &'static str,
    },
}

impl ProtocolError {
    /// Builds an [`Unexpected`](Self::Unexpected) error from the message
    /// that arrived instead of `expected`.
    pub fn unexpected(expected: &'static str, received: &Message) -> Self {
        Self::Unexpected {
            expected,
            received: received.kind(),
        }
    }
}
