//! Wire protocol for the ASCIIArena client.
//!
//! This crate defines the "language" that the client and the arena server
//! speak:
//!
//! - **Types** ([`Message`], [`PlayerId`], [`MatchLoad`], etc.): the
//!   message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding,
//!   decoding, or interpreting a message.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about sockets. The same codec is used
//! on both channels; the transport decides how the bytes are delimited.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Session / Match (state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    FrameUpdate, LogInResult, LogInStatus, MapSnapshot, MatchLoad, Message,
    PlayerAction, PlayerId,
};
