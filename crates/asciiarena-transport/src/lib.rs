//! Transport layer for the ASCIIArena client.
//!
//! The client talks to the arena server over two independent channels:
//!
//! - [`TcpConnection`]: the *control channel*. Reliable and ordered;
//!   carries the handshake, login, matchmaking, and player actions.
//! - [`UdpConnection`]: the *frame channel*. Unreliable and unordered;
//!   carries the server's authoritative frame updates.
//!
//! Both implement the [`Connection`] trait, which moves opaque byte
//! messages. Encoding is the protocol layer's job.

mod error;
mod tcp;
mod udp;

pub use error::TransportError;
pub use tcp::{MAX_FRAME_SIZE, TcpConnection};
pub use udp::{MAX_DATAGRAM_SIZE, UdpConnection};

use std::fmt;
use std::future::Future;

/// The delivery guarantee a connection provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered in order, no loss. Like TCP.
    ReliableOrdered,
    /// May be lost, duplicated, or arrive out of order. Like UDP.
    Unreliable,
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReliableOrdered => f.write_str("reliable-ordered"),
            Self::Unreliable => f.write_str("unreliable"),
        }
    }
}

/// A single channel to the server that can send and receive messages.
///
/// The futures are `Send` so that a connection can be driven from a
/// spawned Tokio task (the frame listener) while another task uses it.
pub trait Connection: Send + Sync + 'static {
    /// Sends one message to the server.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next message from the server.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed, either by
    /// the peer or by a local [`close`](Self::close). A pending `recv` is
    /// woken up by `close`.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection. Closing twice is a no-op.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// The delivery guarantee of this connection.
    fn delivery(&self) -> Delivery;
}
