/// Errors that can occur in the transport layer.
///
/// Every one of these is fatal to the session that owns the channel:
/// nothing in the client retries or reconnects.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the connection.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Dialing the server (or associating a datagram socket with it) failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Binding the local datagram port failed.
    #[error("bind failed: {0}")]
    BindFailed(#[source] std::io::Error),

    /// The server's address could not be resolved.
    #[error("could not resolve {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A message exceeds the maximum size the channel can carry.
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    /// The channel was closed locally.
    #[error("transport shut down")]
    Shutdown,
}
