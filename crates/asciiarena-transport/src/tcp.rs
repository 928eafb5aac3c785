//! Control channel: length-delimited messages over a TCP stream.
//!
//! Wire format: a 4-byte big-endian length prefix followed by the encoded
//! message. TCP is a byte stream, so the prefix is the only thing that
//! tells one message from the next.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, watch};

use crate::{Connection, Delivery, TransportError};

/// Maximum accepted message size (16 MB). Protects against unbounded
/// allocation from a corrupt length prefix. Match maps are the largest
/// messages we expect, and are far below this.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// The reliable, ordered control channel.
///
/// The stream is split into halves with separate locks, so a task blocked
/// in [`recv`](Connection::recv) never holds up a task that is sending.
pub struct TcpConnection {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    peer: SocketAddr,
    /// Flipped to `true` by `close`; pending receives watch it.
    closed: watch::Sender<bool>,
}

impl TcpConnection {
    /// Dials the server's control port.
    pub async fn connect(
        host: &str,
        port: u16,
    ) -> Result<Self, TransportError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(TransportError::ConnectFailed)?;
        Self::from_stream(stream)
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Result<Self, TransportError> {
        stream
            .set_nodelay(true)
            .map_err(TransportError::ConnectFailed)?;
        let peer = stream.peer_addr().map_err(TransportError::ConnectFailed)?;
        let (reader, writer) = stream.into_split();
        let (closed, _) = watch::channel(false);

        tracing::debug!(%peer, "control channel connected");

        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            peer,
            closed,
        })
    }

    /// The server endpoint this channel is connected to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// `true` once [`close`](Connection::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Connection for TcpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Shutdown);
        }
        let len = u32::try_from(data.len())
            .ok()
            .filter(|len| *len <= MAX_FRAME_SIZE)
            .ok_or(TransportError::FrameTooLarge(data.len()))?;

        // One write per message so the prefix and payload can't be
        // interleaved with another sender's.
        let mut frame = Vec::with_capacity(4 + data.len());
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(data);

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&frame)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Ok(None);
        }

        let mut reader = self.reader.lock().await;
        tokio::select! {
            result = read_frame(&mut reader) => result,
            _ = closed.wait_for(|closed| *closed) => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.send_replace(true) {
            return Ok(());
        }
        tracing::debug!(peer = %self.peer, "closing control channel");

        let mut writer = self.writer.lock().await;
        match writer.shutdown().await {
            Ok(()) => Ok(()),
            // The peer got there first.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::SendFailed(e)),
        }
    }

    fn delivery(&self) -> Delivery {
        Delivery::ReliableOrdered
    }
}

/// Reads one length-delimited frame.
///
/// A clean EOF before the prefix is a normal close (`Ok(None)`); an EOF in
/// the middle of a frame is an error.
async fn read_frame(
    reader: &mut OwnedReadHalf,
) -> Result<Option<Vec<u8>>, TransportError> {
    let len = match reader.read_u32().await {
        Ok(len) => len,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(TransportError::ReceiveFailed(e)),
    };
    if len > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(len as usize));
    }

    let mut buf = vec![0u8; len as usize];
    reader
        .read_exact(&mut buf)
        .await
        .map_err(TransportError::ReceiveFailed)?;
    Ok(Some(buf))
}
