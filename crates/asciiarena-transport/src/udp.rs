//! Frame channel: one message per UDP datagram.
//!
//! No sequencing, acknowledgement, or reordering happens here. Whatever
//! arrives is handed up in arrival order; dealing with loss, duplicates,
//! and stale frames is the match layer's job.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;
use tokio::sync::watch;

use crate::{Connection, Delivery, TransportError};

/// Largest payload that fits in a single IPv4 UDP datagram.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// The unreliable, unordered frame channel.
///
/// The socket is bound to the locally chosen port (the one announced to
/// the server in the login request) and connected to the server's frame
/// endpoint, so datagrams from anyone else are dropped by the OS.
pub struct UdpConnection {
    socket: UdpSocket,
    peer: SocketAddr,
    closed: watch::Sender<bool>,
}

impl UdpConnection {
    /// Binds `local_port` on all interfaces and associates the socket with
    /// `host:remote_port`.
    ///
    /// # Errors
    /// - [`TransportError::Resolve`] if `host` does not resolve.
    /// - [`TransportError::BindFailed`] if the local port is taken.
    /// - [`TransportError::ConnectFailed`] if the association fails.
    pub async fn bind(
        local_port: u16,
        host: &str,
        remote_port: u16,
    ) -> Result<Self, TransportError> {
        let peer = resolve(host, remote_port).await?;

        // Match the local address family to the peer's.
        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, local_port).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, local_port).into()
        };

        let socket = UdpSocket::bind(local)
            .await
            .map_err(TransportError::BindFailed)?;
        socket
            .connect(peer)
            .await
            .map_err(TransportError::ConnectFailed)?;
        let (closed, _) = watch::channel(false);

        tracing::debug!(%local, %peer, "frame channel bound");

        Ok(Self {
            socket,
            peer,
            closed,
        })
    }

    /// The local address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// The server endpoint datagrams are exchanged with.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// `true` once [`close`](Connection::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Connection for UdpConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Shutdown);
        }
        if data.len() > MAX_DATAGRAM_SIZE {
            return Err(TransportError::FrameTooLarge(data.len()));
        }
        self.socket
            .send(data)
            .await
            .map_err(TransportError::SendFailed)?;
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Ok(None);
        }

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        tokio::select! {
            result = self.socket.recv(&mut buf) => {
                let len = result.map_err(TransportError::ReceiveFailed)?;
                buf.truncate(len);
                Ok(Some(buf))
            }
            _ = closed.wait_for(|closed| *closed) => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        if !self.closed.send_replace(true) {
            tracing::debug!(peer = %self.peer, "closing frame channel");
        }
        // The socket itself is released when the connection is dropped.
        Ok(())
    }

    fn delivery(&self) -> Delivery {
        Delivery::Unreliable
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let addr = format!("{host}:{port}");
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Resolve {
            addr: addr.clone(),
            source,
        })?;
    addrs.next().ok_or_else(|| TransportError::Resolve {
        addr,
        source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
    })
}
