//! A scripted arena server for session tests.
//!
//! The server side uses the same transport and codec as the client, so the
//! tests read like the conversation they check.

#![allow(dead_code)]

use asciiarena_protocol::{
    Codec, FrameUpdate, JsonCodec, LogInResult, LogInStatus, MapSnapshot,
    MatchLoad, Message, PlayerId,
};
use asciiarena_session::SessionConfig;
use asciiarena_transport::{Connection, TcpConnection};
use tokio::net::{TcpListener, UdpSocket};

pub struct FakeServer {
    listener: TcpListener,
    udp: UdpSocket,
}

impl FakeServer {
    pub async fn start() -> Self {
        Self {
            listener: TcpListener::bind("127.0.0.1:0").await.unwrap(),
            udp: UdpSocket::bind("127.0.0.1:0").await.unwrap(),
        }
    }

    pub fn control_port(&self) -> u16 {
        self.listener.local_addr().unwrap().port()
    }

    pub fn frame_port(&self) -> u16 {
        self.udp.local_addr().unwrap().port()
    }

    /// A client config aimed at this server, with a free local frame port.
    pub fn config(&self, player: char) -> SessionConfig {
        SessionConfig {
            host: "127.0.0.1".to_string(),
            control_port: self.control_port(),
            frame_port: free_udp_port(),
            player: PlayerId(player),
            ..SessionConfig::default()
        }
    }

    pub async fn accept(&self) -> ClientLink {
        let (stream, _) = self.listener.accept().await.unwrap();
        ClientLink {
            control: TcpConnection::from_stream(stream).unwrap(),
        }
    }

    /// Sends one frame update datagram to the client's frame port.
    pub async fn send_frame(&self, client_port: u16, frame_id: u32) {
        let bytes = JsonCodec
            .encode(&Message::FrameUpdate(FrameUpdate { frame_id }))
            .unwrap();
        self.udp
            .send_to(&bytes, ("127.0.0.1", client_port))
            .await
            .unwrap();
    }

    pub fn log_in_ok(&self, required_players: u32, registered: &[char]) -> Message {
        Message::LogInResult(LogInResult {
            status: LogInStatus::Ok,
            server_udp_port: self.frame_port(),
            required_players,
            registered_players: registered.iter().copied().map(PlayerId).collect(),
        })
    }
}

/// The server's end of one client's control channel.
pub struct ClientLink {
    control: TcpConnection,
}

impl ClientLink {
    pub async fn send(&self, message: Message) {
        let bytes = JsonCodec.encode(&message).unwrap();
        self.control.send(&bytes).await.unwrap();
    }

    /// The next message from the client, or `None` once it hung up.
    pub async fn recv(&self) -> Option<Message> {
        match self.control.recv().await {
            Ok(Some(data)) => Some(JsonCodec.decode(&data).unwrap()),
            Ok(None) | Err(_) => None,
        }
    }

    /// Everything the client sends until it hangs up.
    pub async fn drain(&self) -> Vec<Message> {
        let mut messages = Vec::new();
        while let Some(message) = self.recv().await {
            messages.push(message);
        }
        messages
    }

    /// Reads the version announcement and accepts it.
    pub async fn accept_version(&self) -> Message {
        let announce = self.recv().await.expect("client should announce its version");
        self.send(Message::VersionAck {
            version: "server".to_string(),
            accepted: true,
        })
        .await;
        announce
    }

    /// Reads the login request and returns the frame port it asks for.
    pub async fn expect_login(&self) -> u16 {
        match self.recv().await {
            Some(Message::LogInRequest { requested_udp_port, .. }) => requested_udp_port,
            other => panic!("expected LogInRequest, got {other:?}"),
        }
    }

    pub async fn join(&self, player: char) {
        self.send(Message::PlayerConnectionEvent {
            joined: true,
            player: PlayerId(player),
        })
        .await;
    }

    pub async fn leave(&self, player: char) {
        self.send(Message::PlayerConnectionEvent {
            joined: false,
            player: PlayerId(player),
        })
        .await;
    }

    pub async fn load_match(&self, milliseconds_to_start: u32) {
        self.send(Message::MatchLoad(MatchLoad {
            milliseconds_to_start,
            map: small_map(),
        }))
        .await;
    }
}

pub fn small_map() -> MapSnapshot {
    MapSnapshot {
        width: 2,
        height: 2,
        cells: vec![0, 0, 0, 0],
        seed: 42,
    }
}

/// A local UDP port that was free a moment ago.
pub fn free_udp_port() -> u16 {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}
