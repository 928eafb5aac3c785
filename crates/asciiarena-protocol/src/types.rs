//! Core protocol types for the ASCIIArena wire format.
//!
//! Every type in this module travels "on the wire": it gets serialized to
//! bytes, sent over the control stream or a frame datagram, and
//! deserialized by the server (or by us, for server-to-client messages).
//!
//! Think of this as the "language" that the client and server speak.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The identifier of a player: a single character, drawn on the map as the
/// player's avatar.
///
/// Newtype over `char` so that a player can't be confused with any other
/// character data. `#[serde(transparent)]` keeps it a one-character JSON
/// string (`"A"`) on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub char);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0)
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// The server's verdict on a [`Message::LogInRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogInStatus {
    /// The player is registered for the next match.
    Ok,
    /// Another connected client already uses this player character.
    PlayerAlreadyExists,
    /// The server has no free player slots.
    PlayerLimitReached,
}

impl LogInStatus {
    /// `true` only for [`LogInStatus::Ok`].
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for LogInStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "ok",
            Self::PlayerAlreadyExists => "player already exists",
            Self::PlayerLimitReached => "player limit reached",
        };
        f.write_str(text)
    }
}

/// Server → Client answer to a login request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogInResult {
    pub status: LogInStatus,
    /// Where the server expects frame datagrams to be exchanged.
    pub server_udp_port: u16,
    /// How many players a match needs before it is loaded.
    /// Fixed for the whole matchmaking wait.
    pub required_players: u32,
    /// Players already registered when this client logged in,
    /// in registration order.
    pub registered_players: Vec<PlayerId>,
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// The arena layout for one match.
///
/// `cells` is row-major, `width * height` entries. The protocol core does
/// not interpret cell values; that's the renderer's business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSnapshot {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<u8>,
    pub seed: u32,
}

/// Server → Client: "the roster is complete, here's the map."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLoad {
    /// Countdown before local input is admitted.
    pub milliseconds_to_start: u32,
    pub map: MapSnapshot,
}

/// Server → Client, over the frame channel: one authoritative tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameUpdate {
    pub frame_id: u32,
}

/// Client → Server: one input from the local player.
///
/// `frame_id` is the newest frame the client had seen when the input was
/// taken, so the server can tell how stale the input is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAction {
    pub frame_id: u32,
    /// Opaque action code produced by the input collaborator.
    pub action: u32,
}

// ---------------------------------------------------------------------------
// Message: the closed set of everything on the wire
// ---------------------------------------------------------------------------

/// Every message the client sends or receives.
///
/// `#[serde(tag = "type")]` produces "internally tagged" JSON:
///   `{ "type": "FrameUpdate", "frame_id": 12 }`
///
/// Because this is a plain enum, the set of messages is closed at compile
/// time: adding one means adding a variant, and every `match` on
/// `Message` in the workspace has to account for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    // -- Version check --

    /// Client → Server: "this is the protocol version I speak."
    VersionAnnounce { version: String },

    /// Server → Client: "this is mine, and you may (not) continue."
    VersionAck { version: String, accepted: bool },

    // -- Login --

    /// Client → Server: "register me as `player`; send my frames to
    /// `requested_udp_port`."
    LogInRequest {
        player: PlayerId,
        requested_udp_port: u16,
    },

    /// Server → Client: see [`LogInResult`].
    LogInResult(LogInResult),

    // -- Matchmaking --

    /// Server → Client: a player joined (`joined == true`) or left.
    PlayerConnectionEvent { joined: bool, player: PlayerId },

    /// Server → Client: see [`MatchLoad`].
    MatchLoad(MatchLoad),

    // -- In match --

    /// Server → Client (frame channel): see [`FrameUpdate`].
    FrameUpdate(FrameUpdate),

    /// Client → Server: see [`PlayerAction`].
    PlayerAction(PlayerAction),
}

impl Message {
    /// The variant name, for logs and
    /// [`ProtocolError::Unexpected`](crate::ProtocolError::Unexpected).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VersionAnnounce { .. } => "VersionAnnounce",
            Self::VersionAck { .. } => "VersionAck",
            Self::LogInRequest { .. } => "LogInRequest",
            Self::LogInResult(_) => "LogInResult",
            Self::PlayerConnectionEvent { .. } => "PlayerConnectionEvent",
            Self::MatchLoad(_) => "MatchLoad",
            Self::FrameUpdate(_) => "FrameUpdate",
            Self::PlayerAction(_) => "PlayerAction",
        }
    }
}

impl From<FrameUpdate> for Message {
    fn from(update: FrameUpdate) -> Self {
        Self::FrameUpdate(update)
    }
}

impl From<PlayerAction> for Message {
    fn from(action: PlayerAction) -> Self {
        Self::PlayerAction(action)
    }
}

// =========================================================================
// Tests
// =========================================================================
