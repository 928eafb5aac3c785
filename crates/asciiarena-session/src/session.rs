//! Session types: configuration and the lifecycle state.
//!
//! A "session" is the client's side of one connection to the arena
//! server. It tracks:
//! - WHERE the server is and which local frame port to use (`SessionConfig`)
//! - WHO we are (the local `PlayerId`)
//! - WHAT stage of the protocol we're in (`SessionState`)

use std::fmt;

use asciiarena_protocol::PlayerId;

/// The version announced to the server during the version check.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Everything the session needs to know before it dials.
///
/// These are the only knobs the protocol core has. Use
/// `SessionConfig::default()` and override the fields you care about.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server host name or IP address.
    pub host: String,
    /// Server port for the control channel.
    pub control_port: u16,
    /// Local port to bind for the frame channel. Announced to the server
    /// in the login request, so it must be fixed before login.
    pub frame_port: u16,
    /// Protocol version announced to the server.
    pub version: String,
    /// The character we play as.
    pub player: PlayerId,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            control_port: 3001,
            frame_port: 3002,
            version: CLIENT_VERSION.to_string(),
            player: PlayerId('A'),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the session is in the protocol.
///
/// ```text
/// Connecting → VersionChecking → LoggingIn → WaitingForPlayers
///                    │               │            ↑       │
///                    ▼               ▼            │       ▼
///                 Rejected        Rejected     InMatch ← LoadingMatch
///
/// (any state) ──(error or close)──→ Closed
/// ```
///
/// `Rejected` and `Closed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    VersionChecking,
    LoggingIn,
    WaitingForPlayers,
    LoadingMatch,
    InMatch,
    /// The server refused our version or our login.
    Rejected,
    /// Both channels are closed.
    Closed,
}

impl SessionState {
    /// `true` for states no protocol activity can leave.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::VersionChecking => "version-checking",
            Self::LoggingIn => "logging-in",
            Self::WaitingForPlayers => "waiting-for-players",
            Self::LoadingMatch => "loading-match",
            Self::InMatch => "in-match",
            Self::Rejected => "rejected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
