//! `ClientBuilder`: the entry point for connecting to an arena server.

use asciiarena_protocol::{Codec, JsonCodec, PlayerId};
use asciiarena_session::{Session, SessionConfig};

use crate::ArenaError;

/// Builder for configuring and connecting a client session.
///
/// # Example
///
/// ```rust,no_run
/// use asciiarena::prelude::*;
///
/// # async fn play() -> Result<(), ArenaError> {
/// let mut session = ClientBuilder::new()
///     .host("arena.example.org")
///     .player('B')
///     .frame_port(4002)
///     .connect()
///     .await?;
/// assert!(session.check_version().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: SessionConfig,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server host name or IP address.
    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    /// Sets the server's control port.
    pub fn control_port(mut self, port: u16) -> Self {
        self.config.control_port = port;
        self
    }

    /// Sets the local port the frame channel binds to.
    pub fn frame_port(mut self, port: u16) -> Self {
        self.config.frame_port = port;
        self
    }

    /// Overrides the protocol version announced to the server.
    pub fn version(mut self, version: &str) -> Self {
        self.config.version = version.to_string();
        self
    }

    /// Sets the player letter to log in as.
    pub fn player(mut self, player: char) -> Self {
        self.config.player = PlayerId(player);
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration built so far.
    pub fn session_config(&self) -> &SessionConfig {
        &self.config
    }

    /// Dials the server with the JSON codec.
    pub async fn connect(self) -> Result<Session<JsonCodec>, ArenaError> {
        Ok(Session::connect(self.config).await?)
    }

    /// Dials the server with a custom codec.
    pub async fn connect_with_codec<K: Codec>(self, codec: K) -> Result<Session<K>, ArenaError> {
        Ok(Session::connect_with_codec(self.config, codec).await?)
    }
}
