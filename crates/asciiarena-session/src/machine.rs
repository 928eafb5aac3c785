//! The client session: drives the control channel through version check,
//! login, matchmaking, and the match loop.
//!
//! Each step is a method that checks it is called in the right state,
//! talks to the server, and moves to the next state. [`Session::run`]
//! chains the steps for callers that don't need to observe them.
//!
//! Any error closes both channels before it is returned. There is no
//! retry: a caller that wants to try again connects a new session.

use std::sync::Arc;
use std::time::Duration;

use asciiarena_match::{FrameHandler, FrameListener, ListenerHandle, Match, MatchError, MatchState};
use asciiarena_protocol::{
    Codec, JsonCodec, LogInResult, LogInStatus, MatchLoad, Message, ProtocolError,
};
use asciiarena_transport::{Connection, TcpConnection, TransportError, UdpConnection};

use crate::{ActionEmitter, ActionSource, Roster, RosterChange, SessionConfig, SessionError, SessionState};

/// How [`Session::run`] ended, when it ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The server does not speak our protocol version.
    VersionRejected,
    /// The server refused the login.
    LoginRejected(LogInStatus),
    /// The server closed the control channel between matches.
    ServerClosed { matches_played: u32 },
}

/// What one match looked like from this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    /// The match state when the frame listener stopped.
    pub state: MatchState,
    /// How many actions the emitter sent.
    pub actions_sent: u64,
}

/// One client connection to the arena server.
pub struct Session<K: Codec = JsonCodec> {
    config: SessionConfig,
    codec: K,
    state: SessionState,
    control: TcpConnection,
    /// Opened once, by a successful login.
    frames: Option<Arc<UdpConnection>>,
    roster: Roster,
    current: Option<Match>,
    listener: Option<ListenerHandle>,
}

impl Session<JsonCodec> {
    /// Dials the server's control port with the default JSON codec.
    pub async fn connect(config: SessionConfig) -> Result<Self, SessionError> {
        Self::connect_with_codec(config, JsonCodec).await
    }
}

impl<K: Codec> Session<K> {
    /// Dials the server's control port.
    ///
    /// On success the session is in `VersionChecking`.
    pub async fn connect_with_codec(config: SessionConfig, codec: K) -> Result<Self, SessionError> {
        tracing::info!(
            host = %config.host,
            port = config.control_port,
            player = %config.player,
            "connecting"
        );
        let control = TcpConnection::connect(&config.host, config.control_port).await?;

        let mut session = Self {
            config,
            codec,
            state: SessionState::Connecting,
            control,
            frames: None,
            roster: Roster::new(0, &[]),
            current: None,
            listener: None,
        };
        session.transition(SessionState::VersionChecking);
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Players registered for the next match.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The match being loaded or played, if any.
    pub fn current_match(&self) -> Option<&Match> {
        self.current.as_ref()
    }

    /// The frame channel, from login until [`close`](Self::close).
    pub fn frame_channel(&self) -> Option<&UdpConnection> {
        self.frames.as_deref()
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    /// Announces our version and waits for the server's verdict.
    ///
    /// Returns `false` if the server rejected it. The session is then
    /// `Rejected` and both channels are closed.
    pub async fn check_version(&mut self) -> Result<bool, SessionError> {
        self.expect_state(SessionState::VersionChecking, "check the version")?;
        let result = self.exchange_versions().await;
        self.close_on_error(result).await
    }

    async fn exchange_versions(&mut self) -> Result<bool, SessionError> {
        let announce = Message::VersionAnnounce {
            version: self.config.version.clone(),
        };
        self.send(&announce).await?;

        match self.receive().await? {
            Message::VersionAck { version, accepted: true } => {
                tracing::info!(server_version = %version, "version accepted");
                self.transition(SessionState::LoggingIn);
                Ok(true)
            }
            Message::VersionAck { version, accepted: false } => {
                tracing::warn!(
                    local = %self.config.version,
                    server_version = %version,
                    "version rejected"
                );
                self.reject().await;
                Ok(false)
            }
            other => Err(ProtocolError::unexpected("VersionAck", &other).into()),
        }
    }

    /// Logs in as the configured player and opens the frame channel.
    ///
    /// A non-OK status leaves the session `Rejected` with both channels
    /// closed, and is returned as [`SessionError::LoginRejected`].
    pub async fn log_in(&mut self) -> Result<LogInResult, SessionError> {
        self.expect_state(SessionState::LoggingIn, "log in")?;
        let result = self.exchange_login().await;
        self.close_on_error(result).await
    }

    async fn exchange_login(&mut self) -> Result<LogInResult, SessionError> {
        let request = Message::LogInRequest {
            player: self.config.player,
            requested_udp_port: self.config.frame_port,
        };
        self.send(&request).await?;

        let result = match self.receive().await? {
            Message::LogInResult(result) => result,
            other => return Err(ProtocolError::unexpected("LogInResult", &other).into()),
        };

        if !result.status.is_ok() {
            tracing::warn!(player = %self.config.player, status = %result.status, "login rejected");
            self.reject().await;
            return Err(SessionError::LoginRejected(result.status));
        }

        let frames = UdpConnection::bind(
            self.config.frame_port,
            &self.config.host,
            result.server_udp_port,
        )
        .await?;
        self.frames = Some(Arc::new(frames));

        let required = usize::try_from(result.required_players).unwrap_or(usize::MAX);
        self.roster = Roster::new(required, &result.registered_players);
        if self.roster.len() < result.registered_players.len() {
            tracing::warn!(
                registered = result.registered_players.len(),
                kept = self.roster.len(),
                "dropped duplicate or surplus registered players"
            );
        }

        tracing::info!(
            player = %self.config.player,
            server_udp_port = result.server_udp_port,
            required = result.required_players,
            registered = self.roster.len(),
            "logged in"
        );
        self.transition(SessionState::WaitingForPlayers);
        Ok(result)
    }

    /// Tracks players joining and leaving until the roster is complete,
    /// then waits for the server to load the match.
    ///
    /// A `MatchLoad` that arrives while players are still missing is a
    /// protocol violation.
    pub async fn wait_for_match(&mut self) -> Result<MatchLoad, SessionError> {
        self.expect_state(SessionState::WaitingForPlayers, "wait for a match")?;
        let result = self.await_match_load().await;
        self.close_on_error(result).await
    }

    async fn await_match_load(&mut self) -> Result<MatchLoad, SessionError> {
        loop {
            let message = self.receive().await?;
            match message {
                Message::PlayerConnectionEvent { joined, player } => {
                    match self.roster.apply(joined, player) {
                        RosterChange::Joined | RosterChange::Left => {
                            tracing::info!(
                                %player,
                                joined,
                                players = self.roster.len(),
                                required = self.roster.required(),
                                "roster changed"
                            );
                        }
                        change => {
                            tracing::warn!(%player, joined, ?change, "ignored connection event");
                        }
                    }
                }
                Message::MatchLoad(load) if self.roster.is_complete() => {
                    tracing::info!(
                        width = load.map.width,
                        height = load.map.height,
                        starts_in_ms = load.milliseconds_to_start,
                        "match loaded"
                    );
                    self.transition(SessionState::LoadingMatch);
                    return Ok(load);
                }
                other => {
                    let expected = if self.roster.is_complete() {
                        "MatchLoad"
                    } else {
                        "PlayerConnectionEvent"
                    };
                    return Err(ProtocolError::unexpected(expected, &other).into());
                }
            }
        }
    }

    /// Builds the match, starts listening for its frames, and holds back
    /// until the match starts.
    ///
    /// Frames that arrive during the pre-match delay are applied; only
    /// local actions wait.
    pub async fn load_match<H: FrameHandler>(
        &mut self,
        load: MatchLoad,
        handler: H,
    ) -> Result<Match, SessionError> {
        self.expect_state(SessionState::LoadingMatch, "load a match")?;
        let frames = match &self.frames {
            Some(frames) => Arc::clone(frames),
            None => {
                return Err(SessionError::InvalidState {
                    operation: "load a match without a frame channel",
                    state: self.state,
                });
            }
        };

        let game = Match::new(load.map);
        let listener = FrameListener::new(frames, self.codec.clone(), game.clone(), handler);
        self.listener = Some(listener.spawn());
        self.current = Some(game.clone());

        let delay = Duration::from_millis(u64::from(load.milliseconds_to_start));
        if !delay.is_zero() {
            tracing::debug!(?delay, "waiting for match start");
            tokio::time::sleep(delay).await;
        }

        self.transition(SessionState::InMatch);
        Ok(game)
    }

    /// Sends actions until the match finishes, then goes back to waiting
    /// for players.
    ///
    /// The frame listener has always stopped by the time this returns,
    /// whether the match ended normally or not.
    pub async fn play<S: ActionSource>(&mut self, input: &mut S) -> Result<MatchSummary, SessionError> {
        self.expect_state(SessionState::InMatch, "play")?;
        let result = self.run_match(input).await;
        self.close_on_error(result).await
    }

    async fn run_match<S: ActionSource>(&mut self, input: &mut S) -> Result<MatchSummary, SessionError> {
        let (Some(game), Some(listener)) = (self.current.take(), self.listener.take()) else {
            return Err(SessionError::InvalidState {
                operation: "play without a loaded match",
                state: self.state,
            });
        };

        // If this future is dropped mid-match, the guard finishes the match
        // and dropping `listener` aborts its task.
        let _finish = FinishOnDrop(game.clone());

        let emitted = ActionEmitter::new(&self.control, &self.codec, &game)
            .run(input)
            .await;
        if emitted.is_err() {
            // Stops the listener too.
            game.finish();
        }

        let listened = match listener.join().await {
            Err(MatchError::TaskFailed(reason)) => Err(SessionError::ListenerPanicked(reason)),
            other => other.map_err(SessionError::from),
        };

        let actions_sent = emitted?;
        let state = listened?;
        tracing::info!(
            frame_id = state.frame_id,
            frames_applied = state.frames_applied,
            frames_stale = state.frames_stale,
            actions_sent,
            "match over"
        );

        self.transition(SessionState::WaitingForPlayers);
        Ok(MatchSummary { state, actions_sent })
    }

    /// Runs the whole protocol: version check, login, then matches until
    /// the server goes away.
    ///
    /// `handlers` is called once per match to build the frame handler
    /// that decides when that match ends.
    pub async fn run<S, H, F>(&mut self, input: &mut S, mut handlers: F) -> Result<SessionOutcome, SessionError>
    where
        S: ActionSource,
        H: FrameHandler,
        F: FnMut() -> H,
    {
        if !self.check_version().await? {
            return Ok(SessionOutcome::VersionRejected);
        }

        match self.log_in().await {
            Ok(_) => {}
            Err(SessionError::LoginRejected(status)) => {
                return Ok(SessionOutcome::LoginRejected(status));
            }
            Err(e) => return Err(e),
        }

        let mut matches_played = 0;
        loop {
            let load = match self.wait_for_match().await {
                Ok(load) => load,
                Err(SessionError::Transport(TransportError::ConnectionClosed(reason))) => {
                    tracing::info!(%reason, matches_played, "server closed the session");
                    return Ok(SessionOutcome::ServerClosed { matches_played });
                }
                Err(e) => return Err(e),
            };
            self.load_match(load, handlers()).await?;
            self.play(input).await?;
            matches_played += 1;
        }
    }

    /// Closes both channels and stops any running frame listener.
    ///
    /// A rejected session stays `Rejected`; anything else becomes `Closed`.
    pub async fn close(&mut self) {
        if let Some(game) = self.current.take() {
            game.finish();
        }
        if let Some(listener) = self.listener.take() {
            if let Err(e) = listener.join().await {
                tracing::debug!(error = %e, "frame listener ended with an error during close");
            }
        }

        if let Err(e) = self.control.close().await {
            tracing::debug!(error = %e, "closing control channel");
        }
        // The listener has stopped, so this is the last reference and the
        // frame port is released here.
        if let Some(frames) = self.frames.take() {
            if let Err(e) = frames.close().await {
                tracing::debug!(error = %e, "closing frame channel");
            }
        }

        if self.state != SessionState::Rejected && self.state != SessionState::Closed {
            self.transition(SessionState::Closed);
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn expect_state(&self, expected: SessionState, operation: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, next: SessionState) {
        tracing::info!(from = %self.state, to = %next, "session state changed");
        self.state = next;
    }

    async fn reject(&mut self) {
        self.transition(SessionState::Rejected);
        self.close().await;
    }

    async fn close_on_error<T>(&mut self, result: Result<T, SessionError>) -> Result<T, SessionError> {
        if let Err(e) = &result {
            // A rejection has already closed the session.
            if !self.state.is_terminal() {
                tracing::error!(state = %self.state, error = %e, "session failed");
                self.close().await;
            }
        }
        result
    }

    async fn send(&self, message: &Message) -> Result<(), SessionError> {
        let bytes = self.codec.encode(message)?;
        self.control.send(&bytes).await?;
        tracing::debug!(kind = message.kind(), "sent");
        Ok(())
    }

    async fn receive(&self) -> Result<Message, SessionError> {
        let Some(data) = self.control.recv().await? else {
            return Err(TransportError::ConnectionClosed(format!(
                "control channel closed by {}",
                self.control.peer_addr()
            ))
            .into());
        };
        let message: Message = self.codec.decode(&data)?;
        tracing::debug!(kind = message.kind(), state = %self.state, "received");
        Ok(message)
    }
}

impl<K: Codec> Drop for Session<K> {
    fn drop(&mut self) {
        // The listener handle aborts its task when the field drops.
        if let Some(game) = &self.current {
            game.finish();
        }
    }
}

/// Finishes a match when dropped.
struct FinishOnDrop(Match);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.finish();
    }
}

impl<K: Codec> std::fmt::Debug for Session<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("player", &self.config.player)
            .field("state", &self.state)
            .field("server", &self.control.peer_addr())
            .field("roster", &self.roster.players())
            .finish()
    }
}
