//! Frame listener: a background task that feeds frame updates into a match.
//!
//! One listener runs per match. It waits on two things at once: the next
//! datagram, and the match finishing. Whichever comes first wins, so a
//! finished match never leaves the listener blocked on a datagram that
//! will never arrive.

use std::sync::Arc;

use asciiarena_protocol::{Codec, Message, ProtocolError};
use asciiarena_transport::{Connection, TransportError};
use tokio::task::JoinHandle;

use crate::{FrameHandler, FrameOutcome, Match, MatchError, MatchProgress, MatchState};

/// Receives frame updates for one match.
pub struct FrameListener<C, K, H> {
    conn: Arc<C>,
    codec: K,
    game: Match,
    handler: H,
}

impl<C, K, H> FrameListener<C, K, H>
where
    C: Connection,
    K: Codec,
    H: FrameHandler,
{
    pub fn new(conn: Arc<C>, codec: K, game: Match, handler: H) -> Self {
        Self {
            conn,
            codec,
            game,
            handler,
        }
    }

    /// Runs the listener on its own Tokio task.
    pub fn spawn(self) -> ListenerHandle {
        ListenerHandle {
            task: tokio::spawn(self.run()),
        }
    }

    /// Runs until the match finishes or the frame channel fails.
    ///
    /// A failing listener also finishes the match, so that whoever is
    /// waiting on it (the action emitter) stops too. The error is
    /// returned for the session to surface.
    pub async fn run(mut self) -> Result<MatchState, MatchError> {
        tracing::debug!(delivery = %self.conn.delivery(), "frame listener started");

        let result = self.listen().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "frame listener failed");
            self.game.finish();
        }

        let state = self.game.state();
        tracing::debug!(
            frame_id = state.frame_id,
            applied = state.frames_applied,
            stale = state.frames_stale,
            "frame listener stopped"
        );
        result.map(|()| state)
    }

    async fn listen(&mut self) -> Result<(), MatchError> {
        loop {
            let received = tokio::select! {
                biased;
                () = self.game.finished() => return Ok(()),
                received = self.conn.recv() => received?,
            };

            let Some(data) = received else {
                if self.game.is_finished() {
                    return Ok(());
                }
                return Err(TransportError::ConnectionClosed(
                    "frame channel closed during match".into(),
                )
                .into());
            };

            let message: Message = self.codec.decode(&data)?;
            let update = match message {
                Message::FrameUpdate(update) => update,
                other => {
                    return Err(ProtocolError::unexpected("FrameUpdate", &other).into());
                }
            };

            match self.game.apply_frame(update) {
                FrameOutcome::Applied => {
                    let state = self.game.state();
                    tracing::trace!(frame_id = state.frame_id, "frame applied");
                    let progress = self.handler.on_frame(self.game.map(), &state);
                    if progress == MatchProgress::Finished && self.game.finish() {
                        tracing::info!(frame_id = state.frame_id, "match finished");
                    }
                }
                FrameOutcome::Stale => {
                    tracing::trace!(
                        frame_id = update.frame_id,
                        current = self.game.frame_id(),
                        "dropping stale frame"
                    );
                }
                FrameOutcome::MatchOver => return Ok(()),
            }
        }
    }
}

/// Handle to a spawned [`FrameListener`].
pub struct ListenerHandle {
    task: JoinHandle<Result<MatchState, MatchError>>,
}

impl ListenerHandle {
    /// Waits for the listener to stop and returns the final match state.
    pub async fn join(mut self) -> Result<MatchState, MatchError> {
        (&mut self.task)
            .await
            .map_err(|e| MatchError::TaskFailed(e.to_string()))?
    }

    /// `true` once the listener task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the listener without waiting for it.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Dropping the handle stops the listener, so the frame socket it holds is
/// released with it.
impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
