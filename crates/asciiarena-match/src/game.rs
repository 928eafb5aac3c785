//! `Match`: the shared state of one play instance.
//!
//! Two tasks touch a match at the same time: the frame listener writes
//! the frame id, and the action emitter reads it to tag outgoing actions.
//! Instead of sharing a bare field, the state lives in a
//! `tokio::sync::watch` channel. The listener is the single writer;
//! readers either borrow the latest value or wait for it to change.

use std::sync::Arc;

use asciiarena_protocol::{FrameUpdate, MapSnapshot};
use tokio::sync::watch;

use crate::{FrameOutcome, MatchState};

struct Inner {
    map: MapSnapshot,
    state: watch::Sender<MatchState>,
}

/// One match, from `MatchLoad` until it finishes.
///
/// Cheap to clone: clones share the same state. The session keeps one,
/// the listener task keeps another for the duration of the match.
#[derive(Clone)]
pub struct Match {
    inner: Arc<Inner>,
}

impl Match {
    /// Creates a match on the given map, at frame 0, not finished.
    pub fn new(map: MapSnapshot) -> Self {
        let (state, _) = watch::channel(MatchState::default());
        Self {
            inner: Arc::new(Inner { map, state }),
        }
    }

    /// The map this match is played on.
    pub fn map(&self) -> &MapSnapshot {
        &self.inner.map
    }

    /// A copy of the current state.
    pub fn state(&self) -> MatchState {
        *self.inner.state.borrow()
    }

    /// The newest applied frame id.
    pub fn frame_id(&self) -> u32 {
        self.inner.state.borrow().frame_id
    }

    pub fn is_finished(&self) -> bool {
        self.inner.state.borrow().finished
    }

    /// Applies a frame update from the server.
    ///
    /// Only strictly newer frames are accepted. Datagrams can be
    /// duplicated or reordered, and a late frame must not move the match
    /// backwards. Receivers are only woken for applied frames.
    pub fn apply_frame(&self, update: FrameUpdate) -> FrameOutcome {
        let mut outcome = FrameOutcome::Stale;
        self.inner.state.send_if_modified(|state| {
            if state.finished {
                outcome = FrameOutcome::MatchOver;
                false
            } else if update.frame_id > state.frame_id {
                state.frame_id = update.frame_id;
                state.frames_applied += 1;
                outcome = FrameOutcome::Applied;
                true
            } else {
                // Counted, but not worth waking anyone for.
                state.frames_stale += 1;
                false
            }
        });
        outcome
    }

    /// Marks the match finished. Returns `false` if it already was.
    ///
    /// Finishing is one-way: there is no way to un-finish a match.
    pub fn finish(&self) -> bool {
        self.inner.state.send_if_modified(|state| {
            if state.finished {
                false
            } else {
                state.finished = true;
                true
            }
        })
    }

    /// Resolves once the match is finished (immediately if it already is).
    pub async fn finished(&self) {
        let mut rx = self.inner.state.subscribe();
        // The sender lives in `self`, so this can't fail while we wait.
        let _ = rx.wait_for(|state| state.finished).await;
    }

    /// A receiver that sees every applied frame, for presentation.
    pub fn subscribe(&self) -> watch::Receiver<MatchState> {
        self.inner.state.subscribe()
    }
}

impl std::fmt::Debug for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("width", &self.inner.map.width)
            .field("height", &self.inner.map.height)
            .field("state", &self.state())
            .finish()
    }
}
