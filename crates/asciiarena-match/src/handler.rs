//! The `FrameHandler` trait: where game logic plugs into the listener.
//!
//! The protocol core doesn't know when a match is over. That's decided by
//! whoever interprets the frames (the game simulation, the renderer, a
//! test). The listener calls the handler after every applied frame and
//! finishes the match when the handler says so.

use asciiarena_protocol::MapSnapshot;

use crate::{MatchProgress, MatchState};

/// Reacts to applied frames and decides when the match ends.
///
/// `Send + 'static` because the handler moves into the listener task.
///
/// Any `FnMut(&MapSnapshot, &MatchState) -> MatchProgress` closure is a
/// handler:
///
/// ```rust
/// use asciiarena_match::{FrameHandler, MatchProgress, MatchState};
/// use asciiarena_protocol::MapSnapshot;
///
/// fn ends_at_frame_100() -> impl FrameHandler {
///     |_map: &MapSnapshot, state: &MatchState| {
///         if state.frame_id >= 100 {
///             MatchProgress::Finished
///         } else {
///             MatchProgress::Running
///         }
///     }
/// }
/// ```
pub trait FrameHandler: Send + 'static {
    /// Called once per applied frame, after the match state is updated.
    /// Stale frames are not reported.
    fn on_frame(
        &mut self,
        map: &MapSnapshot,
        state: &MatchState,
    ) -> MatchProgress;
}

impl<F> FrameHandler for F
where
    F: FnMut(&MapSnapshot, &MatchState) -> MatchProgress + Send + 'static,
{
    fn on_frame(
        &mut self,
        map: &MapSnapshot,
        state: &MatchState,
    ) -> MatchProgress {
        self(map, state)
    }
}
