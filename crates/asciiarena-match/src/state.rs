//! Plain data describing where a match stands.

use std::fmt;

/// A snapshot of the mutable part of a match.
///
/// This is what the frame listener writes and everyone else reads. It is
/// `Copy`, so readers always get a whole value, never a half-written one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchState {
    /// Newest frame applied so far. `0` until the first frame arrives.
    pub frame_id: u32,
    /// Set once by the game (or the session) and never cleared.
    pub finished: bool,
    /// How many frame updates were applied.
    pub frames_applied: u64,
    /// How many frame updates were dropped as duplicates or out of order.
    pub frames_stale: u64,
}

/// What [`Match::apply_frame`](crate::Match::apply_frame) did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The update was newer than anything seen and is now current.
    Applied,
    /// The update was not newer than the current frame (a duplicate or a
    /// late datagram) and was dropped.
    Stale,
    /// The match had already finished; nothing changes after that.
    MatchOver,
}

impl fmt::Display for FrameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::Stale => f.write_str("stale"),
            Self::MatchOver => f.write_str("match over"),
        }
    }
}

/// The game's verdict after looking at a newly applied frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchProgress {
    Running,
    Finished,
}
