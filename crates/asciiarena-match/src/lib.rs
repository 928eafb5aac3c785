//! Match state and frame listening for the ASCIIArena client.
//!
//! A match starts when the server sends `MatchLoad` and ends when the
//! game says so. While it runs, a background [`FrameListener`] applies
//! the server's frame updates to the shared [`Match`], and the session's
//! action emitter reads the latest frame id from it.
//!
//! # Key types
//!
//! - [`Match`]: the shared, synchronized match state
//! - [`FrameListener`] / [`ListenerHandle`]: the background task
//! - [`FrameHandler`]: the hook game logic implements to end a match
//! - [`MatchState`], [`FrameOutcome`], [`MatchProgress`]: plain data

mod error;
mod game;
mod handler;
mod listener;
mod state;

pub use error::MatchError;
pub use game::Match;
pub use handler::FrameHandler;
pub use listener::{FrameListener, ListenerHandle};
pub use state::{FrameOutcome, MatchProgress, MatchState};
