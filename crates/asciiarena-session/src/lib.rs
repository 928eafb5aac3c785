//! Client session for ASCIIArena.
//!
//! This crate drives one client through the server protocol:
//!
//! 1. **Version check**: announce our version, stop if the server refuses it
//! 2. **Login**: claim a player letter and open the frame channel
//! 3. **Matchmaking**: track the [`Roster`] until enough players joined
//! 4. **Match**: listen for frames in the background while the
//!    [`ActionEmitter`] sends the player's actions, then go back to 3
//!
//! # How it fits in the stack
//!
//! ```text
//! Game / UI (above)        ← supplies an ActionSource and a FrameHandler
//!     ↕
//! Session (this crate)     ← state machine over the control channel
//!     ↕
//! Match (below)            ← shared match state + frame listener
//! Transport, Protocol      ← channels and messages
//! ```

mod emitter;
mod error;
mod input;
mod machine;
mod roster;
mod session;

pub use emitter::ActionEmitter;
pub use error::SessionError;
pub use input::ActionSource;
pub use machine::{MatchSummary, Session, SessionOutcome};
pub use roster::{Roster, RosterChange};
pub use session::{CLIENT_VERSION, SessionConfig, SessionState};
