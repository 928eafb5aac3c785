//! # ASCIIArena
//!
//! Client protocol core for ASCIIArena, a real-time multiplayer arena game.
//!
//! A client keeps two channels open to the server: a reliable control
//! channel for the handshake, login, matchmaking, and the player's actions,
//! and a datagram frame channel for the server's frame updates. The
//! [`Session`](asciiarena_session::Session) drives the protocol; the game
//! plugs in an [`ActionSource`](asciiarena_session::ActionSource) for input
//! and a [`FrameHandler`](asciiarena_match::FrameHandler) that decides when
//! a match is over.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use asciiarena::prelude::*;
//!
//! # async fn play() -> Result<(), ArenaError> {
//! let (_keys, mut input) = tokio::sync::mpsc::channel::<u32>(16);
//! let mut session = ClientBuilder::new().player('A').connect().await?;
//!
//! let outcome = session
//!     .run(&mut input, || {
//!         |_map: &MapSnapshot, state: &MatchState| {
//!             if state.frame_id >= 1_000 {
//!                 MatchProgress::Finished
//!             } else {
//!                 MatchProgress::Running
//!             }
//!         }
//!     })
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::ClientBuilder;
pub use error::ArenaError;

/// Everything a client needs, in one import.
pub mod prelude {
    pub use crate::{ArenaError, ClientBuilder};
    pub use asciiarena_match::{
        FrameHandler, FrameOutcome, Match, MatchError, MatchProgress, MatchState,
    };
    pub use asciiarena_protocol::{
        Codec, JsonCodec, LogInStatus, MapSnapshot, Message, PlayerId,
        ProtocolError,
    };
    pub use asciiarena_session::{
        ActionSource, MatchSummary, Roster, Session, SessionConfig,
        SessionError, SessionOutcome, SessionState,
    };
    pub use asciiarena_transport::TransportError;
}
