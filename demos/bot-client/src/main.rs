//! A headless ASCIIArena client that plays random moves.
//!
//! ```text
//! bot-client [PLAYER] [--host HOST] [--control-port PORT] [--frame-port PORT]
//! RUST_LOG=asciiarena_session=debug bot-client B
//! ```

use std::time::Duration;

use asciiarena::prelude::*;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ---------------------------------------------------------------------------
// Bot behavior
// ---------------------------------------------------------------------------

/// Distinct action codes the bot picks from.
const ACTIONS: u32 = 5;
const ACTION_INTERVAL: Duration = Duration::from_millis(100);
/// The bot gives up on a match after this many frames.
const MATCH_FRAMES: u32 = 3_000;

struct RandomBot {
    rng: StdRng,
}

impl ActionSource for RandomBot {
    async fn next_action(&mut self) -> u32 {
        tokio::time::sleep(ACTION_INTERVAL).await;
        self.rng.random_range(0..ACTIONS)
    }
}

fn frame_limit(_map: &MapSnapshot, state: &MatchState) -> MatchProgress {
    if state.frame_id >= MATCH_FRAMES {
        MatchProgress::Finished
    } else {
        MatchProgress::Running
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "bot-client")]
#[command(about = "Headless ASCIIArena client that plays random moves")]
struct Args {
    #[arg(default_value_t = 'A', help = "Player letter to log in as")]
    player: char,

    #[arg(long, default_value = "127.0.0.1", help = "Server host")]
    host: String,

    #[arg(long, default_value_t = 3001, help = "Server control (TCP) port")]
    control_port: u16,

    #[arg(long, default_value_t = 3002, help = "Local frame (UDP) port")]
    frame_port: u16,
}

impl Args {
    fn builder(&self) -> ClientBuilder {
        ClientBuilder::new()
            .player(self.player)
            .host(&self.host)
            .control_port(self.control_port)
            .frame_port(self.frame_port)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .compact()
        .init();

    let builder = Args::parse().builder();
    let player = builder.session_config().player;
    let mut session = builder.connect().await?;
    let mut bot = RandomBot {
        rng: StdRng::from_os_rng(),
    };

    let outcome = session.run(&mut bot, || frame_limit).await;
    session.close().await;

    match outcome? {
        SessionOutcome::VersionRejected => {
            tracing::warn!("server does not accept version {}", session.config().version);
        }
        SessionOutcome::LoginRejected(status) => {
            tracing::warn!(%player, %status, "login refused");
        }
        SessionOutcome::ServerClosed { matches_played } => {
            tracing::info!(matches_played, "server closed the session");
        }
    }
    Ok(())
}
