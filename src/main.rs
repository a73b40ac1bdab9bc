//! Sente GTP: a Go rules engine behind a GTP command host.
//!
//! ## Usage
//!
//! - `sente-gtp` - Show a demo
//! - `sente-gtp gtp` - Start the GTP host on stdin/stdout for GUI integration
//! - `sente-gtp demo` - Play a short capture and ko sequence
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `warn`).

use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use sente_gtp::board::Stone;
use sente_gtp::constants::{DEFAULT_ENGINE_NAME, DEFAULT_ENGINE_VERSION, DEFAULT_KOMI, DEFAULT_SIZE};
use sente_gtp::gtp::{GenmoveFallback, GtpConfig, GtpHost};
use sente_gtp::selector::RandomSelector;
use sente_gtp::session::{GameSession, Move};

/// Sente GTP: a Go rules engine with a Go Text Protocol host
#[derive(Parser)]
#[command(name = "sente-gtp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP (Go Text Protocol) host for use with GUI applications
    Gtp(GtpArgs),
    /// Run a short demo of the rules engine
    Demo,
}

#[derive(Args)]
struct GtpArgs {
    /// Name reported by the `name` command
    #[arg(long, default_value = DEFAULT_ENGINE_NAME)]
    name: String,
    /// Version reported by the `version` command
    #[arg(long, default_value = DEFAULT_ENGINE_VERSION)]
    engine_version: String,
    /// Initial board size (9, 13 or 19)
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,
    /// Initial komi
    #[arg(long, default_value_t = DEFAULT_KOMI)]
    komi: f64,
    /// How `genmove` chooses a move
    #[arg(long, value_enum, default_value_t = GenmoveMode::Random)]
    genmove: GenmoveMode,
    /// Seed for the random move selector
    #[arg(long)]
    seed: Option<u64>,
    /// Discard `genmove` answers that take longer than this many milliseconds
    #[arg(long)]
    genmove_timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GenmoveMode {
    /// Uniformly random legal move
    Random,
    /// Always pass
    Pass,
    /// Reply with a failure
    Fail,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Gtp(args)) => run_gtp(args),
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn run_gtp(args: GtpArgs) -> Result<()> {
    let config = GtpConfig {
        name: args.name,
        version: args.engine_version,
        board_size: args.size,
        komi: args.komi,
        genmove_fallback: match args.genmove {
            GenmoveMode::Fail => GenmoveFallback::Fail,
            GenmoveMode::Random | GenmoveMode::Pass => GenmoveFallback::Pass,
        },
        genmove_timeout: args.genmove_timeout_ms.map(Duration::from_millis),
    };
    let mut host = GtpHost::with_config(config)?;
    if args.genmove == GenmoveMode::Random {
        let selector = match args.seed {
            Some(seed) => RandomSelector::with_seed(seed),
            None => RandomSelector::new(),
        };
        host.set_selector(selector);
    }

    let stdin = io::stdin();
    host.run(stdin.lock(), io::stdout())
}

fn run_demo() -> Result<()> {
    println!("Sente GTP: Go rules engine\n");

    println!("=== Capture Demo ===");
    let mut game = GameSession::new(9)?;
    for (x, y) in [(2, 3), (3, 3), (4, 3), (8, 8), (3, 2), (8, 7)] {
        game.play_at(x, y)?;
    }
    let captured = game.play_at(3, 4)?;
    println!("Black at (3, 4) captures {captured:?}");
    println!("{}", game.board());

    println!("=== Ko Demo ===");
    let mut game = GameSession::new(9)?;
    for (x, y) in [(2, 3), (3, 3), (4, 3), (1, 3), (3, 2), (2, 4), (3, 4), (2, 2), (8, 8)] {
        game.play_at(x, y)?;
    }
    game.play_at(3, 3)?;
    println!("{}", game.board());
    let retake = Move::play(2, 3, Stone::Black);
    match game.play(retake) {
        Ok(_) => println!("{retake} was accepted"),
        Err(e) => println!("{e}"),
    }
    Ok(())
}
