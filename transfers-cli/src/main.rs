//! Settles the intents described by a world configuration.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p transfers-cli --release
//!
//! # Run with custom config path
//! transfers --config /path/to/config.toml
//!
//! # Pin block time and configure logging level
//! RUST_LOG=debug transfers --timestamp 1700000000
//! ```
//!
//! One JSON object per settlement is written to stdout; logs go to stderr.
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! `${VAR}` references inside the configuration are expanded, so signer keys
//! can come from the environment or a `.env` file.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use transfers_cli::{Outcome, World, WorldConfig};

/// Settle signed transfer intents against a configured in-memory world.
#[derive(Debug, Parser)]
#[command(name = "transfers", version, about)]
struct Args {
    /// Path to the world configuration.
    #[arg(short, long, env = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Block time override, in seconds since the Unix epoch.
    #[arg(short, long)]
    timestamp: Option<u64>,
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            tracing::error!("Runner failed: {e}");
            std::process::exit(1);
        }
    }
}

/// Returns whether every settlement succeeded.
fn run(args: &Args) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = WorldConfig::load_from(&args.config)?;
    if args.timestamp.is_some() {
        config.timestamp = args.timestamp;
    }
    tracing::info!(
        config = %args.config.display(),
        settlements = config.settlements.len(),
        "Loaded configuration"
    );

    let mut world = World::build(&config)?;
    let mut stdout = std::io::stdout().lock();
    let mut settled = 0usize;
    for (index, settlement) in config.settlements.iter().enumerate() {
        let outcome = Outcome::from_result(index, world.settle(settlement));
        if outcome.is_settled() {
            settled += 1;
        } else {
            tracing::warn!(index, method = %settlement.method, "Settlement did not go through");
        }
        serde_json::to_writer(&mut stdout, &outcome)?;
        writeln!(stdout)?;
    }

    tracing::info!(
        settled,
        failed = config.settlements.len() - settled,
        processed = world
            .engine()
            .storage(world.chain())
            .map_or(0, |storage| storage.processed().len()),
        "Run complete"
    );
    Ok(settled == config.settlements.len())
}
