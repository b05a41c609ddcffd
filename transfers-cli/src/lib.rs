//! Settlement runner for signed transfer intents.
//!
//! Builds an in-memory EVM world from a TOML description, signs each
//! configured intent with its operator's key, produces the payer
//! authorization its entry point needs, and settles it against the engine.
//!
//! # Modules
//!
//! - [`config`] - World and settlement configuration with environment variable expansion
//! - [`world`] - World construction and settlement submission
//! - [`output`] - JSON-lines outcome records
//! - [`error`] - Runner error types

pub mod config;
pub mod error;
pub mod output;
pub mod world;

pub use config::WorldConfig;
pub use error::CliError;
pub use output::Outcome;
pub use world::World;
