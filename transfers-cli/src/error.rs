//! Error types for the settlement runner.

use alloy_primitives::Address;
use transfers::TransferError;
use transfers_evm::client::SigningError;

/// Errors that can occur while building the world or running a settlement.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be read.
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for the world schema.
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A configured private key does not parse.
    #[error("invalid signer key: {0}")]
    Key(#[from] alloy_signer_local::LocalSignerError),

    /// A settlement needs a key that is not among the configured signers.
    #[error("no signing key for {0}")]
    UnknownSigner(Address),

    /// Producing a signature failed.
    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    /// The world could not be set up as described.
    #[error("world setup failed: {0}")]
    Setup(String),

    /// A settlement lacks a field its method requires.
    #[error("{method} needs `{field}`")]
    MissingField {
        /// Entry point name.
        method: &'static str,
        /// Missing configuration field.
        field: &'static str,
    },

    /// The engine rejected the settlement.
    #[error(transparent)]
    Settlement(#[from] TransferError),

    /// Output could not be serialized.
    #[error("cannot serialize output: {0}")]
    Json(#[from] serde_json::Error),
}
