//! JSON-lines reporting of settlement outcomes.

use alloy_primitives::Bytes;
use serde::Serialize;
use transfers::{ErrorReason, Transferred};
use transfers_evm::encode_error;

use crate::error::CliError;

/// The result of one configured settlement, as printed on stdout.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The engine settled the intent.
    Settled {
        /// Position in the configuration.
        index: usize,
        /// The emitted settlement record.
        #[serde(flatten)]
        event: Transferred,
    },
    /// The engine rejected the settlement and rolled it back.
    Failed {
        /// Position in the configuration.
        index: usize,
        /// Stable reason code.
        reason: ErrorReason,
        /// Human-readable description.
        message: String,
        /// ABI-encoded revert data a contract would return.
        revert: Bytes,
    },
    /// The settlement could not be prepared for submission.
    Rejected {
        /// Position in the configuration.
        index: usize,
        /// Human-readable description.
        message: String,
    },
}

impl Outcome {
    /// Classifies the result of settling the `index`-th entry.
    #[must_use]
    pub fn from_result(index: usize, result: Result<Transferred, CliError>) -> Self {
        match result {
            Ok(event) => Self::Settled { index, event },
            Err(CliError::Settlement(error)) => Self::Failed {
                index,
                reason: error.reason(),
                message: error.to_string(),
                revert: encode_error(&error),
            },
            Err(error) => Self::Rejected {
                index,
                message: error.to_string(),
            },
        }
    }

    /// Whether the engine settled the intent.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Settled { .. })
    }
}
