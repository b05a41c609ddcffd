//! Error types for intent settlement.
//!
//! Every settlement failure is terminal: the engine aborts the call and rolls
//! back all state. [`TransferError`] identifies the exact failing
//! precondition, and [`ErrorReason`] gives callers a stable machine-readable
//! code for it.

use alloy_primitives::{Address, Bytes, I256, U256};
use serde::{Deserialize, Serialize};

/// Errors that abort a settlement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TransferError {
    /// The intent signature does not recover to the intent's operator.
    #[error("Intent signature is invalid")]
    InvalidSignature,
    /// The intent deadline is before the current block time.
    #[error("Intent is expired")]
    ExpiredIntent,
    /// The intent recipient is the zero address.
    #[error("Intent recipient is the zero address")]
    NullRecipient,
    /// The `(operator, id)` pair was already settled.
    #[error("Intent has already been processed")]
    AlreadyProcessed,
    /// The intent's operator has no registered fee destination.
    #[error("Operator is not registered")]
    OperatorNotRegistered,
    /// Native value sent differs from the required amount (positive = overpaid).
    #[error("Native value differs from the required amount by {0}")]
    InvalidNativeAmount(I256),
    /// The payer's balance is short by the given amount.
    #[error("Payer balance is short by {0}")]
    InsufficientBalance(U256),
    /// The payer's allowance to the engine is short by the given amount.
    #[error("Payer allowance is short by {0}")]
    InsufficientAllowance(U256),
    /// Transfer-authority details do not target the engine or the needed amount.
    #[error("Transfer details do not match the intent")]
    InvalidTransferDetails,
    /// `recipient_amount + fee_amount` overflows 256 bits.
    #[error("Recipient amount plus fee overflows")]
    AmountOverflow,
    /// The intent currency cannot be settled through the chosen entry point.
    #[error("Currency {0} is not accepted by this entry point")]
    IncorrectCurrency(Address),
    /// A token transfer moved a different amount than requested.
    #[error("Token transfer delivered an inexact amount")]
    InexactTransfer,
    /// A native-currency send was rejected by its destination.
    #[error("Native transfer of {amount} to {recipient} failed")]
    NativeTransferFailed {
        /// Destination that rejected the transfer.
        recipient: Address,
        /// Amount that was being sent.
        amount: U256,
        /// Whether the send was a refund to the payer.
        is_refund: bool,
        /// Revert data returned by the destination.
        data: Bytes,
    },
    /// The swap venue reverted with a textual or known symbolic reason.
    #[error("Swap failed: {0}")]
    SwapFailedString(String),
    /// The swap venue reverted with an unrecognized payload.
    #[error("Swap failed with {0}")]
    SwapFailedBytes(Bytes),
    /// A transfer-authority, permit or token call reverted.
    #[error("Call to {target} reverted with {data}")]
    CallReverted {
        /// Contract that reverted.
        target: Address,
        /// Revert data.
        data: Bytes,
    },
    /// A settlement entry point was re-entered while a call was in progress.
    #[error("Reentrant call")]
    ReentrantCall,
    /// Settlement is paused.
    #[error("Settlement is paused")]
    EnforcedPause,
    /// Unpause was requested while settlement is running.
    #[error("Settlement is not paused")]
    ExpectedPause,
    /// The caller lacks the role required by an administrative operation.
    #[error("{0} is not authorized for this operation")]
    Unauthorized(Address),
}

impl TransferError {
    /// Returns the machine-readable reason code for this error.
    #[must_use]
    pub const fn reason(&self) -> ErrorReason {
        match self {
            Self::InvalidSignature => ErrorReason::InvalidSignature,
            Self::ExpiredIntent => ErrorReason::ExpiredIntent,
            Self::NullRecipient => ErrorReason::NullRecipient,
            Self::AlreadyProcessed => ErrorReason::AlreadyProcessed,
            Self::OperatorNotRegistered => ErrorReason::OperatorNotRegistered,
            Self::InvalidNativeAmount(_) => ErrorReason::InvalidNativeAmount,
            Self::InsufficientBalance(_) => ErrorReason::InsufficientBalance,
            Self::InsufficientAllowance(_) => ErrorReason::InsufficientAllowance,
            Self::InvalidTransferDetails => ErrorReason::InvalidTransferDetails,
            Self::AmountOverflow => ErrorReason::AmountOverflow,
            Self::IncorrectCurrency(_) => ErrorReason::IncorrectCurrency,
            Self::InexactTransfer => ErrorReason::InexactTransfer,
            Self::NativeTransferFailed { .. } => ErrorReason::NativeTransferFailed,
            Self::SwapFailedString(_) | Self::SwapFailedBytes(_) => ErrorReason::SwapFailed,
            Self::CallReverted { .. } => ErrorReason::CallReverted,
            Self::ReentrantCall => ErrorReason::ReentrantCall,
            Self::EnforcedPause => ErrorReason::EnforcedPause,
            Self::ExpectedPause => ErrorReason::ExpectedPause,
            Self::Unauthorized(_) => ErrorReason::Unauthorized,
        }
    }

    /// Returns the broad failure class, for presenting a remediation.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSignature
            | Self::ExpiredIntent
            | Self::NullRecipient
            | Self::AlreadyProcessed
            | Self::OperatorNotRegistered => ErrorCategory::Authorization,
            Self::InvalidNativeAmount(_)
            | Self::InsufficientBalance(_)
            | Self::InsufficientAllowance(_)
            | Self::InvalidTransferDetails
            | Self::AmountOverflow => ErrorCategory::Funding,
            Self::IncorrectCurrency(_) => ErrorCategory::Currency,
            Self::InexactTransfer => ErrorCategory::Conservation,
            Self::NativeTransferFailed { .. }
            | Self::SwapFailedString(_)
            | Self::SwapFailedBytes(_)
            | Self::CallReverted { .. } => ErrorCategory::External,
            Self::ReentrantCall
            | Self::EnforcedPause
            | Self::ExpectedPause
            | Self::Unauthorized(_) => ErrorCategory::Access,
        }
    }
}

/// Broad classes of settlement failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The intent itself is not acceptable (signature, deadline, replay, operator).
    Authorization,
    /// The payer's funds or authorization data are insufficient or malformed.
    Funding,
    /// The intent currency does not fit the chosen entry point.
    Currency,
    /// A transfer did not move exactly the expected amount.
    Conservation,
    /// An external contract rejected a call.
    External,
    /// The call was refused by an access guard.
    Access,
}

/// Machine-readable error reason codes for settlement failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorReason {
    /// The intent signature is invalid.
    InvalidSignature,
    /// The intent deadline has passed.
    ExpiredIntent,
    /// The intent recipient is the zero address.
    NullRecipient,
    /// The intent was already processed.
    AlreadyProcessed,
    /// The operator is not registered.
    OperatorNotRegistered,
    /// Wrong native value sent.
    InvalidNativeAmount,
    /// Insufficient payer balance.
    InsufficientBalance,
    /// Insufficient payer allowance.
    InsufficientAllowance,
    /// Malformed transfer-authority details.
    InvalidTransferDetails,
    /// Needed amount overflows.
    AmountOverflow,
    /// Currency not accepted by the entry point.
    IncorrectCurrency,
    /// Fee-on-transfer or otherwise inexact token movement.
    InexactTransfer,
    /// A native send was rejected.
    NativeTransferFailed,
    /// The swap venue failed.
    SwapFailed,
    /// An external call reverted.
    CallReverted,
    /// Reentrant call rejected.
    ReentrantCall,
    /// Settlement is paused.
    EnforcedPause,
    /// Settlement is not paused.
    ExpectedPause,
    /// Caller lacks the required role.
    Unauthorized,
}

impl ErrorReason {
    /// Returns the `snake_case` string representation matching the wire format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "invalid_signature",
            Self::ExpiredIntent => "expired_intent",
            Self::NullRecipient => "null_recipient",
            Self::AlreadyProcessed => "already_processed",
            Self::OperatorNotRegistered => "operator_not_registered",
            Self::InvalidNativeAmount => "invalid_native_amount",
            Self::InsufficientBalance => "insufficient_balance",
            Self::InsufficientAllowance => "insufficient_allowance",
            Self::InvalidTransferDetails => "invalid_transfer_details",
            Self::AmountOverflow => "amount_overflow",
            Self::IncorrectCurrency => "incorrect_currency",
            Self::InexactTransfer => "inexact_transfer",
            Self::NativeTransferFailed => "native_transfer_failed",
            Self::SwapFailed => "swap_failed",
            Self::CallReverted => "call_reverted",
            Self::ReentrantCall => "reentrant_call",
            Self::EnforcedPause => "enforced_pause",
            Self::ExpectedPause => "expected_pause",
            Self::Unauthorized => "unauthorized",
        }
    }
}

impl core::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_matches_serde_name() {
        let reasons = [
            ErrorReason::InvalidSignature,
            ErrorReason::InsufficientAllowance,
            ErrorReason::SwapFailed,
            ErrorReason::EnforcedPause,
        ];
        for reason in reasons {
            let serialized = serde_json::to_string(&reason).unwrap();
            assert_eq!(serialized, format!("\"{}\"", reason.as_str()));
        }
    }

    #[test]
    fn test_swap_failures_share_reason() {
        assert_eq!(
            TransferError::SwapFailedString("V3TooMuchRequested".into()).reason(),
            TransferError::SwapFailedBytes(Bytes::new()).reason(),
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            TransferError::AlreadyProcessed.category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            TransferError::InvalidNativeAmount(I256::MINUS_ONE).category(),
            ErrorCategory::Funding
        );
        assert_eq!(
            TransferError::InexactTransfer.category(),
            ErrorCategory::Conservation
        );
        assert_eq!(
            TransferError::ReentrantCall.category(),
            ErrorCategory::Access
        );
    }

    #[test]
    fn test_native_amount_display_is_signed() {
        let err = TransferError::InvalidNativeAmount(I256::MINUS_ONE);
        assert_eq!(err.to_string(), "Native value differs from the required amount by -1");
    }
}
