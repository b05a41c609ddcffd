//! ABI encoding of settlement errors.

use alloy_primitives::Bytes;
use alloy_sol_types::SolError;
use transfers::TransferError;

use crate::contract::ITransfers;

/// Encodes `error` as the engine's revert data.
///
/// [`TransferError::CallReverted`] bubbles the callee's revert data
/// unchanged, like a Solidity low-level call that rethrows.
#[must_use]
pub fn encode_error(error: &TransferError) -> Bytes {
    let encoded = match error {
        TransferError::InvalidSignature => ITransfers::InvalidSignature {}.abi_encode(),
        TransferError::ExpiredIntent => ITransfers::ExpiredIntent {}.abi_encode(),
        TransferError::NullRecipient => ITransfers::NullRecipient {}.abi_encode(),
        TransferError::AlreadyProcessed => ITransfers::AlreadyProcessed {}.abi_encode(),
        TransferError::OperatorNotRegistered => ITransfers::OperatorNotRegistered {}.abi_encode(),
        TransferError::InvalidNativeAmount(difference) => ITransfers::InvalidNativeAmount {
            difference: *difference,
        }
        .abi_encode(),
        TransferError::InsufficientBalance(difference) => ITransfers::InsufficientBalance {
            difference: *difference,
        }
        .abi_encode(),
        TransferError::InsufficientAllowance(difference) => ITransfers::InsufficientAllowance {
            difference: *difference,
        }
        .abi_encode(),
        TransferError::InvalidTransferDetails => ITransfers::InvalidTransferDetails {}.abi_encode(),
        TransferError::AmountOverflow => ITransfers::AmountOverflow {}.abi_encode(),
        TransferError::IncorrectCurrency(currency) => ITransfers::IncorrectCurrency {
            attemptedCurrency: *currency,
        }
        .abi_encode(),
        TransferError::InexactTransfer => ITransfers::InexactTransfer {}.abi_encode(),
        TransferError::NativeTransferFailed {
            recipient,
            amount,
            is_refund,
            data,
        } => ITransfers::NativeTransferFailed {
            recipient: *recipient,
            amount: *amount,
            isRefund: *is_refund,
            data: data.clone(),
        }
        .abi_encode(),
        TransferError::SwapFailedString(reason) => ITransfers::SwapFailedString {
            reason: reason.clone(),
        }
        .abi_encode(),
        TransferError::SwapFailedBytes(reason) => ITransfers::SwapFailedBytes {
            reason: reason.clone(),
        }
        .abi_encode(),
        TransferError::CallReverted { data, .. } => return data.clone(),
        TransferError::ReentrantCall => ITransfers::ReentrancyGuardReentrantCall {}.abi_encode(),
        TransferError::EnforcedPause => ITransfers::EnforcedPause {}.abi_encode(),
        TransferError::ExpectedPause => ITransfers::ExpectedPause {}.abi_encode(),
        TransferError::Unauthorized(account) => ITransfers::Unauthorized { account: *account }.abi_encode(),
        // Variants added later have no ABI error yet and revert without data.
        _ => Vec::new(),
    };
    encoded.into()
}
