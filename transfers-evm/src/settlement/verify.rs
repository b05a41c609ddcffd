//! Intent authorization.
//!
//! Pure functions of the intent, the asserted sender, the engine identity,
//! the block environment and the processed-intent ledger. Nothing here
//! touches balances.

use alloy_primitives::{Address, B256, U256, eip191_hash_message, keccak256};
use alloy_sol_types::SolType;
use transfers::{ProcessedIntents, TransferError, TransferIntent, UnixTimestamp};

use crate::contract::IntentDigest;
use crate::signature::recover_signer;

/// Everything besides the intent that the signature and validity checks bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyContext {
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Current block time.
    pub now: UnixTimestamp,
    /// Identity whose funds will settle the intent.
    pub sender: Address,
    /// Address of the settlement engine.
    pub engine: Address,
}

/// `keccak256(abi.encode(...))` of the signed intent fields, the chain id,
/// the sender and the engine address.
#[must_use]
pub fn intent_hash(intent: &TransferIntent, chain_id: u64, sender: Address, engine: Address) -> B256 {
    let digest = IntentDigest {
        recipientAmount: intent.recipient_amount,
        deadline: intent.deadline.into(),
        recipient: intent.recipient,
        recipientCurrency: intent.recipient_currency,
        refundDestination: intent.refund_destination,
        feeAmount: intent.fee_amount,
        id: intent.id,
        operator: intent.operator,
        chainId: U256::from(chain_id),
        sender,
        transfers: engine,
    };
    keccak256(IntentDigest::abi_encode_params(&digest))
}

/// Digest the operator actually signs: the EIP-191 personal-message digest
/// of `hash` when `prefix` is empty, `keccak256(prefix ‖ hash)` otherwise.
#[must_use]
pub fn signing_digest(prefix: &[u8], hash: B256) -> B256 {
    if prefix.is_empty() {
        eip191_hash_message(hash)
    } else {
        let mut message = Vec::with_capacity(prefix.len() + 32);
        message.extend_from_slice(prefix);
        message.extend_from_slice(hash.as_slice());
        keccak256(message)
    }
}

/// Authorizes `intent` for settlement by `ctx.sender`.
///
/// Checks run in a fixed order, and the first failure is reported:
/// signature, deadline (inclusive), recipient, replay.
///
/// # Errors
///
/// [`TransferError::InvalidSignature`], [`TransferError::ExpiredIntent`],
/// [`TransferError::NullRecipient`] or [`TransferError::AlreadyProcessed`].
pub fn verify_intent(
    intent: &TransferIntent,
    ctx: &VerifyContext,
    processed: &ProcessedIntents,
) -> Result<(), TransferError> {
    let hash = intent_hash(intent, ctx.chain_id, ctx.sender, ctx.engine);
    let digest = signing_digest(&intent.prefix, hash);
    if recover_signer(&intent.signature, &digest) != Some(intent.operator) {
        return Err(TransferError::InvalidSignature);
    }
    if intent.deadline < ctx.now {
        return Err(TransferError::ExpiredIntent);
    }
    if intent.recipient.is_zero() {
        return Err(TransferError::NullRecipient);
    }
    if processed.is_processed(&intent.operator, &intent.id) {
        return Err(TransferError::AlreadyProcessed);
    }
    Ok(())
}
