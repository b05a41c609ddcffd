//! Off-band signing for operators and payers.
//!
//! Produces the three signatures a settlement can carry: the operator's
//! intent signature, the payer's Permit2 transfer signature and the payer's
//! EIP-2612 permit.

use alloy_primitives::{Address, Bytes, U256};
use alloy_signer::SignerSync;
use transfers::{TransferIntent, UnixTimestamp};

use crate::authority::Permit2;
use crate::chain::Chain;
use crate::contract::PermitTransferFrom;
use crate::settlement::{intent_hash, signing_digest};

/// Errors while producing a signature.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// The signer failed.
    #[error(transparent)]
    Signer(#[from] alloy_signer::Error),
    /// The token has no EIP-2612 permit support.
    #[error("Token {0} does not support permits")]
    PermitUnsupported(Address),
}

/// Signs `intent` as its operator, for settlement by `sender` at `engine`.
///
/// The digest honours the intent's prefix, so set it before signing.
///
/// # Errors
///
/// [`SigningError::Signer`] if the signer fails.
pub fn sign_intent<S: SignerSync>(
    signer: &S,
    intent: TransferIntent,
    chain_id: u64,
    sender: Address,
    engine: Address,
) -> Result<TransferIntent, SigningError> {
    let hash = intent_hash(&intent, chain_id, sender, engine);
    let digest = signing_digest(&intent.prefix, hash);
    let signature = signer.sign_hash_sync(&digest)?;
    Ok(intent.with_signature(signature.as_bytes()))
}

/// Signs a Permit2 `PermitTransferFrom` allowing `spender` to pull the
/// permitted tokens.
///
/// # Errors
///
/// [`SigningError::Signer`] if the signer fails.
pub fn sign_permit2_transfer<S: SignerSync>(
    signer: &S,
    permit2: &Permit2,
    chain_id: u64,
    spender: Address,
    permit: &PermitTransferFrom,
) -> Result<Bytes, SigningError> {
    let digest = permit2.signing_hash(chain_id, spender, permit);
    let signature = signer.sign_hash_sync(&digest)?;
    Ok(Bytes::copy_from_slice(&signature.as_bytes()))
}

/// Signs an EIP-2612 permit of `value` to `spender` for the signer's
/// current nonce on `token`.
///
/// # Errors
///
/// [`SigningError::PermitUnsupported`] if `token` has no permit,
/// [`SigningError::Signer`] if the signer fails.
pub fn sign_eip2612_permit<S: SignerSync>(
    signer: &S,
    chain: &Chain,
    token: Address,
    owner: Address,
    spender: Address,
    value: U256,
    deadline: UnixTimestamp,
) -> Result<Bytes, SigningError> {
    let digest = chain
        .permit_digest(token, owner, spender, value, deadline)
        .ok_or(SigningError::PermitUnsupported(token))?;
    let signature = signer.sign_hash_sync(&digest)?;
    Ok(Bytes::copy_from_slice(&signature.as_bytes()))
}
