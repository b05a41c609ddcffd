//! ECDSA signature recovery shared by the engine, the transfer authority and
//! permit-capable tokens.
//!
//! Only 65-byte `r ‖ s ‖ v` signatures in the lower half of the curve order
//! are accepted. Compact (EIP-2098) and malleable high-`s` encodings are
//! rejected outright rather than normalized.

use alloy_primitives::{Address, B256, Signature, U256, uint};

/// `secp256k1n / 2`. Signatures with a larger `s` are malleable.
pub const SECP256K1N_HALF: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// Recovers the signer of `prehash`, or `None` if the signature is malformed,
/// malleable, or does not recover to a valid point.
#[must_use]
pub fn recover_signer(signature: &[u8], prehash: &B256) -> Option<Address> {
    if signature.len() != 65 {
        return None;
    }
    let signature = Signature::from_raw(signature).ok()?;
    if signature.s() > SECP256K1N_HALF {
        return None;
    }
    signature.recover_address_from_prehash(prehash).ok()
}
