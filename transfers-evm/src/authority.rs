//! Signature-based transfer authority.
//!
//! The engine never holds a standing allowance over payer tokens for the
//! signature-authorized entry points. Instead the payer approves a shared
//! [`TransferAuthority`] once, and signs a one-shot `PermitTransferFrom`
//! for each settlement. [`Permit2`] is an in-memory deployment of that
//! contract: unordered nonces, EIP-712 domain `Permit2`, spender bound to
//! the caller.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{Eip712Domain, SolError, SolStruct, eip712_domain};

use crate::chain::Chain;
use crate::contract::{IERC20Errors, PermitTransferFrom, SignatureTransferDetails, typed};
use crate::signature::recover_signer;

/// A contract that moves tokens on the strength of an owner's signature.
pub trait TransferAuthority: Send + Sync {
    /// Deployed address; payers approve this address on the token.
    fn address(&self) -> Address;

    /// Transfers `details.requestedAmount` of `permit.permitted.token` from
    /// `owner` to `details.to`, authorized by `signature` over `permit` with
    /// `caller` as spender.
    ///
    /// # Errors
    ///
    /// Returns the revert data of the rejected call.
    fn permit_transfer_from(
        &self,
        chain: &mut Chain,
        caller: Address,
        permit: &PermitTransferFrom,
        details: &SignatureTransferDetails,
        owner: Address,
        signature: &[u8],
    ) -> Result<(), Bytes>;
}

/// In-memory Permit2 signature-transfer contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permit2 {
    address: Address,
}

impl Permit2 {
    /// A Permit2 deployment at `address`.
    #[must_use]
    pub const fn new(address: Address) -> Self {
        Self { address }
    }

    /// EIP-712 domain on the given chain. Permit2 has no version.
    #[must_use]
    pub fn domain(&self, chain_id: u64) -> Eip712Domain {
        eip712_domain! {
            name: "Permit2",
            chain_id: chain_id,
            verifying_contract: self.address,
        }
    }

    /// Digest the owner signs to let `spender` redeem `permit`.
    #[must_use]
    pub fn signing_hash(&self, chain_id: u64, spender: Address, permit: &PermitTransferFrom) -> B256 {
        let typed = typed::PermitTransferFrom {
            permitted: typed::TokenPermissions {
                token: permit.permitted.token,
                amount: permit.permitted.amount,
            },
            spender,
            nonce: permit.nonce,
            deadline: permit.deadline,
        };
        typed.eip712_signing_hash(&self.domain(chain_id))
    }
}

impl TransferAuthority for Permit2 {
    fn address(&self) -> Address {
        self.address
    }

    fn permit_transfer_from(
        &self,
        chain: &mut Chain,
        caller: Address,
        permit: &PermitTransferFrom,
        details: &SignatureTransferDetails,
        owner: Address,
        signature: &[u8],
    ) -> Result<(), Bytes> {
        let now = <U256 as From<_>>::from(chain.timestamp());
        if now > permit.deadline {
            return Err(IERC20Errors::SignatureExpired {
                signatureDeadline: permit.deadline,
            }
            .abi_encode()
            .into());
        }
        if details.requestedAmount > permit.permitted.amount {
            return Err(IERC20Errors::InvalidAmount {
                maxAmount: permit.permitted.amount,
            }
            .abi_encode()
            .into());
        }
        chain.frame(|chain| {
            if !chain.use_unordered_nonce(self.address, owner, permit.nonce) {
                return Err(IERC20Errors::InvalidNonce {}.abi_encode().into());
            }
            let hash = self.signing_hash(chain.chain_id(), caller, permit);
            if recover_signer(signature, &hash) != Some(owner) {
                return Err(IERC20Errors::InvalidSigner {}.abi_encode().into());
            }
            chain.transfer_from(
                permit.permitted.token,
                self.address,
                owner,
                details.to,
                details.requestedAmount,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;
    use transfers::UnixTimestamp;

    use super::*;
    use crate::chain::Erc20;
    use crate::contract::TokenPermissions;

    const PERMIT2: Address = address!("0x000000000022D473030F116dDEE9F6B43aC78BA3");
    const TOKEN: Address = address!("0x0000000000000000000000000000000000000070");
    const SPENDER: Address = address!("0x00000000000000000000000000000000000000e0");

    struct Fixture {
        chain: Chain,
        permit2: Permit2,
        owner: PrivateKeySigner,
    }

    fn fixture() -> Fixture {
        let owner = PrivateKeySigner::from_bytes(&B256::with_last_byte(9)).unwrap();
        let mut chain = Chain::new(1, UnixTimestamp::from_secs(1_000));
        chain.deploy_token(TOKEN, Erc20::new("Token"));
        chain.mint(TOKEN, owner.address(), U256::from(100u64)).unwrap();
        chain
            .approve(TOKEN, owner.address(), PERMIT2, U256::MAX)
            .unwrap();
        Fixture {
            chain,
            permit2: Permit2::new(PERMIT2),
            owner,
        }
    }

    fn permit(amount: u64, nonce: u64) -> PermitTransferFrom {
        PermitTransferFrom {
            permitted: TokenPermissions {
                token: TOKEN,
                amount: U256::from(amount),
            },
            nonce: U256::from(nonce),
            deadline: U256::from(2_000u64),
        }
    }

    fn sign(fx: &Fixture, permit: &PermitTransferFrom) -> Bytes {
        let hash = fx.permit2.signing_hash(1, SPENDER, permit);
        fx.owner.sign_hash_sync(&hash).unwrap().as_bytes().into()
    }

    #[test]
    fn test_transfers_and_burns_nonce() {
        let mut fx = fixture();
        let permit = permit(40, 7);
        let signature = sign(&fx, &permit);
        let details = SignatureTransferDetails {
            to: SPENDER,
            requestedAmount: U256::from(40u64),
        };
        let owner = fx.owner.address();
        fx.permit2
            .permit_transfer_from(&mut fx.chain, SPENDER, &permit, &details, owner, &signature)
            .unwrap();
        assert_eq!(fx.chain.balance_of(&TOKEN, &SPENDER), U256::from(40u64));
        assert!(fx.chain.is_nonce_used(PERMIT2, owner, U256::from(7u64)));

        let err = fx
            .permit2
            .permit_transfer_from(&mut fx.chain, SPENDER, &permit, &details, owner, &signature)
            .unwrap_err();
        assert!(IERC20Errors::InvalidNonce::abi_decode(&err).is_ok());
    }

    #[test]
    fn test_spender_is_bound() {
        let mut fx = fixture();
        let permit = permit(40, 1);
        let signature = sign(&fx, &permit);
        let details = SignatureTransferDetails {
            to: SPENDER,
            requestedAmount: U256::from(40u64),
        };
        let owner = fx.owner.address();
        let other = address!("0x00000000000000000000000000000000000000e1");
        let err = fx
            .permit2
            .permit_transfer_from(&mut fx.chain, other, &permit, &details, owner, &signature)
            .unwrap_err();
        assert!(IERC20Errors::InvalidSigner::abi_decode(&err).is_ok());
        assert!(!fx.chain.is_nonce_used(PERMIT2, owner, U256::from(1u64)));
    }

    #[test]
    fn test_requested_above_permitted() {
        let mut fx = fixture();
        let permit = permit(40, 1);
        let signature = sign(&fx, &permit);
        let details = SignatureTransferDetails {
            to: SPENDER,
            requestedAmount: U256::from(41u64),
        };
        let owner = fx.owner.address();
        let err = fx
            .permit2
            .permit_transfer_from(&mut fx.chain, SPENDER, &permit, &details, owner, &signature)
            .unwrap_err();
        let decoded = IERC20Errors::InvalidAmount::abi_decode(&err).unwrap();
        assert_eq!(decoded.maxAmount, U256::from(40u64));
    }

    #[test]
    fn test_expired_permit() {
        let mut fx = fixture();
        fx.chain.set_timestamp(UnixTimestamp::from_secs(2_001));
        let permit = permit(40, 1);
        let signature = sign(&fx, &permit);
        let details = SignatureTransferDetails {
            to: SPENDER,
            requestedAmount: U256::from(40u64),
        };
        let owner = fx.owner.address();
        let err = fx
            .permit2
            .permit_transfer_from(&mut fx.chain, SPENDER, &permit, &details, owner, &signature)
            .unwrap_err();
        assert!(IERC20Errors::SignatureExpired::abi_decode(&err).is_ok());
    }
}
