//! Exact-settlement guard.
//!
//! Every token movement the engine causes is bracketed by a balance reading
//! of the destination. A movement that delivers anything other than the
//! requested amount (fee-on-transfer skims, rebasing, hooks) fails with
//! [`TransferError::InexactTransfer`].

use alloy_primitives::{Address, U256};
use transfers::TransferError;

use crate::chain::Chain;

/// Balance of one holder of one token, read before a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    token: Address,
    owner: Address,
    before: U256,
}

impl BalanceSnapshot {
    /// Reads the current balance of `owner` in `token`.
    #[must_use]
    pub fn take(chain: &Chain, token: Address, owner: Address) -> Self {
        Self {
            token,
            owner,
            before: chain.balance_of(&token, &owner),
        }
    }

    /// Requires the balance to have grown by exactly `expected`.
    ///
    /// # Errors
    ///
    /// [`TransferError::InexactTransfer`] on any other delta.
    pub fn assert_increase(&self, chain: &Chain, expected: U256) -> Result<(), TransferError> {
        let after = chain.balance_of(&self.token, &self.owner);
        if self.before.checked_add(expected) == Some(after) {
            Ok(())
        } else {
            Err(TransferError::InexactTransfer)
        }
    }
}

/// Expected credits to several holders of one token, merged per holder.
///
/// Used when a third party (the swap venue) pays out on the engine's behalf
/// and the recipient and fee destination may coincide.
#[derive(Debug, Clone, Default)]
pub struct PayoutGuard {
    legs: Vec<(BalanceSnapshot, U256)>,
}

impl PayoutGuard {
    /// Snapshots `token` balances of every destination in `legs`.
    #[must_use]
    pub fn take(chain: &Chain, token: Address, legs: &[(Address, U256)]) -> Self {
        let mut merged: Vec<(BalanceSnapshot, U256)> = Vec::with_capacity(legs.len());
        for &(owner, amount) in legs {
            if let Some((_, expected)) = merged.iter_mut().find(|(s, _)| s.owner == owner) {
                *expected = expected.saturating_add(amount);
            } else {
                merged.push((BalanceSnapshot::take(chain, token, owner), amount));
            }
        }
        Self { legs: merged }
    }

    /// Requires every destination to have grown by exactly its expected total.
    ///
    /// # Errors
    ///
    /// [`TransferError::InexactTransfer`] if any destination is off.
    pub fn assert_settled(&self, chain: &Chain) -> Result<(), TransferError> {
        self.legs
            .iter()
            .try_for_each(|(snapshot, expected)| snapshot.assert_increase(chain, *expected))
    }
}
