//! Fund collection: pulling the payer's tokens into the engine.

use std::cmp::Ordering;

use alloy_primitives::{Address, I256, Sign, U256};
use transfers::{TransferError, UnixTimestamp};

use super::guard::BalanceSnapshot;
use super::{Transfers, reverted};
use crate::authority::TransferAuthority;
use crate::chain::Chain;
use crate::contract::Permit2SignatureTransferData;

/// How the payer authorizes a token pull.
#[derive(Debug, Clone, Copy)]
pub enum Funding<'a> {
    /// The payer approved the engine beforehand.
    PreApproved,
    /// The transfer authority moves the funds on the payer's signature.
    Authorized(&'a Permit2SignatureTransferData),
    /// An EIP-2612 permit over the amount, valid until the intent deadline,
    /// followed by a pre-approved pull.
    Permit {
        /// Permit signature by the payer.
        signature: &'a [u8],
        /// Permit deadline.
        deadline: UnixTimestamp,
    },
}

/// Requires the native value sent to equal the needed amount exactly.
///
/// # Errors
///
/// [`TransferError::InvalidNativeAmount`] carrying `value - needed`, positive
/// when overpaid.
pub fn check_native_value(value: U256, needed: U256) -> Result<(), TransferError> {
    let (sign, magnitude) = match value.cmp(&needed) {
        Ordering::Equal => return Ok(()),
        Ordering::Greater => (Sign::Positive, value - needed),
        Ordering::Less => (Sign::Negative, needed - value),
    };
    // deltas beyond the signed range saturate
    let delta = I256::checked_from_sign_and_abs(sign, magnitude).unwrap_or(match sign {
        Sign::Positive => I256::MAX,
        Sign::Negative => I256::MIN,
    });
    Err(TransferError::InvalidNativeAmount(delta))
}

fn require_balance(
    chain: &Chain,
    token: Address,
    payer: Address,
    amount: U256,
) -> Result<(), TransferError> {
    let balance = chain.balance_of(&token, &payer);
    if balance < amount {
        return Err(TransferError::InsufficientBalance(amount - balance));
    }
    Ok(())
}

fn require_allowance(
    chain: &Chain,
    token: Address,
    payer: Address,
    spender: Address,
    amount: U256,
) -> Result<(), TransferError> {
    let allowance = chain.allowance(&token, &payer, &spender);
    if allowance < amount {
        return Err(TransferError::InsufficientAllowance(amount - allowance));
    }
    Ok(())
}

impl<A: TransferAuthority, V> Transfers<A, V> {
    /// Pulls exactly `amount` of `token` from `payer` into the engine.
    ///
    /// A zero amount moves nothing. The engine's balance is checked to have
    /// grown by exactly `amount`.
    pub(super) fn collect(
        &self,
        chain: &mut Chain,
        payer: Address,
        token: Address,
        amount: U256,
        funding: Funding<'_>,
    ) -> Result<(), TransferError> {
        if let Funding::Authorized(data) = funding {
            let details = &data.transferDetails;
            if details.to != self.address || details.requestedAmount != amount {
                return Err(TransferError::InvalidTransferDetails);
            }
            let permitted = data.permit.permitted.token;
            if permitted != token {
                return Err(TransferError::IncorrectCurrency(permitted));
            }
        }
        if amount.is_zero() {
            return Ok(());
        }
        require_balance(chain, token, payer, amount)?;
        let snapshot = BalanceSnapshot::take(chain, token, self.address);
        match funding {
            Funding::PreApproved => {
                require_allowance(chain, token, payer, self.address, amount)?;
                chain
                    .transfer_from(token, self.address, payer, self.address, amount)
                    .map_err(reverted(token))?;
            }
            Funding::Authorized(data) => {
                let authority = self.authority.address();
                traced!(
                    self.authority.permit_transfer_from(
                        chain,
                        self.address,
                        &data.permit,
                        &data.transferDetails,
                        payer,
                        &data.signature,
                    ),
                    tracing::info_span!("permit_transfer_from",
                        authority = %authority,
                        token = %token,
                        owner = %payer,
                        amount = %amount,
                    )
                )
                .map_err(reverted(authority))?;
            }
            Funding::Permit {
                signature,
                deadline,
            } => {
                // A permit front-run by a third party has already set the
                // allowance, so a rejected permit is not fatal by itself.
                if chain
                    .permit(token, payer, self.address, amount, deadline, signature)
                    .is_err()
                {
                    #[cfg(feature = "telemetry")]
                    tracing::debug!(token = %token, owner = %payer, "permit rejected");
                }
                require_allowance(chain, token, payer, self.address, amount)?;
                chain
                    .transfer_from(token, self.address, payer, self.address, amount)
                    .map_err(reverted(token))?;
            }
        }
        snapshot.assert_increase(chain, amount)
    }
}
