//! Exact-output conversion through the swap venue.
//!
//! The venue is trusted for nothing: what the payer actually gave up is
//! measured as the drop in the combined payer + venue balance of the input
//! currency, and every output leg is checked at its destination.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{Revert, SolError};
use transfers::{TransferError, TransferIntent};

use super::collect::Funding;
use super::guard::{BalanceSnapshot, PayoutGuard};
use super::{Transfers, reverted};
use crate::authority::TransferAuthority;
use crate::chain::Chain;
use crate::contract::IUniversalRouter;
use crate::venue::{ADDRESS_THIS, RoutePlan, SwapVenue, VenueCall};

/// Venue faults reported by name rather than as raw bytes.
const KNOWN_SWAP_FAULTS: [([u8; 4], &str); 5] = [
    (
        <IUniversalRouter::V3InvalidSwap as SolError>::SELECTOR,
        "V3InvalidSwap",
    ),
    (
        <IUniversalRouter::V3TooLittleReceived as SolError>::SELECTOR,
        "V3TooLittleReceived",
    ),
    (
        <IUniversalRouter::V3TooMuchRequested as SolError>::SELECTOR,
        "V3TooMuchRequested",
    ),
    (
        <IUniversalRouter::V3InvalidAmountOut as SolError>::SELECTOR,
        "V3InvalidAmountOut",
    ),
    (
        <IUniversalRouter::V3InvalidCaller as SolError>::SELECTOR,
        "V3InvalidCaller",
    ),
];

/// Translates venue revert data into a settlement error.
///
/// `Error(string)` keeps its reason, a bare selector of a known venue fault
/// becomes its name, anything else is passed through as bytes.
#[must_use]
pub fn swap_failure(data: Bytes) -> TransferError {
    if let Ok(revert) = Revert::abi_decode(&data) {
        return TransferError::SwapFailedString(revert.reason);
    }
    let known = KNOWN_SWAP_FAULTS
        .iter()
        .find(|(selector, _)| data.as_ref() == selector.as_slice())
        .map(|(_, name)| *name);
    match known {
        Some(name) => TransferError::SwapFailedString(name.to_owned()),
        None => TransferError::SwapFailedBytes(data),
    }
}

/// What the payer offers as swap input.
#[derive(Debug, Clone, Copy)]
pub(super) enum SwapInput<'a> {
    /// Native currency already moved into the engine; all of it is the maximum.
    Native { value: U256 },
    /// Up to `max_in` of `token`, pulled from the payer.
    Token {
        token: Address,
        max_in: U256,
        funding: Funding<'a>,
    },
}

#[derive(Debug, Clone, Copy)]
pub(super) struct SwapRequest<'a> {
    pub payer: Address,
    pub intent: &'a TransferIntent,
    pub fee_destination: Address,
    pub needed: U256,
    pub pool_fee: u32,
    pub input: SwapInput<'a>,
}

impl<A: TransferAuthority, V: SwapVenue> Transfers<A, V> {
    /// Combined payer + venue holdings of the input currency. Native input
    /// counts native and wrapped balances together.
    fn input_side(&self, chain: &Chain, input: &SwapInput<'_>, payer: Address) -> U256 {
        let venue = self.venue.address();
        match *input {
            SwapInput::Native { .. } => [payer, venue]
                .iter()
                .map(|holder| {
                    chain
                        .native_balance(holder)
                        .saturating_add(chain.balance_of(&self.wrapped_native, holder))
                })
                .fold(U256::ZERO, U256::saturating_add),
            SwapInput::Token { token, .. } => chain
                .balance_of(&token, &payer)
                .saturating_add(chain.balance_of(&token, &venue)),
        }
    }

    /// Buys exactly `needed` of the intent currency and delivers it.
    ///
    /// Returns the amount of input currency the payer actually spent.
    pub(super) fn swap(
        &self,
        chain: &mut Chain,
        request: &SwapRequest<'_>,
    ) -> Result<U256, TransferError> {
        let intent = request.intent;
        let venue = self.venue.address();
        let pays_native = intent.pays_native();
        let token_out = if pays_native {
            self.wrapped_native
        } else {
            intent.recipient_currency
        };

        let (token_in, max_in, value, before, plan) = match request.input {
            SwapInput::Native { value } => {
                // the value already sits in the engine, so count it as the payer's
                let before = self
                    .input_side(chain, &request.input, request.payer)
                    .saturating_add(value);
                let plan = RoutePlan::new().wrap_eth(ADDRESS_THIS, value);
                (self.wrapped_native, value, value, before, plan)
            }
            SwapInput::Token {
                token,
                max_in,
                funding,
            } => {
                let before = self.input_side(chain, &request.input, request.payer);
                self.collect(chain, request.payer, token, max_in, funding)?;
                let handed = BalanceSnapshot::take(chain, token, venue);
                chain
                    .transfer(token, self.address, venue, max_in)
                    .map_err(reverted(token))?;
                handed.assert_increase(chain, max_in)?;
                (token, max_in, U256::ZERO, before, RoutePlan::new())
            }
        };

        let (plan, output) = if pays_native {
            let plan = plan.v3_swap_exact_out(
                self.address,
                request.needed,
                max_in,
                token_out,
                request.pool_fee,
                token_in,
            );
            let output = PayoutGuard::take(chain, token_out, &[(self.address, request.needed)]);
            (plan, output)
        } else {
            let plan = plan
                .v3_swap_exact_out(
                    ADDRESS_THIS,
                    request.needed,
                    max_in,
                    token_out,
                    request.pool_fee,
                    token_in,
                )
                .transfer(token_out, request.fee_destination, intent.fee_amount)
                .transfer(token_out, intent.recipient, intent.recipient_amount);
            let output = PayoutGuard::take(
                chain,
                token_out,
                &[
                    (request.fee_destination, intent.fee_amount),
                    (intent.recipient, intent.recipient_amount),
                ],
            );
            (plan, output)
        };
        let plan = match request.input {
            SwapInput::Native { .. } => plan.unwrap_weth(request.payer, U256::ZERO),
            SwapInput::Token { token, .. } => plan.sweep(token, request.payer, U256::ZERO),
        };

        traced!(
            chain.frame(|chain| {
                if !value.is_zero() {
                    chain.move_native(self.address, venue, value)?;
                }
                self.venue.execute(
                    chain,
                    VenueCall {
                        caller: self.address,
                        commands: plan.commands(),
                        inputs: plan.inputs(),
                        deadline: intent.deadline,
                        value,
                    },
                )
            }),
            tracing::info_span!("venue_execute",
                venue = %venue,
                token_in = %token_in,
                token_out = %token_out,
                amount_out = %request.needed,
                max_in = %max_in,
            )
        )
        .map_err(swap_failure)?;

        let after = self.input_side(chain, &request.input, request.payer);
        let consumed = before
            .checked_sub(after)
            .ok_or(TransferError::InexactTransfer)?;
        output.assert_settled(chain)?;
        if pays_native {
            self.unwrap_and_pay_out(chain, intent, request.fee_destination, request.needed)?;
        }
        Ok(consumed)
    }
}
