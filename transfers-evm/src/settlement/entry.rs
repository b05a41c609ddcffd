//! Settlement entry points.
//!
//! Each entry point only chooses the payer and the route; the shared
//! settlement pipeline does the rest.

use alloy_primitives::{Address, U256};
use transfers::{TransferError, TransferIntent, Transferred};
#[cfg(feature = "telemetry")]
use tracing::instrument;

use super::collect::Funding;
use super::{Call, Route, Transfers};
use crate::authority::TransferAuthority;
use crate::chain::Chain;
use crate::contract::{Eip2612SignatureTransferData, Permit2SignatureTransferData};
use crate::venue::SwapVenue;

impl<A: TransferAuthority, V: SwapVenue> Transfers<A, V> {
    /// Settles a native-currency intent with exactly `call.value`.
    ///
    /// # Errors
    ///
    /// Any [`TransferError`]; nothing is settled on failure.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        operator = %intent.operator,
        id = %intent.id,
        sender = %call.sender,
    )))]
    pub fn transfer_native(
        &self,
        chain: &mut Chain,
        call: Call,
        intent: &TransferIntent,
    ) -> Result<Transferred, TransferError> {
        let route = Route::Native { value: call.value };
        self.settle(chain, call, call.sender, intent, route)
    }

    /// Settles a token intent, pulling the token through the transfer
    /// authority on the payer's signature.
    ///
    /// # Errors
    ///
    /// Any [`TransferError`]; nothing is settled on failure.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        operator = %intent.operator,
        id = %intent.id,
        sender = %sender,
    )))]
    pub fn transfer_token(
        &self,
        chain: &mut Chain,
        sender: Address,
        intent: &TransferIntent,
        data: &Permit2SignatureTransferData,
    ) -> Result<Transferred, TransferError> {
        let route = Route::Token {
            token: intent.recipient_currency,
            funding: Funding::Authorized(data),
        };
        self.settle(chain, Call::new(sender), sender, intent, route)
    }

    /// Settles a token intent from an allowance the payer granted the engine.
    ///
    /// # Errors
    ///
    /// Any [`TransferError`]; nothing is settled on failure.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        operator = %intent.operator,
        id = %intent.id,
        sender = %sender,
    )))]
    pub fn transfer_token_pre_approved(
        &self,
        chain: &mut Chain,
        sender: Address,
        intent: &TransferIntent,
    ) -> Result<Transferred, TransferError> {
        let route = Route::Token {
            token: intent.recipient_currency,
            funding: Funding::PreApproved,
        };
        self.settle(chain, Call::new(sender), sender, intent, route)
    }

    /// Settles a token intent paid by `data.owner`, with `sender` only
    /// relaying. The owner's EIP-2612 permit, valid until the intent
    /// deadline, grants the engine the needed amount.
    ///
    /// # Errors
    ///
    /// Any [`TransferError`]; nothing is settled on failure.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        operator = %intent.operator,
        id = %intent.id,
        sender = %sender,
        owner = %data.owner,
    )))]
    pub fn subsidized_transfer_token(
        &self,
        chain: &mut Chain,
        sender: Address,
        intent: &TransferIntent,
        data: &Eip2612SignatureTransferData,
    ) -> Result<Transferred, TransferError> {
        let route = Route::Token {
            token: intent.recipient_currency,
            funding: Funding::Permit {
                signature: &data.signature,
                deadline: intent.deadline,
            },
        };
        self.settle(chain, Call::new(sender), data.owner, intent, route)
    }

    /// Wraps exactly `call.value` and pays the intent in wrapped native.
    ///
    /// # Errors
    ///
    /// Any [`TransferError`]; nothing is settled on failure.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        operator = %intent.operator,
        id = %intent.id,
        sender = %call.sender,
    )))]
    pub fn wrap_and_transfer(
        &self,
        chain: &mut Chain,
        call: Call,
        intent: &TransferIntent,
    ) -> Result<Transferred, TransferError> {
        let route = Route::Wrap { value: call.value };
        self.settle(chain, call, call.sender, intent, route)
    }

    /// Pulls wrapped native through the transfer authority and pays the
    /// intent in native currency.
    ///
    /// # Errors
    ///
    /// Any [`TransferError`]; nothing is settled on failure.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        operator = %intent.operator,
        id = %intent.id,
        sender = %sender,
    )))]
    pub fn unwrap_and_transfer(
        &self,
        chain: &mut Chain,
        sender: Address,
        intent: &TransferIntent,
        data: &Permit2SignatureTransferData,
    ) -> Result<Transferred, TransferError> {
        let route = Route::Unwrap {
            funding: Funding::Authorized(data),
        };
        self.settle(chain, Call::new(sender), sender, intent, route)
    }

    /// Pulls pre-approved wrapped native and pays the intent in native
    /// currency.
    ///
    /// # Errors
    ///
    /// Any [`TransferError`]; nothing is settled on failure.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        operator = %intent.operator,
        id = %intent.id,
        sender = %sender,
    )))]
    pub fn unwrap_and_transfer_pre_approved(
        &self,
        chain: &mut Chain,
        sender: Address,
        intent: &TransferIntent,
    ) -> Result<Transferred, TransferError> {
        let route = Route::Unwrap {
            funding: Funding::PreApproved,
        };
        self.settle(chain, Call::new(sender), sender, intent, route)
    }

    /// Swaps up to `call.value` of native currency into the intent's token
    /// through the `pool_fee` pool. Unused value returns to the sender.
    ///
    /// # Errors
    ///
    /// Any [`TransferError`]; nothing is settled on failure.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        operator = %intent.operator,
        id = %intent.id,
        sender = %call.sender,
        pool_fee = pool_fee,
    )))]
    pub fn swap_and_transfer_native(
        &self,
        chain: &mut Chain,
        call: Call,
        intent: &TransferIntent,
        pool_fee: u32,
    ) -> Result<Transferred, TransferError> {
        let route = Route::SwapNative {
            value: call.value,
            pool_fee,
        };
        self.settle(chain, call, call.sender, intent, route)
    }

    /// Swaps up to `data.transferDetails.requestedAmount` of the permitted
    /// token, pulled through the transfer authority, into the intent
    /// currency. Unused input returns to the sender.
    ///
    /// # Errors
    ///
    /// Any [`TransferError`]; nothing is settled on failure.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        operator = %intent.operator,
        id = %intent.id,
        sender = %sender,
        token_in = %data.permit.permitted.token,
        pool_fee = pool_fee,
    )))]
    pub fn swap_and_transfer_token(
        &self,
        chain: &mut Chain,
        sender: Address,
        intent: &TransferIntent,
        data: &Permit2SignatureTransferData,
        pool_fee: u32,
    ) -> Result<Transferred, TransferError> {
        let route = Route::SwapToken {
            token_in: data.permit.permitted.token,
            max_in: data.transferDetails.requestedAmount,
            funding: Funding::Authorized(data),
            pool_fee,
        };
        self.settle(chain, Call::new(sender), sender, intent, route)
    }

    /// Swaps up to `max_in` of pre-approved `token_in` into the intent
    /// currency. Unused input returns to the sender.
    ///
    /// # Errors
    ///
    /// Any [`TransferError`]; nothing is settled on failure.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        operator = %intent.operator,
        id = %intent.id,
        sender = %sender,
        token_in = %token_in,
        max_in = %max_in,
        pool_fee = pool_fee,
    )))]
    pub fn swap_and_transfer_token_pre_approved(
        &self,
        chain: &mut Chain,
        sender: Address,
        intent: &TransferIntent,
        token_in: Address,
        max_in: U256,
        pool_fee: u32,
    ) -> Result<Transferred, TransferError> {
        let route = Route::SwapToken {
            token_in,
            max_in,
            funding: Funding::PreApproved,
            pool_fee,
        };
        self.settle(chain, Call::new(sender), sender, intent, route)
    }
}
