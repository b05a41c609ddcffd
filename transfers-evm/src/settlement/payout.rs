//! Payout dispatch: recipient amount and operator fee.

use alloy_primitives::{Address, U256};
use transfers::{TransferError, TransferIntent};

use super::guard::BalanceSnapshot;
use super::{Transfers, reverted};
use crate::chain::Chain;

impl<A, V> Transfers<A, V> {
    /// Sends native currency from the engine. Zero amounts are skipped.
    pub(super) fn send_native(
        &self,
        chain: &mut Chain,
        recipient: Address,
        amount: U256,
        is_refund: bool,
    ) -> Result<(), TransferError> {
        if amount.is_zero() {
            return Ok(());
        }
        chain
            .send_native(self.address, recipient, amount)
            .map_err(|data| TransferError::NativeTransferFailed {
                recipient,
                amount,
                is_refund,
                data,
            })
    }

    /// Returns native currency to the payer.
    pub(super) fn refund_native(
        &self,
        chain: &mut Chain,
        payer: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        self.send_native(chain, payer, amount, true)
    }

    /// Pays both legs in native currency.
    pub(super) fn pay_out_native(
        &self,
        chain: &mut Chain,
        intent: &TransferIntent,
        fee_destination: Address,
    ) -> Result<(), TransferError> {
        self.send_native(chain, intent.recipient, intent.recipient_amount, false)?;
        self.send_native(chain, fee_destination, intent.fee_amount, false)
    }

    /// Pays both legs in `token`, each checked to arrive in full.
    pub(super) fn pay_out_token(
        &self,
        chain: &mut Chain,
        token: Address,
        intent: &TransferIntent,
        fee_destination: Address,
    ) -> Result<(), TransferError> {
        let legs = [
            (intent.recipient, intent.recipient_amount),
            (fee_destination, intent.fee_amount),
        ];
        for (destination, amount) in legs {
            if amount.is_zero() {
                continue;
            }
            let snapshot = BalanceSnapshot::take(chain, token, destination);
            chain
                .transfer(token, self.address, destination, amount)
                .map_err(reverted(token))?;
            snapshot.assert_increase(chain, amount)?;
        }
        Ok(())
    }

    /// Unwraps exactly `needed` wrapped native held by the engine, then pays
    /// both legs natively.
    pub(super) fn unwrap_and_pay_out(
        &self,
        chain: &mut Chain,
        intent: &TransferIntent,
        fee_destination: Address,
        needed: U256,
    ) -> Result<(), TransferError> {
        if !needed.is_zero() {
            chain
                .withdraw(self.wrapped_native, self.address, needed)
                .map_err(reverted(self.wrapped_native))?;
        }
        self.pay_out_native(chain, intent, fee_destination)
    }
}
