//! Operator registration, pause control and recovery of stray funds.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use transfers::TransferError;

use super::{Call, Transfers, TransfersStorage, reverted};
use crate::chain::Chain;
use crate::contract::ITransfers;

impl<A, V> Transfers<A, V> {
    fn only_owner<'c>(
        &self,
        chain: &'c mut Chain,
        sender: Address,
    ) -> Result<&'c mut TransfersStorage, TransferError> {
        let storage = chain.storage_mut(self.address);
        if storage.owner != sender {
            return Err(TransferError::Unauthorized(sender));
        }
        Ok(storage)
    }

    fn only_sweeper(&self, chain: &Chain, sender: Address) -> Result<(), TransferError> {
        if self.storage(chain).map(TransfersStorage::sweeper) != Some(sender) {
            return Err(TransferError::Unauthorized(sender));
        }
        Ok(())
    }

    /// Registers `sender` as an operator collecting its own fees.
    pub fn register_operator(&self, chain: &mut Chain, sender: Address) {
        self.register_operator_with_fee_destination(chain, sender, sender);
    }

    /// Registers `sender` as an operator whose fees go to `fee_destination`.
    /// Registering again replaces the fee destination.
    pub fn register_operator_with_fee_destination(
        &self,
        chain: &mut Chain,
        sender: Address,
        fee_destination: Address,
    ) {
        chain
            .storage_mut(self.address)
            .operators
            .register(sender, fee_destination);
        let log = ITransfers::OperatorRegistered {
            operator: sender,
            feeDestination: fee_destination,
        };
        chain.emit(self.address, log.encode_log_data());
        #[cfg(feature = "telemetry")]
        tracing::info!(operator = %sender, fee_destination = %fee_destination, "operator registered");
    }

    /// Removes `sender` from the operator registry. Intents it signed can no
    /// longer settle.
    pub fn unregister_operator(&self, chain: &mut Chain, sender: Address) {
        chain
            .storage_mut(self.address)
            .operators
            .unregister(&sender);
        let log = ITransfers::OperatorUnregistered { operator: sender };
        chain.emit(self.address, log.encode_log_data());
        #[cfg(feature = "telemetry")]
        tracing::info!(operator = %sender, "operator unregistered");
    }

    /// Disables every settlement entry point.
    ///
    /// # Errors
    ///
    /// [`TransferError::Unauthorized`] unless `sender` is the owner,
    /// [`TransferError::EnforcedPause`] if already paused.
    pub fn pause(&self, chain: &mut Chain, sender: Address) -> Result<(), TransferError> {
        let storage = self.only_owner(chain, sender)?;
        if storage.paused {
            return Err(TransferError::EnforcedPause);
        }
        storage.paused = true;
        chain.emit(
            self.address,
            ITransfers::Paused { account: sender }.encode_log_data(),
        );
        #[cfg(feature = "telemetry")]
        tracing::info!(account = %sender, "settlement paused");
        Ok(())
    }

    /// Re-enables settlement.
    ///
    /// # Errors
    ///
    /// [`TransferError::Unauthorized`] unless `sender` is the owner,
    /// [`TransferError::ExpectedPause`] if not paused.
    pub fn unpause(&self, chain: &mut Chain, sender: Address) -> Result<(), TransferError> {
        let storage = self.only_owner(chain, sender)?;
        if !storage.paused {
            return Err(TransferError::ExpectedPause);
        }
        storage.paused = false;
        chain.emit(
            self.address,
            ITransfers::Unpaused { account: sender }.encode_log_data(),
        );
        #[cfg(feature = "telemetry")]
        tracing::info!(account = %sender, "settlement unpaused");
        Ok(())
    }

    /// Appoints the account allowed to sweep stray funds.
    ///
    /// # Errors
    ///
    /// [`TransferError::Unauthorized`] unless `sender` is the owner.
    pub fn set_sweeper(
        &self,
        chain: &mut Chain,
        sender: Address,
        sweeper: Address,
    ) -> Result<(), TransferError> {
        self.only_owner(chain, sender)?.sweeper = sweeper;
        Ok(())
    }

    /// Sends the engine's whole native balance to `destination`.
    ///
    /// # Errors
    ///
    /// [`TransferError::Unauthorized`] unless `sender` is the sweeper,
    /// [`TransferError::NativeTransferFailed`] if `destination` rejects it.
    pub fn sweep_native(
        &self,
        chain: &mut Chain,
        sender: Address,
        destination: Address,
    ) -> Result<(), TransferError> {
        let amount = chain.native_balance(&self.address);
        self.sweep_native_amount(chain, sender, destination, amount)
    }

    /// Sends `amount` of the engine's native balance to `destination`.
    ///
    /// # Errors
    ///
    /// [`TransferError::Unauthorized`] unless `sender` is the sweeper,
    /// [`TransferError::NativeTransferFailed`] if the send fails.
    pub fn sweep_native_amount(
        &self,
        chain: &mut Chain,
        sender: Address,
        destination: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        self.only_sweeper(chain, sender)?;
        self.non_reentrant(chain, Call::new(sender), |chain| {
            self.send_native(chain, destination, amount, false)
        })?;
        #[cfg(feature = "telemetry")]
        tracing::info!(destination = %destination, amount = %amount, "native swept");
        Ok(())
    }

    /// Sends the engine's whole balance of `token` to `destination`.
    ///
    /// # Errors
    ///
    /// [`TransferError::Unauthorized`] unless `sender` is the sweeper,
    /// [`TransferError::CallReverted`] if the token transfer fails.
    pub fn sweep_token(
        &self,
        chain: &mut Chain,
        sender: Address,
        token: Address,
        destination: Address,
    ) -> Result<(), TransferError> {
        let amount = chain.balance_of(&token, &self.address);
        self.sweep_token_amount(chain, sender, token, destination, amount)
    }

    /// Sends `amount` of the engine's `token` balance to `destination`.
    ///
    /// # Errors
    ///
    /// [`TransferError::Unauthorized`] unless `sender` is the sweeper,
    /// [`TransferError::CallReverted`] if the token transfer fails.
    pub fn sweep_token_amount(
        &self,
        chain: &mut Chain,
        sender: Address,
        token: Address,
        destination: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        self.only_sweeper(chain, sender)?;
        self.non_reentrant(chain, Call::new(sender), |chain| {
            chain
                .transfer(token, self.address, destination, amount)
                .map_err(reverted(token))
        })?;
        #[cfg(feature = "telemetry")]
        tracing::info!(token = %token, destination = %destination, amount = %amount, "token swept");
        Ok(())
    }
}
