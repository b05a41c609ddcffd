//! In-memory ERC-20 ledger.
//!
//! One [`Erc20`] models a deployed token: balances, allowances, EIP-2612
//! nonces, and the optional behaviours the engine has to cope with
//! (fee-on-transfer skimming, permit support, wrapped native currency).

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{Eip712Domain, SolError, eip712_domain};

use crate::contract::IERC20Errors;

/// Basis-point denominator for transfer fees.
const BPS: u64 = 10_000;

/// An ERC-20 token deployment.
#[derive(Debug, Clone)]
pub struct Erc20 {
    name: String,
    version: String,
    transfer_fee_bps: u16,
    permit: bool,
    wrapped_native: bool,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    nonces: HashMap<Address, U256>,
}

impl Erc20 {
    /// A plain token with the given EIP-712 name and version `"1"`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1".to_owned(),
            transfer_fee_bps: 0,
            permit: false,
            wrapped_native: false,
            total_supply: U256::ZERO,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            nonces: HashMap::new(),
        }
    }

    /// A wrapped-native-currency token (`deposit` / `withdraw`).
    #[must_use]
    pub fn wrapped_native(name: impl Into<String>) -> Self {
        let mut token = Self::new(name);
        token.wrapped_native = true;
        token
    }

    /// Skims `bps` basis points from every transfer (burned).
    #[must_use]
    pub const fn with_transfer_fee(mut self, bps: u16) -> Self {
        self.transfer_fee_bps = bps;
        self
    }

    /// Enables EIP-2612 `permit` under the given domain version.
    #[must_use]
    pub fn with_permit(mut self, version: impl Into<String>) -> Self {
        self.permit = true;
        self.version = version.into();
        self
    }

    /// EIP-712 domain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// EIP-712 domain version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether the token supports EIP-2612 `permit`.
    #[must_use]
    pub const fn supports_permit(&self) -> bool {
        self.permit
    }

    /// Whether this is the wrapped form of the native currency.
    #[must_use]
    pub const fn is_wrapped_native(&self) -> bool {
        self.wrapped_native
    }

    /// Total supply.
    #[must_use]
    pub const fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Balance of `owner`.
    #[must_use]
    pub fn balance_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    /// Allowance granted by `owner` to `spender`.
    #[must_use]
    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// Current EIP-2612 nonce of `owner`.
    #[must_use]
    pub fn nonce(&self, owner: &Address) -> U256 {
        self.nonces.get(owner).copied().unwrap_or_default()
    }

    /// EIP-712 domain for permits on this token deployed at `address`.
    #[must_use]
    pub fn permit_domain(&self, chain_id: u64, address: Address) -> Eip712Domain {
        eip712_domain! {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id: chain_id,
            verifying_contract: address,
        }
    }

    /// Credits `to` with freshly minted tokens.
    pub fn mint(&mut self, to: Address, amount: U256) {
        self.total_supply = self.total_supply.saturating_add(amount);
        let balance = self.balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Burns `amount` from `from`.
    ///
    /// # Errors
    ///
    /// Reverts with `ERC20InsufficientBalance` if `from` holds less.
    pub fn burn(&mut self, from: Address, amount: U256) -> Result<(), Bytes> {
        self.debit(from, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    /// Sets `spender`'s allowance over `owner`'s tokens.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((owner, spender), amount);
    }

    /// Moves `amount` from `from` to `to`, skimming the transfer fee if any.
    ///
    /// # Errors
    ///
    /// Reverts with `ERC20InsufficientBalance` if `from` holds less.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Bytes> {
        self.debit(from, amount)?;
        let fee = amount * U256::from(self.transfer_fee_bps) / U256::from(BPS);
        let delivered = amount - fee;
        self.total_supply -= fee;
        let balance = self.balances.entry(to).or_default();
        *balance = balance.saturating_add(delivered);
        Ok(())
    }

    /// Moves `amount` from `from` to `to` on behalf of `spender`.
    ///
    /// An allowance of `U256::MAX` is treated as infinite and never decreases.
    ///
    /// # Errors
    ///
    /// Reverts with `ERC20InsufficientAllowance` or `ERC20InsufficientBalance`.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Bytes> {
        let allowance = self.allowance(&from, &spender);
        if allowance < amount {
            return Err(IERC20Errors::ERC20InsufficientAllowance {
                spender,
                allowance,
                needed: amount,
            }
            .abi_encode()
            .into());
        }
        self.transfer(from, to, amount)?;
        if allowance != U256::MAX {
            self.allowances.insert((from, spender), allowance - amount);
        }
        Ok(())
    }

    /// Consumes and returns the current EIP-2612 nonce of `owner`.
    pub fn use_nonce(&mut self, owner: Address) -> U256 {
        let nonce = self.nonces.entry(owner).or_default();
        let current = *nonce;
        *nonce += U256::from(1u8);
        current
    }

    fn debit(&mut self, from: Address, amount: U256) -> Result<(), Bytes> {
        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(IERC20Errors::ERC20InsufficientBalance {
                sender: from,
                balance,
                needed: amount,
            }
            .abi_encode()
            .into());
        }
        self.balances.insert(from, balance - amount);
        Ok(())
    }
}
