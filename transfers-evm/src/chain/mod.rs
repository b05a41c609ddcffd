//! In-memory EVM world state.
//!
//! [`Chain`] holds everything a settlement touches: the block environment,
//! native balances, ERC-20 deployments, receive hooks of contract accounts,
//! Permit2 nonces, engine storage and the event log. All mutation goes
//! through `&mut Chain`, so a call is a serialized state transition.
//!
//! [`Chain::frame`] checkpoints the whole world and restores it when the
//! closure fails, which gives every external call and every engine entry
//! point EVM revert semantics.

mod token;

pub use token::Erc20;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, Log, LogData, U256};
use alloy_sol_types::{SolError, SolStruct};
use transfers::UnixTimestamp;

use crate::contract::{IERC20Errors, typed};
use crate::settlement::TransfersStorage;
use crate::signature::recover_signer;

/// Block-level execution environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEnv {
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Current block timestamp.
    pub timestamp: UnixTimestamp,
}

/// Code run when a contract account receives native currency.
///
/// Returning `Err` reverts the send with the given data. The hook gets full
/// access to the world, so it may call back into the engine.
pub trait NativeReceiver: Send + Sync {
    /// Handles an incoming native transfer of `value` from `from`.
    ///
    /// # Errors
    ///
    /// Returns revert data to reject the transfer.
    fn receive(&self, chain: &mut Chain, from: Address, value: U256) -> Result<(), Bytes>;
}

impl<F> NativeReceiver for F
where
    F: Fn(&mut Chain, Address, U256) -> Result<(), Bytes> + Send + Sync,
{
    fn receive(&self, chain: &mut Chain, from: Address, value: U256) -> Result<(), Bytes> {
        self(chain, from, value)
    }
}

/// The world state.
#[derive(Clone)]
pub struct Chain {
    env: BlockEnv,
    native: HashMap<Address, U256>,
    tokens: HashMap<Address, Erc20>,
    receivers: HashMap<Address, Arc<dyn NativeReceiver>>,
    unordered_nonces: HashSet<(Address, Address, U256)>,
    storage: HashMap<Address, TransfersStorage>,
    logs: Vec<Log>,
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("env", &self.env)
            .field("native", &self.native)
            .field("tokens", &self.tokens.keys().collect::<Vec<_>>())
            .field("receivers", &self.receivers.keys().collect::<Vec<_>>())
            .field("logs", &self.logs.len())
            .finish_non_exhaustive()
    }
}

impl Chain {
    /// Creates an empty world at the given chain id and block time.
    #[must_use]
    pub fn new(chain_id: u64, timestamp: UnixTimestamp) -> Self {
        Self {
            env: BlockEnv {
                chain_id,
                timestamp,
            },
            native: HashMap::new(),
            tokens: HashMap::new(),
            receivers: HashMap::new(),
            unordered_nonces: HashSet::new(),
            storage: HashMap::new(),
            logs: Vec::new(),
        }
    }

    /// Block environment.
    #[must_use]
    pub const fn env(&self) -> BlockEnv {
        self.env
    }

    /// EIP-155 chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.env.chain_id
    }

    /// Current block timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> UnixTimestamp {
        self.env.timestamp
    }

    /// Moves the block clock to `timestamp`.
    pub const fn set_timestamp(&mut self, timestamp: UnixTimestamp) {
        self.env.timestamp = timestamp;
    }

    /// Runs `f` as a call frame: on `Err`, every change it made is undone.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error after restoring the pre-call state.
    pub fn frame<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let checkpoint = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = checkpoint;
        }
        result
    }

    // ---- native currency ----

    /// Native balance of `account`.
    #[must_use]
    pub fn native_balance(&self, account: &Address) -> U256 {
        self.native.get(account).copied().unwrap_or_default()
    }

    /// Credits `account` with newly created native currency.
    pub fn fund(&mut self, account: Address, amount: U256) {
        let balance = self.native.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Installs a receive hook on `account`, turning it into a contract account.
    pub fn set_receiver(&mut self, account: Address, receiver: Arc<dyn NativeReceiver>) {
        self.receivers.insert(account, receiver);
    }

    /// Moves native currency without running any receive hook.
    ///
    /// Models `msg.value` accompanying a call.
    ///
    /// # Errors
    ///
    /// Returns empty revert data if `from` holds less than `amount`.
    pub fn move_native(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Bytes> {
        let balance = self.native_balance(&from);
        if balance < amount {
            return Err(Bytes::new());
        }
        self.native.insert(from, balance - amount);
        let credit = self.native.entry(to).or_default();
        *credit = credit.saturating_add(amount);
        Ok(())
    }

    /// Sends native currency, running the destination's receive hook if any.
    ///
    /// # Errors
    ///
    /// Returns the revert data of a failed send; the send is fully undone.
    pub fn send_native(&mut self, from: Address, to: Address, amount: U256) -> Result<(), Bytes> {
        self.frame(|chain| {
            chain.move_native(from, to, amount)?;
            match chain.receivers.get(&to).map(Arc::clone) {
                Some(receiver) => receiver.receive(chain, from, amount),
                None => Ok(()),
            }
        })
    }

    // ---- tokens ----

    /// Deploys `token` at `address`, replacing any previous deployment.
    pub fn deploy_token(&mut self, address: Address, token: Erc20) {
        self.tokens.insert(address, token);
    }

    /// The token deployed at `address`, if any.
    #[must_use]
    pub fn token(&self, address: &Address) -> Option<&Erc20> {
        self.tokens.get(address)
    }

    /// Token balance of `owner`; zero for unknown tokens.
    #[must_use]
    pub fn balance_of(&self, token: &Address, owner: &Address) -> U256 {
        self.tokens
            .get(token)
            .map(|t| t.balance_of(owner))
            .unwrap_or_default()
    }

    /// Token allowance from `owner` to `spender`; zero for unknown tokens.
    #[must_use]
    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> U256 {
        self.tokens
            .get(token)
            .map(|t| t.allowance(owner, spender))
            .unwrap_or_default()
    }

    /// Mints `amount` of `token` to `to`.
    ///
    /// # Errors
    ///
    /// Reverts with `UnknownToken` if nothing is deployed at `token`.
    pub fn mint(&mut self, token: Address, to: Address, amount: U256) -> Result<(), Bytes> {
        self.token_mut(token)?.mint(to, amount);
        Ok(())
    }

    /// `owner` approves `spender` for `amount` of `token`.
    ///
    /// # Errors
    ///
    /// Reverts with `UnknownToken` if nothing is deployed at `token`.
    pub fn approve(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), Bytes> {
        self.token_mut(token)?.approve(owner, spender, amount);
        Ok(())
    }

    /// `from` transfers `amount` of `token` to `to`.
    ///
    /// # Errors
    ///
    /// Returns the token's revert data.
    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Bytes> {
        self.token_mut(token)?.transfer(from, to, amount)
    }

    /// `spender` moves `amount` of `token` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns the token's revert data.
    pub fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Bytes> {
        self.token_mut(token)?
            .transfer_from(spender, from, to, amount)
    }

    /// Wraps `amount` of `account`'s native currency into `token`.
    ///
    /// # Errors
    ///
    /// Reverts if `token` is not a wrapped-native deployment or `account`
    /// lacks native balance.
    pub fn deposit(&mut self, token: Address, account: Address, amount: U256) -> Result<(), Bytes> {
        self.frame(|chain| {
            chain.wrapped_native_mut(token)?;
            chain.move_native(account, token, amount)?;
            chain.token_mut(token)?.mint(account, amount);
            Ok(())
        })
    }

    /// Unwraps `amount` of `token` held by `account` back into native currency.
    ///
    /// The native leg is sent with [`Chain::send_native`], so receive hooks run.
    ///
    /// # Errors
    ///
    /// Reverts if `token` is not wrapped native, `account` lacks the tokens,
    /// or the native send is rejected.
    pub fn withdraw(&mut self, token: Address, account: Address, amount: U256) -> Result<(), Bytes> {
        self.frame(|chain| {
            chain.wrapped_native_mut(token)?.burn(account, amount)?;
            chain.send_native(token, account, amount)
        })
    }

    /// EIP-2612 `permit`: `owner` approves `spender` by signature.
    ///
    /// # Errors
    ///
    /// Reverts with `PermitUnsupported`, `ERC2612ExpiredSignature` or
    /// `ERC2612InvalidSigner`.
    pub fn permit(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: UnixTimestamp,
        signature: &[u8],
    ) -> Result<(), Bytes> {
        let now = self.timestamp();
        let chain_id = self.chain_id();
        self.frame(|chain| {
            let erc20 = chain.token_mut(token)?;
            if !erc20.supports_permit() {
                return Err(IERC20Errors::PermitUnsupported {}.abi_encode().into());
            }
            if now > deadline {
                return Err(IERC20Errors::ERC2612ExpiredSignature {
                    deadline: deadline.into(),
                }
                .abi_encode()
                .into());
            }
            let permit = typed::Permit {
                owner,
                spender,
                value,
                nonce: erc20.use_nonce(owner),
                deadline: deadline.into(),
            };
            let hash = permit.eip712_signing_hash(&erc20.permit_domain(chain_id, token));
            let signer = recover_signer(signature, &hash).unwrap_or_default();
            if signer != owner {
                return Err(IERC20Errors::ERC2612InvalidSigner { signer, owner }
                    .abi_encode()
                    .into());
            }
            erc20.approve(owner, spender, value);
            Ok(())
        })
    }

    /// EIP-712 digest a permit signer must sign for the current nonce of `owner`.
    ///
    /// Returns `None` if `token` does not support permits.
    #[must_use]
    pub fn permit_digest(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: UnixTimestamp,
    ) -> Option<B256> {
        let erc20 = self.tokens.get(&token).filter(|t| t.supports_permit())?;
        let permit = typed::Permit {
            owner,
            spender,
            value,
            nonce: erc20.nonce(&owner),
            deadline: deadline.into(),
        };
        Some(permit.eip712_signing_hash(&erc20.permit_domain(self.chain_id(), token)))
    }

    // ---- unordered nonces ----

    /// Whether `nonce` of `owner` has been consumed at `contract`.
    #[must_use]
    pub fn is_nonce_used(&self, contract: Address, owner: Address, nonce: U256) -> bool {
        self.unordered_nonces.contains(&(contract, owner, nonce))
    }

    /// Consumes `nonce` of `owner` at `contract`; `false` if already used.
    pub fn use_unordered_nonce(&mut self, contract: Address, owner: Address, nonce: U256) -> bool {
        self.unordered_nonces.insert((contract, owner, nonce))
    }

    // ---- engine storage ----

    /// Storage of the engine deployed at `address`.
    #[must_use]
    pub fn storage(&self, address: &Address) -> Option<&TransfersStorage> {
        self.storage.get(address)
    }

    /// Mutable storage of the engine at `address`, zero-initialized on first use.
    pub fn storage_mut(&mut self, address: Address) -> &mut TransfersStorage {
        self.storage.entry(address).or_default()
    }

    // ---- logs ----

    /// Appends a log emitted by `address`.
    pub fn emit(&mut self, address: Address, data: LogData) {
        self.logs.push(Log { address, data });
    }

    /// All logs emitted so far, oldest first.
    #[must_use]
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    fn token_mut(&mut self, token: Address) -> Result<&mut Erc20, Bytes> {
        self.tokens
            .get_mut(&token)
            .ok_or_else(|| IERC20Errors::UnknownToken { token }.abi_encode().into())
    }

    fn wrapped_native_mut(&mut self, token: Address) -> Result<&mut Erc20, Bytes> {
        let erc20 = self.token_mut(token)?;
        if erc20.is_wrapped_native() {
            Ok(erc20)
        } else {
            Err(IERC20Errors::NotWrappedNative {}.abi_encode().into())
        }
    }
}
