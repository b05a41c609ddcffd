//! The settlement engine.
//!
//! [`Transfers`] is the engine's code: immutable, shared, generic over its
//! [`TransferAuthority`] and [`SwapVenue`]. Its state lives in the
//! [`Chain`] as a [`TransfersStorage`] slot keyed by the engine address, so
//! a receive hook that calls back into the engine sees the in-flight
//! reentrancy flag and is rejected.
//!
//! Every settlement entry point funnels into one pipeline:
//!
//! 1. reentrancy lock, `msg.value` moved into the engine
//! 2. pause check
//! 3. [`verify_intent`]: signature, deadline, recipient, replay
//! 4. operator lookup
//! 5. entry-point currency rule
//! 6. collection, optional swap, payout, each token leg guarded
//! 7. ledger mark and `Transferred` event
//!
//! Any failure unwinds the whole call through [`Chain::frame`].

/// Runs a synchronous call, optionally inside a tracing span.
macro_rules! traced {
    ($call:expr, $span:expr) => {{
        #[cfg(feature = "telemetry")]
        {
            $span.in_scope(|| $call)
        }
        #[cfg(not(feature = "telemetry"))]
        {
            $call
        }
    }};
}

mod admin;
mod collect;
mod entry;
mod error;
mod guard;
mod payout;
mod swap;
mod verify;

pub use collect::{Funding, check_native_value};
pub use error::encode_error;
pub use guard::{BalanceSnapshot, PayoutGuard};
pub use swap::swap_failure;
pub use verify::{VerifyContext, intent_hash, signing_digest, verify_intent};

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolEvent;
use transfers::{
    IntentId, NATIVE_CURRENCY, OperatorRegistry, ProcessedIntents, TransferError, TransferIntent,
    Transferred,
};

use crate::authority::TransferAuthority;
use crate::chain::Chain;
use crate::contract::ITransfers;
use crate::venue::SwapVenue;
use swap::{SwapInput, SwapRequest};

/// Caller context of an entry point: `msg.sender` and `msg.value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    /// Account calling the engine.
    pub sender: Address,
    /// Native currency sent with the call.
    pub value: U256,
}

impl Call {
    /// A call without native value.
    #[must_use]
    pub const fn new(sender: Address) -> Self {
        Self {
            sender,
            value: U256::ZERO,
        }
    }

    /// A call carrying `value` of native currency.
    #[must_use]
    pub const fn with_value(sender: Address, value: U256) -> Self {
        Self { sender, value }
    }
}

/// Persistent state of one engine deployment.
#[derive(Debug, Clone, Default)]
pub struct TransfersStorage {
    operators: OperatorRegistry,
    processed: ProcessedIntents,
    owner: Address,
    sweeper: Address,
    paused: bool,
    entered: bool,
}

impl TransfersStorage {
    /// Registered operators and their fee destinations.
    #[must_use]
    pub const fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    /// Settled `(operator, id)` pairs.
    #[must_use]
    pub const fn processed(&self) -> &ProcessedIntents {
        &self.processed
    }

    /// Account allowed to pause, unpause and appoint the sweeper.
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Account allowed to recover stray funds.
    #[must_use]
    pub const fn sweeper(&self) -> Address {
        self.sweeper
    }

    /// Whether settlement entry points are disabled.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }
}

/// The settlement engine deployed at one address.
#[derive(Debug, Clone)]
pub struct Transfers<A, V> {
    address: Address,
    wrapped_native: Address,
    authority: A,
    venue: V,
}

/// How an entry point funds and settles an intent.
#[derive(Debug, Clone, Copy)]
enum Route<'a> {
    Native {
        value: U256,
    },
    Token {
        token: Address,
        funding: Funding<'a>,
    },
    Wrap {
        value: U256,
    },
    Unwrap {
        funding: Funding<'a>,
    },
    SwapNative {
        value: U256,
        pool_fee: u32,
    },
    SwapToken {
        token_in: Address,
        max_in: U256,
        funding: Funding<'a>,
        pool_fee: u32,
    },
}

impl Route<'_> {
    /// Rejects intents whose currency the entry point cannot settle.
    fn check_currency(&self, intent: &TransferIntent, wrapped: Address) -> Result<(), TransferError> {
        let currency = intent.recipient_currency;
        let rejected = match *self {
            Self::Native { .. } => (currency != NATIVE_CURRENCY).then_some(NATIVE_CURRENCY),
            Self::Token { .. } => (currency == NATIVE_CURRENCY).then_some(NATIVE_CURRENCY),
            Self::Wrap { .. } => (currency != wrapped).then_some(NATIVE_CURRENCY),
            Self::Unwrap { .. } => (currency != NATIVE_CURRENCY).then_some(wrapped),
            Self::SwapNative { .. } => {
                (currency == NATIVE_CURRENCY || currency == wrapped).then_some(NATIVE_CURRENCY)
            }
            Self::SwapToken { token_in, .. } => {
                if token_in == NATIVE_CURRENCY {
                    Some(NATIVE_CURRENCY)
                } else if token_in == currency
                    || (token_in == wrapped && currency == NATIVE_CURRENCY)
                {
                    Some(token_in)
                } else {
                    None
                }
            }
        };
        rejected.map_or(Ok(()), |attempted| {
            Err(TransferError::IncorrectCurrency(attempted))
        })
    }
}

/// Maps revert data of a call to `target` into [`TransferError::CallReverted`].
fn reverted(target: Address) -> impl FnOnce(Bytes) -> TransferError {
    move |data| TransferError::CallReverted { target, data }
}

impl<A, V> Transfers<A, V> {
    /// Engine address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Wrapped native currency the engine wraps into and unwraps from.
    #[must_use]
    pub const fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    /// Transfer authority used by the signature-authorized entry points.
    #[must_use]
    pub const fn authority(&self) -> &A {
        &self.authority
    }

    /// Swap venue used by the swap entry points.
    #[must_use]
    pub const fn venue(&self) -> &V {
        &self.venue
    }

    /// Engine storage in `chain`.
    #[must_use]
    pub fn storage<'c>(&self, chain: &'c Chain) -> Option<&'c TransfersStorage> {
        chain.storage(&self.address)
    }

    /// Whether `(operator, id)` has been settled.
    #[must_use]
    pub fn is_processed(&self, chain: &Chain, operator: &Address, id: &IntentId) -> bool {
        self.storage(chain)
            .is_some_and(|s| s.processed.is_processed(operator, id))
    }

    /// Fee destination of `operator`, if registered.
    #[must_use]
    pub fn fee_destination(&self, chain: &Chain, operator: &Address) -> Option<Address> {
        self.storage(chain)
            .and_then(|s| s.operators.fee_destination(operator))
    }

    /// Whether `operator` is registered.
    #[must_use]
    pub fn is_operator(&self, chain: &Chain, operator: &Address) -> bool {
        self.storage(chain)
            .is_some_and(|s| s.operators.is_registered(operator))
    }

    /// Number of registered operators.
    #[must_use]
    pub fn operator_count(&self, chain: &Chain) -> usize {
        self.storage(chain).map_or(0, |s| s.operators.len())
    }

    /// Whether settlement is paused.
    #[must_use]
    pub fn is_paused(&self, chain: &Chain) -> bool {
        self.storage(chain).is_some_and(TransfersStorage::is_paused)
    }

    /// Runs `f` under the reentrancy lock, after moving `value` from `sender`
    /// into the engine. The whole call reverts if `f` fails.
    fn non_reentrant<T>(
        &self,
        chain: &mut Chain,
        call: Call,
        f: impl FnOnce(&mut Chain) -> Result<T, TransferError>,
    ) -> Result<T, TransferError> {
        chain.frame(|chain| {
            let storage = chain.storage_mut(self.address);
            if storage.entered {
                return Err(TransferError::ReentrantCall);
            }
            storage.entered = true;
            if !call.value.is_zero() {
                let balance = chain.native_balance(&call.sender);
                chain
                    .move_native(call.sender, self.address, call.value)
                    .map_err(|_| TransferError::InsufficientBalance(call.value - balance))?;
            }
            let result = f(chain)?;
            chain.storage_mut(self.address).entered = false;
            Ok(result)
        })
    }

    /// Marks the intent processed and emits `Transferred`.
    fn finish(
        &self,
        chain: &mut Chain,
        sender: Address,
        intent: &TransferIntent,
        spent_amount: U256,
        spent_currency: Address,
    ) -> Result<Transferred, TransferError> {
        chain
            .storage_mut(self.address)
            .processed
            .mark(intent.operator, intent.id)?;
        let event = Transferred {
            operator: intent.operator,
            id: intent.id,
            recipient: intent.recipient,
            sender,
            spent_amount,
            spent_currency,
        };
        let log = ITransfers::Transferred {
            operator: event.operator,
            id: event.id,
            recipient: event.recipient,
            sender: event.sender,
            spentAmount: event.spent_amount,
            spentCurrency: event.spent_currency,
        };
        chain.emit(self.address, log.encode_log_data());
        #[cfg(feature = "telemetry")]
        tracing::info!(
            operator = %event.operator,
            id = %event.id,
            recipient = %event.recipient,
            sender = %event.sender,
            spent_amount = %event.spent_amount,
            spent_currency = %event.spent_currency,
            "intent settled"
        );
        Ok(event)
    }
}

impl<A: TransferAuthority, V: SwapVenue> Transfers<A, V> {
    /// Deploys an engine at `address`, owned by `owner` who is also the
    /// initial sweeper.
    pub fn deploy(
        chain: &mut Chain,
        address: Address,
        wrapped_native: Address,
        authority: A,
        venue: V,
        owner: Address,
    ) -> Self {
        let storage = chain.storage_mut(address);
        storage.owner = owner;
        storage.sweeper = owner;
        Self {
            address,
            wrapped_native,
            authority,
            venue,
        }
    }

    /// The settlement pipeline shared by every entry point.
    fn settle(
        &self,
        chain: &mut Chain,
        call: Call,
        payer: Address,
        intent: &TransferIntent,
        route: Route<'_>,
    ) -> Result<Transferred, TransferError> {
        self.non_reentrant(chain, call, |chain| {
            let env = chain.env();
            let storage = chain.storage_mut(self.address);
            if storage.paused {
                return Err(TransferError::EnforcedPause);
            }
            let ctx = VerifyContext {
                chain_id: env.chain_id,
                now: env.timestamp,
                sender: payer,
                engine: self.address,
            };
            verify_intent(intent, &ctx, &storage.processed)?;
            let fee_destination = storage
                .operators
                .fee_destination(&intent.operator)
                .ok_or(TransferError::OperatorNotRegistered)?;
            route.check_currency(intent, self.wrapped_native)?;
            let needed = intent
                .needed_amount()
                .ok_or(TransferError::AmountOverflow)?;
            let (spent_amount, spent_currency) =
                self.execute_route(chain, payer, intent, fee_destination, needed, route)?;
            self.finish(chain, payer, intent, spent_amount, spent_currency)
        })
    }

    fn execute_route(
        &self,
        chain: &mut Chain,
        payer: Address,
        intent: &TransferIntent,
        fee_destination: Address,
        needed: U256,
        route: Route<'_>,
    ) -> Result<(U256, Address), TransferError> {
        match route {
            Route::Native { value } => {
                check_native_value(value, needed)?;
                self.pay_out_native(chain, intent, fee_destination)?;
                Ok((value, NATIVE_CURRENCY))
            }
            Route::Token { token, funding } => {
                self.collect(chain, payer, token, needed, funding)?;
                self.pay_out_token(chain, token, intent, fee_destination)?;
                Ok((needed, token))
            }
            Route::Wrap { value } => {
                check_native_value(value, needed)?;
                if !needed.is_zero() {
                    chain
                        .deposit(self.wrapped_native, self.address, needed)
                        .map_err(reverted(self.wrapped_native))?;
                }
                self.pay_out_token(chain, self.wrapped_native, intent, fee_destination)?;
                Ok((value, NATIVE_CURRENCY))
            }
            Route::Unwrap { funding } => {
                self.collect(chain, payer, self.wrapped_native, needed, funding)?;
                self.unwrap_and_pay_out(chain, intent, fee_destination, needed)?;
                Ok((needed, self.wrapped_native))
            }
            Route::SwapNative { value, pool_fee } => {
                if needed.is_zero() {
                    self.refund_native(chain, payer, value)?;
                    return Ok((U256::ZERO, NATIVE_CURRENCY));
                }
                let request = SwapRequest {
                    payer,
                    intent,
                    fee_destination,
                    needed,
                    pool_fee,
                    input: SwapInput::Native { value },
                };
                let consumed = self.swap(chain, &request)?;
                Ok((consumed, NATIVE_CURRENCY))
            }
            Route::SwapToken {
                token_in,
                max_in,
                funding,
                pool_fee,
            } => {
                if needed.is_zero() {
                    return Ok((U256::ZERO, token_in));
                }
                let request = SwapRequest {
                    payer,
                    intent,
                    fee_destination,
                    needed,
                    pool_fee,
                    input: SwapInput::Token {
                        token: token_in,
                        max_in,
                        funding,
                    },
                };
                let consumed = self.swap(chain, &request)?;
                Ok((consumed, token_in))
            }
        }
    }
}
