use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{Revert, SolError, SolType};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use transfers::NATIVE_CURRENCY;

use super::{ADDRESS_THIS, MSG_SENDER, SwapVenue, VenueCall, commands, decode_path};
use crate::chain::Chain;
use crate::contract::IUniversalRouter;

/// Pool fees are expressed in hundredths of a basis point.
const FEE_DENOMINATOR: u32 = 1_000_000;

/// A fixed-price pool between two tokens.
///
/// One unit of `token0` is worth `price_num / price_den` units of `token1`.
/// Liquidity is whatever the pool address holds of each token.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Address holding the pool's liquidity.
    pub address: Address,
    /// First token of the pair.
    pub token0: Address,
    /// Second token of the pair.
    pub token1: Address,
    /// Fee tier in hundredths of a basis point (`3000` = 0.3%).
    pub fee: u32,
    /// Price numerator.
    #[serde_as(as = "DisplayFromStr")]
    pub price_num: U256,
    /// Price denominator.
    #[serde_as(as = "DisplayFromStr")]
    pub price_den: U256,
}

impl Pool {
    /// Input needed to buy exactly `amount_out` of `token_out`, fee included,
    /// rounded up. `None` if the pool does not trade `token_out`.
    #[must_use]
    pub fn amount_in(&self, token_out: Address, amount_out: U256) -> Option<U256> {
        let (num, den) = if token_out == self.token1 {
            (self.price_den, self.price_num)
        } else if token_out == self.token0 {
            (self.price_num, self.price_den)
        } else {
            return None;
        };
        let net = ceil_div(amount_out.checked_mul(num)?, den)?;
        let scale = U256::from(FEE_DENOMINATOR);
        let keep = U256::from(FEE_DENOMINATOR.checked_sub(self.fee)?);
        ceil_div(net.checked_mul(scale)?, keep)
    }

    fn trades(&self, a: Address, b: Address, fee: u32) -> bool {
        self.fee == fee
            && ((self.token0 == a && self.token1 == b) || (self.token0 == b && self.token1 == a))
    }
}

fn ceil_div(num: U256, den: U256) -> Option<U256> {
    if den.is_zero() {
        return None;
    }
    let (quot, rem) = num.div_rem(den);
    if rem.is_zero() {
        Some(quot)
    } else {
        quot.checked_add(U256::from(1u8))
    }
}

/// In-memory Universal Router with fixed-price single-hop pools.
#[derive(Debug, Clone)]
pub struct UniversalRouter {
    address: Address,
    wrapped_native: Address,
    pools: Vec<Pool>,
}

impl UniversalRouter {
    /// A router at `address` unwrapping and wrapping through `wrapped_native`.
    #[must_use]
    pub const fn new(address: Address, wrapped_native: Address) -> Self {
        Self {
            address,
            wrapped_native,
            pools: Vec::new(),
        }
    }

    /// Adds a pool.
    #[must_use]
    pub fn with_pool(mut self, pool: Pool) -> Self {
        self.pools.push(pool);
        self
    }

    /// Configured pools.
    #[must_use]
    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    fn map_recipient(&self, caller: Address, recipient: Address) -> Address {
        match recipient {
            MSG_SENDER => caller,
            ADDRESS_THIS => self.address,
            other => other,
        }
    }

    fn dispatch(
        &self,
        chain: &mut Chain,
        caller: Address,
        command: u8,
        input: &[u8],
    ) -> Result<(), Bytes> {
        match command & commands::COMMAND_TYPE_MASK {
            commands::V3_SWAP_EXACT_OUT => {
                let swap = IUniversalRouter::V3SwapExactOut::abi_decode_params(input)
                    .map_err(|_| invalid_swap())?;
                self.swap_exact_out(chain, caller, &swap)
            }
            commands::WRAP_ETH => {
                let wrap = IUniversalRouter::WrapEth::abi_decode_params(input)
                    .map_err(|_| invalid_swap())?;
                if chain.native_balance(&self.address) < wrap.amountMin {
                    return Err(IUniversalRouter::InsufficientETH {}.abi_encode().into());
                }
                chain.deposit(self.wrapped_native, self.address, wrap.amountMin)?;
                let recipient = self.map_recipient(caller, wrap.recipient);
                if recipient != self.address {
                    chain.transfer(self.wrapped_native, self.address, recipient, wrap.amountMin)?;
                }
                Ok(())
            }
            commands::UNWRAP_WETH => {
                let unwrap = IUniversalRouter::UnwrapWeth::abi_decode_params(input)
                    .map_err(|_| invalid_swap())?;
                let balance = chain.balance_of(&self.wrapped_native, &self.address);
                if balance < unwrap.amountMin {
                    return Err(IUniversalRouter::InsufficientETH {}.abi_encode().into());
                }
                if balance.is_zero() {
                    return Ok(());
                }
                chain.withdraw(self.wrapped_native, self.address, balance)?;
                let recipient = self.map_recipient(caller, unwrap.recipient);
                if recipient == self.address {
                    Ok(())
                } else {
                    chain.send_native(self.address, recipient, balance)
                }
            }
            commands::TRANSFER => {
                let transfer = IUniversalRouter::Transfer::abi_decode_params(input)
                    .map_err(|_| invalid_swap())?;
                let recipient = self.map_recipient(caller, transfer.recipient);
                self.pay(chain, transfer.token, recipient, transfer.value)
            }
            commands::SWEEP => {
                let sweep = IUniversalRouter::Sweep::abi_decode_params(input)
                    .map_err(|_| invalid_swap())?;
                let balance = if sweep.token == NATIVE_CURRENCY {
                    chain.native_balance(&self.address)
                } else {
                    chain.balance_of(&sweep.token, &self.address)
                };
                if balance < sweep.amountMin {
                    return Err(IUniversalRouter::InsufficientToken {}.abi_encode().into());
                }
                if balance.is_zero() {
                    return Ok(());
                }
                let recipient = self.map_recipient(caller, sweep.recipient);
                self.pay(chain, sweep.token, recipient, balance)
            }
            other => Err(IUniversalRouter::InvalidCommandType {
                commandType: U256::from(other),
            }
            .abi_encode()
            .into()),
        }
    }

    fn pay(
        &self,
        chain: &mut Chain,
        token: Address,
        recipient: Address,
        value: U256,
    ) -> Result<(), Bytes> {
        if token == NATIVE_CURRENCY {
            chain.send_native(self.address, recipient, value)
        } else {
            chain.transfer(token, self.address, recipient, value)
        }
    }

    fn swap_exact_out(
        &self,
        chain: &mut Chain,
        caller: Address,
        swap: &IUniversalRouter::V3SwapExactOut,
    ) -> Result<(), Bytes> {
        if swap.amountOut.is_zero() {
            return Err(IUniversalRouter::V3InvalidAmountOut {}.abi_encode().into());
        }
        let (token_out, fee, token_in) = decode_path(&swap.path).ok_or_else(invalid_swap)?;
        let pool = self
            .pools
            .iter()
            .find(|p| p.trades(token_in, token_out, fee))
            .ok_or_else(pool_not_found)?;
        let amount_in = pool
            .amount_in(token_out, swap.amountOut)
            .ok_or_else(invalid_swap)?;
        if amount_in > swap.amountInMax {
            return Err(IUniversalRouter::V3TooMuchRequested {}.abi_encode().into());
        }
        let recipient = self.map_recipient(caller, swap.recipient);
        if swap.payerIsUser {
            chain.transfer_from(token_in, self.address, caller, pool.address, amount_in)?;
        } else {
            chain.transfer(token_in, self.address, pool.address, amount_in)?;
        }
        chain.transfer(token_out, pool.address, recipient, swap.amountOut)
    }
}

fn invalid_swap() -> Bytes {
    IUniversalRouter::V3InvalidSwap {}.abi_encode().into()
}

fn pool_not_found() -> Bytes {
    Revert {
        reason: "pool not found".into(),
    }
    .abi_encode()
    .into()
}

impl SwapVenue for UniversalRouter {
    fn address(&self) -> Address {
        self.address
    }

    fn execute(&self, chain: &mut Chain, call: VenueCall<'_>) -> Result<(), Bytes> {
        if chain.timestamp() > call.deadline {
            return Err(IUniversalRouter::TransactionDeadlinePassed {}
                .abi_encode()
                .into());
        }
        if call.commands.len() != call.inputs.len() {
            return Err(IUniversalRouter::LengthMismatch {}.abi_encode().into());
        }
        chain.frame(|chain| {
            for (command, input) in call.commands.iter().zip(call.inputs) {
                self.dispatch(chain, call.caller, *command, input)?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use transfers::UnixTimestamp;

    use super::*;
    use crate::chain::Erc20;
    use crate::venue::RoutePlan;

    const ROUTER: Address = address!("0x00000000000000000000000000000000000000f0");
    const WETH: Address = address!("0x00000000000000000000000000000000000000e7");
    const USDC: Address = address!("0x0000000000000000000000000000000000000070");
    const POOL: Address = address!("0x00000000000000000000000000000000000000b1");
    const CALLER: Address = address!("0x00000000000000000000000000000000000000c0");
    const PAYEE: Address = address!("0x00000000000000000000000000000000000000d0");

    fn pool() -> Pool {
        // 1 WETH = 2000 USDC
        Pool {
            address: POOL,
            token0: WETH,
            token1: USDC,
            fee: 3000,
            price_num: U256::from(2000u64),
            price_den: U256::from(1u64),
        }
    }

    fn setup() -> (Chain, UniversalRouter) {
        let mut chain = Chain::new(1, UnixTimestamp::from_secs(100));
        chain.deploy_token(WETH, Erc20::wrapped_native("Wrapped Ether"));
        chain.deploy_token(USDC, Erc20::new("USD Coin"));
        chain.mint(USDC, POOL, U256::from(1_000_000u64)).unwrap();
        chain.fund(POOL, U256::from(1_000_000u64));
        chain.deposit(WETH, POOL, U256::from(1_000_000u64)).unwrap();
        (chain, UniversalRouter::new(ROUTER, WETH).with_pool(pool()))
    }

    fn execute(chain: &mut Chain, router: &UniversalRouter, plan: &RoutePlan) -> Result<(), Bytes> {
        router.execute(
            chain,
            VenueCall {
                caller: CALLER,
                commands: plan.commands(),
                inputs: plan.inputs(),
                deadline: UnixTimestamp::from_secs(100),
                value: U256::ZERO,
            },
        )
    }

    #[test]
    fn test_amount_in_rounds_up_with_fee() {
        // 4000 USDC costs 2 WETH net, grossed up by 1e6 / 997000
        let amount = pool().amount_in(USDC, U256::from(4000u64)).unwrap();
        assert_eq!(amount, U256::from(3u64));
        let amount = pool().amount_in(WETH, U256::from(1u64)).unwrap();
        assert_eq!(amount, U256::from(2007u64));
    }

    #[test]
    fn test_native_in_token_out_refunds_excess() {
        let (mut chain, router) = setup();
        chain.fund(ROUTER, U256::from(5u64));
        let plan = RoutePlan::new()
            .wrap_eth(ADDRESS_THIS, U256::from(5u64))
            .v3_swap_exact_out(ADDRESS_THIS, U256::from(4000u64), U256::from(5u64), USDC, 3000, WETH)
            .transfer(USDC, PAYEE, U256::from(4000u64))
            .unwrap_weth(MSG_SENDER, U256::ZERO);
        execute(&mut chain, &router, &plan).unwrap();
        assert_eq!(chain.balance_of(&USDC, &PAYEE), U256::from(4000u64));
        assert_eq!(chain.native_balance(&CALLER), U256::from(2u64));
        assert_eq!(chain.native_balance(&ROUTER), U256::ZERO);
        assert_eq!(chain.balance_of(&WETH, &ROUTER), U256::ZERO);
    }

    #[test]
    fn test_too_much_requested_reverts_everything() {
        let (mut chain, router) = setup();
        chain.fund(ROUTER, U256::from(2u64));
        let plan = RoutePlan::new()
            .wrap_eth(ADDRESS_THIS, U256::from(2u64))
            .v3_swap_exact_out(ADDRESS_THIS, U256::from(4000u64), U256::from(2u64), USDC, 3000, WETH);
        let err = execute(&mut chain, &router, &plan).unwrap_err();
        assert!(IUniversalRouter::V3TooMuchRequested::abi_decode(&err).is_ok());
        assert_eq!(chain.native_balance(&ROUTER), U256::from(2u64));
    }

    #[test]
    fn test_unknown_pool_reverts_with_reason() {
        let (mut chain, router) = setup();
        let plan = RoutePlan::new().v3_swap_exact_out(
            ADDRESS_THIS,
            U256::from(1u64),
            U256::from(1u64),
            USDC,
            500,
            WETH,
        );
        let err = execute(&mut chain, &router, &plan).unwrap_err();
        assert_eq!(Revert::abi_decode(&err).unwrap().reason, "pool not found");
    }

    #[test]
    fn test_deadline_and_shape_checks() {
        let (mut chain, router) = setup();
        chain.set_timestamp(UnixTimestamp::from_secs(101));
        let err = execute(&mut chain, &router, &RoutePlan::new()).unwrap_err();
        assert!(IUniversalRouter::TransactionDeadlinePassed::abi_decode(&err).is_ok());

        chain.set_timestamp(UnixTimestamp::from_secs(100));
        let err = router
            .execute(
                &mut chain,
                VenueCall {
                    caller: CALLER,
                    commands: &[commands::SWEEP],
                    inputs: &[],
                    deadline: UnixTimestamp::from_secs(100),
                    value: U256::ZERO,
                },
            )
            .unwrap_err();
        assert!(IUniversalRouter::LengthMismatch::abi_decode(&err).is_ok());

        let err = router
            .execute(
                &mut chain,
                VenueCall {
                    caller: CALLER,
                    commands: &[0x21],
                    inputs: &[Bytes::new()],
                    deadline: UnixTimestamp::from_secs(100),
                    value: U256::ZERO,
                },
            )
            .unwrap_err();
        let decoded = IUniversalRouter::InvalidCommandType::abi_decode(&err).unwrap();
        assert_eq!(decoded.commandType, U256::from(0x21u8));
    }

    #[test]
    fn test_pool_from_json() {
        let json = r#"{
            "address": "0x00000000000000000000000000000000000000b1",
            "token0": "0x00000000000000000000000000000000000000e7",
            "token1": "0x0000000000000000000000000000000000000070",
            "fee": 3000,
            "price_num": "2000",
            "price_den": "1"
        }"#;
        let parsed: Pool = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, pool());
    }
}
