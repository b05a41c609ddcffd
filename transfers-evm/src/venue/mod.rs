//! Swap venue interface and Universal-Router command encoding.
//!
//! The engine drives the venue with a [`RoutePlan`]: a byte string of
//! command types and a parallel list of `abi.encode`d inputs, executed in
//! order within one call. Recipients may use the [`MSG_SENDER`] and
//! [`ADDRESS_THIS`] placeholders.

mod router;

pub use router::{Pool, UniversalRouter};

use alloy_primitives::{Address, Bytes, U256, address};
use alloy_sol_types::SolType;
use transfers::UnixTimestamp;

use crate::chain::Chain;
use crate::contract::IUniversalRouter;

/// Universal-Router command types.
pub mod commands {
    /// Exact-output swap through a V3 pool path.
    pub const V3_SWAP_EXACT_OUT: u8 = 0x01;
    /// Sends the router's whole balance of a token to a recipient.
    pub const SWEEP: u8 = 0x04;
    /// Sends a fixed amount of a token held by the router.
    pub const TRANSFER: u8 = 0x05;
    /// Wraps native currency held by the router.
    pub const WRAP_ETH: u8 = 0x0b;
    /// Unwraps the router's whole wrapped-native balance and sends it.
    pub const UNWRAP_WETH: u8 = 0x0c;
    /// Mask selecting the command type; upper bits are flags.
    pub const COMMAND_TYPE_MASK: u8 = 0x3f;
}

/// Recipient placeholder for the caller of `execute`.
pub const MSG_SENDER: Address = address!("0x0000000000000000000000000000000000000001");

/// Recipient placeholder for the router itself.
pub const ADDRESS_THIS: Address = address!("0x0000000000000000000000000000000000000002");

/// Byte length of a single-pool `tokenOut ‖ fee ‖ tokenIn` path.
pub const SINGLE_HOP_PATH_LEN: usize = 20 + 3 + 20;

/// One `execute` call on a venue.
#[derive(Debug, Clone, Copy)]
pub struct VenueCall<'a> {
    /// Account calling the venue (`msg.sender`).
    pub caller: Address,
    /// Command type bytes.
    pub commands: &'a [u8],
    /// ABI-encoded input for each command.
    pub inputs: &'a [Bytes],
    /// The call reverts once block time passes this.
    pub deadline: UnixTimestamp,
    /// Native value already moved to the venue with the call.
    pub value: U256,
}

/// An exact-output swap venue.
pub trait SwapVenue: Send + Sync {
    /// Deployed address.
    fn address(&self) -> Address;

    /// Executes a command plan.
    ///
    /// # Errors
    ///
    /// Returns the revert data of the failed command.
    fn execute(&self, chain: &mut Chain, call: VenueCall<'_>) -> Result<(), Bytes>;
}

/// Builder for a command byte string and its inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePlan {
    commands: Vec<u8>,
    inputs: Vec<Bytes>,
}

impl RoutePlan {
    /// An empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Command type bytes.
    #[must_use]
    pub fn commands(&self) -> &[u8] {
        &self.commands
    }

    /// Encoded inputs, parallel to [`RoutePlan::commands`].
    #[must_use]
    pub fn inputs(&self) -> &[Bytes] {
        &self.inputs
    }

    /// Wraps `amount` of native currency for `recipient`.
    #[must_use]
    pub fn wrap_eth(self, recipient: Address, amount: U256) -> Self {
        let input = IUniversalRouter::WrapEth {
            recipient,
            amountMin: amount,
        };
        self.push(
            commands::WRAP_ETH,
            IUniversalRouter::WrapEth::abi_encode_params(&input),
        )
    }

    /// Buys exactly `amount_out` of `token_out` with at most `amount_in_max`
    /// of `token_in` through the `fee` pool.
    #[must_use]
    pub fn v3_swap_exact_out(
        self,
        recipient: Address,
        amount_out: U256,
        amount_in_max: U256,
        token_out: Address,
        fee: u32,
        token_in: Address,
    ) -> Self {
        let input = IUniversalRouter::V3SwapExactOut {
            recipient,
            amountOut: amount_out,
            amountInMax: amount_in_max,
            path: encode_path(token_out, fee, token_in),
            payerIsUser: false,
        };
        self.push(
            commands::V3_SWAP_EXACT_OUT,
            IUniversalRouter::V3SwapExactOut::abi_encode_params(&input),
        )
    }

    /// Sends `value` of `token` to `recipient`. Zero transfers are omitted.
    #[must_use]
    pub fn transfer(self, token: Address, recipient: Address, value: U256) -> Self {
        if value.is_zero() {
            return self;
        }
        let input = IUniversalRouter::Transfer {
            token,
            recipient,
            value,
        };
        self.push(
            commands::TRANSFER,
            IUniversalRouter::Transfer::abi_encode_params(&input),
        )
    }

    /// Sends the router's whole `token` balance to `recipient`.
    #[must_use]
    pub fn sweep(self, token: Address, recipient: Address, amount_min: U256) -> Self {
        let input = IUniversalRouter::Sweep {
            token,
            recipient,
            amountMin: amount_min,
        };
        self.push(
            commands::SWEEP,
            IUniversalRouter::Sweep::abi_encode_params(&input),
        )
    }

    /// Unwraps the router's whole wrapped-native balance to `recipient`.
    #[must_use]
    pub fn unwrap_weth(self, recipient: Address, amount_min: U256) -> Self {
        let input = IUniversalRouter::UnwrapWeth {
            recipient,
            amountMin: amount_min,
        };
        self.push(
            commands::UNWRAP_WETH,
            IUniversalRouter::UnwrapWeth::abi_encode_params(&input),
        )
    }

    fn push(mut self, command: u8, input: Vec<u8>) -> Self {
        self.commands.push(command);
        self.inputs.push(input.into());
        self
    }
}

/// Encodes an exact-output single-pool path: `tokenOut ‖ fee (uint24) ‖ tokenIn`.
#[must_use]
pub fn encode_path(token_out: Address, fee: u32, token_in: Address) -> Bytes {
    let mut path = Vec::with_capacity(SINGLE_HOP_PATH_LEN);
    path.extend_from_slice(token_out.as_slice());
    path.extend_from_slice(&fee.to_be_bytes()[1..]);
    path.extend_from_slice(token_in.as_slice());
    path.into()
}

/// Decodes a single-pool path into `(token_out, fee, token_in)`.
#[must_use]
pub fn decode_path(path: &[u8]) -> Option<(Address, u32, Address)> {
    if path.len() != SINGLE_HOP_PATH_LEN {
        return None;
    }
    let token_out = Address::from_slice(&path[..20]);
    let fee = u32::from_be_bytes([0, path[20], path[21], path[22]]);
    let token_in = Address::from_slice(&path[23..]);
    Some((token_out, fee, token_in))
}
