//! World and settlement configuration.
//!
//! Loads a TOML description of the world (contracts, tokens, balances,
//! pools, operators, signing keys) and the settlements to run against it.
//! String values may reference environment variables as `$VAR` or `${VAR}`,
//! which keeps private keys out of the file.
//!
//! # Example Configuration
//!
//! ```toml
//! chain_id = 8453
//! timestamp = 1700000000
//! signers = ["$OPERATOR_KEY", "$PAYER_KEY"]
//!
//! [contracts]
//! engine = "0x00000000000000000000000000000000000000e0"
//! owner = "0x000000000000000000000000000000000000000a"
//! wrapped_native = "0x4200000000000000000000000000000000000006"
//! permit2 = "0x000000000022D473030F116dDEE9F6B43aC78BA3"
//! router = "0x6fF5693b99212Da76ad316178A184AB56D299b43"
//!
//! [[operators]]
//! address = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
//! fee_destination = "0x00000000000000000000000000000000000000fd"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - Signer keys referenced by `$VAR` in the config file

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use transfers::TransferIntent;
use transfers_evm::Pool;

use crate::error::CliError;

/// Top-level configuration: the world and the settlements to run.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// EIP-155 chain id (default: `8453`).
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Block time in seconds since the epoch (default: now).
    #[serde(default)]
    pub timestamp: Option<u64>,

    /// Deployed contract addresses.
    pub contracts: Contracts,

    /// Private keys of every operator and payer, hex with or without `0x`.
    #[serde(default)]
    pub signers: Vec<String>,

    /// Native balances, as decimal strings.
    #[serde_as(as = "HashMap<_, DisplayFromStr>")]
    #[serde(default)]
    pub native: HashMap<Address, U256>,

    /// ERC-20 deployments.
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,

    /// Swap venue pools.
    #[serde(default)]
    pub pools: Vec<Pool>,

    /// Operators registered with the engine at startup.
    #[serde(default)]
    pub operators: Vec<OperatorConfig>,

    /// Token allowances granted at startup.
    #[serde(default)]
    pub approvals: Vec<ApprovalConfig>,

    /// Settlements to execute, in order.
    #[serde(default)]
    pub settlements: Vec<SettlementConfig>,
}

/// Addresses of the engine and its collaborators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Contracts {
    /// Settlement engine.
    pub engine: Address,
    /// Engine owner and initial sweeper.
    pub owner: Address,
    /// Wrapped native token.
    pub wrapped_native: Address,
    /// Permit2 signature-transfer contract.
    pub permit2: Address,
    /// Universal Router.
    pub router: Address,
}

/// One ERC-20 deployment and its initial balances.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token address.
    pub address: Address,
    /// Token name, also the EIP-712 domain name of its permit.
    pub name: String,
    /// Whether this is the wrapped native token. Its balances are minted by
    /// depositing freshly funded native currency.
    #[serde(default)]
    pub wrapped: bool,
    /// Basis points skimmed from every transfer.
    #[serde(default)]
    pub transfer_fee_bps: u16,
    /// EIP-2612 domain version; permits are disabled when absent.
    #[serde(default)]
    pub permit_version: Option<String>,
    /// Initial balances, as decimal strings.
    #[serde_as(as = "HashMap<_, DisplayFromStr>")]
    #[serde(default)]
    pub balances: HashMap<Address, U256>,
}

/// An operator and where its fees go.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Operator address.
    pub address: Address,
    /// Fee destination (default: the operator itself).
    #[serde(default)]
    pub fee_destination: Option<Address>,
}

/// An allowance granted before any settlement runs.
#[serde_as]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Token address.
    pub token: Address,
    /// Approving holder.
    pub owner: Address,
    /// Approved spender.
    pub spender: Address,
    /// Allowance, as a decimal or `0x` hex string.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: U256,
}

/// Engine entry point a settlement goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Exact native value.
    TransferNative,
    /// Token pulled through Permit2.
    TransferToken,
    /// Token pulled from an existing allowance.
    TransferTokenPreApproved,
    /// Token pulled after an EIP-2612 permit, relayed by a third party.
    SubsidizedTransferToken,
    /// Native value wrapped and paid in wrapped native.
    WrapAndTransfer,
    /// Wrapped native pulled through Permit2 and paid natively.
    UnwrapAndTransfer,
    /// Wrapped native pulled from an existing allowance and paid natively.
    UnwrapAndTransferPreApproved,
    /// Native value swapped into the intent currency.
    SwapAndTransferNative,
    /// Token pulled through Permit2 and swapped into the intent currency.
    SwapAndTransferToken,
    /// Token pulled from an existing allowance and swapped into the intent currency.
    SwapAndTransferTokenPreApproved,
}

impl Method {
    /// Entry point name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TransferNative => "transfer_native",
            Self::TransferToken => "transfer_token",
            Self::TransferTokenPreApproved => "transfer_token_pre_approved",
            Self::SubsidizedTransferToken => "subsidized_transfer_token",
            Self::WrapAndTransfer => "wrap_and_transfer",
            Self::UnwrapAndTransfer => "unwrap_and_transfer",
            Self::UnwrapAndTransferPreApproved => "unwrap_and_transfer_pre_approved",
            Self::SwapAndTransferNative => "swap_and_transfer_native",
            Self::SwapAndTransferToken => "swap_and_transfer_token",
            Self::SwapAndTransferTokenPreApproved => "swap_and_transfer_token_pre_approved",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One settlement: an unsigned intent plus how the payer funds it.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Entry point.
    pub method: Method,
    /// Whose funds settle the intent.
    pub payer: Address,
    /// Account submitting a subsidized transfer (default: the payer).
    #[serde(default)]
    pub relayer: Option<Address>,
    /// Native value sent with the call.
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    pub value: U256,
    /// Pool fee tier for swaps (default: `3000`).
    #[serde(default = "default_pool_fee")]
    pub pool_fee: u32,
    /// Swap input token.
    #[serde(default)]
    pub token_in: Option<Address>,
    /// Maximum swap input.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub max_in: Option<U256>,
    /// The intent, in its JSON wire shape; signed with the operator's key
    /// before submission.
    pub intent: TransferIntent,
}

const fn default_chain_id() -> u64 {
    8453
}

const fn default_pool_fee() -> u32 {
    3000
}

impl WorldConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, CliError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(Path::new(&path))
    }

    /// Loads configuration from a specific file path, expanding `$VAR` and
    /// `${VAR}` references first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text, expanding `$VAR` and `${VAR}`
    /// references first.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn parse(content: &str) -> Result<Self, CliError> {
        let expanded = expand_env_vars(content);
        Ok(toml::from_str(&expanded)?)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match lookup(&name).filter(|_| !name.is_empty()) {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if braced && !name.is_empty() {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    fn lookup(name: &str) -> Option<String> {
        (name == "PAYER_KEY").then(|| "0xabc".to_owned())
    }

    #[test]
    fn test_expand_plain_and_braced() {
        assert_eq!(expand_with("k = \"$PAYER_KEY\"", lookup), "k = \"0xabc\"");
        assert_eq!(expand_with("k = \"${PAYER_KEY}\"", lookup), "k = \"0xabc\"");
    }

    #[test]
    fn test_unresolved_left_as_is() {
        assert_eq!(expand_with("$MISSING and ${MISSING}", lookup), "$MISSING and ${MISSING}");
        assert_eq!(expand_with("cost: $ 5", lookup), "cost: $ 5");
    }

    #[test]
    fn test_parse_world() {
        let toml = r#"
            timestamp = 1700000000

            [contracts]
            engine = "0x00000000000000000000000000000000000000e0"
            owner = "0x000000000000000000000000000000000000000a"
            wrapped_native = "0x00000000000000000000000000000000000000e7"
            permit2 = "0x000000000022D473030F116dDEE9F6B43aC78BA3"
            router = "0x00000000000000000000000000000000000000f0"

            [[tokens]]
            address = "0x0000000000000000000000000000000000000070"
            name = "USD Coin"
            balances = { "0x00000000000000000000000000000000000000c0" = "1000" }

            [[settlements]]
            method = "transfer_token_pre_approved"
            payer = "0x00000000000000000000000000000000000000c0"

            [settlements.intent]
            recipientAmount = "90"
            feeAmount = "10"
            deadline = "1700000060"
            recipient = "0x1111111111111111111111111111111111111111"
            recipientCurrency = "0x0000000000000000000000000000000000000070"
            refundDestination = "0x00000000000000000000000000000000000000c0"
            id = "0x000102030405060708090a0b0c0d0e0f"
            operator = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        "#;
        let config = WorldConfig::parse(toml).unwrap();
        assert_eq!(config.chain_id, 8453);
        assert_eq!(config.timestamp, Some(1_700_000_000));
        let payer = address!("0x00000000000000000000000000000000000000c0");
        assert_eq!(config.tokens[0].balances[&payer], U256::from(1000u64));
        let settlement = &config.settlements[0];
        assert_eq!(settlement.method, Method::TransferTokenPreApproved);
        assert_eq!(settlement.pool_fee, 3000);
        assert_eq!(settlement.value, U256::ZERO);
        assert_eq!(settlement.intent.recipient_amount, U256::from(90u64));
        assert!(settlement.intent.signature.is_empty());
    }
}
