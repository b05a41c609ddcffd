#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM settlement engine for signed transfer intents.
//!
//! An operator signs a [`TransferIntent`](transfers::TransferIntent); a payer
//! submits it through one of the engine's entry points. The engine verifies
//! the intent, collects the payer's funds (native value, a pre-approved
//! allowance, a Permit2 signature transfer or an EIP-2612 permit), optionally
//! converts them through an exact-output swap, pays the recipient and the
//! operator's fee destination, and records the intent as processed. Each
//! call commits fully or not at all.
//!
//! # Architecture
//!
//! - [`settlement`] - The engine: verification, collection, swap, payout, admin
//! - [`chain`] - In-memory EVM world state with checkpoint/rollback frames
//! - [`authority`] - Signature-based transfer authority (Permit2)
//! - [`venue`] - Swap venue (Universal Router command subset)
//! - [`contract`] - Solidity bindings: digests, typed data, events, errors
//! - [`signature`] - ECDSA signer recovery
//!
//! # Feature Flags
//!
//! - `client` - Signing helpers for operators and payers
//! - `telemetry` - `tracing` spans and events
//!
pub mod authority;
pub mod chain;
pub mod contract;
pub mod settlement;
pub mod signature;
pub mod venue;

#[cfg(feature = "client")]
pub mod client;

pub use authority::{Permit2, TransferAuthority};
pub use chain::{Chain, Erc20, NativeReceiver};
pub use settlement::{Call, Transfers, TransfersStorage, encode_error};
pub use venue::{Pool, SwapVenue, UniversalRouter};
