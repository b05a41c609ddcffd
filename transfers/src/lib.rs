#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for signed transfer-intent settlement.
//!
//! An operator signs a [`TransferIntent`] off-band; a payer then submits it to
//! a settlement engine which collects the payer's funds, optionally converts
//! them, pays the recipient and the operator's fee destination, and records
//! the intent as processed. This crate holds the chain-agnostic pieces of that
//! flow. The EVM engine lives in `transfers-evm`.
//!
//! # Modules
//!
//! - [`intent`] - The signed intent and the transient authorization payloads
//! - [`error`] - Settlement error taxonomy and machine-readable reason codes
//! - [`registry`] - Operator → fee destination registry
//! - [`ledger`] - Processed-intent set enforcing at-most-once settlement
//! - [`event`] - The settlement record emitted on success
//! - [`timestamp`] - Unix timestamps used for deadlines and block time

pub mod error;
pub mod event;
pub mod intent;
pub mod ledger;
pub mod registry;
pub mod timestamp;

pub use error::{ErrorCategory, ErrorReason, TransferError};
pub use event::Transferred;
pub use intent::{IntentId, NATIVE_CURRENCY, TransferIntent};
pub use ledger::ProcessedIntents;
pub use registry::OperatorRegistry;
pub use timestamp::UnixTimestamp;
