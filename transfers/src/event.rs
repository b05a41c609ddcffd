//! The settlement record.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::intent::IntentId;

/// Proof of a successful settlement, emitted exactly once per settled intent.
///
/// `spent_currency` and `spent_amount` describe what the payer gave up, which
/// differs from the recipient currency when a swap took place.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transferred {
    /// Operator that authorized the intent.
    pub operator: Address,
    /// Intent identifier.
    pub id: IntentId,
    /// Recipient that was paid.
    pub recipient: Address,
    /// Identity whose funds settled the intent.
    pub sender: Address,
    /// Amount the payer actually spent.
    #[serde_as(as = "DisplayFromStr")]
    pub spent_amount: U256,
    /// Currency the payer actually spent.
    pub spent_currency: Address,
}
