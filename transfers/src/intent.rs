//! The signed transfer intent.
//!
//! A [`TransferIntent`] is authored and signed by an operator and handed to
//! the payer, who submits it to the settlement engine together with whatever
//! authorization data the chosen entry point needs. The intent itself is
//! immutable: any change to a signed field invalidates the signature.

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::timestamp::UnixTimestamp;

/// Sentinel currency address meaning "the chain's native currency".
pub const NATIVE_CURRENCY: Address = Address::ZERO;

/// A 16-byte opaque intent identifier, unique per operator.
pub type IntentId = FixedBytes<16>;

/// A request to settle `recipient_amount` to `recipient` and `fee_amount` to
/// the operator's fee destination, both in `recipient_currency`.
///
/// # Wire format
///
/// ```json
/// {
///   "recipientAmount": "90",
///   "deadline": "1700000000",
///   "recipient": "0x…",
///   "recipientCurrency": "0x0000000000000000000000000000000000000000",
///   "refundDestination": "0x…",
///   "feeAmount": "10",
///   "id": "0x000102030405060708090a0b0c0d0e0f",
///   "operator": "0x…",
///   "signature": "0x…",
///   "prefix": "0x"
/// }
/// ```
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferIntent {
    /// Amount the recipient must receive, net of fee.
    #[serde_as(as = "DisplayFromStr")]
    pub recipient_amount: U256,
    /// The intent is invalid once block time passes this value.
    pub deadline: UnixTimestamp,
    /// Settlement destination.
    pub recipient: Address,
    /// Currency the recipient must receive; [`NATIVE_CURRENCY`] for native.
    pub recipient_currency: Address,
    /// Where callers should send refunds. Not enforced by the engine.
    pub refund_destination: Address,
    /// Amount the operator's fee destination must receive.
    #[serde_as(as = "DisplayFromStr")]
    pub fee_amount: U256,
    /// Replay-protection identifier, unique per operator.
    pub id: IntentId,
    /// Authorizing operator; must be registered with a fee destination.
    pub operator: Address,
    /// Operator signature over the intent digest.
    #[serde(default)]
    pub signature: Bytes,
    /// Alternate signing prefix. Empty means the EIP-191 personal-message prefix.
    #[serde(default)]
    pub prefix: Bytes,
}

impl TransferIntent {
    /// Total amount that must be collected: `recipient_amount + fee_amount`.
    ///
    /// Returns `None` when the sum overflows 256 bits.
    #[must_use]
    pub fn needed_amount(&self) -> Option<U256> {
        self.recipient_amount.checked_add(self.fee_amount)
    }

    /// Whether the recipient is to be paid in native currency.
    #[must_use]
    pub fn pays_native(&self) -> bool {
        self.recipient_currency == NATIVE_CURRENCY
    }

    /// Returns a copy of this intent carrying the given signature.
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<Bytes>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Returns a copy of this intent using an alternate signing prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<Bytes>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, fixed_bytes};

    use super::*;

    fn intent() -> TransferIntent {
        TransferIntent {
            recipient_amount: U256::from(90u64),
            deadline: UnixTimestamp::from_secs(1_700_000_000),
            recipient: address!("0x1111111111111111111111111111111111111111"),
            recipient_currency: NATIVE_CURRENCY,
            refund_destination: address!("0x2222222222222222222222222222222222222222"),
            fee_amount: U256::from(10u64),
            id: fixed_bytes!("0x000102030405060708090a0b0c0d0e0f"),
            operator: address!("0x3333333333333333333333333333333333333333"),
            signature: Bytes::new(),
            prefix: Bytes::new(),
        }
    }

    #[test]
    fn test_needed_amount_sums_fee() {
        assert_eq!(intent().needed_amount(), Some(U256::from(100u64)));
    }

    #[test]
    fn test_needed_amount_overflow() {
        let mut intent = intent();
        intent.recipient_amount = U256::MAX;
        assert_eq!(intent.needed_amount(), None);
    }

    #[test]
    fn test_intent_wire_format() {
        let json = serde_json::to_value(intent()).unwrap();
        assert_eq!(json["recipientAmount"], "90");
        assert_eq!(json["feeAmount"], "10");
        assert_eq!(json["deadline"], "1700000000");
        assert_eq!(json["id"], "0x000102030405060708090a0b0c0d0e0f");
        assert_eq!(json["prefix"], "0x");
    }

    #[test]
    fn test_intent_signature_and_prefix_default_to_empty() {
        let mut json = serde_json::to_value(intent()).unwrap();
        let object = json.as_object_mut().unwrap();
        object.remove("signature");
        object.remove("prefix");
        let parsed: TransferIntent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, intent());
    }

    #[test]
    fn test_pays_native() {
        let mut intent = intent();
        assert!(intent.pays_native());
        intent.recipient_currency = address!("0x4444444444444444444444444444444444444444");
        assert!(!intent.pays_native());
    }
}
