//! Processed-intent ledger. Prevents double settlement.
//!
//! Each `(operator, id)` pair can be settled once. Entries are never evicted
//! or cleared: a processed intent stays processed for the lifetime of the
//! engine.

use std::collections::HashSet;

use alloy_primitives::Address;

use crate::error::TransferError;
use crate::intent::IntentId;

/// Set of `(operator, id)` pairs that have been settled.
#[derive(Debug, Clone, Default)]
pub struct ProcessedIntents {
    processed: HashSet<(Address, IntentId)>,
}

impl ProcessedIntents {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `(operator, id)` has been settled.
    #[must_use]
    pub fn is_processed(&self, operator: &Address, id: &IntentId) -> bool {
        self.processed.contains(&(*operator, *id))
    }

    /// Marks `(operator, id)` as settled.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::AlreadyProcessed`] if the pair was already marked.
    pub fn mark(&mut self, operator: Address, id: IntentId) -> Result<(), TransferError> {
        if self.processed.insert((operator, id)) {
            Ok(())
        } else {
            Err(TransferError::AlreadyProcessed)
        }
    }

    /// Number of settled intents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    /// Whether nothing has been settled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, fixed_bytes};

    use super::*;

    const OPERATOR: Address = address!("0x00000000000000000000000000000000000000a1");
    const OTHER: Address = address!("0x00000000000000000000000000000000000000a2");
    const ID: IntentId = fixed_bytes!("0x0102030405060708090a0b0c0d0e0f10");

    #[test]
    fn test_mark_once() {
        let mut ledger = ProcessedIntents::new();
        assert!(!ledger.is_processed(&OPERATOR, &ID));
        ledger.mark(OPERATOR, ID).unwrap();
        assert!(ledger.is_processed(&OPERATOR, &ID));
        assert_eq!(ledger.mark(OPERATOR, ID), Err(TransferError::AlreadyProcessed));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_ids_are_scoped_per_operator() {
        let mut ledger = ProcessedIntents::new();
        ledger.mark(OPERATOR, ID).unwrap();
        assert!(!ledger.is_processed(&OTHER, &ID));
        ledger.mark(OTHER, ID).unwrap();
        assert_eq!(ledger.len(), 2);
    }
}
