//! Operator → fee destination registry.
//!
//! Each operator may only mutate its own entry; the engine enforces that by
//! keying every write on the caller.

use std::collections::HashMap;

use alloy_primitives::Address;

/// Maps registered operators to the address that receives their fees.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    fee_destinations: HashMap<Address, Address>,
}

impl OperatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `operator` (or updates its entry) with the given fee destination.
    pub fn register(&mut self, operator: Address, fee_destination: Address) {
        self.fee_destinations.insert(operator, fee_destination);
    }

    /// Removes `operator`, returning its previous fee destination.
    pub fn unregister(&mut self, operator: &Address) -> Option<Address> {
        self.fee_destinations.remove(operator)
    }

    /// Returns the fee destination of `operator`, if registered.
    #[must_use]
    pub fn fee_destination(&self, operator: &Address) -> Option<Address> {
        self.fee_destinations.get(operator).copied()
    }

    /// Whether `operator` is registered.
    #[must_use]
    pub fn is_registered(&self, operator: &Address) -> bool {
        self.fee_destinations.contains_key(operator)
    }

    /// Number of registered operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fee_destinations.len()
    }

    /// Whether no operator is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fee_destinations.is_empty()
    }
}
