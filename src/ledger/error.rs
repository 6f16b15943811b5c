//! Error types for ledger operations.

use thiserror::Error;

use crate::Quantity;

/// The quantity-carrying operation that was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Withdraw,
    Replenish,
}

/// Error returned by the quantity-carrying ledger operations.
///
/// Unknown articles or shipments are not errors: lookups answer `false` and
/// cancellations are no-ops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{op:?}: amount must be positive, got {amount}")]
    InvalidArgument { op: OperationKind, amount: Quantity },

    #[error("{op:?}: amount {amount} would overflow the article's stock or reservations")]
    Overflow { op: OperationKind, amount: Quantity },
}

impl LedgerError {
    pub fn op(&self) -> OperationKind {
        match self {
            LedgerError::InvalidArgument { op, .. } | LedgerError::Overflow { op, .. } => *op,
        }
    }
}
