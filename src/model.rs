//! Core domain types for the stock ledger.

use crate::Quantity;

/// Article (stock-keeping unit) identifier.
pub type ArticleId = u32;

/// Shipment identifier.
pub type ShipmentId = u32;

/// An operation representing the possible inputs of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Take units out of stock for a shipment; any shortfall becomes a reservation.
    Withdraw {
        article: ArticleId,
        shipment: ShipmentId,
        amount: Quantity,
    },
    /// Incoming stock; settles outstanding reservations first, oldest first.
    Replenish { article: ArticleId, amount: Quantity },
    /// Drop the promise made to a shipment without restocking.
    CancelReservation {
        article: ArticleId,
        shipment: ShipmentId,
    },
    /// Ask whether any unpromised stock is on hand.
    AvailabilityCheck { article: ArticleId },
}

/// Outbound signal produced by a ledger state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A reservation was fully or partially satisfied by replenishment.
    ShipmentReady {
        shipment: ShipmentId,
        article: ArticleId,
        amount: Quantity,
    },
    /// A withdrawal came up short; the supplier should deliver `amount`.
    SupplierOrder {
        article: ArticleId,
        amount: Quantity,
        shipment: ShipmentId,
    },
}

/// Breakdown of a withdrawal: what left stock now and what is still owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Withdrawal {
    pub fulfilled_now: Quantity,
    pub shortfall: Quantity,
}

impl Withdrawal {
    pub fn is_complete(&self) -> bool {
        self.shortfall == Quantity::ZERO
    }
}

/// Reply to an [`Operation`] applied through [`Ledger::apply`](crate::Ledger::apply).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Withdrawn(Withdrawal),
    Replenished,
    Canceled,
    Available(bool),
}

/// One outstanding promise, as reported in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub shipment: ShipmentId,
    pub owed: Quantity,
}

/// Read-only view of an article account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSnapshot {
    pub article: ArticleId,
    pub available: Quantity,
    /// Outstanding reservations, oldest first.
    pub reservations: Vec<Reservation>,
}

impl ArticleSnapshot {
    pub fn total_owed(&self) -> Quantity {
        self.reservations.iter().map(|r| r.owed).sum()
    }
}
