//! Allocation policy.
//!
//! Pure functions deciding how a withdrawal or a replenishment splits across
//! on-hand stock, reservations and backorders. They never mutate an account;
//! [`ArticleAccount`](super::ArticleAccount) applies the resulting plans.

use crate::Quantity;
use crate::model::{Reservation, Withdrawal};

/// Outcome of distributing incoming stock.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplenishmentPlan {
    /// Quantities handed to waiting shipments, in the order they were served.
    pub deliveries: Vec<Reservation>,
    /// What is left for general stock once the queue is served.
    pub restock: Quantity,
}

impl ReplenishmentPlan {
    pub fn delivered(&self) -> Quantity {
        self.deliveries.iter().map(|d| d.owed).sum()
    }
}

/// Split a withdrawal of `amount` against `available` on-hand stock.
///
/// Everything on hand is handed out when the request cannot be met in full;
/// the remainder is the shortfall to reserve and backorder.
pub fn plan_withdrawal(available: Quantity, amount: Quantity) -> Withdrawal {
    if available >= amount {
        Withdrawal {
            fulfilled_now: amount,
            shortfall: Quantity::ZERO,
        }
    } else {
        Withdrawal {
            fulfilled_now: available,
            shortfall: amount - available,
        }
    }
}

/// Distribute `amount` incoming units over `queue`, oldest reservation first.
///
/// A reservation the remaining units cannot cover is served partially and
/// distribution stops there. Invariant: `delivered() + restock == amount`.
pub fn plan_replenishment<'a>(
    queue: impl IntoIterator<Item = &'a Reservation>,
    amount: Quantity,
) -> ReplenishmentPlan {
    let mut remaining = amount;
    let mut deliveries = Vec::new();

    for reservation in queue {
        if !remaining.is_positive() {
            break;
        }
        let served = remaining.min(reservation.owed);
        deliveries.push(Reservation {
            shipment: reservation.shipment,
            owed: served,
        });
        remaining -= served;
    }

    ReplenishmentPlan {
        deliveries,
        restock: remaining,
    }
}
