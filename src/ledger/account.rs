use std::collections::VecDeque;

use super::policy::ReplenishmentPlan;
use crate::Quantity;
use crate::model::{ArticleId, ArticleSnapshot, Reservation, ShipmentId, Withdrawal};

/// Stock and outstanding promises for one article.
///
/// Reservations are kept in the order each shipment first came up short;
/// that order decides who is served first when stock arrives.
#[derive(Debug, Default)]
pub struct ArticleAccount {
    available: Quantity,
    reservations: VecDeque<Reservation>,
}

impl ArticleAccount {
    pub fn available(&self) -> Quantity {
        self.available
    }

    pub fn is_available(&self) -> bool {
        self.available.is_positive()
    }

    pub fn reservations(&self) -> impl Iterator<Item = &Reservation> + '_ {
        self.reservations.iter()
    }

    pub fn total_owed(&self) -> Quantity {
        self.reservations.iter().map(|r| r.owed).sum()
    }

    /// Whether `shortfall` more can be promised without the total owed overflowing.
    ///
    /// Any single reservation is bounded by the total, so this also covers
    /// accumulation onto an existing entry.
    pub fn can_reserve(&self, shortfall: Quantity) -> bool {
        self.total_owed().checked_add(shortfall).is_some()
    }

    pub fn can_restock(&self, restock: Quantity) -> bool {
        self.available.checked_add(restock).is_some()
    }

    /// Hand out `fulfilled_now` and record any shortfall against `shipment`.
    pub fn withdraw(&mut self, shipment: ShipmentId, outcome: Withdrawal) {
        self.available -= outcome.fulfilled_now;
        if outcome.shortfall.is_positive() {
            self.reserve(shipment, outcome.shortfall);
        }
        self.check_invariants();
    }

    /// A repeated shortfall accumulates in place and keeps its queue position.
    fn reserve(&mut self, shipment: ShipmentId, owed: Quantity) {
        match self.reservations.iter_mut().find(|r| r.shipment == shipment) {
            Some(existing) => existing.owed += owed,
            None => self.reservations.push_back(Reservation { shipment, owed }),
        }
    }

    /// Apply a plan computed from this account's own reservation queue.
    pub fn settle(&mut self, plan: &ReplenishmentPlan) {
        for delivery in &plan.deliveries {
            let Some(front) = self.reservations.front_mut() else {
                panic!(
                    "replenishment plan serves shipment {} but the queue is empty",
                    delivery.shipment
                );
            };
            assert_eq!(
                front.shipment, delivery.shipment,
                "replenishment plan out of queue order"
            );
            front.owed -= delivery.owed;
            if !front.owed.is_positive() {
                self.reservations.pop_front();
            }
        }
        self.available += plan.restock;
        self.check_invariants();
    }

    /// Drop the reservation for `shipment`, returning what it was owed.
    ///
    /// The owed quantity is not returned to available stock.
    pub fn cancel(&mut self, shipment: ShipmentId) -> Option<Quantity> {
        let idx = self.reservations.iter().position(|r| r.shipment == shipment)?;
        self.reservations.remove(idx).map(|r| r.owed)
    }

    pub fn snapshot(&self, article: ArticleId) -> ArticleSnapshot {
        ArticleSnapshot {
            article,
            available: self.available,
            reservations: self.reservations.iter().copied().collect(),
        }
    }

    fn check_invariants(&self) {
        assert!(
            !self.available.is_negative(),
            "available stock went negative: {}",
            self.available
        );
        assert!(
            self.reservations.iter().all(|r| r.owed.is_positive()),
            "reservation with non-positive owed amount"
        );
    }
}
