//! Inventory ledger.
//!
//! The ledger keeps one [`ArticleAccount`] per article and applies
//! withdrawals, replenishments and reservation cancellations to it. Each
//! article is guarded by its own lock, so operations on different articles run
//! in parallel while operations on the same article are serialized.
//!
//! Events produced by a state change are published while the article lock is
//! still held, after the change is committed and before the caller gets its
//! reply. A sink failure never rolls back the commit: the event is parked in an
//! outbox and retried by [`Ledger::redeliver`].

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::Quantity;
use crate::model::{
    ArticleId, ArticleSnapshot, LedgerEvent, Operation, Reply, ShipmentId, Withdrawal,
};
use crate::sink::EventSink;

mod account;
pub use account::ArticleAccount;

pub mod policy;
pub use policy::ReplenishmentPlan;

mod error;
pub use error::{LedgerError, OperationKind};

type SharedAccount = Arc<Mutex<ArticleAccount>>;

/// Outbox length at which (and at every multiple of which) a backlog warning is logged.
const OUTBOX_BACKLOG_WARN: usize = 256;

/// The inventory ledger.
pub struct Ledger<S> {
    accounts: RwLock<HashMap<ArticleId, SharedAccount>>,
    sink: S,
    /// Events the sink refused, oldest first.
    outbox: Mutex<VecDeque<LedgerEvent>>,
}

/// Public API
impl<S: EventSink> Ledger<S> {
    pub fn new(sink: S) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            sink,
            outbox: Mutex::new(VecDeque::new()),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run the ledger over the given operation stream, in order
    pub async fn run(&self, mut stream: impl Stream<Item = Operation> + Unpin) {
        while let Some(op) = stream.next().await {
            // rejected operations are already logged and must not stop the run
            let _ = self.apply(op).await;
        }
    }

    /// Apply a single operation
    pub async fn apply(&self, op: Operation) -> Result<Reply, LedgerError> {
        match op {
            Operation::Withdraw {
                article,
                shipment,
                amount,
            } => self
                .withdraw(article, amount, shipment)
                .await
                .map(Reply::Withdrawn),
            Operation::Replenish { article, amount } => self
                .replenish(article, amount)
                .await
                .map(|()| Reply::Replenished),
            Operation::CancelReservation { article, shipment } => {
                self.cancel_reservation(article, shipment).await;
                Ok(Reply::Canceled)
            }
            Operation::AvailabilityCheck { article } => {
                Ok(Reply::Available(self.is_available(article).await))
            }
        }
    }

    /// Withdraw `amount` units of `article` for `shipment`.
    ///
    /// Whatever is on hand is handed out. If that is not enough, the shortfall
    /// is reserved for the shipment (accumulating onto an existing reservation)
    /// and one supplier order for it is emitted.
    pub async fn withdraw(
        &self,
        article: ArticleId,
        amount: Quantity,
        shipment: ShipmentId,
    ) -> Result<Withdrawal, LedgerError> {
        Self::ensure_positive(OperationKind::Withdraw, article, amount)?;

        let account = self.account(article).await;
        let mut account = account.lock().await;

        let outcome = policy::plan_withdrawal(account.available(), amount);
        if !account.can_reserve(outcome.shortfall) {
            let op = OperationKind::Withdraw;
            return Err(Self::reject(article, LedgerError::Overflow { op, amount }));
        }
        account.withdraw(shipment, outcome);

        if outcome.is_complete() {
            info!(
                article = %article,
                shipment = %shipment,
                amount = %amount,
                available = %account.available(),
                "withdrawal satisfied"
            );
        } else {
            info!(
                article = %article,
                shipment = %shipment,
                amount = %amount,
                fulfilled = %outcome.fulfilled_now,
                shortfall = %outcome.shortfall,
                "withdrawal short, reserved shortfall"
            );
            self.dispatch(LedgerEvent::SupplierOrder {
                article,
                amount: outcome.shortfall,
                shipment,
            })
            .await;
        }

        Ok(outcome)
    }

    /// Add `amount` incoming units of `article`.
    ///
    /// Outstanding reservations are served first, oldest first, each with a
    /// shipment-ready event; the remainder becomes available stock.
    pub async fn replenish(&self, article: ArticleId, amount: Quantity) -> Result<(), LedgerError> {
        Self::ensure_positive(OperationKind::Replenish, article, amount)?;

        let account = self.account(article).await;
        let mut account = account.lock().await;

        let plan = policy::plan_replenishment(account.reservations(), amount);
        if !account.can_restock(plan.restock) {
            let op = OperationKind::Replenish;
            return Err(Self::reject(article, LedgerError::Overflow { op, amount }));
        }
        account.settle(&plan);

        info!(
            article = %article,
            amount = %amount,
            delivered = %plan.delivered(),
            restocked = %plan.restock,
            available = %account.available(),
            owed = %account.total_owed(),
            "replenishment applied"
        );

        for delivery in &plan.deliveries {
            self.dispatch(LedgerEvent::ShipmentReady {
                shipment: delivery.shipment,
                article,
                amount: delivery.owed,
            })
            .await;
        }

        Ok(())
    }

    /// Drop the reservation held for `shipment` on `article`.
    ///
    /// The owed quantity is discarded, not restocked. Unknown articles and
    /// shipments are a no-op. Returns what the dropped reservation was owed.
    pub async fn cancel_reservation(
        &self,
        article: ArticleId,
        shipment: ShipmentId,
    ) -> Option<Quantity> {
        let Some(account) = self.existing(article).await else {
            info!(article = %article, shipment = %shipment, "no account, nothing to cancel");
            return None;
        };
        let dropped = account.lock().await.cancel(shipment);

        match dropped {
            Some(owed) => info!(
                article = %article,
                shipment = %shipment,
                owed = %owed,
                "reservation canceled"
            ),
            None => info!(
                article = %article,
                shipment = %shipment,
                "no reservation, nothing to cancel"
            ),
        }

        dropped
    }

    /// Whether any unpromised stock of `article` is on hand.
    pub async fn is_available(&self, article: ArticleId) -> bool {
        let available = match self.existing(article).await {
            Some(account) => account.lock().await.is_available(),
            None => false,
        };
        info!(article = %article, available, "availability checked");
        available
    }

    /// Return the state of one article account
    pub async fn snapshot(&self, article: ArticleId) -> Option<ArticleSnapshot> {
        let account = self.existing(article).await?;
        let snapshot = account.lock().await.snapshot(article);
        Some(snapshot)
    }

    /// Return the state of all article accounts, ordered by article id
    pub async fn snapshots(&self) -> Vec<ArticleSnapshot> {
        let mut accounts: Vec<(ArticleId, SharedAccount)> = self
            .accounts
            .read()
            .await
            .iter()
            .map(|(id, account)| (*id, Arc::clone(account)))
            .collect();
        accounts.sort_by_key(|(id, _)| *id);

        let mut snapshots = Vec::with_capacity(accounts.len());
        for (id, account) in accounts {
            snapshots.push(account.lock().await.snapshot(id));
        }
        snapshots
    }

    /// Retry parked events in their original order.
    ///
    /// Returns how many were delivered; the rest stay parked.
    pub async fn redeliver(&self) -> usize {
        let mut outbox = self.outbox.lock().await;
        let delivered = self.drain(&mut outbox);
        if delivered > 0 || !outbox.is_empty() {
            info!(delivered, pending = outbox.len(), "outbox redelivery");
        }
        delivered
    }

    /// Number of events waiting for redelivery
    pub async fn pending_events(&self) -> usize {
        self.outbox.lock().await.len()
    }
}

/// Private API
impl<S: EventSink> Ledger<S> {
    fn ensure_positive(
        op: OperationKind,
        article: ArticleId,
        amount: Quantity,
    ) -> Result<(), LedgerError> {
        if amount.is_positive() {
            return Ok(());
        }
        Err(Self::reject(article, LedgerError::InvalidArgument { op, amount }))
    }

    fn reject(article: ArticleId, err: LedgerError) -> LedgerError {
        warn!(article = %article, reason = %err, "{:?} rejected", err.op());
        err
    }

    /// Get the account for `article`, creating it on first touch.
    async fn account(&self, article: ArticleId) -> SharedAccount {
        if let Some(account) = self.existing(article).await {
            return account;
        }
        // re-checked under the write lock: two first touches create one account
        let mut accounts = self.accounts.write().await;
        Arc::clone(accounts.entry(article).or_default())
    }

    async fn existing(&self, article: ArticleId) -> Option<SharedAccount> {
        self.accounts.read().await.get(&article).map(Arc::clone)
    }

    /// Publish an event, or park it if the sink refuses.
    ///
    /// While older events are parked, new ones queue behind them so the sink
    /// sees events in commit order.
    async fn dispatch(&self, event: LedgerEvent) {
        let mut outbox = self.outbox.lock().await;
        if outbox.is_empty() {
            match self.sink.publish(&event) {
                Ok(()) => {
                    info!(?event, "event published");
                    return;
                }
                Err(e) => warn!(?event, reason = %e, "event parked for redelivery"),
            }
            outbox.push_back(event);
        } else {
            outbox.push_back(event);
            self.drain(&mut outbox);
        }

        let pending = outbox.len();
        if pending > 0 && pending % OUTBOX_BACKLOG_WARN == 0 {
            warn!(pending, "outbox backlog growing, sink may be gone for good");
        }
    }

    fn drain(&self, outbox: &mut VecDeque<LedgerEvent>) -> usize {
        let mut delivered = 0;
        while let Some(event) = outbox.front() {
            if let Err(e) = self.sink.publish(event) {
                warn!(?event, reason = %e, pending = outbox.len(), "redelivery failed");
                break;
            }
            info!(?event, "event published");
            outbox.pop_front();
            delivered += 1;
        }
        delivered
    }
}
