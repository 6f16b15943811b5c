//! Outbound event delivery.
//!
//! The ledger hands every [`LedgerEvent`] to an [`EventSink`] after committing
//! the state change that produced it. Publishing is fire-and-forget: a sink
//! must not block waiting for a downstream acknowledgement.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::model::LedgerEvent;

/// Downstream failure while publishing an event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("event channel is closed")]
    Closed,
    #[error("downstream unavailable: {0}")]
    Unavailable(String),
}

/// Destination for ledger events (message bus, supplier channel, ...).
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &LedgerEvent) -> Result<(), SinkError>;
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn publish(&self, event: &LedgerEvent) -> Result<(), SinkError> {
        (**self).publish(event)
    }
}

/// Sink forwarding events into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<LedgerEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LedgerEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: &LedgerEvent) -> Result<(), SinkError> {
        self.sender.send(*event).map_err(|_| SinkError::Closed)
    }
}

/// Sink that keeps every delivered event in memory, in delivery order.
///
/// It can be taken offline, in which case publishing fails with
/// [`SinkError::Unavailable`] and nothing is recorded.
#[derive(Debug)]
pub struct RecordingSink {
    events: Mutex<Vec<LedgerEvent>>,
    online: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            online: AtomicBool::new(true),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &LedgerEvent) -> Result<(), SinkError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("recording sink offline".to_string()));
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event);
        Ok(())
    }
}
