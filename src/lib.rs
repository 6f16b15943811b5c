pub mod csv;
pub mod ledger;
pub mod model;
pub mod quantity;
pub mod sink;

pub use ledger::{Ledger, LedgerError};
pub use model::{ArticleId, LedgerEvent, Operation, ShipmentId, Withdrawal};
pub use quantity::Quantity;
pub use sink::{ChannelSink, EventSink, RecordingSink, SinkError};
