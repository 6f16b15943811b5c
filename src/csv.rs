use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::model::{ArticleSnapshot, LedgerEvent};
use crate::{ArticleId, Operation, Quantity, ShipmentId};

/// Errors that can occur when reading operation scripts
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized operation '{op}'")]
    UnrecognizedOp { line: usize, op: String },

    #[error("line {line}: {op} missing amount")]
    MissingAmount { line: usize, op: String },

    #[error("line {line}: {op} missing shipment")]
    MissingShipment { line: usize, op: String },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    op: String,
    article: ArticleId,
    shipment: Option<ShipmentId>,
    amount: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SnapshotRow {
    article: ArticleId,
    available: i64,
    owed: i64,
    reservations: String,
}

#[derive(Debug, Serialize)]
struct EventRow {
    event: &'static str,
    article: ArticleId,
    shipment: ShipmentId,
    amount: i64,
}

impl InputRow {
    fn amount(&self, line: usize) -> Result<Quantity, CsvError> {
        self.amount
            .map(Quantity::new)
            .ok_or_else(|| CsvError::MissingAmount {
                line,
                op: self.op.clone(),
            })
    }

    fn shipment(&self, line: usize) -> Result<ShipmentId, CsvError> {
        self.shipment.ok_or_else(|| CsvError::MissingShipment {
            line,
            op: self.op.clone(),
        })
    }

    fn into_operation(self, line: usize) -> Result<Operation, CsvError> {
        match self.op.as_str() {
            "withdraw" => Ok(Operation::Withdraw {
                article: self.article,
                shipment: self.shipment(line)?,
                amount: self.amount(line)?,
            }),
            "replenish" => Ok(Operation::Replenish {
                article: self.article,
                amount: self.amount(line)?,
            }),
            "cancel" => Ok(Operation::CancelReservation {
                article: self.article,
                shipment: self.shipment(line)?,
            }),
            "check" => Ok(Operation::AvailabilityCheck {
                article: self.article,
            }),
            _ => Err(CsvError::UnrecognizedOp { line, op: self.op }),
        }
    }
}

/// Read ledger operations from a csv file
///
/// Expected header: `op,article,shipment,amount`.
pub fn read_operations(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Operation, CsvError>>, CsvError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            row.into_operation(line)
        }))
}

/// Write article snapshots in csv format
pub fn write_snapshots<'a>(
    writer: impl io::Write,
    snapshots: impl IntoIterator<Item = &'a ArticleSnapshot>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for snapshot in snapshots {
        let reservations = snapshot
            .reservations
            .iter()
            .map(|r| format!("{}:{}", r.shipment, r.owed))
            .collect::<Vec<_>>()
            .join(";");
        writer.serialize(SnapshotRow {
            article: snapshot.article,
            available: snapshot.available.units(),
            owed: snapshot.total_owed().units(),
            reservations,
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write ledger events in csv format, in the given order
pub fn write_events<'a>(
    writer: impl io::Write,
    events: impl IntoIterator<Item = &'a LedgerEvent>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for event in events {
        let row = match *event {
            LedgerEvent::ShipmentReady {
                shipment,
                article,
                amount,
            } => EventRow {
                event: "shipment_ready",
                article,
                shipment,
                amount: amount.units(),
            },
            LedgerEvent::SupplierOrder {
                article,
                amount,
                shipment,
            } => EventRow {
                event: "supplier_order",
                article,
                shipment,
                amount: amount.units(),
            },
        };
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}
