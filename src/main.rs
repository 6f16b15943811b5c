use std::env;
use std::fs::File;
use std::io;
use std::process::ExitCode;

use stock_ledger::csv::{read_operations, write_events, write_snapshots};
use stock_ledger::{ChannelSink, Ledger};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: stock-ledger <operations.csv> [events.csv]");
        return ExitCode::FAILURE;
    };
    let events_path = args.next();

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let operations = match read_operations(path.clone()) {
        Ok(operations) => operations,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let (sink, mut events) = ChannelSink::new();
    let ledger = Ledger::new(sink);
    let (op_sender, op_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in operations {
            match result {
                Ok(op) => {
                    if op_sender.send(op).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    ledger.run(ReceiverStream::new(op_receiver)).await;

    let pending = ledger.pending_events().await;
    if pending > 0 && ledger.redeliver().await < pending {
        warn!(pending = ledger.pending_events().await, "events left undelivered");
    }

    let snapshots = ledger.snapshots().await;
    if let Err(e) = write_snapshots(io::stdout().lock(), &snapshots) {
        error!("failed to write snapshots: {e}");
        return ExitCode::FAILURE;
    }

    // dropping the ledger closes the event channel
    drop(ledger);
    let Some(events_path) = events_path else {
        return ExitCode::SUCCESS;
    };

    let mut emitted = Vec::new();
    while let Some(event) = events.recv().await {
        emitted.push(event);
    }
    let written = File::create(&events_path)
        .map_err(csv::Error::from)
        .and_then(|file| write_events(file, &emitted));
    if let Err(e) = written {
        error!(path = events_path, "failed to write events: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
