//! Runs a handful of inserts and selects through the worker pool against an
//! in-memory table and logs each completion.
//!
//! ```text
//! cargo run --example queue_demo -- --sql-threads 3 --rows 20
//! RUST_LOG=sql_dispatch=debug cargo run --example queue_demo
//! ```

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::sync::mpsc;

use clap::Parser;
use sql_dispatch::data::TextN;
use sql_dispatch::prelude::*;
use sql_dispatch::test_utils::{MemoryStatement, MemoryTable};
use sql_dispatch::types::Bigint;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Queue statements through the SQL worker pool")]
struct Args {
    #[command(flatten)]
    engine: EngineOptions,
    /// Rows to insert before querying
    #[arg(long, default_value_t = 10)]
    rows: i64,
}

#[derive(Debug, Default)]
struct Item {
    id: Bigint,
    label: TextN,
}

sql_set!(Item { id: Bigint, label: TextN });

fn main() -> Result<(), SqlDispatchError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let options_json = serde_json::to_string(&args.engine).unwrap_or_else(|_| "{}".to_string());
    tracing::info!("engine options: {}", options_json);

    let engine = Arc::new(ConnectionEngine::new(args.engine)?);
    engine.start()?;

    let table = MemoryTable::new();
    let insert = StatementHandle::new(
        Arc::new(MemoryStatement::insert(&table)),
        Arc::clone(&engine),
    );
    let select = StatementHandle::new(
        Arc::new(MemoryStatement::select(&table)),
        Arc::clone(&engine),
    );

    let (tx, rx) = mpsc::channel();
    for id in 1..=args.rows {
        let tx = tx.clone();
        let label = if id % 3 == 0 {
            TextN::null()
        } else {
            TextN::new(format!("item-{id}"))
        };
        insert.queue(
            QueryArgs::new().with_parameters(Arc::new(Item { id, label })),
            move |n| {
                let _ = tx.send(n);
            },
        );
    }
    drop(tx);
    for notification in rx {
        match notification.outcome() {
            Ok(()) => tracing::debug!(query_id = notification.query_id(), "insert done"),
            Err(fault) => tracing::warn!(query_id = notification.query_id(), %fault, "insert failed"),
        }
    }

    let results = SetContainer::<Item>::new().shared();
    let rows = shared_count();
    let (tx, rx) = mpsc::channel();
    select.queue(
        QueryArgs::new()
            .with_results(results.clone())
            .with_rows(Arc::clone(&rows)),
        move |n| {
            let _ = tx.send(n);
        },
    );
    if let Ok(notification) = rx.recv() {
        notification
            .into_result()
            .map_err(|fault| SqlDispatchError::ExecutionError(fault.to_string()))?;
    }

    let results = results
        .lock()
        .map_err(|_| SqlDispatchError::Other("result container poisoned".into()))?;
    tracing::info!(rows = rows.load(Ordering::Acquire), "select done");
    for item in results.iter() {
        tracing::info!(id = item.id, label = %item.label, "row");
    }
    drop(results);

    let abandoned = engine.terminate();
    tracing::info!(abandoned, "shut down");
    Ok(())
}
