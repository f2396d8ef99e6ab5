//! Criterion benchmark for queue round trips through the worker pool. Each
//! iteration submits a batch of in-memory selects and waits for every
//! notification, so the numbers reflect queue, wake-up and callback overhead
//! rather than any database.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sql_dispatch::data::TextN;
use sql_dispatch::prelude::*;
use sql_dispatch::test_utils::{MemoryStatement, MemoryTable};
use sql_dispatch::types::Bigint;
use std::hint::black_box;
use std::sync::Arc;
use std::sync::mpsc;
use tokio::runtime::Runtime;

const BATCH: usize = 256;

#[derive(Debug, Default)]
struct BenchRow {
    id: Bigint,
    name: TextN,
}

sql_set!(BenchRow { id: Bigint, name: TextN });

fn get_batch_size() -> usize {
    std::env::var("BENCH_BATCH")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(BATCH)
}

fn seeded_table(rows: usize) -> MemoryTable {
    let table = MemoryTable::new();
    for id in 0..rows {
        table.push(vec![
            RowValues::Int(id as i64),
            RowValues::Text(format!("row-{id}")),
        ]);
    }
    table
}

fn started_engine(threads: usize) -> ConnectionEngine {
    let engine = ConnectionEngine::new(EngineOptions::new(threads)).unwrap_or_else(|err| {
        panic!("invalid engine options: {err}");
    });
    engine
        .start()
        .unwrap_or_else(|err| panic!("failed to start engine: {err}"));
    engine
}

fn bench_callback_batches(c: &mut Criterion) {
    let batch = get_batch_size();
    let table = seeded_table(16);
    let statement: Arc<dyn Statement> = Arc::new(MemoryStatement::select(&table));

    let mut group = c.benchmark_group("queue_callbacks");
    group.throughput(Throughput::Elements(batch as u64));
    for threads in [1, 2, 4, 8] {
        let engine = started_engine(threads);
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, _| {
            b.iter(|| {
                let (tx, rx) = mpsc::channel();
                for _ in 0..batch {
                    let tx = tx.clone();
                    let results = SetContainer::<BenchRow>::new().shared();
                    engine.queue(
                        Arc::clone(&statement),
                        QueryArgs::new().with_results(results),
                        move |n| {
                            let _ = tx.send(n.is_success());
                        },
                    );
                }
                drop(tx);
                black_box(rx.iter().filter(|ok| *ok).count())
            });
        });
        engine.terminate();
    }
    group.finish();
}

fn bench_async_batches(c: &mut Criterion) {
    let batch = get_batch_size();
    let runtime = Runtime::new().unwrap_or_else(|err| panic!("failed to build runtime: {err}"));
    let table = seeded_table(16);
    let statement: Arc<dyn Statement> = Arc::new(MemoryStatement::select(&table));
    let engine = started_engine(4);
    let engine = &engine;
    let statement = &statement;

    let mut group = c.benchmark_group("queue_async");
    group.throughput(Throughput::Elements(batch as u64));
    group.bench_function("select_by_id", |b| {
        b.to_async(&runtime).iter(|| async move {
            let pending: Vec<_> = (0..batch)
                .map(|_| engine.queue_async(Arc::clone(statement), QueryArgs::EMPTY))
                .collect();
            let mut ok = 0;
            for fut in pending {
                if fut.await.is_ok_and(|n| n.is_success()) {
                    ok += 1;
                }
            }
            black_box(ok)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_callback_batches, bench_async_batches);
criterion_main!(benches);
