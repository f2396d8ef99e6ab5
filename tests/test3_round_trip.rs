use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use sql_dispatch::data::{DoubleN, TextN};
use sql_dispatch::prelude::*;
use sql_dispatch::test_utils::{MemoryStatement, MemoryTable};
use sql_dispatch::types::Bigint;

#[derive(Debug, Default, Clone, PartialEq)]
struct Score {
    id: Bigint,
    player: TextN,
    points: DoubleN,
}

sql_set!(Score {
    id: Bigint,
    player: TextN,
    points: DoubleN,
});

#[derive(Debug, Default)]
struct ById {
    id: Bigint,
}

sql_set!(ById { id: Bigint });

fn score(id: Bigint, player: &str, points: Option<f64>) -> Score {
    Score {
        id,
        player: player.to_string().into(),
        points: points.into(),
    }
}

fn engine(threads: usize) -> Arc<ConnectionEngine> {
    let engine = ConnectionEngine::new(EngineOptions::new(threads)).unwrap();
    engine.start().unwrap();
    Arc::new(engine)
}

#[test]
fn synchronous_insert_then_select() {
    let table = MemoryTable::new();
    let engine = engine(1);
    let insert = StatementHandle::new(Arc::new(MemoryStatement::insert(&table)), Arc::clone(&engine));
    let select = StatementHandle::new(Arc::new(MemoryStatement::select(&table)), engine);

    let mut insert_id = 0;
    let mut rows = 0;
    for (id, player) in [(1, "ana"), (2, "bo")] {
        insert
            .execute(
                Some(&score(id, player, Some(1.5))),
                None,
                Some(&mut insert_id),
                Some(&mut rows),
            )
            .unwrap();
    }
    assert_eq!(insert_id, 2);
    assert_eq!(rows, 1);

    let mut found = SetContainer::<Score>::new();
    select
        .execute(Some(&ById { id: 2 }), Some(&mut found), None, Some(&mut rows))
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(found.into_records(), vec![score(2, "bo", Some(1.5))]);
}

#[test]
fn queued_insert_reports_counters_and_select_fills_container() {
    let table = MemoryTable::new();
    let engine = engine(2);
    let insert = StatementHandle::new(Arc::new(MemoryStatement::insert(&table)), Arc::clone(&engine));

    let (tx, rx) = std::sync::mpsc::channel();
    let insert_id = shared_count();
    let rows = shared_count();
    insert.queue(
        QueryArgs::new()
            .with_parameters(Arc::new(score(10, "cy", None)))
            .with_insert_id(Arc::clone(&insert_id))
            .with_rows(Arc::clone(&rows)),
        move |n| tx.send(n).unwrap(),
    );
    assert!(rx.recv().unwrap().is_success());
    assert_eq!(insert_id.load(Ordering::Acquire), 1);
    assert_eq!(rows.load(Ordering::Acquire), 1);

    let results = SetContainer::<Score>::new().shared();
    let (tx, rx) = std::sync::mpsc::channel();
    engine.queue(
        Arc::new(MemoryStatement::select(&table)),
        QueryArgs::new().with_results(results.clone()),
        move |n| tx.send(n).unwrap(),
    );
    assert!(rx.recv().unwrap().is_success());

    let results = results.lock().unwrap();
    assert_eq!(results.len(), 1);
    let row = results.front().unwrap();
    assert_eq!(row.player.get().map(String::as_str), Some("cy"));
    assert!(row.points.is_null());
}

#[test]
fn a_bad_row_is_not_left_in_the_container() {
    let table = MemoryTable::new();
    table.push(vec![
        RowValues::Int(1),
        RowValues::Text("ok".into()),
        RowValues::Float(2.0),
    ]);
    table.push(vec![
        RowValues::Null,
        RowValues::Text("broken".into()),
        RowValues::Null,
    ]);

    let select = MemoryStatement::select(&table);
    let mut found = SetContainer::<Score>::new();
    let err = select.execute(None, Some(&mut found), None, None).unwrap_err();
    assert!(matches!(err, SqlDispatchError::ConversionError(_)));
    assert_eq!(found.len(), 1);
    assert_eq!(found.back().map(|s| s.id), Some(1));
}

#[test]
fn insert_without_parameters_fails_through_the_callback() {
    let table = MemoryTable::new();
    let engine = engine(1);
    let insert = StatementHandle::new(Arc::new(MemoryStatement::insert(&table)), engine);

    let outcome = Arc::new(Mutex::new(None));
    let (tx, rx) = std::sync::mpsc::channel();
    let slot = Arc::clone(&outcome);
    insert.queue(QueryArgs::EMPTY, move |n| {
        *slot.lock().unwrap() = Some(n.into_result());
        tx.send(()).unwrap();
    });
    rx.recv().unwrap();

    let fault = outcome.lock().unwrap().take().unwrap().unwrap_err();
    assert_eq!(fault.message(), "Binding error: insert requires parameters");
    assert!(table.rows().is_empty());
}

#[tokio::test]
async fn queue_async_resolves_with_the_notification() {
    let table = MemoryTable::new();
    let engine = engine(2);
    let insert = StatementHandle::new(Arc::new(MemoryStatement::insert(&table)), Arc::clone(&engine));
    let select = StatementHandle::new(Arc::new(MemoryStatement::select(&table)), engine);

    for id in 1..=3 {
        let notification = insert
            .queue_async(QueryArgs::new().with_parameters(Arc::new(score(id, "dee", Some(0.5)))))
            .await
            .unwrap();
        notification.into_result().unwrap();
    }

    let results = SetContainer::<Score>::new().shared();
    let rows = shared_count();
    let notification = select
        .queue_async(
            QueryArgs::new()
                .with_parameters(Arc::new(ById { id: 3 }))
                .with_results(results.clone())
                .with_rows(Arc::clone(&rows)),
        )
        .await
        .unwrap();
    assert!(notification.is_success());
    assert_eq!(rows.load(Ordering::Acquire), 1);
    assert_eq!(results.lock().unwrap().iter().map(|s| s.id).collect::<Vec<_>>(), vec![3]);
}
