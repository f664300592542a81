use litedoc::collection::Document;
use litedoc::common::SortOrder;
use litedoc::doc;
use litedoc::errors::ErrorKind;
use litedoc::filter::field;
use litedoc::store::{ChangeEvent, ChangeListener};
use litedoc_int_test::test_util::{insert_people, run_test, wait_until};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn test_doc_snapshot_fires_once_per_change() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        insert_people(&users).await?;

        let snapshots: Arc<Mutex<Vec<Option<Document>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = snapshots.clone();
        let subscription = users.doc("john").on_snapshot(move |document| {
            sink.lock().push(document);
        })?;
        tokio::time::sleep(Duration::from_millis(50)).await;

        users.doc("john").update(doc! { "age": 50 }).await?;
        assert!(wait_until(Duration::from_secs(2), || snapshots.lock().len() == 1).await);

        // changes to other rows of the table are ignored
        users.doc("sita").update(doc! { "age": 29 }).await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        {
            let snapshots = snapshots.lock();
            assert_eq!(snapshots.len(), 1);
            let john = snapshots[0].as_ref().expect("john should exist");
            assert_eq!(john.get("age"), Some(&json!(50)));
        }

        subscription.unsubscribe();
        users.doc("john").update(doc! { "age": 51 }).await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(snapshots.lock().len(), 1);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_doc_snapshot_reports_insert_and_delete() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        users.ensure_exists().await?;

        let snapshots: Arc<Mutex<Vec<Option<Document>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = snapshots.clone();
        let _subscription = users.doc("maya").on_snapshot(move |document| {
            sink.lock().push(document);
        })?;
        tokio::time::sleep(Duration::from_millis(50)).await;

        users.doc("maya").put(doc! { "name": "Maya" }).await?;
        assert!(wait_until(Duration::from_secs(2), || snapshots.lock().len() == 1).await);

        users.doc("maya").delete().await?;
        assert!(wait_until(Duration::from_secs(2), || snapshots.lock().len() == 2).await);

        let snapshots = snapshots.lock();
        assert!(snapshots[0].is_some());
        assert!(snapshots[1].is_none());
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_snapshot() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        insert_people(&users).await?;

        let snapshots: Arc<Mutex<Vec<Vec<Document>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = snapshots.clone();
        let subscription = users
            .filter(field("age").gt(40))
            .sort_by("age", SortOrder::Ascending)
            .on_snapshot(move |documents| {
                sink.lock().push(documents);
            })?;

        users.doc("sita").update(doc! { "age": 45 }).await?;
        assert!(wait_until(Duration::from_secs(2), || snapshots.lock().len() == 1).await);
        {
            let snapshots = snapshots.lock();
            let names: Vec<_> = snapshots[0]
                .iter()
                .filter_map(|d| d.get("name").cloned())
                .collect();
            assert_eq!(names, vec![json!("John"), json!("Sita"), json!("Maya")]);
        }

        users.doc("john").delete().await?;
        assert!(wait_until(Duration::from_secs(2), || snapshots.lock().len() == 2).await);
        assert_eq!(snapshots.lock()[1].len(), 2);

        subscription.unsubscribe();
        users.doc("maya").delete().await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(snapshots.lock().len(), 2);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_snapshot_ignores_other_collections() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        let orders = ctx.db().collection("orders")?;
        users.ensure_exists().await?;

        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let _subscription = users.query().on_snapshot(move |_| {
            *counter.lock() += 1;
        })?;

        orders.doc("o1").put(doc! { "total": 10 }).await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*calls.lock(), 0);

        users.doc("john").put(doc! { "name": "John" }).await?;
        assert!(wait_until(Duration::from_secs(2), || *calls.lock() == 1).await);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_write_reaches_snapshot() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        users.ensure_exists().await?;

        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let _subscription = users.query().on_snapshot(move |_| {
            *counter.lock() += 1;
        })?;

        // the caller stops waiting right after the write was handed to storage
        let john = users.doc("john");
        let _ = tokio::time::timeout(Duration::ZERO, john.put(doc! { "name": "John" })).await;

        assert!(wait_until(Duration::from_secs(5), || *calls.lock() == 1).await);
        assert!(users.doc("john").get().await?.is_some());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*calls.lock(), 1);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_writers_notify_once_per_change() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        users.ensure_exists().await?;

        let events = Arc::new(Mutex::new(0usize));
        let event_counter = events.clone();
        let _listener = ctx.db().listen(ChangeListener::new(move |_: &ChangeEvent| {
            *event_counter.lock() += 1;
            Ok(())
        }))?;

        let snapshots = Arc::new(Mutex::new(0usize));
        let snapshot_counter = snapshots.clone();
        let _subscription = users.query().on_snapshot(move |_| {
            *snapshot_counter.lock() += 1;
        })?;

        let writers: Vec<_> = (0..20)
            .map(|i| {
                let users = users.clone();
                tokio::spawn(async move {
                    users
                        .doc(&format!("user{}", i))
                        .put(doc! { "name": format!("User {}", i), "rank": i })
                        .await
                })
            })
            .collect();
        for writer in writers {
            writer.await??;
        }

        assert!(wait_until(Duration::from_secs(5), || *events.lock() == 20).await);
        assert!(wait_until(Duration::from_secs(5), || *snapshots.lock() == 20).await);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*events.lock(), 20);
        assert_eq!(*snapshots.lock(), 20);
        assert_eq!(users.count().await?, 20);
        Ok(())
    })
    .await;
}

#[test]
fn test_snapshot_requires_runtime() {
    let ctx = litedoc_int_test::test_util::create_test_context().expect("context");

    let users = ctx.db().collection("users").expect("collection");
    let err = users.doc("john").on_snapshot(|_| {}).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

    let err = users.query().on_snapshot(|_| {}).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidOperation);

    litedoc_int_test::test_util::cleanup(ctx).expect("cleanup");
}
