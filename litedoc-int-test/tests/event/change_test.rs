use litedoc::doc;
use litedoc::filter::field;
use litedoc::store::{ChangeEvent, ChangeEventType, ChangeListener};
use litedoc_int_test::test_util::{insert_people, run_test, wait_until};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

fn recorder() -> (Arc<Mutex<Vec<ChangeEvent>>>, ChangeListener) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let listener = ChangeListener::new(move |event: &ChangeEvent| {
        sink.lock().push(event.clone());
        Ok(())
    });
    (events, listener)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_row_changes_are_published() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        users.ensure_exists().await?;

        let (events, listener) = recorder();
        let subscription = ctx.db().listen(listener)?;

        let john = users.doc("john");
        john.put(doc! { "name": "John" }).await?;
        john.update(doc! { "age": 42 }).await?;
        john.delete().await?;

        assert!(wait_until(Duration::from_secs(2), || events.lock().len() == 3).await);
        let events = events.lock().clone();
        let kinds: Vec<ChangeEventType> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeEventType::Insert,
                ChangeEventType::Update,
                ChangeEventType::Delete
            ]
        );
        assert!(events.iter().all(|e| e.table() == "users"));
        assert!(events.iter().all(|e| e.namespace() == "main"));
        assert_eq!(events[0].row_locator(), events[2].row_locator());

        assert!(subscription.unsubscribe());
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bulk_statement_publishes_per_row() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        insert_people(&users).await?;

        let (events, listener) = recorder();
        let _subscription = ctx.db().listen(listener)?;

        users
            .filter(field("address.city").eq("Austin"))
            .update(doc! { "state": "TX" })
            .await?;

        assert!(wait_until(Duration::from_secs(2), || events.lock().len() == 2).await);
        assert!(events
            .lock()
            .iter()
            .all(|e| e.event_type() == ChangeEventType::Update));
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unsubscribed_listener_is_silent() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        let (events, listener) = recorder();
        let subscription = ctx.db().listen(listener)?;

        users.doc("john").put(doc! { "name": "John" }).await?;
        assert!(wait_until(Duration::from_secs(2), || events.lock().len() == 1).await);

        assert!(subscription.unsubscribe());
        assert!(!subscription.unsubscribe());

        users.doc("sita").put(doc! { "name": "Sita" }).await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(events.lock().len(), 1);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_listener_may_query_the_store() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        users.ensure_exists().await?;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reader = users.clone();
        let handle = tokio::runtime::Handle::current();
        let _subscription = ctx.db().listen(ChangeListener::new(move |event: &ChangeEvent| {
            let reader = reader.clone();
            let sink = sink.clone();
            let locator = event.row_locator();
            handle.spawn(async move {
                if let Ok(Some(document)) = reader.doc_by_row_locator(locator).await {
                    sink.lock().push(document);
                }
            });
            Ok(())
        }))?;

        users.doc("john").put(doc! { "name": "John" }).await?;
        assert!(wait_until(Duration::from_secs(2), || seen.lock().len() == 1).await);
        Ok(())
    })
    .await;
}
