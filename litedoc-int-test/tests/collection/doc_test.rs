use litedoc::collection::{merge, PutOptions};
use litedoc::doc;
use litedoc::errors::ErrorKind;
use litedoc::filter::RawFragment;
use litedoc_int_test::test_util::{insert_people, run_test};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    id: String,
    name: String,
    age: u32,
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_and_get() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        users.doc("john").put(doc! { "name": "John", "age": 42 }).await?;

        let john = users.doc("john").get().await?.expect("john should exist");
        assert_eq!(john.get("name"), Some(&json!("John")));
        assert_eq!(john.get("age"), Some(&json!(42)));
        assert_eq!(john.get("id"), Some(&json!("john")));

        assert!(users.doc("nobody").get().await?.is_none());
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_replaces_document() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        let john = users.doc("john");
        john.put(doc! { "name": "John", "age": 42 }).await?;
        john.put(doc! { "name": "Johnny" }).await?;

        let stored = john.get().await?.expect("john should exist");
        assert_eq!(stored.get("name"), Some(&json!("Johnny")));
        assert!(stored.get("age").is_none());
        assert_eq!(users.count().await?, 1);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_with_merge() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        let john = users.doc("john");
        john.put(doc! { "name": "John", "age": 42, "address": { "city": "Boston" } })
            .await?;
        john.put_with_options(doc! { "age": 43, "address": { "zip": "02101" } }, &merge())
            .await?;

        let stored = john.get().await?.expect("john should exist");
        assert_eq!(stored.get("name"), Some(&json!("John")));
        assert_eq!(stored.get("age"), Some(&json!(43)));
        assert_eq!(
            stored.get("address"),
            Some(&json!({ "city": "Boston", "zip": "02101" }))
        );

        john.put_with_options(doc! { "name": "Jon" }, &PutOptions::default())
            .await?;
        let stored = john.get().await?.expect("john should exist");
        assert!(stored.get("address").is_none());
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_adopts_body_id() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        let handle = users.new_doc();
        handle.put(doc! { "id": "sita", "name": "Sita" }).await?;

        assert_eq!(handle.id(), "sita");
        assert!(users.doc("sita").get().await?.is_some());
        assert_eq!(users.count().await?, 1);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_new_doc_ids_are_unique() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        let first = users.new_doc();
        let second = users.new_doc();
        assert_ne!(first.id(), second.id());

        first.put(doc! { "name": "A" }).await?;
        second.put(doc! { "name": "B" }).await?;
        assert_eq!(users.count().await?, 2);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_typed_round_trip() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        let kennedy = Person {
            id: "kennedy".to_string(),
            name: "Kennedy".to_string(),
            age: 35,
        };
        users.doc("kennedy").put_value(&kennedy).await?;

        let stored: Option<Person> = users.doc("kennedy").get_as().await?;
        assert_eq!(stored, Some(kennedy));
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_merges_partial() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        insert_people(&users).await?;

        let john = users.doc("john");
        john.update(doc! { "age": 43, "address": { "zip": "02101" }, "id": "other" })
            .await?;

        let stored = john.get().await?.expect("john should exist");
        assert_eq!(stored.get("id"), Some(&json!("john")));
        assert_eq!(stored.get("age"), Some(&json!(43)));
        assert_eq!(
            stored.get("address"),
            Some(&json!({ "city": "Boston", "zip": "02101" }))
        );

        john.update(doc! { "address": null }).await?;
        let stored = john.get().await?.expect("john should exist");
        assert!(stored.get("address").is_none());

        // other documents are untouched
        let sita = users.doc("sita").get().await?.expect("sita should exist");
        assert_eq!(sita.get("age"), Some(&json!(28)));
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_missing_document_is_noop() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        users.doc("ghost").update(doc! { "age": 1 }).await?;
        assert!(users.doc("ghost").get().await?.is_none());
        assert_eq!(users.count().await?, 0);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_raw() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        insert_people(&users).await?;

        users
            .doc("sita")
            .update_raw(
                RawFragment::new("json_set(value, '$.age', json_extract(value, '$.age') + ")
                    .bind(2)
                    .push(")"),
            )
            .await?;

        let sita = users.doc("sita").get().await?.expect("sita should exist");
        assert_eq!(sita.get("age"), Some(&json!(30)));
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_delete_document() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        insert_people(&users).await?;

        users.doc("john").delete().await?;
        assert!(users.doc("john").get().await?.is_none());
        assert_eq!(users.count().await?, 3);

        // deleting again is harmless
        users.doc("john").delete().await?;
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_row_locator() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        assert_eq!(users.doc("john").row_locator().await?, None);

        users.doc("john").put(doc! { "name": "John" }).await?;
        let locator = users
            .doc("john")
            .row_locator()
            .await?
            .expect("john should have a row");

        let by_locator = users.doc_by_row_locator(locator).await?;
        assert_eq!(
            by_locator.and_then(|d| d.get("name").cloned()),
            Some(json!("John"))
        );
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_collection_name() {
    run_test(|ctx| async move {
        let err = ctx.db().collection("bad\"name").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidName);

        let err = ctx.db().collection("").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidName);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ensure_exists_is_idempotent() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        users.ensure_exists().await?;
        users.ensure_exists().await?;
        ctx.db().collection("users")?.ensure_exists().await?;

        assert_eq!(users.count().await?, 0);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_drop_and_delete_collection() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        insert_people(&users).await?;

        users.delete().await?;
        assert_eq!(users.count().await?, 0);

        insert_people(&users).await?;
        users.drop().await?;
        // the table is recreated on next use
        assert_eq!(users.count().await?, 0);
        assert!(users.all().await?.is_empty());
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_storage_error_passthrough() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        insert_people(&users).await?;

        let err = users
            .filter_raw(RawFragment::new("no_such_function(value) = 1"))
            .get()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StorageError);
        assert!(err.message().contains("no_such_function"));
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_operations_fail_after_close() {
    run_test(|ctx| async move {
        let users = ctx.db().collection("users")?;
        insert_people(&users).await?;
        ctx.db().close()?;

        let err = users.count().await.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StorageError);
        Ok(())
    })
    .await;
}
