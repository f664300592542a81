use litedoc::common::{SortOrder, SortSpec};
use litedoc::doc;
use litedoc::filter::{field, or, RawFragment};
use litedoc_int_test::test_util::{insert_numbered, insert_people, run_test};
use serde_json::{json, Value};

fn ages(documents: &[litedoc::collection::Document]) -> Vec<i64> {
    documents
        .iter()
        .filter_map(|d| d.get("age").and_then(Value::as_i64))
        .collect()
}

fn names(documents: &[litedoc::collection::Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|d| d.get("name").and_then(Value::as_str).map(str::to_string))
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_filter_by_range() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_numbered(&people, 100).await?;

        let adults = people.filter(field("age").gte(50)).get().await?;
        assert_eq!(adults.len(), 51);
        assert_eq!(people.filter(field("age").gte(50)).count().await?, 51);

        let window = people.filter(field("age").gt(10).lt(20)).count().await?;
        assert_eq!(window, 9);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pagination_is_order_independent() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_numbered(&people, 100).await?;

        let base = people.filter(field("age").gte(50)).sort_by("age", SortOrder::Ascending);
        let first = base.skip(10).limit(10).get().await?;
        let second = base.limit(10).skip(10).get().await?;

        assert_eq!(ages(&first), (60..70).collect::<Vec<i64>>());
        assert_eq!(first, second);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_skip_without_limit() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_numbered(&people, 20).await?;

        let tail = people
            .query()
            .sort_by("age", SortOrder::Ascending)
            .skip(15)
            .get()
            .await?;
        assert_eq!(ages(&tail), vec![16, 17, 18, 19, 20]);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sort_numeric_and_string() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_people(&people).await?;

        let by_age = people
            .query()
            .sort_by("age", SortOrder::Descending)
            .get()
            .await?;
        assert_eq!(ages(&by_age), vec![61, 42, 35, 28]);

        let by_name = people
            .query()
            .sort_by("name", SortOrder::Ascending)
            .get()
            .await?;
        assert_eq!(names(&by_name), vec!["John", "Kennedy", "Maya", "Sita"]);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sort_on_nested_field_then_name() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_people(&people).await?;

        let sorted = people
            .query()
            .sort(
                SortSpec::new()
                    .asc("address.city")
                    .desc("name"),
            )
            .get()
            .await?;
        assert_eq!(names(&sorted), vec!["Maya", "Kennedy", "John", "Sita"]);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_or_query() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_people(&people).await?;

        let matched = people
            .filter(or(vec![
                field("name").eq("John").into(),
                field("name").eq("Kennedy").into(),
                field("name").eq("Nobody").into(),
            ]))
            .count()
            .await?;
        assert_eq!(matched, 2);

        let matched = people
            .filter(field("name").eq("Sita").or(field("age").gt(60)))
            .get()
            .await?;
        assert_eq!(matched.len(), 2);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chained_filters_are_conjoined() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_people(&people).await?;

        let matched = people
            .filter(field("address.city").eq("Austin"))
            .filter(field("age").lt(40))
            .get()
            .await?;
        assert_eq!(names(&matched), vec!["Kennedy"]);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_people(&people).await?;

        let oldest = people
            .query()
            .sort_by("age", SortOrder::Descending)
            .first()
            .await?
            .expect("collection is not empty");
        assert_eq!(oldest.get("name"), Some(&json!("Maya")));

        let none = people.filter(field("age").gt(100)).first().await?;
        assert!(none.is_none());
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_query_awaits_directly() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_people(&people).await?;

        let documents = people.filter(field("age").lte(35)).await?;
        assert_eq!(documents.len(), 2);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bulk_update_and_delete() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_people(&people).await?;

        people
            .filter(field("address.city").eq("Austin"))
            .update(doc! { "state": "TX" })
            .await?;
        let texans = people.filter(field("state").eq("TX")).count().await?;
        assert_eq!(texans, 2);

        people
            .query()
            .update_raw(
                RawFragment::new("json_set(value, '$.age', json_extract(value, '$.age') + ")
                    .bind(1)
                    .push(")"),
            )
            .await?;
        let john = people.doc("john").get().await?.expect("john should exist");
        assert_eq!(john.get("age"), Some(&json!(43)));

        people.filter(field("age").gt(40)).delete().await?;
        assert_eq!(people.count().await?, 2);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_raw_filter() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        insert_people(&people).await?;

        let matched = people
            .filter_raw(RawFragment::new("json_extract(value, '$.name') LIKE ").bind("%a"))
            .sort_by("name", SortOrder::Ascending)
            .get()
            .await?;
        assert_eq!(names(&matched), vec!["Maya", "Sita"]);

        // raw and field criteria combine
        let matched = people
            .filter_raw(RawFragment::new("json_extract(value, '$.name') LIKE ").bind("%a"))
            .filter(field("age").gt(30))
            .count()
            .await?;
        assert_eq!(matched, 1);
        Ok(())
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_or_on_different_fields() {
    run_test(|ctx| async move {
        let people = ctx.db().collection("people")?;
        people.doc("john").put(doc! { "name": "John", "age": 10 }).await?;
        people.doc("kennedy").put(doc! { "name": "Kennedy", "age": 45 }).await?;
        people.doc("sita").put(doc! { "name": "Sita", "age": 20 }).await?;

        let criteria = field("name").eq("John").or(field("age").gte(40));
        let matched = people
            .filter(criteria.clone())
            .sort_by("name", SortOrder::Ascending)
            .get()
            .await?;
        assert_eq!(names(&matched), vec!["John", "Kennedy"]);
        assert_eq!(people.filter(criteria).count().await?, 2);
        Ok(())
    })
    .await;
}
