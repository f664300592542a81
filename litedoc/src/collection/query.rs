use crate::collection::collection_ref::read_count;
use crate::collection::snapshot::SnapshotContext;
use crate::collection::{statements, CollectionRef, Document};
use crate::common::{SortOrder, SortSpec, Subscription, DOC_ID};
use crate::errors::DocResult;
use crate::filter::{compile, compile_raw, order_by_clause, CompiledClause, Criteria, RawFragment};
use crate::store::{ChangeEvent, ChangeListener};
use serde_json::Value;
use std::fmt::Debug;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

/// Filter, sort and pagination options of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub criteria: Option<Criteria>,
    pub sort: Option<SortSpec>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// A deferred query over a collection.
///
/// Builder methods return a new query and leave the receiver untouched, so a
/// base query can be refined in several directions. Nothing touches storage
/// until a terminal method runs: [`get`](Self::get), [`first`](Self::first),
/// [`count`](Self::count), [`update`](Self::update),
/// [`update_raw`](Self::update_raw) or [`delete`](Self::delete).
///
/// A query can also be awaited directly, which runs a fresh `get()`.
///
/// # Examples
///
/// ```rust,ignore
/// let page = users
///     .filter(field("age").gte(50))
///     .sort_by("age", SortOrder::Ascending)
///     .skip(10)
///     .limit(10)
///     .await?;
/// ```
#[derive(Clone)]
pub struct Query {
    collection: CollectionRef,
    options: QueryOptions,
}

impl Query {
    pub(crate) fn new(collection: CollectionRef) -> Self {
        Query {
            collection,
            options: QueryOptions::default(),
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    /// Replaces the sort spec.
    pub fn sort(&self, sort: SortSpec) -> Self {
        let mut query = self.clone();
        query.options.sort = Some(sort);
        query
    }

    /// Appends a sort key after the existing ones.
    pub fn sort_by(&self, field_name: &str, sort_order: SortOrder) -> Self {
        let sort = self.options.sort.clone().unwrap_or_default();
        self.sort(sort.then_by(field_name, sort_order))
    }

    /// Skips the first `skip` results.
    pub fn skip(&self, skip: u64) -> Self {
        let mut query = self.clone();
        query.options.skip = Some(skip);
        query
    }

    /// Returns at most `limit` results.
    pub fn limit(&self, limit: u64) -> Self {
        let mut query = self.clone();
        query.options.limit = Some(limit);
        query
    }

    /// Adds a filter, conjoined with any existing one.
    pub fn filter(&self, criteria: impl Into<Criteria>) -> Self {
        let criteria = criteria.into();
        let mut query = self.clone();
        query.options.criteria = Some(match query.options.criteria.take() {
            None => criteria,
            Some(existing) => existing.and(criteria),
        });
        query
    }

    /// The `SELECT` statement and parameters `get()` would run.
    pub fn statement(&self) -> DocResult<(String, Vec<Value>)> {
        let clause = self.clause()?;
        let order_by = match &self.options.sort {
            Some(sort) => order_by_clause(sort)?,
            None => String::new(),
        };
        let sql = statements::select(
            self.collection.name(),
            &clause,
            &order_by,
            self.options.skip,
            self.options.limit,
        );
        Ok((sql, clause.params))
    }

    /// Runs the query and returns matching documents in the order storage
    /// produced them.
    pub async fn get(&self) -> DocResult<Vec<Document>> {
        let (sql, params) = self.statement()?;
        self.collection.ensure_exists().await?;
        self.collection.store().query(&sql, &params).await
    }

    /// Runs the query with a limit of at most one.
    ///
    /// An explicit `limit(0)` is kept, so the result is `None`.
    pub async fn first(&self) -> DocResult<Option<Document>> {
        let limit = self.options.limit.map_or(1, |limit| limit.min(1));
        Ok(self.limit(limit).get().await?.into_iter().next())
    }

    /// Number of matching documents; sort and pagination are ignored.
    pub async fn count(&self) -> DocResult<u64> {
        let clause = self.clause()?;
        self.collection.ensure_exists().await?;
        let rows = self
            .collection
            .store()
            .raw_query(&statements::count(self.collection.name(), &clause), &clause.params)
            .await?;
        read_count(&rows)
    }

    /// Merge-patches `partial` into every matching document.
    ///
    /// Top-level keys of `partial` replace stored ones, nested objects are
    /// merged recursively and `null` removes a key. The `id` key is ignored
    /// so stored documents keep their identifiers.
    pub async fn update(&self, partial: Document) -> DocResult<()> {
        let mut partial = partial;
        partial.remove(DOC_ID);
        if partial.is_empty() {
            return Ok(());
        }

        let clause = self.clause()?;
        self.collection.ensure_exists().await?;
        let sql = statements::update(
            self.collection.name(),
            &statements::patch_expression(),
            &clause,
        );
        let mut params = Vec::with_capacity(clause.params.len() + 1);
        params.push(Value::String(serde_json::to_string(&partial)?));
        params.extend(clause.params);
        self.collection.store().run(&sql, &params).await
    }

    /// Sets the value of every matching document to a raw SQL expression.
    ///
    /// ```rust,ignore
    /// users
    ///     .filter(field("name").eq("John"))
    ///     .update_raw(RawFragment::new("json_set(value, '$.age', ").bind(43).push(")"))
    ///     .await?;
    /// ```
    pub async fn update_raw(&self, expression: RawFragment) -> DocResult<()> {
        let clause = self.clause()?;
        let expression = compile_raw(&expression);
        self.collection.ensure_exists().await?;
        let sql = statements::update(self.collection.name(), &expression.predicate, &clause);
        let mut params = expression.params;
        params.extend(clause.params);
        self.collection.store().run(&sql, &params).await
    }

    /// Deletes every matching document. Sort and pagination are ignored.
    pub async fn delete(&self) -> DocResult<()> {
        let clause = self.clause()?;
        self.collection.ensure_exists().await?;
        self.collection
            .store()
            .run(&statements::delete(self.collection.name(), &clause), &clause.params)
            .await
    }

    /// Re-runs the query on every change to the collection.
    ///
    /// Every change event on the collection's table triggers one re-fetch and
    /// one callback invocation, whether or not the changed row matches the
    /// filter. Re-fetches run as tasks on the current tokio runtime; a failed
    /// re-fetch is logged and skips the callback.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` outside of a tokio runtime.
    pub fn on_snapshot<F>(&self, callback: F) -> DocResult<Subscription>
    where
        F: Fn(Vec<Document>) + Send + Sync + 'static,
    {
        let context = SnapshotContext::capture()?;
        let callback = Arc::new(callback);
        let query = self.clone();
        let table = self.collection.name().to_string();

        let listener_context = context.clone();
        let listener = ChangeListener::new(move |event: &ChangeEvent| {
            if event.table() != table {
                return Ok(());
            }
            let query = query.clone();
            let callback = callback.clone();
            let context = listener_context.clone();
            listener_context.spawn(async move {
                match query.get().await {
                    Ok(documents) => {
                        if context.is_active() {
                            callback(documents);
                        }
                    }
                    Err(e) => {
                        log::error!(
                            "Failed to refresh snapshot of {}: {}",
                            query.collection.name(),
                            e
                        );
                    }
                }
            });
            Ok(())
        });

        let subscription = self.collection.store().listen(listener)?;
        Ok(subscription.with_teardown(context.teardown()))
    }

    fn clause(&self) -> DocResult<CompiledClause> {
        compile(self.options.criteria.as_ref())
    }
}

impl Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("collection", &self.collection.name())
            .field("options", &self.options)
            .finish()
    }
}

impl IntoFuture for Query {
    type Output = DocResult<Vec<Document>>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.get().await })
    }
}
