use crate::collection::{statements, DocRef, Document, Query};
use crate::common::{COUNT_COLUMN, FORBIDDEN_NAME_CHARS};
use crate::errors::{DocError, DocResult, ErrorKind};
use crate::filter::{Criteria, RawFragment};
use crate::store::DocumentStore;
use dashmap::DashSet;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Handle to a named collection of documents.
///
/// A collection maps to one table with an `id` primary key and a `value`
/// column holding the JSON document. The table is created lazily: every
/// operation first calls [`ensure_exists`](Self::ensure_exists), which runs
/// `CREATE TABLE IF NOT EXISTS` once per database and remembers the result.
///
/// Cloning is cheap; all clones share the same state.
///
/// # Examples
///
/// ```rust,ignore
/// let users = db.collection("users")?;
///
/// users.doc("john").put(doc!{ "name": "John", "age": 42 }).await?;
/// let adults = users.filter(field("age").gte(18)).sort_by("name", SortOrder::Ascending).get().await?;
/// let total = users.count().await?;
/// ```
#[derive(Clone)]
pub struct CollectionRef {
    inner: Arc<CollectionRefInner>,
}

struct CollectionRefInner {
    name: String,
    store: DocumentStore,
    ensured: Arc<DashSet<String>>,
}

impl CollectionRef {
    /// Creates a collection handle after validating its name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` if the name is empty or contains a quote.
    pub(crate) fn new(
        name: &str,
        store: DocumentStore,
        ensured: Arc<DashSet<String>>,
    ) -> DocResult<Self> {
        validate_name(name)?;
        Ok(CollectionRef {
            inner: Arc::new(CollectionRefInner {
                name: name.to_string(),
                store,
                ensured,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub(crate) fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    /// Creates the underlying table if absent.
    ///
    /// Memoised per database after the first success; later calls return
    /// without touching storage.
    pub async fn ensure_exists(&self) -> DocResult<()> {
        if self.inner.ensured.contains(&self.inner.name) {
            return Ok(());
        }
        self.inner
            .store
            .run(&statements::create_table(&self.inner.name), &[])
            .await?;
        self.inner.ensured.insert(self.inner.name.clone());
        Ok(())
    }

    /// Returns a handle to the document stored under `id`.
    pub fn doc(&self, id: &str) -> DocRef {
        DocRef::new(self.clone(), id)
    }

    /// Returns a handle with a freshly generated UUID v4 identifier.
    pub fn new_doc(&self) -> DocRef {
        DocRef::new(self.clone(), &uuid::Uuid::new_v4().to_string())
    }

    /// Starts an unfiltered query.
    pub fn query(&self) -> Query {
        Query::new(self.clone())
    }

    /// Starts a query filtered by `criteria`.
    pub fn filter(&self, criteria: impl Into<Criteria>) -> Query {
        self.query().filter(criteria)
    }

    /// Starts a query from criteria in JSON form.
    ///
    /// ```rust,ignore
    /// let query = users.filter_value(&json!({ "age": { "$gte": 50 } }))?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `InvalidCriteria` or `UnsupportedOperator` for malformed criteria.
    pub fn filter_value(&self, criteria: &Value) -> DocResult<Query> {
        if criteria.is_null() {
            return Ok(self.query());
        }
        Ok(self.filter(Criteria::from_value(criteria)?))
    }

    /// Starts a query from equality shorthand, `{ "name": "John" }`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCriteria` for malformed shorthand.
    pub fn filter_eq(&self, shorthand: &Value) -> DocResult<Query> {
        Ok(self.filter(Criteria::from_eq_shorthand(shorthand)?))
    }

    /// Starts a query filtered by a raw SQL predicate.
    pub fn filter_raw(&self, fragment: RawFragment) -> Query {
        self.filter(Criteria::Raw(fragment))
    }

    /// Number of documents in the collection.
    pub async fn count(&self) -> DocResult<u64> {
        self.query().count().await
    }

    /// Every document in storage order.
    pub async fn all(&self) -> DocResult<Vec<Document>> {
        self.query().get().await
    }

    /// Looks a document up by its physical row locator.
    pub async fn doc_by_row_locator(&self, row_locator: i64) -> DocResult<Option<Document>> {
        self.ensure_exists().await?;
        let documents = self
            .inner
            .store
            .query(
                &statements::select_by_row_locator(&self.inner.name),
                &[Value::from(row_locator)],
            )
            .await?;
        Ok(documents.into_iter().next())
    }

    /// Drops the underlying table and every document in it.
    ///
    /// The collection handle stays usable; the next operation recreates an
    /// empty table.
    pub async fn drop(&self) -> DocResult<()> {
        self.inner
            .store
            .run(&statements::drop_table(&self.inner.name), &[])
            .await?;
        self.inner.ensured.remove(&self.inner.name);
        Ok(())
    }

    /// Alias of [`drop`](Self::drop).
    pub async fn delete(&self) -> DocResult<()> {
        self.drop().await
    }
}

impl Debug for CollectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionRef")
            .field("name", &self.inner.name)
            .finish()
    }
}

impl PartialEq for CollectionRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name
    }
}

fn validate_name(name: &str) -> DocResult<()> {
    if name.is_empty() {
        log::error!("Collection name cannot be empty");
        return Err(DocError::new(
            "Collection name cannot be empty",
            ErrorKind::InvalidName,
        ));
    }
    if name.contains(FORBIDDEN_NAME_CHARS) {
        log::error!("Collection name {} contains a quote", name);
        return Err(DocError::new(
            &format!("Collection name must not include quotes: {}", name),
            ErrorKind::InvalidName,
        ));
    }
    Ok(())
}

/// Reads the `count` column of an aggregate row.
pub(crate) fn read_count(rows: &[crate::store::Row]) -> DocResult<u64> {
    match rows.first().and_then(|row| row.get(COUNT_COLUMN)) {
        None => Ok(0),
        Some(value) => value.as_u64().ok_or_else(|| {
            log::error!("Unexpected count value {}", value);
            DocError::new(
                &format!("Unexpected count value {}", value),
                ErrorKind::StorageError,
            )
        }),
    }
}
