use crate::collection::snapshot::SnapshotContext;
use crate::collection::{
    document_id, from_document, statements, to_document, CollectionRef, Document, PutOptions,
    Query,
};
use crate::common::{Subscription, DOC_ID, ID_COLUMN, ROW_LOCATOR_COLUMN};
use crate::errors::{DocError, DocResult, ErrorKind};
use crate::filter::{compile, compile_raw, Criteria, RawFragment};
use crate::store::{ChangeEvent, ChangeListener};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Handle to a single document of a collection, addressed by id.
///
/// The handle does not hold document data; every operation goes to storage.
/// Clones share the same id, so re-pinning the id through [`put`](Self::put)
/// is visible to every clone.
///
/// # Examples
///
/// ```rust,ignore
/// let john = users.doc("john");
/// john.put(doc!{ "name": "John", "age": 42 }).await?;
/// john.update(doc!{ "age": 43 }).await?;
///
/// let current = john.get().await?;
/// john.delete().await?;
/// ```
#[derive(Clone)]
pub struct DocRef {
    inner: Arc<DocRefInner>,
}

struct DocRefInner {
    collection: CollectionRef,
    id: RwLock<String>,
}

impl DocRef {
    pub(crate) fn new(collection: CollectionRef, id: &str) -> Self {
        DocRef {
            inner: Arc::new(DocRefInner {
                collection,
                id: RwLock::new(id.to_string()),
            }),
        }
    }

    /// The current document id.
    pub fn id(&self) -> String {
        self.inner.id.read().clone()
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.inner.collection
    }

    /// Reads the document, `None` if absent.
    pub async fn get(&self) -> DocResult<Option<Document>> {
        let collection = &self.inner.collection;
        collection.ensure_exists().await?;
        let documents = collection
            .store()
            .query(&statements::select_by_id(collection.name()), &[self.id_param()])
            .await?;
        Ok(documents.into_iter().next())
    }

    /// Reads the document and deserializes it into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self) -> DocResult<Option<T>> {
        match self.get().await? {
            Some(document) => Ok(Some(from_document(document)?)),
            None => Ok(None),
        }
    }

    /// Physical row locator of the document, `None` if absent.
    ///
    /// Stable until the document is deleted; a re-inserted document may get
    /// a different one.
    pub async fn row_locator(&self) -> DocResult<Option<i64>> {
        let collection = &self.inner.collection;
        collection.ensure_exists().await?;
        let rows = collection
            .store()
            .raw_query(
                &statements::row_locator_by_id(collection.name()),
                &[self.id_param()],
            )
            .await?;

        match rows.first().and_then(|row| row.get(ROW_LOCATOR_COLUMN)) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => match value.as_i64() {
                Some(locator) => Ok(Some(locator)),
                None => {
                    log::error!("Unexpected row locator {}", value);
                    Err(DocError::new(
                        &format!("Unexpected row locator {}", value),
                        ErrorKind::StorageError,
                    ))
                }
            },
        }
    }

    /// Inserts the document or replaces the stored body.
    ///
    /// A record carrying a non-empty `id` re-pins this handle (and its clones)
    /// to that id first. The stored body always carries the handle's id.
    pub async fn put(&self, record: Document) -> DocResult<()> {
        self.put_with_options(record, &PutOptions::default()).await
    }

    /// Inserts the document, or replaces or merges the stored body depending
    /// on `options`.
    pub async fn put_with_options(&self, record: Document, options: &PutOptions) -> DocResult<()> {
        let collection = &self.inner.collection;
        collection.ensure_exists().await?;

        if let Some(id) = document_id(&record) {
            *self.inner.id.write() = id;
        }
        let id = self.id();
        let mut body = record;
        body.insert(DOC_ID.to_string(), Value::String(id.clone()));

        let encoded = serde_json::to_string(&body)?;
        collection
            .store()
            .run(
                &statements::upsert(collection.name(), options.is_merge()),
                &[Value::String(id), Value::String(encoded)],
            )
            .await
    }

    /// Serializes `value` and puts it.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError` if `value` does not serialize to a JSON object.
    pub async fn put_value<T: Serialize>(&self, value: &T) -> DocResult<()> {
        self.put(to_document(value)?).await
    }

    /// Merge-patches `partial` into the stored document.
    ///
    /// Top-level keys of `partial` replace stored ones, nested objects are
    /// merged recursively and `null` removes a key. The `id` key is ignored.
    /// Patching an absent document does nothing.
    pub async fn update(&self, partial: Document) -> DocResult<()> {
        self.query_self().update(partial).await
    }

    /// Sets the stored document to a raw SQL expression over `value`.
    pub async fn update_raw(&self, expression: RawFragment) -> DocResult<()> {
        let collection = &self.inner.collection;
        let clause = compile(Some(&by_id_column(&self.id())))?;
        let expression = compile_raw(&expression);
        collection.ensure_exists().await?;

        let sql = statements::update(collection.name(), &expression.predicate, &clause);
        let mut params = expression.params;
        params.extend(clause.params);
        collection.store().run(&sql, &params).await
    }

    /// Deletes the document; deleting an absent document is not an error.
    pub async fn delete(&self) -> DocResult<()> {
        let collection = &self.inner.collection;
        collection.ensure_exists().await?;
        collection
            .store()
            .run(&statements::delete_by_id(collection.name()), &[self.id_param()])
            .await
    }

    /// Re-reads the document on every change to its row.
    ///
    /// The row locator is resolved again for each change event on the
    /// collection's table, so re-inserted documents keep being observed. A
    /// deleted document is matched against the last locator seen and
    /// reported once as `None`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` outside of a tokio runtime.
    pub fn on_snapshot<F>(&self, callback: F) -> DocResult<Subscription>
    where
        F: Fn(Option<Document>) + Send + Sync + 'static,
    {
        let context = SnapshotContext::capture()?;
        let callback = Arc::new(callback);
        let last_locator: Arc<Mutex<Option<i64>>> = Arc::new(Mutex::new(None));

        let doc_ref = self.clone();
        let seen = last_locator.clone();
        context.spawn(async move {
            match doc_ref.row_locator().await {
                Ok(locator) => {
                    let mut seen = seen.lock();
                    if seen.is_none() {
                        *seen = locator;
                    }
                }
                Err(e) => log::warn!("Failed to resolve row of {}: {}", doc_ref.id(), e),
            }
        });

        let doc_ref = self.clone();
        let listener_context = context.clone();
        let listener = ChangeListener::new(move |event: &ChangeEvent| {
            if event.table() != doc_ref.collection().name() {
                return Ok(());
            }
            let doc_ref = doc_ref.clone();
            let callback = callback.clone();
            let last_locator = last_locator.clone();
            let context = listener_context.clone();
            let changed = event.row_locator();
            listener_context.spawn(async move {
                if let Err(e) = doc_ref
                    .refresh_snapshot(changed, &last_locator, &context, callback.as_ref())
                    .await
                {
                    log::error!("Failed to refresh snapshot of {}: {}", doc_ref.id(), e);
                }
            });
            Ok(())
        });

        let subscription = self.collection().store().listen(listener)?;
        Ok(subscription.with_teardown(context.teardown()))
    }

    async fn refresh_snapshot<F>(
        &self,
        changed: i64,
        last_locator: &Mutex<Option<i64>>,
        context: &SnapshotContext,
        callback: &F,
    ) -> DocResult<()>
    where
        F: Fn(Option<Document>) + Send + Sync + ?Sized,
    {
        let current = self.row_locator().await?;
        let known = current.or(*last_locator.lock());
        if known != Some(changed) {
            return Ok(());
        }

        let document = self.get().await?;
        *last_locator.lock() = if document.is_some() { current } else { None };
        if context.is_active() {
            callback(document);
        }
        Ok(())
    }

    fn id_param(&self) -> Value {
        Value::String(self.id())
    }

    fn query_self(&self) -> Query {
        self.inner.collection.filter(by_id_column(&self.id()))
    }
}

// Filters on the primary key column rather than the document body.
fn by_id_column(id: &str) -> Criteria {
    Criteria::Raw(RawFragment::new(&format!("{} = ", ID_COLUMN)).bind(id))
}

impl Debug for DocRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocRef")
            .field("collection", &self.inner.collection.name())
            .field("id", &self.id())
            .finish()
    }
}
