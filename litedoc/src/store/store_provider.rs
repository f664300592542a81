use crate::collection::Document;
use crate::common::{Subscription, VALUE_COLUMN};
use crate::errors::{DocError, DocResult, ErrorKind};
use crate::store::ChangeListener;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::ops::Deref;
use std::sync::Arc;

/// A raw result row: column name to column value.
pub type Row = Map<String, Value>;

/// Capability interface of a storage backend.
///
/// A backend executes parameterized SQL against tables of two columns,
/// `id TEXT PRIMARY KEY` and `value TEXT` holding the JSON-encoded document,
/// and reports every row mutation as a [`ChangeEvent`](crate::store::ChangeEvent)
/// to the listeners registered through [`listen`](Self::listen).
///
/// Parameters are positional and bound in order to the `?` placeholders of
/// the statement. Backends serialize physical execution; callers may issue
/// operations concurrently.
///
/// # Errors
///
/// Every failure of the underlying engine is reported as `StorageError`
/// carrying the driver's message unchanged. The core never retries.
#[async_trait]
pub trait DocumentStoreProvider: Send + Sync {
    /// Executes a read statement and returns its rows as the engine shapes them.
    async fn raw_query(&self, sql: &str, params: &[Value]) -> DocResult<Vec<Row>>;

    /// Executes a read statement and decodes the `value` column of each row.
    async fn query(&self, sql: &str, params: &[Value]) -> DocResult<Vec<Document>> {
        let rows = self.raw_query(sql, params).await?;
        rows.iter().map(decode_document).collect()
    }

    /// Executes a write or DDL statement.
    async fn run(&self, sql: &str, params: &[Value]) -> DocResult<()>;

    /// Registers a listener for row change events.
    fn listen(&self, listener: ChangeListener) -> DocResult<Subscription>;

    /// Releases the connection and stops change notification.
    fn close(&self) -> DocResult<()>;

    fn is_closed(&self) -> bool;
}

/// Decodes the `value` column of a row into a document.
///
/// # Errors
///
/// Returns `EncodingError` when the column is missing or does not hold a JSON
/// object.
pub fn decode_document(row: &Row) -> DocResult<Document> {
    match row.get(VALUE_COLUMN) {
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text)? {
            Value::Object(document) => Ok(document),
            other => {
                log::error!("Stored value is not a JSON object: {}", other);
                Err(DocError::new(
                    "Stored value is not a JSON object",
                    ErrorKind::EncodingError,
                ))
            }
        },
        Some(Value::Object(document)) => Ok(document.clone()),
        Some(other) => {
            log::error!("Unexpected value column {}", other);
            Err(DocError::new(
                "Value column does not hold an encoded document",
                ErrorKind::EncodingError,
            ))
        }
        None => {
            log::error!("Row has no {} column: {:?}", VALUE_COLUMN, row.keys());
            Err(DocError::new(
                &format!("Row has no {} column", VALUE_COLUMN),
                ErrorKind::EncodingError,
            ))
        }
    }
}

/// Shared handle to a storage backend.
///
/// Cloning is cheap; every clone talks to the same connection. Dereferences
/// to the provider so its methods can be called directly.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<dyn DocumentStoreProvider>,
}

impl DocumentStore {
    /// Wraps a provider implementation.
    pub fn new<T: DocumentStoreProvider + 'static>(inner: T) -> Self {
        DocumentStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for DocumentStore {
    type Target = Arc<dyn DocumentStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A pluggable module supplying the storage backend of a database.
///
/// Backend crates expose a module type configured through a builder and hand
/// it to [`LiteDocBuilder::load_module`](crate::litedoc_builder::LiteDocBuilder::load_module).
pub trait StoreModule {
    fn get_store(&self) -> DocResult<DocumentStore>;
}
