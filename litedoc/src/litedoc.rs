use crate::collection::CollectionRef;
use crate::common::Subscription;
use crate::errors::DocResult;
use crate::litedoc_builder::LiteDocBuilder;
use crate::store::{ChangeListener, DocumentStore};
use dashmap::DashSet;
use std::fmt::Debug;
use std::sync::Arc;

/// The database handle.
///
/// `LiteDoc` owns the storage connection and, through it, the change bus of
/// the connection. Collections obtained from it share both, along with the
/// set of tables already known to exist.
///
/// Cloning is cheap; all clones refer to the same database.
///
/// # Examples
///
/// ```rust,ignore
/// use litedoc::doc;
/// use litedoc::litedoc::LiteDoc;
/// use litedoc_rusqlite_adapter::RusqliteModule;
///
/// let db = LiteDoc::builder()
///     .load_module(RusqliteModule::with_config().db_path(":memory:").build())
///     .open()?;
///
/// let users = db.collection("users")?;
/// users.doc("john").put(doc!{ "name": "John" }).await?;
///
/// db.close()?;
/// ```
#[derive(Clone)]
pub struct LiteDoc {
    inner: Arc<LiteDocInner>,
}

struct LiteDocInner {
    store: DocumentStore,
    ensured: Arc<DashSet<String>>,
}

impl LiteDoc {
    /// Creates a builder for opening a database.
    pub fn builder() -> LiteDocBuilder {
        LiteDocBuilder::new()
    }

    pub(crate) fn new(store: DocumentStore) -> Self {
        LiteDoc {
            inner: Arc::new(LiteDocInner {
                store,
                ensured: Arc::new(DashSet::new()),
            }),
        }
    }

    /// Returns a handle to the collection named `name`.
    ///
    /// The underlying table is created on first use.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` if the name is empty or contains a quote.
    pub fn collection(&self, name: &str) -> DocResult<CollectionRef> {
        CollectionRef::new(name, self.inner.store.clone(), self.inner.ensured.clone())
    }

    /// Registers a listener for every row change in the database.
    pub fn listen(&self, listener: ChangeListener) -> DocResult<Subscription> {
        self.inner.store.listen(listener)
    }

    pub fn store(&self) -> DocumentStore {
        self.inner.store.clone()
    }

    /// Closes the storage connection and drops every change listener.
    pub fn close(&self) -> DocResult<()> {
        self.inner.ensured.clear();
        self.inner.store.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.store.is_closed()
    }
}

impl Debug for LiteDoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiteDoc")
            .field("closed", &self.is_closed())
            .finish()
    }
}
