use crate::errors::{DocError, DocResult, ErrorKind};
use crate::litedoc::LiteDoc;
use crate::store::{DocumentStore, StoreModule};

/// Builder for opening a LiteDoc database.
///
/// Configuration errors are captured as they happen and returned from
/// [`open`](Self::open), so the chain never has to be interrupted.
///
/// # Examples
///
/// ```rust,ignore
/// use litedoc::litedoc::LiteDoc;
/// use litedoc_rusqlite_adapter::RusqliteModule;
///
/// let db = LiteDoc::builder()
///     .load_module(RusqliteModule::with_config().db_path("/tmp/app.db").build())
///     .open()?;
/// ```
#[derive(Default)]
pub struct LiteDocBuilder {
    error: Option<DocError>,
    store: Option<DocumentStore>,
}

impl LiteDocBuilder {
    pub fn new() -> Self {
        LiteDocBuilder {
            error: None,
            store: None,
        }
    }

    /// Loads the storage module, which opens the backend connection.
    ///
    /// Only one store module can be loaded; a second one is reported as
    /// `InvalidOperation` when opening.
    ///
    /// # Arguments
    ///
    /// * `module` - A type implementing `StoreModule`
    pub fn load_module<T: StoreModule + 'static>(mut self, module: T) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.store.is_some() {
            log::error!("A store module is already loaded");
            self.error = Some(DocError::new(
                "A store module is already loaded",
                ErrorKind::InvalidOperation,
            ));
            return self;
        }
        match module.get_store() {
            Ok(store) => self.store = Some(store),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Opens the database.
    ///
    /// # Errors
    ///
    /// Returns the first error captured while configuring, or
    /// `InvalidOperation` when no store module was loaded.
    pub fn open(self) -> DocResult<LiteDoc> {
        if let Some(error) = self.error {
            return Err(error);
        }
        match self.store {
            Some(store) => {
                log::debug!("Opened document store");
                Ok(LiteDoc::new(store))
            }
            None => {
                log::error!("No store module loaded");
                Err(DocError::new(
                    "No store module loaded, call load_module before open",
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }
}
