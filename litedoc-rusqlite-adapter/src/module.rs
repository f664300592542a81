use crate::config::RusqliteConfig;
use crate::store::RusqliteStore;
use litedoc::errors::DocResult;
use litedoc::store::{DocumentStore, StoreModule};
use std::time::Duration;

/// LiteDoc storage module backed by SQLite through rusqlite.
///
/// # Examples
///
/// ```rust,ignore
/// use litedoc::litedoc::LiteDoc;
/// use litedoc_rusqlite_adapter::RusqliteModule;
///
/// // file database tuned for production
/// let db = LiteDoc::builder()
///     .load_module(
///         RusqliteModule::with_config()
///             .production_preset()
///             .db_path("/path/to/app.db")
///             .build(),
///     )
///     .open()?;
/// ```
///
/// # Configuration Presets
///
/// - `production_preset()` - WAL journal, 64 MB page cache, foreign keys on
/// - `test_preset()` - in-memory database with a short busy timeout
pub struct RusqliteModule {
    store_config: RusqliteConfig,
}

impl RusqliteModule {
    /// Creates a new builder for configuring the module.
    #[inline]
    pub fn with_config() -> RusqliteModuleBuilder {
        RusqliteModuleBuilder::new()
    }
}

impl StoreModule for RusqliteModule {
    /// Opens the SQLite connection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the database cannot be opened.
    fn get_store(&self) -> DocResult<DocumentStore> {
        let store = RusqliteStore::open(self.store_config.clone())?;
        Ok(DocumentStore::new(store))
    }
}

/// Builder for configuring a [`RusqliteModule`].
pub struct RusqliteModuleBuilder {
    store_config: RusqliteConfig,
}

impl RusqliteModuleBuilder {
    #[inline]
    pub fn new() -> RusqliteModuleBuilder {
        RusqliteModuleBuilder {
            store_config: RusqliteConfig::new(),
        }
    }

    /// Applies the production preset.
    ///
    /// This configures:
    /// - WAL journal mode with `synchronous = NORMAL`
    /// - 64 MB page cache
    /// - 10 second busy timeout
    /// - Foreign key enforcement
    #[inline]
    pub fn production_preset(self) -> Self {
        self.wal_mode(true)
            .cache_size(-64 * 1024)
            .busy_timeout(Duration::from_secs(10))
            .foreign_keys(true)
    }

    /// Applies the preset used by tests: a private in-memory database that
    /// fails fast on lock contention.
    #[inline]
    pub fn test_preset(self) -> Self {
        self.in_memory()
            .busy_timeout(Duration::from_millis(500))
    }

    #[inline]
    pub fn db_path(self, db_path: &str) -> Self {
        self.store_config.set_db_path(db_path);
        self
    }

    /// Uses a private in-memory database.
    #[inline]
    pub fn in_memory(self) -> Self {
        self.db_path(crate::config::MEMORY_DB_PATH)
    }

    #[inline]
    pub fn wal_mode(self, wal_mode: bool) -> Self {
        self.store_config.set_wal_mode(wal_mode);
        self
    }

    #[inline]
    pub fn busy_timeout(self, busy_timeout: Duration) -> Self {
        self.store_config.set_busy_timeout(busy_timeout);
        self
    }

    #[inline]
    pub fn cache_size(self, cache_size: i64) -> Self {
        self.store_config.set_cache_size(cache_size);
        self
    }

    #[inline]
    pub fn foreign_keys(self, foreign_keys: bool) -> Self {
        self.store_config.set_foreign_keys(foreign_keys);
        self
    }

    #[inline]
    pub fn build(self) -> RusqliteModule {
        RusqliteModule {
            store_config: self.store_config,
        }
    }
}

impl Default for RusqliteModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
