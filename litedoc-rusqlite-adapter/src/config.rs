use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// In-memory database path understood by SQLite.
pub const MEMORY_DB_PATH: &str = ":memory:";

/// SQLite connection configuration.
///
/// A cloneable, thread-safe holder of the connection settings. Uses the PIMPL
/// pattern with `Arc<RusqliteConfigInner>`, so clones share one configuration.
/// Settings are applied when the store opens its connection; changing them
/// afterwards has no effect on an open store.
///
/// Create via `RusqliteConfig::new()` or, more commonly, through
/// `RusqliteModule::with_config()`.
#[derive(Clone)]
pub struct RusqliteConfig {
    inner: Arc<RusqliteConfigInner>,
}

impl RusqliteConfig {
    /// Creates a configuration with default values:
    ///
    /// - Path: `:memory:`
    /// - WAL journal mode: off
    /// - Busy timeout: 5000 ms
    /// - Page cache: SQLite default (`-2000`, about 2 MB)
    /// - Foreign keys: off
    #[inline]
    pub fn new() -> RusqliteConfig {
        RusqliteConfig {
            inner: Arc::new(RusqliteConfigInner::new()),
        }
    }

    /// Database file path, `:memory:` for a private in-memory database.
    #[inline]
    pub fn db_path(&self) -> &str {
        self.inner.db_path()
    }

    /// Sets the database file path. Only the first call takes effect.
    #[inline]
    pub(crate) fn set_db_path(&self, db_path: &str) {
        self.inner.set_db_path(db_path)
    }

    #[inline]
    pub fn is_in_memory(&self) -> bool {
        self.db_path() == MEMORY_DB_PATH
    }

    #[inline]
    pub fn wal_mode(&self) -> bool {
        self.inner.wal_mode.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_wal_mode(&self, wal_mode: bool) {
        self.inner.wal_mode.store(wal_mode, Ordering::Relaxed)
    }

    /// How long a statement waits on a locked database before failing.
    #[inline]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.inner.busy_timeout_ms.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn set_busy_timeout(&self, busy_timeout: Duration) {
        self.inner
            .busy_timeout_ms
            .store(busy_timeout.as_millis() as u64, Ordering::Relaxed)
    }

    /// Value of `PRAGMA cache_size`: pages when positive, KiB when negative.
    #[inline]
    pub fn cache_size(&self) -> i64 {
        self.inner.cache_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_cache_size(&self, cache_size: i64) {
        self.inner.cache_size.store(cache_size, Ordering::Relaxed)
    }

    #[inline]
    pub fn foreign_keys(&self) -> bool {
        self.inner.foreign_keys.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_foreign_keys(&self, foreign_keys: bool) {
        self.inner.foreign_keys.store(foreign_keys, Ordering::Relaxed)
    }

    /// Pragmas run right after the connection opens.
    pub(crate) fn pragmas(&self) -> Vec<String> {
        let mut pragmas = Vec::with_capacity(3);
        // WAL is meaningless for in-memory databases
        if self.wal_mode() && !self.is_in_memory() {
            pragmas.push("PRAGMA journal_mode = WAL".to_string());
            pragmas.push("PRAGMA synchronous = NORMAL".to_string());
        }
        pragmas.push(format!("PRAGMA cache_size = {}", self.cache_size()));
        pragmas.push(format!(
            "PRAGMA foreign_keys = {}",
            if self.foreign_keys() { "ON" } else { "OFF" }
        ));
        pragmas
    }
}

impl Default for RusqliteConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct RusqliteConfigInner {
    db_path: OnceLock<String>,
    wal_mode: AtomicBool,
    busy_timeout_ms: AtomicU64,
    cache_size: AtomicI64,
    foreign_keys: AtomicBool,
}

impl RusqliteConfigInner {
    /// Default busy timeout: 5 seconds
    const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

    /// SQLite's own default page cache, 2000 KiB
    const DEFAULT_CACHE_SIZE: i64 = -2000;

    fn new() -> Self {
        RusqliteConfigInner {
            db_path: OnceLock::new(),
            wal_mode: AtomicBool::new(false),
            busy_timeout_ms: AtomicU64::new(Self::DEFAULT_BUSY_TIMEOUT_MS),
            cache_size: AtomicI64::new(Self::DEFAULT_CACHE_SIZE),
            foreign_keys: AtomicBool::new(false),
        }
    }

    fn db_path(&self) -> &str {
        self.db_path
            .get()
            .map(String::as_str)
            .unwrap_or(MEMORY_DB_PATH)
    }

    fn set_db_path(&self, db_path: &str) {
        if self.db_path.set(db_path.to_string()).is_err() {
            log::warn!(
                "Database path is already set to {}, ignoring {}",
                self.db_path(),
                db_path
            );
        }
    }
}
