use crate::config::RusqliteConfig;
use crate::convert::{read_row, to_sql_value};
use crate::error::{RusqliteStoreError, RusqliteStoreResult};
use async_trait::async_trait;
use litedoc::common::Subscription;
use litedoc::errors::DocResult;
use litedoc::store::{ChangeBus, ChangeEvent, ChangeEventType, ChangeListener, DocumentStoreProvider, Row};
use parking_lot::Mutex;
use rusqlite::hooks::Action;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// SQLite implementation of [`DocumentStoreProvider`].
///
/// Owns a single connection guarded by a mutex; statements run one at a time
/// on tokio's blocking pool. Row changes are captured by SQLite's update hook
/// while a statement runs and published on the store's [`ChangeBus`] once
/// the statement has completed and the connection is released, so listeners
/// may query the store again. Publication happens on the blocking thread
/// that ran the statement, so a caller that stops waiting for a committed
/// write does not lose its events.
///
/// Uses the PIMPL pattern; clones share the connection and the bus.
#[derive(Clone)]
pub struct RusqliteStore {
    inner: Arc<RusqliteStoreInner>,
}

impl RusqliteStore {
    /// Opens the connection described by `config` and installs the update hook.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` with SQLite's message when the database cannot
    /// be opened or configured.
    pub fn open(config: RusqliteConfig) -> DocResult<Self> {
        let inner = RusqliteStoreInner::open(config).map_err(|e| {
            log::error!("Failed to open SQLite database: {}", e);
            e
        })?;
        Ok(RusqliteStore {
            inner: Arc::new(inner),
        })
    }

    pub fn config(&self) -> &RusqliteConfig {
        &self.inner.config
    }
}

#[async_trait]
impl DocumentStoreProvider for RusqliteStore {
    async fn raw_query(&self, sql: &str, params: &[Value]) -> DocResult<Vec<Row>> {
        let inner = self.inner.clone();
        let sql = sql.to_string();
        let params: Vec<SqlValue> = params.iter().map(to_sql_value).collect();

        let rows = tokio::task::spawn_blocking(move || {
            let (rows, events) = inner.query_rows(&sql, &params)?;
            inner.publish(events);
            Ok::<_, RusqliteStoreError>(rows)
        })
        .await??;
        Ok(rows)
    }

    async fn run(&self, sql: &str, params: &[Value]) -> DocResult<()> {
        let inner = self.inner.clone();
        let sql = sql.to_string();
        let params: Vec<SqlValue> = params.iter().map(to_sql_value).collect();

        tokio::task::spawn_blocking(move || {
            let (_, events) = inner.execute(&sql, &params)?;
            inner.publish(events);
            Ok::<_, RusqliteStoreError>(())
        })
        .await??;
        Ok(())
    }

    fn listen(&self, listener: ChangeListener) -> DocResult<Subscription> {
        self.inner.bus.register(listener)
    }

    fn close(&self) -> DocResult<()> {
        self.inner.close()?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.connection.lock().is_none()
    }
}

struct RusqliteStoreInner {
    connection: Mutex<Option<Connection>>,
    pending: Arc<Mutex<Vec<ChangeEvent>>>,
    bus: ChangeBus,
    config: RusqliteConfig,
}

impl RusqliteStoreInner {
    fn open(config: RusqliteConfig) -> RusqliteStoreResult<Self> {
        let connection = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(config.db_path())?
        };
        connection.busy_timeout(config.busy_timeout())?;
        connection.execute_batch(&config.pragmas().join(";\n"))?;

        let pending = Arc::new(Mutex::new(Vec::new()));
        let sink = pending.clone();
        connection.update_hook(Some(
            move |action: Action, namespace: &str, table: &str, row_locator: i64| {
                let event_type = match action {
                    Action::SQLITE_INSERT => ChangeEventType::Insert,
                    Action::SQLITE_UPDATE => ChangeEventType::Update,
                    Action::SQLITE_DELETE => ChangeEventType::Delete,
                    _ => {
                        log::warn!("Ignoring unknown change on {}.{}", namespace, table);
                        return;
                    }
                };
                sink.lock()
                    .push(ChangeEvent::new(event_type, namespace, table, row_locator));
            },
        ));

        log::debug!("Opened SQLite database at {}", config.db_path());
        Ok(RusqliteStoreInner {
            connection: Mutex::new(Some(connection)),
            pending,
            bus: ChangeBus::new(),
            config,
        })
    }

    /// Runs `f` on the connection and collects the change events it caused.
    ///
    /// Events of a failed statement are discarded.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> RusqliteStoreResult<(T, Vec<ChangeEvent>)> {
        let guard = self.connection.lock();
        let connection = guard.as_ref().ok_or(RusqliteStoreError::Closed)?;
        let result = f(connection);
        let events = std::mem::take(&mut *self.pending.lock());
        Ok((result?, events))
    }

    fn query_rows(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> RusqliteStoreResult<(Vec<Row>, Vec<ChangeEvent>)> {
        let started = Instant::now();
        let result = self.with_connection(|connection| {
            let mut statement = connection.prepare_cached(sql)?;
            let columns: Vec<String> = statement
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();
            let rows = statement.query_map(params_from_iter(params.iter()), |row| {
                read_row(row, &columns)
            })?;
            rows.collect::<rusqlite::Result<Vec<Row>>>()
        });
        log_statement(sql, params, started, &result);
        result
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> RusqliteStoreResult<(usize, Vec<ChangeEvent>)> {
        let started = Instant::now();
        let result = self.with_connection(|connection| {
            let mut statement = connection.prepare_cached(sql)?;
            statement.execute(params_from_iter(params.iter()))
        });
        log_statement(sql, params, started, &result);
        result
    }

    fn publish(&self, events: Vec<ChangeEvent>) {
        for event in events {
            log::trace!("Publishing change {}", event);
            if let Err(e) = self.bus.publish(&event) {
                log::warn!("Change listeners failed for {}: {}", event, e);
            }
        }
    }

    fn close(&self) -> RusqliteStoreResult<()> {
        let connection = self.connection.lock().take();
        self.bus.close();
        if let Some(connection) = connection {
            connection.close().map_err(|(_, e)| {
                log::error!("Failed to close SQLite database: {}", e);
                RusqliteStoreError::Sqlite(e)
            })?;
            log::debug!("Closed SQLite database at {}", self.config.db_path());
        }
        Ok(())
    }
}

fn log_statement<T>(
    sql: &str,
    params: &[SqlValue],
    started: Instant,
    result: &RusqliteStoreResult<T>,
) {
    match result {
        Ok(_) => log::debug!(
            "{} {:?} took {:?}",
            sql,
            params,
            started.elapsed()
        ),
        Err(e) => log::error!("{} {:?} failed: {}", sql, params, e),
    }
}
