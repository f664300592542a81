use crate::common::Subscription;
use crate::errors::{DocError, DocResult, ErrorKind};
use crate::store::{ChangeBus, ChangeEvent, ChangeListener, DocumentStoreProvider, Row};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// A statement seen by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// In-memory store that records statements and replays canned rows.
///
/// Every `raw_query` pops the next queued response, or returns no rows when
/// the queue is empty. Change events are published by hand.
#[derive(Clone)]
pub(crate) struct RecordingStore {
    inner: Arc<RecordingStoreInner>,
}

struct RecordingStoreInner {
    statements: Mutex<Vec<Statement>>,
    responses: Mutex<VecDeque<DocResult<Vec<Row>>>>,
    bus: ChangeBus,
}

impl RecordingStore {
    pub fn new() -> Self {
        RecordingStore {
            inner: Arc::new(RecordingStoreInner {
                statements: Mutex::new(Vec::new()),
                responses: Mutex::new(VecDeque::new()),
                bus: ChangeBus::new(),
            }),
        }
    }

    pub fn respond(&self, rows: Vec<Row>) {
        self.inner.responses.lock().push_back(Ok(rows));
    }

    pub fn fail_next(&self, message: &str) {
        self.inner
            .responses
            .lock()
            .push_back(Err(DocError::new(message, ErrorKind::StorageError)));
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.inner.statements.lock().clone()
    }

    pub fn last_statement(&self) -> Option<Statement> {
        self.inner.statements.lock().last().cloned()
    }

    /// Statements other than table creation.
    pub fn data_statements(&self) -> Vec<Statement> {
        self.statements()
            .into_iter()
            .filter(|s| !s.sql.starts_with("CREATE TABLE"))
            .collect()
    }

    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.inner.bus.publish(&event);
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.inner.statements.lock().push(Statement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }
}

#[async_trait]
impl DocumentStoreProvider for RecordingStore {
    async fn raw_query(&self, sql: &str, params: &[Value]) -> DocResult<Vec<Row>> {
        self.record(sql, params);
        self.inner
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn run(&self, sql: &str, params: &[Value]) -> DocResult<()> {
        self.record(sql, params);
        Ok(())
    }

    fn listen(&self, listener: ChangeListener) -> DocResult<Subscription> {
        self.inner.bus.register(listener)
    }

    fn close(&self) -> DocResult<()> {
        self.inner.bus.close();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.bus.is_closed()
    }
}
