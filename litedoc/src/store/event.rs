use crate::common::{EventBus, EventListener};
use std::fmt::Display;

/// Kind of row mutation reported by the storage engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEventType {
    Insert,
    Update,
    Delete,
}

impl Display for ChangeEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeEventType::Insert => write!(f, "insert"),
            ChangeEventType::Update => write!(f, "update"),
            ChangeEventType::Delete => write!(f, "delete"),
        }
    }
}

/// Notification of a single row mutation.
///
/// Published by a store on its change bus once the mutating statement has
/// completed. The `row_locator` is the engine's physical row key, which
/// document snapshots use to correlate events with the document they watch.
///
/// # Examples
///
/// ```ignore
/// let subscription = db.listen(ChangeListener::new(|event: &ChangeEvent| {
///     log::info!("{} on {} row {}", event.event_type(), event.table(), event.row_locator());
///     Ok(())
/// }))?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    event_type: ChangeEventType,
    namespace: String,
    table: String,
    row_locator: i64,
}

impl ChangeEvent {
    pub fn new(event_type: ChangeEventType, namespace: &str, table: &str, row_locator: i64) -> Self {
        ChangeEvent {
            event_type,
            namespace: namespace.to_string(),
            table: table.to_string(),
            row_locator,
        }
    }

    pub fn event_type(&self) -> ChangeEventType {
        self.event_type
    }

    /// Database namespace the table lives in, `main` for the primary database.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn row_locator(&self) -> i64 {
        self.row_locator
    }
}

impl Display for ChangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}.{}#{}",
            self.event_type, self.namespace, self.table, self.row_locator
        )
    }
}

/// Listener for row change events.
pub type ChangeListener = EventListener<ChangeEvent>;

/// Per-connection bus carrying row change events.
pub type ChangeBus = EventBus<ChangeEvent>;
