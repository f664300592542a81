use crate::common::{COUNT_COLUMN, ID_COLUMN, ROW_LOCATOR_COLUMN, UNBOUNDED_LIMIT, VALUE_COLUMN};
use crate::filter::CompiledClause;

// Table names are validated on collection construction and never contain quotes.
fn table(name: &str) -> String {
    format!("\"{}\"", name)
}

pub(crate) fn create_table(name: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} TEXT, {} TEXT NOT NULL PRIMARY KEY)",
        table(name),
        VALUE_COLUMN,
        ID_COLUMN
    )
}

pub(crate) fn drop_table(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", table(name))
}

pub(crate) fn select_by_id(name: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = ?",
        VALUE_COLUMN,
        table(name),
        ID_COLUMN
    )
}

pub(crate) fn row_locator_by_id(name: &str) -> String {
    format!(
        "SELECT {} AS {} FROM {} WHERE {} = ?",
        ROW_LOCATOR_COLUMN,
        ROW_LOCATOR_COLUMN,
        table(name),
        ID_COLUMN
    )
}

pub(crate) fn select_by_row_locator(name: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = ?",
        VALUE_COLUMN,
        table(name),
        ROW_LOCATOR_COLUMN
    )
}

pub(crate) fn upsert(name: &str, merge: bool) -> String {
    let new_value = if merge {
        format!("json_patch({}, excluded.{})", VALUE_COLUMN, VALUE_COLUMN)
    } else {
        format!("excluded.{}", VALUE_COLUMN)
    };
    format!(
        "INSERT INTO {} ({}, {}) VALUES (?, ?) ON CONFLICT ({}) DO UPDATE SET {} = {}",
        table(name),
        ID_COLUMN,
        VALUE_COLUMN,
        ID_COLUMN,
        VALUE_COLUMN,
        new_value
    )
}

pub(crate) fn delete_by_id(name: &str) -> String {
    format!("DELETE FROM {} WHERE {} = ?", table(name), ID_COLUMN)
}

/// `UPDATE` setting the value column to `expression`, filtered by `clause`.
pub(crate) fn update(name: &str, expression: &str, clause: &CompiledClause) -> String {
    format!(
        "UPDATE {} SET {} = {}{}",
        table(name),
        VALUE_COLUMN,
        expression,
        clause.where_clause()
    )
}

/// Merge-patch expression applying one bound JSON object.
pub(crate) fn patch_expression() -> String {
    format!("json_patch({}, ?)", VALUE_COLUMN)
}

pub(crate) fn delete(name: &str, clause: &CompiledClause) -> String {
    format!("DELETE FROM {}{}", table(name), clause.where_clause())
}

pub(crate) fn count(name: &str, clause: &CompiledClause) -> String {
    format!(
        "SELECT COUNT(*) AS {} FROM {}{}",
        COUNT_COLUMN,
        table(name),
        clause.where_clause()
    )
}

/// `SELECT` of document bodies with optional ordering and pagination.
///
/// An offset without a limit still emits `LIMIT -1`, SQLite's unbounded
/// limit, since `OFFSET` is only valid after `LIMIT`.
pub(crate) fn select(
    name: &str,
    clause: &CompiledClause,
    order_by: &str,
    skip: Option<u64>,
    limit: Option<u64>,
) -> String {
    let mut sql = format!("SELECT {} FROM {}{}", VALUE_COLUMN, table(name), clause.where_clause());
    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(order_by);
    }
    match (limit, skip) {
        (Some(limit), Some(skip)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, skip)),
        (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
        (None, Some(skip)) => {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", UNBOUNDED_LIMIT, skip))
        }
        (None, None) => {}
    }
    sql
}
