//! # LiteDoc - Document Store over SQLite
//!
//! LiteDoc stores JSON documents in SQLite tables and queries them with a
//! MongoDB-like criteria language compiled to parameterized SQL. Documents
//! and queries can be observed live: snapshot callbacks re-run whenever the
//! underlying rows change.
//!
//! ## Key Features
//!
//! - **Collections**: Named sets of JSON documents addressed by id
//! - **Criteria**: Field comparisons (`eq`, `neq`, `lt`, `lte`, `gt`, `gte`,
//!   `in`) composed with `and`/`or`, or raw SQL fragments
//! - **Pagination and Sorting**: Sort on any nested field, skip and limit
//! - **Partial Updates**: JSON merge-patch of documents, single or in bulk
//! - **Live Snapshots**: Document and query callbacks driven by row change events
//! - **Pluggable Storage**: The core is written against a small storage trait;
//!   `litedoc-rusqlite-adapter` provides SQLite
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use litedoc::doc;
//! use litedoc::filter::field;
//! use litedoc::litedoc::LiteDoc;
//! use litedoc_rusqlite_adapter::RusqliteModule;
//!
//! let db = LiteDoc::builder()
//!     .load_module(RusqliteModule::with_config().db_path(":memory:").build())
//!     .open()?;
//!
//! let users = db.collection("users")?;
//! users.doc("john").put(doc!{ "name": "John", "age": 42 }).await?;
//!
//! let found = users.filter(field("age").gte(40)).get().await?;
//! let total = users.count().await?;
//! ```
//!
//! ## Design Pattern
//!
//! Handles (`LiteDoc`, `CollectionRef`, `DocRef`) use the PIMPL pattern: a thin
//! public struct around an `Arc` of private state. Clones are cheap and share
//! state, and the change bus lives exactly as long as the storage connection
//! that owns it.
//!
//! ## Module Organization
//!
//! - [`collection`] - Collections, document handles, queries and snapshots
//! - [`common`] - Event bus, sort specs and constants
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Criteria model and SQL clause compiler
//! - [`litedoc`] - The database handle
//! - [`litedoc_builder`] - Builder for opening a database
//! - [`store`] - Storage trait, store module and change events

pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod litedoc;
pub mod litedoc_builder;
pub mod store;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    colog::init();
}
