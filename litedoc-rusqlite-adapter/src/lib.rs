//! SQLite storage for LiteDoc.
//!
//! Provides [`RusqliteModule`], a [`StoreModule`](litedoc::store::StoreModule)
//! opening a single rusqlite connection, either to a file or to a private
//! in-memory database. Row changes are observed through SQLite's update hook
//! and published as LiteDoc change events.
//!
//! ```rust,ignore
//! use litedoc::litedoc::LiteDoc;
//! use litedoc_rusqlite_adapter::RusqliteModule;
//!
//! let db = LiteDoc::builder()
//!     .load_module(RusqliteModule::with_config().db_path("/tmp/app.db").build())
//!     .open()?;
//! ```

mod config;
mod convert;
mod error;
mod module;
mod store;

pub use config::*;
pub use error::*;
pub use module::*;
pub use store::RusqliteStore;

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    colog::init();
}
