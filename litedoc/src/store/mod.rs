//! Storage backends and abstractions.
//!
//! The core talks to storage only through [`DocumentStoreProvider`]: three
//! statement primitives (`raw_query`, `query`, `run`) and a change listener
//! registration. Backends live in their own crates and are plugged in with a
//! [`StoreModule`]; `litedoc-rusqlite-adapter` is the SQLite backend.
//!
//! # Events
//!
//! Each backend owns one [`ChangeBus`] for the lifetime of its connection and
//! publishes a [`ChangeEvent`] per mutated row. Collection and document
//! snapshots are built on top of these events.

mod event;
#[cfg(test)]
pub(crate) mod mock;
mod store_provider;

pub use event::*;
pub use store_provider::*;
