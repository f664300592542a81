//! Collections, documents and queries.
//!
//! # Documents
//!
//! A [`Document`] is a JSON object. It is stored as JSON text in the `value`
//! column of its collection's table, with its `id` field kept equal to the
//! row's primary key.
//!
//! ```rust,ignore
//! use litedoc::doc;
//!
//! let john = doc!{ "name": "John", "address": { "city": "Pune" } };
//! ```
//!
//! # Collections
//!
//! A [`CollectionRef`] is a named table of documents. It hands out
//! [`DocRef`]s for single documents and [`Query`]s for filtered sets:
//!
//! ```rust,ignore
//! use litedoc::filter::field;
//!
//! let users = db.collection("users")?;
//! users.doc("john").put(doc!{ "name": "John", "age": 42 }).await?;
//!
//! let seniors = users.filter(field("age").gte(60)).get().await?;
//! ```
//!
//! # Snapshots
//!
//! Both documents and queries support live snapshots: the callback is
//! invoked with fresh data after every change to the underlying table.
//!
//! ```rust,ignore
//! let subscription = users.doc("john").on_snapshot(|document| {
//!     println!("john is now {:?}", document);
//! })?;
//! // later
//! subscription.unsubscribe();
//! ```

mod collection_ref;
mod doc_ref;
mod document;
mod put_options;
mod query;
mod snapshot;
mod statements;

pub use collection_ref::CollectionRef;
pub use doc_ref::DocRef;
pub use document::*;
pub use put_options::*;
pub use query::*;
