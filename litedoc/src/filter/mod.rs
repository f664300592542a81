//! Filter expressions and their compilation to SQL.
//!
//! # Overview
//!
//! Filters are described by [`Criteria`], a closed algebra of field
//! conditions, boolean composition and raw SQL fragments. The compiler turns
//! criteria into a `WHERE` predicate with positional parameters, evaluated
//! against the JSON document stored in each row.
//!
//! # Examples
//!
//! ```rust,ignore
//! use litedoc::filter::{field, or, Criteria};
//! use serde_json::json;
//!
//! // fluent
//! let adults = field("age").gte(18);
//! let named = or(vec![field("name").eq("John").into(), field("age").gte(40).into()]);
//!
//! // parsed
//! let parsed = Criteria::from_value(&json!({ "age": { "$gte": 18 } }))?;
//! ```
mod compiler;
mod criteria;
mod fluent;
mod raw_fragment;

pub use compiler::*;
pub use criteria::*;
pub use fluent::*;
pub use raw_fragment::*;
