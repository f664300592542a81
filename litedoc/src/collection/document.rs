use crate::common::DOC_ID;
use crate::errors::{DocError, DocResult, ErrorKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A JSON document: an object mapping field names to JSON values.
///
/// Every stored document carries its identifier in the `id` field, kept equal
/// to the primary key of its row.
pub type Document = Map<String, Value>;

/// Creates a [`Document`] from JSON object syntax.
///
/// Keys are string literals, values are anything `serde_json::json!` accepts.
///
/// # Examples
///
/// ```rust,ignore
/// use litedoc::doc;
///
/// let empty = doc!{};
/// let john = doc!{
///     "name": "John",
///     "age": 42,
///     "address": { "city": "Pune", "zip": 411001 },
///     "tags": ["a", "b"],
/// };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ({ $($body:tt)* }) => {
        $crate::doc!($($body)*)
    };

    ($($body:tt)+) => {
        match $crate::__private::serde_json::json!({ $($body)+ }) {
            $crate::__private::serde_json::Value::Object(document) => document,
            _ => $crate::collection::Document::new(),
        }
    };
}

/// Reads the identifier a document carries, if any.
///
/// Strings are used as-is; other non-null values use their JSON text. Empty
/// strings and `null` count as absent.
pub fn document_id(document: &Document) -> Option<String> {
    match document.get(DOC_ID) {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) if id.is_empty() => None,
        Some(Value::String(id)) => Some(id.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Converts a serializable value into a document.
///
/// # Errors
///
/// Returns `EncodingError` when the value does not serialize to a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> DocResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => {
            log::error!("Value does not serialize to a JSON object: {}", other);
            Err(DocError::new(
                "Only values serializing to a JSON object can be stored as documents",
                ErrorKind::EncodingError,
            ))
        }
    }
}

/// Converts a document into a deserializable value.
pub fn from_document<T: DeserializeOwned>(document: Document) -> DocResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
