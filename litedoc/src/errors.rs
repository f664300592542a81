use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for litedoc operations
///
/// Every failure surfaced by the library carries exactly one of these kinds.
/// Callers are expected to branch on the kind, never on the message text.
///
/// # Examples
///
/// ```rust,ignore
/// use litedoc::errors::{DocError, ErrorKind, DocResult};
///
/// fn example() -> DocResult<()> {
///     Err(DocError::new("Collection name must not include quotes", ErrorKind::InvalidName))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Illegal collection name (quote characters, empty name)
    InvalidName,
    /// Malformed criteria: composite keys mixed with siblings, bad field path,
    /// wrong argument shape
    InvalidCriteria,
    /// Comparison operator token outside the supported table
    UnsupportedOperator,
    /// Failure reported by the storage collaborator, message kept verbatim
    StorageError,
    /// Error encoding or decoding a document
    EncodingError,
    /// Error raised by one or more event handlers
    EventError,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidName => write!(f, "Invalid name"),
            ErrorKind::InvalidCriteria => write!(f, "Invalid criteria"),
            ErrorKind::UnsupportedOperator => write!(f, "Unsupported operator"),
            ErrorKind::StorageError => write!(f, "Storage error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom litedoc error type.
///
/// `DocError` encapsulates the error message, its kind and an optional cause.
/// A backtrace is captured at construction for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use litedoc::errors::{DocError, ErrorKind};
///
/// let err = DocError::new("Unsupported operator $regex", ErrorKind::UnsupportedOperator);
///
/// let cause = DocError::new("disk I/O error", ErrorKind::StorageError);
/// let err = DocError::new_with_cause("Failed to create collection", ErrorKind::StorageError, cause);
/// ```
#[derive(Clone)]
pub struct DocError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocError>>,
    backtrace: Arc<Backtrace>,
}

impl DocError {
    /// Creates a new `DocError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `DocError` with a cause error.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    /// * `cause` - The underlying error that caused this error
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocError) -> Self {
        DocError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocError> {
        self.cause.as_deref()
    }
}

impl Display for DocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}\nCaused by: {:?}", self.error_kind, self.message, cause),
            None => write!(f, "{}: {}\n{:?}", self.error_kind, self.message, self.backtrace),
        }
    }
}

impl Error for DocError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for litedoc operations.
///
/// `DocResult<T>` is shorthand for `Result<T, DocError>`.
pub type DocResult<T> = Result<T, DocError>;

impl From<serde_json::Error> for DocError {
    fn from(err: serde_json::Error) -> Self {
        DocError::new(
            &format!("JSON encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<tokio::task::JoinError> for DocError {
    fn from(err: tokio::task::JoinError) -> Self {
        DocError::new(
            &format!("Background task failed: {}", err),
            ErrorKind::InternalError,
        )
    }
}
