use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

/// Error kinds for store operations.
///
/// Each kind names one category of failure so callers (controllers, jobs)
/// can translate a [StoreError] into their own response shape without
/// parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::errors::{ErrorKind, StoreError, StoreResult};
///
/// fn example() -> StoreResult<()> {
///     Err(StoreError::new("Unknown operator $foo", ErrorKind::InvalidFilter))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Constraint errors
    /// A uniqueness constraint would be violated
    DuplicateKey,

    // Input errors
    /// A filter uses an unsupported operator or a malformed shape
    InvalidFilter,
    /// An update patch uses an unsupported operator or touches a system field
    InvalidUpdate,
    /// An aggregation pipeline has an unknown stage or a malformed accumulator
    InvalidPipeline,
    /// A document has an invalid field name or an invalid `_id`
    InvalidDocument,

    // Collection errors
    /// The collection was not declared when the store was opened
    CollectionNotFound,
    /// The collection was declared twice
    CollectionAlreadyDeclared,
    /// On-disk data of a collection is unreadable or corrupt
    CollectionLoadError,

    // IO and storage errors
    /// A mutation could not be made durable after bounded retries
    DurabilityError,
    /// Generic IO error
    IOError,
    /// Error encoding or decoding persisted data
    EncodingError,
    /// Another process holds the data directory lock
    StoreLocked,
    /// The store has already been closed
    StoreAlreadyClosed,

    // Configuration errors
    /// A builder or configuration value is out of range
    InvalidConfiguration,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::InvalidFilter => write!(f, "Invalid filter"),
            ErrorKind::InvalidUpdate => write!(f, "Invalid update"),
            ErrorKind::InvalidPipeline => write!(f, "Invalid pipeline"),
            ErrorKind::InvalidDocument => write!(f, "Invalid document"),
            ErrorKind::CollectionNotFound => write!(f, "Collection not found"),
            ErrorKind::CollectionAlreadyDeclared => write!(f, "Collection already declared"),
            ErrorKind::CollectionLoadError => write!(f, "Collection load error"),
            ErrorKind::DurabilityError => write!(f, "Durability error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::StoreLocked => write!(f, "Store locked"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::InvalidConfiguration => write!(f, "Invalid configuration"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type of the store.
///
/// `StoreError` carries a message, an [ErrorKind] and an optional cause. A
/// backtrace is captured unresolved at construction and only symbolized when
/// the error is printed with `{:?}`.
///
/// The `StoreResult<T>` alias is used by every fallible operation.
#[derive(Clone)]
pub struct StoreError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<StoreError>>,
    backtrace: Backtrace,
}

impl StoreError {
    /// Creates a new `StoreError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        StoreError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Backtrace::new_unresolved(),
        }
    }

    /// Creates a new `StoreError` that wraps a cause.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: StoreError) -> Self {
        StoreError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Backtrace::new_unresolved(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&StoreError> {
        self.cause.as_deref()
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let mut backtrace = self.backtrace.clone();
                backtrace.resolve();
                write!(f, "{}\n{:?}", self.message, backtrace)
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::new(
            &format!("JSON encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<std::fmt::Error> for StoreError {
    fn from(err: std::fmt::Error) -> Self {
        StoreError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}
