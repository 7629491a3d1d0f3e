//! Error types for storage adapter operations.

use std::fmt;

/// The message carried by every deadline expiry, whatever the statement was.
pub const TIMEOUT_MESSAGE: &str = "command timed out";

/// The primary error type for all adapter operations.
#[derive(Debug)]
pub enum Error {
    /// Connection-related errors (connect, disconnect, authentication)
    Connection(ConnectionError),
    /// Query execution errors reported by the driver
    Query(QueryError),
    /// Type conversion errors
    Type(TypeError),
    /// Protocol errors (wire-level)
    Protocol(ProtocolError),
    /// Storage lifecycle errors (already up/down, probe and drop failures)
    Storage(StorageError),
    /// Configuration errors
    Config(ConfigError),
    /// I/O errors
    Io(std::io::Error),
    /// The isolated task did not finish before its deadline
    Timeout,
    /// Operation was cancelled
    Cancelled,
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
    /// Authentication failed
    Authentication,
    /// Connection lost during operation
    Disconnected,
    /// Connection refused
    Refused,
    /// The driver's runtime dependencies could not be started
    Startup,
}

#[derive(Debug)]
pub struct QueryError {
    pub sql: Option<String>,
    /// Engine error code, e.g. `ORA-00942`
    pub code: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct ProtocolError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// A storage lifecycle failure.
///
/// Probe and execution failures keep the underlying error as `source` and
/// reuse its message, so the framework can report it verbatim.
#[derive(Debug)]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
    /// Statement that failed, when one was being run
    pub sql: Option<String>,
    pub source: Option<Box<Error>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// Storage already holds tables or objects
    AlreadyUp,
    /// Storage holds no tables and no objects
    AlreadyDown,
    /// A status or drop-generating probe failed
    Probe,
    /// A generated drop statement failed
    Execution,
    /// A statement succeeded with a result shape other than the one expected
    UnexpectedShape,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Precondition failure for `create`.
    pub fn already_up() -> Self {
        Self {
            kind: StorageErrorKind::AlreadyUp,
            message: "storage is already up".to_string(),
            sql: None,
            source: None,
        }
    }

    /// Precondition failure for `destroy`.
    pub fn already_down() -> Self {
        Self {
            kind: StorageErrorKind::AlreadyDown,
            message: "storage is already down".to_string(),
            sql: None,
            source: None,
        }
    }

    /// Wrap an underlying error, keeping its message.
    pub fn wrap(kind: StorageErrorKind, sql: impl Into<String>, source: Error) -> Self {
        Self {
            kind,
            message: source.to_string(),
            sql: Some(sql.into()),
            source: Some(Box::new(source)),
        }
    }

    /// A statement returned something other than the expected result shape.
    pub fn unexpected_shape(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: StorageErrorKind::UnexpectedShape,
            message: message.into(),
            sql: Some(sql.into()),
            source: None,
        }
    }
}

impl Error {
    /// Did the deadline of an isolated task expire?
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    /// Storage error kind, if this is a lifecycle error.
    pub fn storage_kind(&self) -> Option<StorageErrorKind> {
        match self {
            Error::Storage(s) => Some(s.kind),
            _ => None,
        }
    }

    /// Engine error code if available (e.g., "ORA-00942")
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.code.as_deref(),
            Error::Storage(s) => s.source.as_deref().and_then(Error::code),
            _ => None,
        }
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            Error::Storage(s) => s.sql.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => {
                if let Some(code) = &e.code {
                    write!(f, "{}: {}", code, e.message)
                } else {
                    write!(f, "{}", e.message)
                }
            }
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e.message),
            Error::Storage(e) => write!(f, "{}", e.message),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Timeout => write!(f, "{}", TIMEOUT_MESSAGE),
            Error::Cancelled => write!(f, "Operation cancelled"),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Protocol(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Storage(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "{} ({})", self.message, code)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Error::Protocol(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Storage(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;
