//! Error types for ctxbridge.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias using ctxbridge's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Remote operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Search,
}

impl Operation {
    /// Capitalized label used as the error message prefix.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Insert => "Insert context",
            Self::Search => "Search context",
        }
    }

    /// Tool / log name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert => "insert_context",
            Self::Search => "search_context",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Search => write!(f, "search"),
        }
    }
}

/// Classification of an [`Error`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Timeout,
    Http,
    Unknown,
    InvalidInput,
}

/// Core error type for ctxbridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Startup configuration is missing or malformed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The remote call did not complete within the configured timeout
    #[error("Request timeout - {operation} operation took too long")]
    Timeout { operation: Operation },

    /// The remote service answered with a non-2xx status
    #[error("{} failed: HTTP {status}: {status_text}", .operation.label())]
    Http {
        operation: Operation,
        status: u16,
        status_text: String,
    },

    /// Transport or decoding failure that is neither a timeout nor an HTTP status
    #[error("{} failed: {message}", .operation.label())]
    Unknown {
        operation: Operation,
        message: String,
    },

    /// Tool arguments failed validation before any request was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Http { .. } => ErrorKind::Http,
            Self::Unknown { .. } => ErrorKind::Unknown,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// Operation the error was raised for, if it came from a remote call.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Timeout { operation }
            | Self::Http { operation, .. }
            | Self::Unknown { operation, .. } => Some(*operation),
            Self::Config(_) | Self::InvalidInput(_) => None,
        }
    }

    pub fn unknown(operation: Operation, message: impl Into<String>) -> Self {
        Self::Unknown {
            operation,
            message: message.into(),
        }
    }
}
