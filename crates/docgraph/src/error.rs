//! Error types for docgraph operations.
//!
//! All fallible operations return [`Result<T>`] with context-rich error messages.
//! Store diagnostics never cross the [`Database`](crate::store::Database) boundary:
//! they are logged there and replaced with [`GraphError::Database`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docgraph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Message returned to callers whenever the graph store fails.
pub const DATABASE_ERROR_MESSAGE: &str = "Database error occurred. See server logs.";

/// Comprehensive error type for compilation, resolution and store access.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Input to the document compiler is not a nested mapping
    #[error("Malformed document: {message}")]
    MalformedDocument {
        /// Description of the offending fragment
        message: String,
    },

    /// Failure reported by a graph store adapter
    #[error("Store error: {message}")]
    Store {
        /// Detailed error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generic store failure surfaced to callers (details are in the logs)
    #[error("{}", DATABASE_ERROR_MESSAGE)]
    Database,

    /// Statement text the in-memory store cannot interpret
    #[error("Invalid statement at offset {position}: {message}")]
    Statement {
        /// What the interpreter expected
        message: String,
        /// Byte offset into the statement text
        position: usize,
    },

    /// Invalid operation (e.g., resolving a type field without a source)
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong
        message: String,
    },

    /// Reading a dataset or config file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GraphError {
    /// Create a store error from a message and optional source.
    pub fn store<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a statement error at the given byte offset.
    pub fn statement(message: impl Into<String>, position: usize) -> Self {
        Self::Statement {
            message: message.into(),
            position,
        }
    }

    /// Create a malformed document error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }
}
