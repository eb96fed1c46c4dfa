//! Error types for the TPC-H graph harness

use thiserror::Error;

use crate::dataset::Table;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors that can occur while reading, loading or querying
#[derive(Debug, Error)]
pub enum BenchError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A `.tbl` file could not be found in the data directory
    #[error("table file not found: {0}")]
    MissingTable(String),

    /// A row could not be parsed
    #[error("{table} line {line}, column {column}: {message}")]
    Parse {
        /// Table being read
        table: Table,
        /// 1-based line number
        line: usize,
        /// 1-based column number
        column: usize,
        /// What went wrong
        message: String,
    },

    /// HTTP transport error (ArangoDB, NebulaGraph gateway)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid endpoint URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Bolt transport error (Neo4j, Memgraph)
    #[error("Bolt error: {0}")]
    Bolt(#[from] neo4rs::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The database rejected a request
    #[error("{backend} error: {message}")]
    Backend {
        /// Database that reported the error
        backend: &'static str,
        /// Error message as reported by the database
        message: String,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BenchError {
    pub(crate) fn backend(backend: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            message: message.into(),
        }
    }
}
