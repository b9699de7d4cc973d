//! Error types for the blog ORM.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Variants follow the failure classes of the ORM layer: configuration and lifecycle
//! mistakes, connection failures, statement failures reported by the driver, and
//! invalid caller input.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrmError {
    /// Fatal setup mistakes: bad model declarations, pool lifecycle misuse.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Statement failed: {message}")]
    Statement {
        message: String,
        /// e.g., "23000" for an integrity constraint violation
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Only produced under the strict row-count policy.
    #[error("Unexpected row count for {operation}: expected 1, affected {affected}")]
    RowCount { operation: String, affected: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl OrmError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a statement error with optional SQL state.
    pub fn statement(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Statement {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a row count error.
    pub fn row_count(operation: impl Into<String>, affected: u64) -> Self {
        Self::RowCount {
            operation: operation.into(),
            affected,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Statement { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Convert sqlx errors to OrmError.
impl From<sqlx::Error> for OrmError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => {
                OrmError::configuration(format!("Invalid connection options: {}", msg))
            }
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                let suggestion = if db_err.is_unique_violation() {
                    "A row with the same key already exists"
                } else {
                    "Check the SQL syntax and referenced objects"
                };
                OrmError::statement(db_err.message(), code, suggestion)
            }
            sqlx::Error::RowNotFound => OrmError::statement(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => OrmError::connection(
                "Timed out waiting for a pooled connection",
                "Increase max_size or the acquire timeout",
            ),
            sqlx::Error::PoolClosed => {
                OrmError::configuration("Connection pool is closed; it was shut down")
            }
            sqlx::Error::Io(io_err) => OrmError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => OrmError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => OrmError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => OrmError::statement(
                format!("Column not found: {}", col),
                None,
                "Check the model declaration against the table",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                OrmError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => OrmError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => OrmError::internal("Database worker crashed"),
            _ => OrmError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for ORM operations.
pub type OrmResult<T> = Result<T, OrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrmError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = OrmError::statement(
            "Duplicate entry",
            Some("23000".to_string()),
            "Use a fresh key",
        );
        assert_eq!(err.suggestion(), Some("Use a fresh key"));
        assert_eq!(OrmError::configuration("x").suggestion(), None);
    }

    #[test]
    fn test_error_retryable() {
        assert!(OrmError::connection("err", "sugg").is_retryable());
        assert!(!OrmError::configuration("not initialized").is_retryable());
        assert!(!OrmError::invalid_input("bad limit").is_retryable());
    }

    #[test]
    fn test_row_count_display() {
        let err = OrmError::row_count("update", 0);
        assert_eq!(
            err.to_string(),
            "Unexpected row count for update: expected 1, affected 0"
        );
    }

    #[test]
    fn test_pool_errors_map_to_lifecycle_classes() {
        assert!(matches!(
            OrmError::from(sqlx::Error::PoolTimedOut),
            OrmError::Connection { .. }
        ));
        assert!(matches!(
            OrmError::from(sqlx::Error::PoolClosed),
            OrmError::Configuration { .. }
        ));
        assert!(matches!(
            OrmError::from(sqlx::Error::RowNotFound),
            OrmError::Statement { .. }
        ));
    }
}
