//! Error types for sqlweave

use crate::config::Dialect;
use thiserror::Error;

/// Result type alias for sqlweave operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while building, rendering, binding or executing statements
#[derive(Debug, Error)]
pub enum SqlError {
    /// A plain SQL template declares a different number of `?` than values supplied
    #[error("Bind count mismatch: template has {placeholders} placeholder(s), got {bindings} value(s)")]
    BindCountMismatch { placeholders: usize, bindings: usize },

    /// A subquery used where a single column is required selects a different number of columns
    #[error("Subquery must select exactly {expected} column(s), selects {actual}")]
    SubqueryColumns { expected: usize, actual: usize },

    /// INSERT/UPDATE rendered without any column/value pair
    #[error("Empty statement: {0} has no column/value pairs")]
    EmptyStatement(&'static str),

    /// The dialect has no mapping for a type or feature
    #[error("Unsupported for dialect {dialect}: {feature}")]
    UnsupportedDialect { dialect: Dialect, feature: String },

    /// Invalid SQL identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The bind sink refused a value
    #[error("Bind error at parameter {index}: {message}")]
    Bind { index: usize, message: String },

    /// Query execution error, passed through from the driver unchanged
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl SqlError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a bind error for a specific parameter index
    pub fn bind(index: usize, message: impl Into<String>) -> Self {
        Self::Bind {
            index,
            message: message.into(),
        }
    }

    /// Create an unsupported-dialect error
    pub fn unsupported(dialect: Dialect, feature: impl Into<String>) -> Self {
        Self::UnsupportedDialect {
            dialect,
            feature: feature.into(),
        }
    }

    /// Check if this is an empty statement error
    pub fn is_empty_statement(&self) -> bool {
        matches!(self, Self::EmptyStatement(_))
    }

    /// Check if this is an unsupported-dialect error
    ///
    /// Callers that can fall back to a generic type use this to recover.
    pub fn is_unsupported_dialect(&self) -> bool {
        matches!(self, Self::UnsupportedDialect { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// SQLSTATE code reported by the database, if this is a database error
    pub fn db_code(&self) -> Option<&str> {
        match self {
            Self::Query(err) => err.as_db_error().map(|db| db.code().code()),
            _ => None,
        }
    }
}
