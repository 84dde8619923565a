//! Error types for fieldex
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Not-found outcomes (unknown clause name, unknown searcher id) are never
//! errors; they surface as empty collections or `None`.

use std::io;
use thiserror::Error;

/// Result type alias for fieldex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for fieldex
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading or writing index data
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Two system registrations claimed the same JQL clause name.
    ///
    /// Fatal to a handler rebuild; the previously published snapshot stays live.
    #[error("{}", duplicate_clause_message(.clause, .field.as_deref()))]
    DuplicateSystemClause {
        /// Case-folded clause name
        clause: String,
        /// Display name of the field attempting the second registration
        field: Option<String>,
    },

    /// A query referenced a clause the user cannot use (or that does not exist)
    #[error("Unknown or inaccessible clause: '{0}'")]
    UnknownClause(String),

    /// Resolving a document's sort value failed
    ///
    /// Fatal to the sort: a partially resolved ranking is never returned.
    #[error("Failed to resolve sort value for field '{field}' on document {doc}: {source}")]
    SortValue {
        /// Sort field
        field: String,
        /// Segment-local document id
        doc: u32,
        /// Underlying index failure
        #[source]
        source: io::Error,
    },

    /// Index data failed validation
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Invalid argument or configuration value
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn duplicate_clause_message(clause: &str, field: Option<&str>) -> String {
    match field {
        Some(field) => format!(
            "Two system clauses are trying to register against the same JQL name. New Field = '{}', Jql Name = '{}'.",
            field, clause
        ),
        None => format!(
            "Two system clauses are trying to register against the same JQL name. Clause with Jql Name = '{}'.",
            clause
        ),
    }
}

impl Error {
    /// Create an invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Wrap an index failure that happened while resolving a sort value
    pub fn sort_value(field: impl Into<String>, doc: u32, source: io::Error) -> Self {
        Error::SortValue {
            field: field.into(),
            doc,
            source,
        }
    }

    /// True for configuration errors that abort a handler rebuild
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::DuplicateSystemClause { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display_io() {
        let err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "segment missing"));
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("segment missing"));
    }

    #[test]
    fn test_error_display_duplicate_with_field() {
        let err = Error::DuplicateSystemClause {
            clause: "status".to_string(),
            field: Some("Status".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("New Field = 'Status'"));
        assert!(msg.contains("Jql Name = 'status'"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_error_display_duplicate_without_field() {
        let err = Error::DuplicateSystemClause {
            clause: "filter".to_string(),
            field: None,
        };
        assert!(err.to_string().contains("Clause with Jql Name = 'filter'"));
    }

    #[test]
    fn test_error_sort_value_keeps_source() {
        let err = Error::sort_value(
            "priority",
            7,
            io::Error::new(io::ErrorKind::UnexpectedEof, "truncated"),
        );
        let msg = err.to_string();
        assert!(msg.contains("priority"));
        assert!(msg.contains('7'));
        assert!(err.source().is_some());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_error_from_io() {
        let err: Error = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_unknown_clause() {
        let err = Error::UnknownClause("cf[10001]".to_string());
        assert!(err.to_string().contains("cf[10001]"));
    }
}
