//! Errors reported inside an [`OperationResult`](crate::result::OperationResult).

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::io;
use thiserror::Error;

/// Every failure a store operation can report.
///
/// None of these escape as a panic or an `Err` from the public operations;
/// they are collected into the operation's result.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no content stored for key {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("store is in read-only mode")]
    ReadOnly,
}

/// Stable, wire-friendly classification of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Io,
    Cancelled,
    ReadOnly,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Io => "io",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::ReadOnly => "read_only",
        }
    }
}

impl StoreError {
    pub fn not_found(key: impl ToString) -> Self {
        StoreError::NotFound(key.to_string())
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            StoreError::Io { .. } => ErrorKind::Io,
            StoreError::Cancelled => ErrorKind::Cancelled,
            StoreError::ReadOnly => ErrorKind::ReadOnly,
        }
    }

    /// The underlying `std::io::ErrorKind`, for I/O failures.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            StoreError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

impl Serialize for StoreError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StoreError", 2)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(StoreError::not_found("name:a").kind().as_str(), "not_found");
        assert_eq!(StoreError::Cancelled.kind().as_str(), "cancelled");
        assert_eq!(StoreError::ReadOnly.kind(), ErrorKind::ReadOnly);
    }

    #[test]
    fn test_io_message_includes_context() {
        let err = StoreError::io(
            "failed to open object",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "failed to open object: denied");
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
    }

    #[test]
    fn test_serializes_kind_and_message() {
        let json = serde_json::to_value(StoreError::not_found("id:abc")).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["message"], "no content stored for key id:abc");
    }
}
