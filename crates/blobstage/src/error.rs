// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for staged reads

use crate::location::ObjectLocation;
use crate::reader::ReaderState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Object not found: {location}")]
    ObjectNotFound { location: String },

    #[error("Transient network error for {location}: {message}")]
    TransientNetwork { location: String, message: String },

    #[error("Download of {location} was cancelled")]
    Cancelled { location: String },

    #[error("Reader is not open (state: {state})")]
    NotOpen { state: ReaderState },

    #[error("Reader cannot be opened from state {state}")]
    InvalidState { state: ReaderState },

    #[error("Failed to open {location}: {source}")]
    OpenFailed {
        location: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid reader options: {0}")]
    InvalidOptions(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<serde_arrow::Error> for Error {
    fn from(e: serde_arrow::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

impl Error {
    /// Categorize an object store failure. Only a missing object is
    /// distinguished; anything else is reported as transient.
    pub(crate) fn from_object_store(err: object_store::Error, location: &ObjectLocation) -> Self {
        match err {
            object_store::Error::NotFound { .. } => Error::ObjectNotFound {
                location: location.to_string(),
            },
            other => Error::TransientNetwork {
                location: location.to_string(),
                message: other.to_string(),
            },
        }
    }

    pub(crate) fn cancelled(location: &ObjectLocation) -> Self {
        Error::Cancelled {
            location: location.to_string(),
        }
    }

    /// The innermost categorized error, looking through `OpenFailed`.
    #[must_use]
    pub fn cause(&self) -> &Error {
        match self {
            Error::OpenFailed { source, .. } => source.cause(),
            other => other,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.cause(), Error::ObjectNotFound { .. })
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause(), Error::Cancelled { .. })
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.cause(), Error::TransientNetwork { .. })
    }

    #[must_use]
    pub fn is_not_open(&self) -> bool {
        matches!(self.cause(), Error::NotOpen { .. })
    }

    #[must_use]
    pub fn is_open_failed(&self) -> bool {
        matches!(self, Error::OpenFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cause_looks_through_open_failed() {
        let location = ObjectLocation::new("container", "items.parquet");
        let err = Error::OpenFailed {
            location: location.to_string(),
            source: Box::new(Error::cancelled(&location)),
        };

        assert!(err.is_open_failed());
        assert!(err.is_cancelled());
        assert!(!err.is_not_found());
        assert!(matches!(err.cause(), Error::Cancelled { .. }));
        assert!(err.to_string().contains("container/items.parquet"));
    }

    #[test]
    fn test_object_store_not_found_is_categorized() {
        let location = ObjectLocation::new("c", "missing.parquet");
        let source = object_store::Error::NotFound {
            path: "missing.parquet".to_string(),
            source: "gone".into(),
        };
        let err = Error::from_object_store(source, &location);
        assert!(err.is_not_found());

        let other = object_store::Error::Generic {
            store: "test",
            source: "connection reset".into(),
        };
        let err = Error::from_object_store(other, &location);
        assert!(err.is_transient());
        assert!(err.to_string().contains("connection reset"));
    }
}
