use std::io;

use thiserror::Error;

use tabgroups_model::ModelError;

/// Failures while reading or writing persisted tab group records.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read record {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write record {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },
    /// The record contents could not be encoded or decoded.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl StoreError {
    pub(crate) fn read(key: &str, source: io::Error) -> Self {
        StoreError::Read {
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn write(key: &str, source: io::Error) -> Self {
        StoreError::Write {
            key: key.to_string(),
            source,
        }
    }

    /// Key of the record involved, when the failure was I/O.
    pub fn key(&self) -> Option<&str> {
        match self {
            StoreError::Read { key, .. } | StoreError::Write { key, .. } => Some(key),
            StoreError::Model(_) => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
