//! Error types.
//!
//! Decode failures are always recovered by the registry (the record is
//! skipped and logged); only store and registry-edit errors reach callers.

use crate::area::Corner;
use thiserror::Error;

/// A persisted record could not be turned into a value.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed {what}: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidNumber { field: &'static str, value: f64 },

    #[error("{0} is not a finite 3-component vector")]
    InvalidCorner(&'static str),
}

impl DecodeError {
    pub(crate) fn malformed(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| DecodeError::Malformed { what, source }
    }
}

/// Reading or writing an override file failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("legacy config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// An edit against the registry was rejected.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("world '{0}' is not loaded and could not be loaded")]
    WorldUnavailable(String),

    #[error("an area named '{0}' already exists")]
    DuplicateArea(String),

    #[error("the {0} corner has not been marked")]
    IncompleteArea(Corner),

    #[error("no area named '{0}'")]
    UnknownArea(String),
}
