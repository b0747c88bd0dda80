// src/error.rs

//! Error types for rockscan
//!
//! Every variant here is fatal for a resolution run. Recoverable problems are
//! reported through [`crate::diagnostics::Warning`] instead.

use crate::rockspec::SchemaError;
use thiserror::Error;

/// Fatal errors raised while resolving a rock
#[derive(Error, Debug)]
pub enum Error {
    /// The container (or a nested container) could not be opened or read
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// The .rockspec text is not valid Lua
    #[error("Rockspec syntax error: {0}")]
    ConfigSyntaxError(String),

    /// The rock is missing its base directory or its .rockspec
    #[error("Invalid rock structure: {0}")]
    StructureError(String),

    /// The rockspec declares a build type other than the supported one
    #[error("Build type '{found}' is not supported (expected '{expected}')")]
    UnsupportedBuildType { found: String, expected: String },

    /// A required rockspec field is absent or has the wrong shape
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A flatten task panicked or was cancelled
    #[error("Task failed: {0}")]
    TaskError(String),
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::TaskError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
