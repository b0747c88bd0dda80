// src/diagnostics.rs

//! Non-fatal diagnostics collected during a resolution run
//!
//! Unknown Lua syntax, missing module files and overwritten archive paths do
//! not abort a run. They are returned to the caller alongside the result so it
//! can decide whether partial coverage is acceptable (see `--strict`).

use serde::Serialize;
use std::fmt;

/// A recoverable problem found while flattening or interpreting a rock
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// The interpreter met an expression it does not evaluate
    UnsupportedExpression { expression: String },
    /// A keyed table field whose key is not a non-empty string
    DroppedTableKey,
    /// A nested archive overwrote a path that was already flattened
    PathCollision { path: String },
    /// An entry larger than the configured limit was skipped
    OversizedEntry { path: String, size: u64 },
    /// A declared module's file is not in the archive
    MissingModule { module: String, path: String },
    /// A declared module's source is not a plain path (e.g. a C sources table)
    NonPathModule { module: String },
    /// More than one .rockspec was found
    AmbiguousRockspec { chosen: String, ignored: Vec<String> },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedExpression { expression } => {
                write!(f, "missing interpreter for {} expression", expression)
            }
            Self::DroppedTableKey => write!(f, "table field with a non-string key was dropped"),
            Self::PathCollision { path } => {
                write!(f, "nested archive overwrote existing path {}", path)
            }
            Self::OversizedEntry { path, size } => {
                write!(f, "skipped oversized entry {} ({} bytes)", path, size)
            }
            Self::MissingModule { module, path } => {
                write!(f, "module {} not found at {}", module, path)
            }
            Self::NonPathModule { module } => {
                write!(f, "module {} is not declared as a single source path", module)
            }
            Self::AmbiguousRockspec { chosen, ignored } => {
                write!(f, "using {} and ignoring {}", chosen, ignored.join(", "))
            }
        }
    }
}
