// src/lib.rs

//! Rockscan
//!
//! Resolves the Lua modules declared by a packed LuaRocks rock.
//!
//! # Pipeline
//!
//! - `archive`: flatten the ZIP rock, including nested ZIPs, into one
//!   path-keyed virtual file tree
//! - `rockspec`: evaluate the literal assignments of the `.rockspec` into
//!   structured values and read them through a schema
//! - `resolver`: map every `build.modules` entry of a `builtin` rockspec to
//!   its file content
//!
//! Recoverable problems are collected as [`Warning`]s instead of failing the
//! run.

pub mod archive;
pub mod diagnostics;
mod error;
pub mod resolver;
pub mod rockspec;

pub use archive::{FlattenLimits, TreeEntry, VirtualFileTree, flatten, flatten_with};
pub use diagnostics::Warning;
pub use error::{Error, Result};
pub use resolver::{
    ModuleMap, Resolution, ResolutionSummary, ResolverConfig, join_module_path, resolve,
    resolve_tree, resolve_with,
};
pub use rockspec::{Rockspec, SchemaError, Value};
