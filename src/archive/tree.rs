// src/archive/tree.rs

//! Virtual file tree produced by flattening a rock
//!
//! Keys are full logical paths with forward slashes. Directory keys end with
//! `/` and carry no payload.

use crate::diagnostics::Warning;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::btree_map;
use tracing::warn;

/// Path separator used for every key in the tree
pub const SEPARATOR: char = '/';

/// A single node of the flattened tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEntry {
    Directory,
    File(Vec<u8>),
}

impl TreeEntry {
    /// Raw payload, empty for directories
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Directory => &[],
            Self::File(content) => content,
        }
    }

    /// Payload decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.bytes())
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// Flat, depth-agnostic view of a container and every container nested in it
#[derive(Debug, Clone, Default)]
pub struct VirtualFileTree {
    entries: BTreeMap<String, TreeEntry>,
    warnings: Vec<Warning>,
}

impl VirtualFileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a directory marker; a trailing separator is added if missing
    pub fn insert_dir(&mut self, path: impl Into<String>) {
        let mut path = path.into();
        if !path.ends_with(SEPARATOR) {
            path.push(SEPARATOR);
        }
        self.entries.insert(path, TreeEntry::Directory);
    }

    pub fn insert_file(&mut self, path: impl Into<String>, content: Vec<u8>) {
        self.entries.insert(path.into(), TreeEntry::File(content));
    }

    pub fn push_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Merge a sub-tree into this one by union
    ///
    /// Paths are taken as-is (no namespacing). On collision the incoming
    /// entry wins and a [`Warning::PathCollision`] is recorded. Identical
    /// directory markers are not collisions.
    pub fn merge(&mut self, other: VirtualFileTree) {
        self.warnings.extend(other.warnings);
        for (path, entry) in other.entries {
            match self.entries.insert(path.clone(), entry) {
                Some(TreeEntry::Directory) if path.ends_with(SEPARATOR) => {}
                Some(_) => {
                    warn!("Nested archive overwrote existing path: {}", path);
                    self.warnings.push(Warning::PathCollision { path });
                }
                None => {}
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All directory keys in sorted order
    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_dir())
            .map(|(path, _)| path.as_str())
    }

    /// File keys ending with `suffix`, in sorted order
    pub fn files_with_suffix<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(path, entry)| !entry.is_dir() && path.ends_with(suffix))
            .map(|(path, _)| path.as_str())
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TreeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
