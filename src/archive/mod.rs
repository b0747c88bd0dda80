// src/archive/mod.rs

//! Rock archive flattening
//!
//! A packed rock is a ZIP container that may hold further ZIP containers.
//! [`flatten`] materializes all of them into one [`VirtualFileTree`]:
//! nested archives are merged by union, so `lib.zip` containing `lib/x.lua`
//! contributes the key `lib/x.lua`, never `lib.zip/lib/x.lua`.
//!
//! # Concurrency
//!
//! Every entry of a container is read on the blocking pool and handled as
//! its own task in a [`JoinSet`]. Each task returns an owned sub-tree; the
//! sub-trees are merged one at a time at the join point, so no shared tree
//! is written concurrently. The first failing entry aborts its siblings.

mod tree;

pub use tree::{SEPARATOR, TreeEntry, VirtualFileTree};

use crate::diagnostics::Warning;
use crate::error::{Error, Result};
use futures::future::{BoxFuture, FutureExt};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use zip::ZipArchive;

/// Suffix that marks an entry as a nested container
pub const NESTED_ARCHIVE_SUFFIX: &str = ".zip";

/// Default nesting limit below the outer container
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Maximum size for a single entry during flattening (512 MB)
pub const MAX_ENTRY_SIZE: u64 = 512 * 1024 * 1024;

/// Knobs for [`flatten_with`]
#[derive(Debug, Clone)]
pub struct FlattenLimits {
    /// Entries whose name ends with this suffix are flattened recursively
    pub archive_suffix: String,
    /// How many levels of nested containers are followed
    pub max_depth: usize,
    /// Entries larger than this are skipped with a warning
    pub max_entry_size: u64,
}

impl Default for FlattenLimits {
    fn default() -> Self {
        Self {
            archive_suffix: NESTED_ARCHIVE_SUFFIX.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_entry_size: MAX_ENTRY_SIZE,
        }
    }
}

type Container = ZipArchive<Cursor<Arc<[u8]>>>;

/// What one container entry turned out to be
enum EntryPayload {
    Directory(String),
    File { name: String, content: Vec<u8> },
    Oversized { name: String, size: u64 },
}

/// Flatten a rock with the default limits
pub async fn flatten(data: impl Into<Arc<[u8]>>) -> Result<VirtualFileTree> {
    flatten_with(data, &FlattenLimits::default()).await
}

/// Flatten a rock and every container nested inside it
pub async fn flatten_with(
    data: impl Into<Arc<[u8]>>,
    limits: &FlattenLimits,
) -> Result<VirtualFileTree> {
    flatten_level(data.into(), Arc::new(limits.clone()), 0).await
}

fn flatten_level(
    data: Arc<[u8]>,
    limits: Arc<FlattenLimits>,
    depth: usize,
) -> BoxFuture<'static, Result<VirtualFileTree>> {
    async move {
        if depth > limits.max_depth {
            return Err(Error::ArchiveError(format!(
                "Nested archives exceed the maximum depth of {}",
                limits.max_depth
            )));
        }

        let container = open_container(data)?;
        debug!("Flattening container with {} entries (depth {})", container.len(), depth);

        let mut tasks = JoinSet::new();
        for index in 0..container.len() {
            tasks.spawn(flatten_entry(container.clone(), index, Arc::clone(&limits), depth));
        }

        let mut tree = VirtualFileTree::new();
        while let Some(joined) = tasks.join_next().await {
            // Returning early drops the JoinSet, which aborts the siblings
            tree.merge(joined??);
        }

        Ok(tree)
    }
    .boxed()
}

async fn flatten_entry(
    container: Container,
    index: usize,
    limits: Arc<FlattenLimits>,
    depth: usize,
) -> Result<VirtualFileTree> {
    let max_entry_size = limits.max_entry_size;
    let payload =
        tokio::task::spawn_blocking(move || read_entry(container, index, max_entry_size)).await??;

    let mut tree = VirtualFileTree::new();
    match payload {
        EntryPayload::Directory(name) => tree.insert_dir(name),
        EntryPayload::File { name, content } if name.ends_with(limits.archive_suffix.as_str()) => {
            debug!("Flattening nested archive: {}", name);
            return flatten_level(content.into(), limits, depth + 1)
                .await
                .map_err(|e| match e {
                    Error::ArchiveError(msg) => Error::ArchiveError(format!("{}: {}", name, msg)),
                    other => other,
                });
        }
        EntryPayload::File { name, content } => tree.insert_file(name, content),
        EntryPayload::Oversized { name, size } => {
            warn!("Skipping oversized entry: {} ({} bytes)", name, size);
            tree.push_warning(Warning::OversizedEntry { path: name, size });
        }
    }

    Ok(tree)
}

fn open_container(data: Arc<[u8]>) -> Result<Container> {
    ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::ArchiveError(format!("Failed to open container: {}", e)))
}

/// Read one entry's full payload; runs on the blocking pool
fn read_entry(mut container: Container, index: usize, max_entry_size: u64) -> Result<EntryPayload> {
    let mut entry = container
        .by_index(index)
        .map_err(|e| Error::ArchiveError(format!("Failed to read entry {}: {}", index, e)))?;

    let name = normalize_entry_name(entry.name());
    if entry.is_dir() {
        return Ok(EntryPayload::Directory(name));
    }

    let declared = entry.size();
    if declared > max_entry_size {
        return Ok(EntryPayload::Oversized { name, size: declared });
    }

    // The declared size may lie, so cap what is actually inflated
    let mut content = Vec::with_capacity(declared as usize);
    (&mut entry)
        .take(max_entry_size + 1)
        .read_to_end(&mut content)
        .map_err(|e| Error::ArchiveError(format!("Failed to decompress {}: {}", name, e)))?;

    if content.len() as u64 > max_entry_size {
        return Ok(EntryPayload::Oversized {
            name,
            size: content.len() as u64,
        });
    }

    Ok(EntryPayload::File { name, content })
}

/// Entry names always use forward slashes
fn normalize_entry_name(name: &str) -> String {
    name.replace('\\', "/")
}
