// src/resolver.rs

//! Module resolution for packed rocks
//!
//! Flattens the rock, finds its base directory and `.rockspec`, checks the
//! build type and looks every `build.modules` entry up in the flattened tree.
//! Modules whose files are missing are skipped with a warning.

use crate::archive::{self, FlattenLimits, SEPARATOR, TreeEntry, VirtualFileTree};
use crate::diagnostics::Warning;
use crate::error::{Error, Result};
use crate::rockspec::{ParsedRockspec, Rockspec, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Suffix identifying the rockspec inside a rock
pub const ROCKSPEC_SUFFIX: &str = ".rockspec";

/// The only build type whose modules can be resolved statically
pub const SUPPORTED_BUILD_TYPE: &str = "builtin";

/// Module name to file content
pub type ModuleMap = BTreeMap<String, Vec<u8>>;

/// Settings for a resolution run
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub rockspec_suffix: String,
    pub supported_build_type: String,
    pub limits: FlattenLimits,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            rockspec_suffix: ROCKSPEC_SUFFIX.to_string(),
            supported_build_type: SUPPORTED_BUILD_TYPE.to_string(),
            limits: FlattenLimits::default(),
        }
    }
}

/// Outcome of a successful resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    pub package: Option<String>,
    pub version: Option<String>,
    pub modules: ModuleMap,
    pub warnings: Vec<Warning>,
}

/// Serializable overview of a [`Resolution`] without file contents
#[derive(Debug, Serialize)]
pub struct ResolutionSummary<'a> {
    pub package: Option<&'a str>,
    pub version: Option<&'a str>,
    pub modules: Vec<&'a str>,
    pub warnings: &'a [Warning],
}

impl Resolution {
    pub fn summary(&self) -> ResolutionSummary<'_> {
        ResolutionSummary {
            package: self.package.as_deref(),
            version: self.version.as_deref(),
            modules: self.modules.keys().map(String::as_str).collect(),
            warnings: &self.warnings,
        }
    }
}

/// Resolve the modules of a packed rock with the default configuration
pub async fn resolve(data: impl Into<Arc<[u8]>>) -> Result<Resolution> {
    resolve_with(data, &ResolverConfig::default()).await
}

/// Resolve the modules of a packed rock
pub async fn resolve_with(
    data: impl Into<Arc<[u8]>>,
    config: &ResolverConfig,
) -> Result<Resolution> {
    let tree = archive::flatten_with(data, &config.limits).await?;
    info!("Flattened rock into {} entries", tree.len());
    resolve_tree(&tree, config)
}

/// Resolve modules against an already flattened tree
pub fn resolve_tree(tree: &VirtualFileTree, config: &ResolverConfig) -> Result<Resolution> {
    let mut warnings = tree.warnings().to_vec();

    let (base_dir, rockspec_path) = locate_rock(tree, &config.rockspec_suffix, &mut warnings)?;
    debug!("Base directory: {}", base_dir);
    debug!("Rockspec: {}", rockspec_path);

    let text = tree
        .get(rockspec_path)
        .map(|entry| entry.text().into_owned())
        .unwrap_or_default();
    let ParsedRockspec {
        rockspec,
        warnings: rockspec_warnings,
    } = Rockspec::parse(&text)?;
    warnings.extend(rockspec_warnings);

    let build = rockspec.build()?;
    if build.build_type != config.supported_build_type {
        return Err(Error::UnsupportedBuildType {
            found: build.build_type.to_string(),
            expected: config.supported_build_type.clone(),
        });
    }

    let mut modules = ModuleMap::new();
    for (module, source) in build.modules()? {
        let relative = match source {
            Value::Text(relative) => relative,
            Value::List(_) | Value::Record(_) | Value::Absent => {
                debug!("Module {} has no single source path, skipping", module);
                warnings.push(Warning::NonPathModule {
                    module: module.clone(),
                });
                continue;
            }
        };

        let found = join_module_path(base_dir, relative).and_then(|path| match tree.get(&path) {
            Some(TreeEntry::File(content)) => Some(content.clone()),
            Some(TreeEntry::Directory) | None => None,
        });

        match found {
            Some(content) => {
                modules.insert(module.clone(), content);
            }
            None => {
                warn!("Module {} not found at {}{}", module, base_dir, relative);
                warnings.push(Warning::MissingModule {
                    module: module.clone(),
                    path: format!("{}{}", base_dir, relative),
                });
            }
        }
    }

    info!("Resolved {} module(s)", modules.len());

    Ok(Resolution {
        package: rockspec.package().ok().map(str::to_string),
        version: rockspec.version().ok().map(str::to_string),
        modules,
        warnings,
    })
}

/// Find the base directory and the rockspec of a flattened rock
///
/// Nested archives may add top-level directories of their own, so the base
/// directory is derived from the rockspec rather than picked on its own.
fn locate_rock<'a>(
    tree: &'a VirtualFileTree,
    suffix: &'a str,
    warnings: &mut Vec<Warning>,
) -> Result<(&'a str, &'a str)> {
    let top_depth = tree
        .directories()
        .map(depth)
        .min()
        .ok_or_else(|| Error::StructureError("missing base directory".to_string()))?;

    let rockspec = find_rockspec(tree, top_depth, suffix, warnings)
        .ok_or_else(|| Error::StructureError("missing configuration file".to_string()))?;

    let base_dir = find_base_directory(tree, rockspec)
        .ok_or_else(|| Error::StructureError("missing base directory".to_string()))?;

    Ok((base_dir, rockspec))
}

/// The shallowest directory key holding `rockspec`, falling back to the
/// shallowest directory key overall; ties go to the first in sorted order
pub fn find_base_directory<'a>(tree: &'a VirtualFileTree, rockspec: &str) -> Option<&'a str> {
    tree.directories()
        .filter(|dir| rockspec.starts_with(*dir))
        .min_by_key(|dir| depth(dir))
        .or_else(|| tree.directories().min_by_key(|dir| depth(dir)))
}

/// Pick the rockspec, preferring one directly inside a top-level directory
fn find_rockspec<'a>(
    tree: &'a VirtualFileTree,
    top_depth: usize,
    suffix: &'a str,
    warnings: &mut Vec<Warning>,
) -> Option<&'a str> {
    let candidates: Vec<&str> = tree.files_with_suffix(suffix).collect();

    let chosen = candidates
        .iter()
        .copied()
        .find(|path| {
            parent_directory(path)
                .is_some_and(|parent| depth(parent) == top_depth && tree.contains(parent))
        })
        .or_else(|| candidates.first().copied())?;

    if candidates.len() > 1 {
        let ignored: Vec<String> = candidates
            .iter()
            .filter(|path| **path != chosen)
            .map(|path| path.to_string())
            .collect();
        warn!("Multiple rockspecs found, using {}", chosen);
        warnings.push(Warning::AmbiguousRockspec {
            chosen: chosen.to_string(),
            ignored,
        });
    }

    Some(chosen)
}

/// Directory part of a key, including its trailing separator
fn parent_directory(path: &str) -> Option<&str> {
    path.rfind(SEPARATOR).map(|index| &path[..=index])
}

fn depth(path: &str) -> usize {
    path.matches(SEPARATOR).count()
}

/// Join a module's relative path under the base directory
///
/// `.` segments and repeated separators are dropped and `..` removes the
/// previous segment. Returns `None` when the path climbs out of the base
/// directory.
///
/// ```
/// use rockscan::resolver::join_module_path;
///
/// assert_eq!(join_module_path("pkg-1.0/", "src/foo.lua").as_deref(), Some("pkg-1.0/src/foo.lua"));
/// assert_eq!(join_module_path("pkg-1.0/", "./init.lua").as_deref(), Some("pkg-1.0/init.lua"));
/// assert_eq!(join_module_path("pkg-1.0/", "../etc/passwd"), None);
/// ```
pub fn join_module_path(base_dir: &str, relative: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in relative.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    let mut joined = base_dir.to_string();
    if !joined.is_empty() && !joined.ends_with(SEPARATOR) {
        joined.push(SEPARATOR);
    }
    joined.push_str(&segments.join("/"));
    Some(joined)
}
