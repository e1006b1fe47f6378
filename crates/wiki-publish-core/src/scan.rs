//! Local tree enumeration: one root document plus a flat directory of children.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::SyncError;

/// Title used when a filename has nothing left after cleaning.
pub const EMPTY_TITLE: &str = "empty title";

/// Where the local documents live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLayout {
    /// Working directory the tree is resolved against.
    pub base_dir: PathBuf,
    /// Root document file name, e.g. `README.md`.
    pub root_file: String,
    /// Subdirectory holding the child documents, e.g. `doc`.
    pub docs_dir: String,
    /// Extension of child documents, without the dot.
    pub extension: String,
}

impl Default for TreeLayout {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            root_file: "README.md".to_string(),
            docs_dir: "doc".to_string(),
            extension: "md".to_string(),
        }
    }
}

impl TreeLayout {
    pub fn in_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Default::default()
        }
    }

    pub fn root_path(&self) -> PathBuf {
        self.base_dir.join(&self.root_file)
    }

    pub fn docs_path(&self) -> PathBuf {
        self.base_dir.join(&self.docs_dir)
    }

    /// Whether the root document exists. Without it there is nothing to publish.
    pub fn has_root(&self) -> bool {
        self.root_path().is_file()
    }

    /// Root document name before suffixing: the root file name without its extension.
    pub fn package_name(&self) -> &str {
        strip_extension(&self.root_file)
    }
}

/// A local document and the title it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDoc {
    pub path: PathBuf,
    pub title: String,
}

/// The scanned local tree for one sync run.
#[derive(Debug, Clone)]
pub struct LocalTree {
    pub root: LocalDoc,
    /// Children keyed by suffixed title. Colliding titles keep the last file scanned.
    pub children: BTreeMap<String, LocalDoc>,
}

/// Enumerate the root document and the children under `layout.docs_dir`.
///
/// Children are not searched recursively. Files are visited in name order, so
/// when two filenames clean to the same title the later one wins.
pub fn scan_tree(layout: &TreeLayout, suffix: &str) -> Result<LocalTree, SyncError> {
    let root = LocalDoc {
        path: layout.root_path(),
        title: format!("{}{}", layout.package_name(), suffix),
    };

    let docs_path = layout.docs_path();
    let mut children = BTreeMap::new();
    if !docs_path.is_dir() {
        debug!("No docs directory at {}", docs_path.display());
        return Ok(LocalTree { root, children });
    }

    let wanted = format!(".{}", layout.extension);
    let walker = WalkDir::new(&docs_path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| SyncError::Scan {
            path: docs_path.clone(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !entry.file_name().to_string_lossy().ends_with(&wanted) {
            continue;
        }

        let title = format!("{}{}", title_from_path(entry.path()), suffix);
        if let Some(previous) = children.insert(
            title.clone(),
            LocalDoc {
                path: entry.path().to_path_buf(),
                title: title.clone(),
            },
        ) {
            debug!(
                "{} replaces {} for title {:?}",
                entry.path().display(),
                previous.path.display(),
                title
            );
        }
    }

    debug!("Scanned {} child documents in {}", children.len(), docs_path.display());
    Ok(LocalTree { root, children })
}

/// Display title for a document path, before suffixing.
///
/// The extension is dropped and every run of characters that are neither
/// letters nor digits becomes a single space.
pub fn title_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let title = strip_extension(&name)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        EMPTY_TITLE.to_string()
    } else {
        title
    }
}

fn strip_extension(name: &str) -> &str {
    name.rsplit_once('.').map(|(base, _)| base).unwrap_or(name)
}
