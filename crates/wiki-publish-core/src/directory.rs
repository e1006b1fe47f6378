use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use crate::convert::ConvertedDocument;
use crate::error::DirectoryError;

/// A document as reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub id: String,
    pub title: String,
    pub version: u32,
    pub space_key: String,
}

/// Predicate applied to the documents found under an ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Keep only documents with exactly this title.
    ByTitle(String),
    /// Keep every document except those with this title.
    ExcludingTitle(String),
}

impl DocumentFilter {
    pub fn matches(&self, doc: &RemoteDocument) -> bool {
        match self {
            DocumentFilter::ByTitle(title) => doc.title == *title,
            DocumentFilter::ExcludingTitle(title) => doc.title != *title,
        }
    }
}

/// Backend trait for the hierarchical document store documents are published to.
///
/// `create` and `update` also upload the attachments listed by the converted
/// document; from the caller's point of view that is a single operation.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// List documents directly under `ancestor_id` that satisfy `filter`,
    /// in the order the store returned them.
    async fn find_by_parent(
        &self,
        ancestor_id: &str,
        filter: &DocumentFilter,
    ) -> Result<Vec<RemoteDocument>, DirectoryError>;

    /// Create a new document (version 0) under `ancestor_id`.
    async fn create(
        &self,
        title: &str,
        doc: &ConvertedDocument,
        ancestor_id: &str,
    ) -> Result<RemoteDocument, DirectoryError>;

    /// Replace the body of `existing`, bumping its version by one.
    async fn update(
        &self,
        existing: &RemoteDocument,
        doc: &ConvertedDocument,
        ancestor_id: &str,
    ) -> Result<(), DirectoryError>;
}

/// Attachment paths with duplicate base filenames removed, first occurrence wins.
///
/// The remote store keys attachments of one document by filename, so two
/// sources sharing a name cannot both be uploaded in one call.
pub fn unique_attachments(paths: &[PathBuf]) -> Vec<&PathBuf> {
    let mut seen: HashSet<&OsStr> = HashSet::new();
    let mut unique = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(name) = path.file_name() else {
            warn!("Skipping attachment without a file name: {}", path.display());
            continue;
        };
        if !seen.insert(name) {
            warn!("Skipping duplicate attachment {}", path.display());
            continue;
        }
        unique.push(path);
    }
    unique
}
