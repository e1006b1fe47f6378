use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ConvertError;

/// A local document rendered into the remote storage format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertedDocument {
    /// Wire-ready body, opaque to the engine.
    pub body: String,
    /// Directory the attachment paths are relative to.
    pub attachment_prefix: PathBuf,
    /// Binary files referenced by the body, in order of appearance. May hold duplicates.
    pub attachment_paths: Vec<PathBuf>,
}

impl ConvertedDocument {
    /// Resolve an attachment path against the prefix.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.attachment_prefix.join(path)
    }
}

/// Converts a local file into a `ConvertedDocument`.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, path: &Path) -> Result<ConvertedDocument, ConvertError>;
}
