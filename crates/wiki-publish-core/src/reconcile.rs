//! The reconciliation run: publish the local tree under one ancestor.
//!
//! States: root lookup, then either root create or root update followed by
//! child lookup, then child diff (update matches), then child create. Every
//! remote call is awaited before the next one is issued; the first error ends
//! the run without undoing what was already applied.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::convert::{ConvertedDocument, DocumentConverter};
use crate::directory::{DocumentFilter, RemoteDirectory};
use crate::error::{SyncError, SyncStep};
use crate::identity::derive_suffix;
use crate::scan::{scan_tree, TreeLayout};

/// What happened to the root document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootAction {
    Created,
    Updated,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub root_title: String,
    pub root: RootAction,
    /// Titles of child documents updated in place.
    pub updated: Vec<String>,
    /// Titles of child documents created.
    pub created: Vec<String>,
    /// Titles of remote child candidates with no local counterpart. Left untouched.
    pub orphaned: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The root document does not exist locally; nothing was published.
    Skipped,
    Completed(SyncReport),
}

/// Drives one sync run against a remote directory.
pub struct SyncEngine {
    directory: Arc<dyn RemoteDirectory>,
    converter: Arc<dyn DocumentConverter>,
    layout: TreeLayout,
}

impl SyncEngine {
    pub fn new(
        directory: Arc<dyn RemoteDirectory>,
        converter: Arc<dyn DocumentConverter>,
        layout: TreeLayout,
    ) -> Self {
        Self {
            directory,
            converter,
            layout,
        }
    }

    /// Publish the local tree under `ancestor_id`.
    ///
    /// Surrounding whitespace is trimmed from the identifier.
    #[instrument(skip(self), level = "debug")]
    pub async fn sync(&self, ancestor_id: &str) -> Result<SyncOutcome, SyncError> {
        let ancestor_id = ancestor_id.trim();

        if !self.layout.has_root() {
            info!(
                "No {} in {}, nothing to publish",
                self.layout.root_file,
                self.layout.base_dir.display()
            );
            return Ok(SyncOutcome::Skipped);
        }

        let suffix = derive_suffix(ancestor_id)?;
        let tree = scan_tree(&self.layout, &suffix)?;
        let mut pending = tree.children;
        let root_title = tree.root.title;

        let found = self
            .directory
            .find_by_parent(ancestor_id, &DocumentFilter::ByTitle(root_title.clone()))
            .await
            .map_err(|e| SyncError::remote(SyncStep::FindRoot, &root_title, e))?;
        if found.len() > 1 {
            warn!(
                "{} documents titled {:?} under {}, using the first",
                found.len(),
                root_title,
                ancestor_id
            );
        }

        let root_doc = self.convert(&tree.root.path).await?;

        let (root, existing_children) = match found.into_iter().next() {
            None => {
                self.directory
                    .create(&root_title, &root_doc, ancestor_id)
                    .await
                    .map_err(|e| SyncError::remote(SyncStep::CreateRoot, &root_title, e))?;
                info!("Created root document {:?}", root_title);
                (RootAction::Created, Vec::new())
            }
            Some(existing) => {
                self.directory
                    .update(&existing, &root_doc, ancestor_id)
                    .await
                    .map_err(|e| SyncError::remote(SyncStep::UpdateRoot, &existing.title, e))?;
                info!(
                    "Updated root document {:?} to version {}",
                    existing.title,
                    existing.version + 1
                );

                let children = self
                    .directory
                    .find_by_parent(
                        ancestor_id,
                        &DocumentFilter::ExcludingTitle(root_title.clone()),
                    )
                    .await
                    .map_err(|e| SyncError::remote(SyncStep::FindChildren, &root_title, e))?;
                (RootAction::Updated, children)
            }
        };

        let mut updated = Vec::new();
        let mut orphaned = Vec::new();
        for remote in &existing_children {
            let Some(local) = pending.remove(&remote.title) else {
                debug!("Remote document {:?} has no local counterpart", remote.title);
                orphaned.push(remote.title.clone());
                continue;
            };
            let doc = self.convert(&local.path).await?;
            self.directory
                .update(remote, &doc, ancestor_id)
                .await
                .map_err(|e| SyncError::remote(SyncStep::UpdateChild, &remote.title, e))?;
            info!(
                "Updated {:?} from {} to version {}",
                remote.title,
                local.path.display(),
                remote.version + 1
            );
            updated.push(remote.title.clone());
        }

        let mut created = Vec::new();
        for (title, local) in pending {
            let doc = self.convert(&local.path).await?;
            self.directory
                .create(&title, &doc, ancestor_id)
                .await
                .map_err(|e| SyncError::remote(SyncStep::CreateChild, &title, e))?;
            info!("Created {:?} from {}", title, local.path.display());
            created.push(title);
        }

        Ok(SyncOutcome::Completed(SyncReport {
            root_title,
            root,
            updated,
            created,
            orphaned,
        }))
    }

    async fn convert(&self, path: &Path) -> Result<ConvertedDocument, SyncError> {
        self.converter
            .convert(path)
            .await
            .map_err(|source| SyncError::Convert {
                path: path.to_path_buf(),
                source,
            })
    }
}
