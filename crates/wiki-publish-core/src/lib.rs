//! Core traits and types for wiki-publish.
//!
//! This crate holds everything that does not depend on a particular document store:
//! - `RemoteDirectory`: find, create and update documents under an ancestor node
//! - `DocumentConverter`: turn a local file into a wire-ready body plus attachments
//! - `derive_suffix`: the per-ancestor identity suffix appended to every title
//! - `scan_tree`: enumeration of the local root document and its children
//! - `SyncEngine`: the reconciliation run that drives the collaborators

mod convert;
mod directory;
mod error;
mod identity;
mod reconcile;
mod scan;

pub use convert::{ConvertedDocument, DocumentConverter};
pub use directory::{unique_attachments, DocumentFilter, RemoteDirectory, RemoteDocument};
pub use error::{ConvertError, DirectoryError, SyncError, SyncStep};
pub use identity::{derive_suffix, SUFFIX_SEPARATOR};
pub use reconcile::{RootAction, SyncEngine, SyncOutcome, SyncReport};
pub use scan::{scan_tree, title_from_path, LocalDoc, LocalTree, TreeLayout, EMPTY_TITLE};
