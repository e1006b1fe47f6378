use std::fmt;
use std::path::PathBuf;

/// Errors raised by a `RemoteDirectory` implementation.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("{method} {url} returned {status}: {message}")]
    Api {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid ancestor id {0:?}")]
    InvalidAncestor(String),

    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a `DocumentConverter`.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// The step of a sync run in which a remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    FindRoot,
    CreateRoot,
    UpdateRoot,
    FindChildren,
    UpdateChild,
    CreateChild,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStep::FindRoot => "find root document",
            SyncStep::CreateRoot => "create root document",
            SyncStep::UpdateRoot => "update root document",
            SyncStep::FindChildren => "find child documents",
            SyncStep::UpdateChild => "update child document",
            SyncStep::CreateChild => "create child document",
        };
        f.write_str(s)
    }
}

/// Errors that abort a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to derive identity suffix: {0}")]
    Identity(String),

    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to convert {path}: {source}")]
    Convert {
        path: PathBuf,
        #[source]
        source: ConvertError,
    },

    #[error("failed to {step} {title:?}: {source}")]
    Remote {
        step: SyncStep,
        title: String,
        #[source]
        source: DirectoryError,
    },
}

impl SyncError {
    pub(crate) fn remote(step: SyncStep, title: &str, source: DirectoryError) -> Self {
        Self::Remote {
            step,
            title: title.to_string(),
            source,
        }
    }
}
