//! Repository error taxonomy
//!
//! Low-level failures (I/O, record decoding, malformed edit commands) are
//! wrapped into one of these variants at the boundary of the area that hit
//! them, so callers never see a raw `std::io::Error` without knowing which
//! path or object it concerns.

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("not a git-light repository (or any parent up to {0})")]
    NotInitialized(PathBuf),

    #[error("repository already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("corrupt delta {oid}: {reason}")]
    CorruptDelta { oid: String, reason: String },

    #[error("corrupt commit {oid}: {reason}")]
    CorruptCommit { oid: String, reason: String },

    #[error("nothing found in staging area, add your changes first")]
    EmptyStage,

    #[error("no changes since commit {0}")]
    NothingChanged(ObjectId),

    #[error("commit {0} already exists in the object store")]
    DuplicateCommit(ObjectId),

    #[error("cannot delete branch '{0}' while it is checked out")]
    ProtectedBranch(BranchName),

    #[error("a branch named '{0}' already exists")]
    BranchExists(BranchName),

    #[error("'{0}' is not a valid branch name")]
    InvalidBranchName(String),

    #[error("invalid revision '{0}'")]
    InvalidRevision(String),

    #[error("HEAD is detached at {0}, check out a branch before committing")]
    DetachedHead(ObjectId),

    #[error("{0} is not a text file")]
    NotText(String),

    #[error("checkout failed while materializing {path}: {reason}")]
    CheckoutFailed { path: String, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to encode or decode record {key}: {reason}")]
    Codec { key: String, reason: String },
}

impl RepositoryError {
    pub fn corrupt_delta(oid: impl ToString, reason: impl ToString) -> Self {
        RepositoryError::CorruptDelta {
            oid: oid.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn corrupt_commit(oid: impl ToString, reason: impl ToString) -> Self {
        RepositoryError::CorruptCommit {
            oid: oid.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }

    pub fn is_not_text(&self) -> bool {
        matches!(self, RepositoryError::NotText(_))
    }
}

/// Attach the action and path an I/O error happened on.
///
/// A missing file is reported as `NotFound` instead of a generic I/O failure.
pub(crate) trait IoResultExt<T> {
    fn with_path(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                RepositoryError::NotFound(path.display().to_string())
            } else {
                RepositoryError::Io {
                    context: format!("unable to {} {}", action, path.display()),
                    source,
                }
            }
        })
    }
}
