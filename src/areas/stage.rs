//! Staging area
//!
//! Holds at most one draft commit, under the key `commit`, together with the
//! delta records its manifest refers to. Finalizing a commit is a two-phase
//! move: the draft is renamed to its commit ID, then every staged record is
//! moved into the object store.

use crate::areas::database::Database;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::record::Record;
use crate::errors::{RepositoryError, Result};
use std::path::Path;
use tracing::debug;

pub const DRAFT_KEY: &str = "commit";

#[derive(Debug)]
pub struct Stage {
    database: Database,
}

impl Stage {
    pub fn new(path: Box<Path>) -> Self {
        Stage {
            database: Database::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.database.objects_path()
    }

    /// Store for the pending delta records
    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn has_draft(&self) -> bool {
        self.database.contains(DRAFT_KEY)
    }

    pub fn load_draft(&self) -> Result<Option<Commit>> {
        if !self.has_draft() {
            return Ok(None);
        }

        match self.database.load(DRAFT_KEY) {
            Ok(Record::Commit(commit)) => Ok(Some(commit)),
            Ok(record) => Err(RepositoryError::corrupt_commit(
                DRAFT_KEY,
                format!("expected a commit, found a {}", record.kind()),
            )),
            Err(RepositoryError::Codec { reason, .. }) => {
                Err(RepositoryError::corrupt_commit(DRAFT_KEY, reason))
            }
            Err(e) => Err(e),
        }
    }

    pub fn save_draft(&self, draft: &Commit) -> Result<()> {
        debug!(files = draft.files().len(), "saving draft commit");
        self.database.overwrite(DRAFT_KEY, &draft.clone().into())
    }

    /// First phase of finalizing: the stamped draft takes its commit ID as key.
    pub fn seal(&self, draft: &Commit) -> Result<ObjectId> {
        let oid = draft.object_id();

        self.save_draft(draft)?;
        self.database.rename(DRAFT_KEY, oid.as_ref())?;
        debug!(%oid, "draft sealed");

        Ok(oid)
    }

    /// Second phase of finalizing: hand every staged record to `objects`.
    pub fn migrate(&self, objects: &Database) -> Result<usize> {
        objects.absorb(&self.database)
    }

    /// Drop the draft and every pending record.
    pub fn clear(&self) -> Result<()> {
        debug!("clearing staging area");
        crate::areas::workspace::clear_dir(self.path())
    }
}
