use crate::areas::refs::Head;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{RepositoryError, Result};
use std::io::Write;
use tracing::{info, warn};

impl Repository {
    pub fn commit(&mut self, message: &str, committer: Option<&str>) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let branch = match self.refs().read_head()? {
            Head::Branch(branch) => branch,
            Head::Detached(oid) => return Err(RepositoryError::DetachedHead(oid).into()),
        };
        let parent = self.refs().read_branch(&branch)?;

        let draft = match self.stage().load_draft()? {
            Some(draft) if draft.parent() == parent.as_ref() && !draft.is_empty() => draft,
            Some(_) => {
                warn!(%branch, "staged changes do not follow the branch tip, discarding them");
                self.stage().clear()?;
                return Err(RepositoryError::EmptyStage.into());
            }
            None => return Err(RepositoryError::EmptyStage.into()),
        };

        let committer = committer.unwrap_or(self.config().committer()).to_string();
        let oid = self.finalize_commit(&branch, draft, message.trim(), &committer)?;
        let commit = self.database().load_commit(&oid)?;

        let is_root = match commit.parent() {
            Some(_) => "",
            None => "(root-commit) ",
        };
        writeln!(
            self.writer(),
            "[{} {}{}] {}",
            branch,
            is_root,
            oid,
            commit.short_message()
        )?;

        Ok(())
    }

    /// Stamp the draft, persist it and move the branch onto it.
    ///
    /// The draft is first renamed to its commit ID inside the staging area,
    /// then the branch ref is updated and finally every staged record moves
    /// into the object store.
    pub fn finalize_commit(
        &self,
        branch: &BranchName,
        mut draft: Commit,
        message: &str,
        committer: &str,
    ) -> Result<ObjectId> {
        if draft.is_empty() {
            return Err(RepositoryError::EmptyStage);
        }

        let oid = draft.object_id();
        if draft.parent() == Some(&oid) {
            return Err(RepositoryError::NothingChanged(oid));
        }
        if self.database().contains(oid.as_ref()) {
            return Err(RepositoryError::DuplicateCommit(oid));
        }

        draft.finalize(message.to_string(), committer.to_string(), self.config().now());
        self.stage().seal(&draft)?;
        self.refs().update_branch(branch, Some(&oid))?;
        self.stage().migrate(self.database())?;
        info!(%oid, %branch, "commit created");

        Ok(oid)
    }
}
