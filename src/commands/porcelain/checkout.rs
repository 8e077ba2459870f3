use crate::areas::refs::Head;
use crate::areas::repository::Repository;
use crate::areas::workspace::{clear_dir, move_all, write_lines};
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{RepositoryError, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

impl Repository {
    pub fn checkout(&mut self, target: &str) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let current_head = self.refs().read_head()?;
        let revision = Revision::try_parse(target)?;
        let target_oid = revision.resolve(self)?;

        let new_head = match &revision {
            revision if revision.is_relative_to_head() => None,
            Revision::Branch(name) => Some(Head::Branch(name.clone())),
            _ => Some(Head::Detached(target_oid.clone())),
        };

        self.materialize(&target_oid)?;

        // HEAD only moves once the working tree holds the target
        if let Some(head) = &new_head {
            self.refs().set_head(head)?;
        }
        info!(%target_oid, %revision, "checked out");

        match new_head {
            Some(Head::Branch(name)) if current_head.branch() == Some(&name) => {
                writeln!(self.writer(), "Already on '{}'", name)?;
            }
            Some(Head::Branch(name)) => {
                writeln!(self.writer(), "Switched to branch '{}'", name)?;
            }
            Some(Head::Detached(_)) => {
                self.print_head_position("HEAD is now at", &target_oid)?;
            }
            None => {
                self.print_head_position("Working tree restored to", &target_oid)?;
            }
        }

        Ok(())
    }

    fn print_head_position(&self, message: &str, oid: &ObjectId) -> anyhow::Result<()> {
        let commit = self.database().load_commit(oid)?;

        writeln!(
            self.writer(),
            "{} {} {}",
            message,
            oid.to_short_oid(),
            commit.short_message()
        )?;

        Ok(())
    }

    /// Write every tracked file of `oid` into the working tree.
    ///
    /// Files are rebuilt under `temp/` first and only moved over the working
    /// tree once all of them were written. A directory standing where a file
    /// goes fails the checkout before anything moves. On failure `temp/` is
    /// emptied and the working tree is left as it was.
    pub fn materialize(&self, oid: &ObjectId) -> Result<()> {
        let tree = self.database().tree(Some(oid))?;
        let temp_path = self.temp_path();
        clear_dir(&temp_path)?;

        let written = tree.iter().try_for_each(|(path, file_oid)| {
            self.materialize_file(&temp_path, path, file_oid)
                .map_err(|e| match e {
                    RepositoryError::CheckoutFailed { .. } => e,
                    e => RepositoryError::CheckoutFailed {
                        path: path.clone(),
                        reason: e.to_string(),
                    },
                })
        });

        if let Err(e) = written {
            clear_dir(&temp_path)?;
            return Err(e);
        }
        debug!(files = tree.len(), "working tree rebuilt in temp");

        move_all(&temp_path, self.path()).map_err(|e| RepositoryError::CheckoutFailed {
            path: temp_path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn materialize_file(&self, temp_path: &Path, path: &str, oid: &ObjectId) -> Result<()> {
        let relative_path = Self::checked_relative_path(path)?;
        if self.path().join(&relative_path).is_dir() {
            return Err(RepositoryError::CheckoutFailed {
                path: path.to_string(),
                reason: "a directory is in the way".to_string(),
            });
        }
        let lines = self.database().resolve(oid)?;

        write_lines(&temp_path.join(relative_path), &lines)
    }

    /// Tracked paths must stay below the working root and out of the control directory.
    fn checked_relative_path(path: &str) -> Result<PathBuf> {
        let relative_path = PathBuf::from(path);
        let escapes = relative_path.as_os_str().is_empty()
            || relative_path
                .components()
                .any(|component| !matches!(component, Component::Normal(_)))
            || relative_path
                .components()
                .next()
                .is_some_and(|first| first.as_os_str() == crate::areas::CONTROL_DIR);

        if escapes {
            return Err(RepositoryError::CheckoutFailed {
                path: path.to_string(),
                reason: "path leaves the working tree".to_string(),
            });
        }

        Ok(relative_path)
    }
}
