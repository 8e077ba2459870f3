use crate::areas::repository::Repository;
use crate::areas::workspace::path_key;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Arguments of `add` that stand for the whole working tree
pub const WILDCARDS: [&str; 2] = ["*", "."];

impl Repository {
    pub fn add(&mut self, paths: &[String]) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let parent = self.refs().head_oid()?;
        let tree = self.database().tree(parent.as_ref())?;
        let mut draft = self.current_draft(parent)?;

        let mut changed = false;
        for path in self.expand_paths(paths)? {
            let lines = match self.workspace().read_lines(&path) {
                Ok(lines) => lines,
                Err(e) if e.is_not_found() => {
                    warn!(path = %path.display(), "skipping vanished file");
                    continue;
                }
                Err(e) if e.is_not_text() => {
                    warn!(path = %path.display(), "skipping non-text file");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            changed |= self.stage_path(&mut draft, &tree, &path, lines)?;
        }

        if !changed {
            debug!("nothing new to stage");
            return Ok(());
        }

        if draft.is_empty() {
            // every staged change was reverted, nothing refers to the pending records
            self.stage().clear()?;
        } else {
            self.stage().save_draft(&draft)?;
        }

        Ok(())
    }

    /// The draft to stage into: the saved one when it follows `parent`, a new one otherwise
    fn current_draft(&self, parent: Option<ObjectId>) -> Result<Commit> {
        match self.stage().load_draft()? {
            Some(draft) if draft.parent() == parent.as_ref() => Ok(draft),
            Some(_) => {
                warn!("discarding changes staged on top of another commit");
                self.stage().clear()?;
                Ok(Commit::draft(parent))
            }
            None => Ok(Commit::draft(parent)),
        }
    }

    /// Resolve wildcards and directories to the files they cover, relative to the root.
    fn expand_paths(&self, paths: &[String]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for raw_path in paths {
            let root = if WILDCARDS.contains(&raw_path.as_str()) {
                None
            } else {
                let path = Path::new(raw_path);
                Some(path.strip_prefix(self.path()).unwrap_or(path).to_path_buf())
            };

            match self.workspace().list_files(root.as_deref()) {
                Ok(listed) => files.extend(listed),
                Err(e) if e.is_not_found() => {
                    warn!(path = %raw_path, "pathspec did not match any files");
                }
                Err(e) => return Err(e),
            }
        }

        files.sort();
        files.dedup();

        Ok(files)
    }

    /// Stage one file against the last committed tree.
    ///
    /// New files are stored as full snapshots, changed files as a delta
    /// against their committed version. Returns whether the draft changed.
    fn stage_path(
        &self,
        draft: &mut Commit,
        tree: &BTreeMap<String, ObjectId>,
        path: &Path,
        lines: Vec<String>,
    ) -> Result<bool> {
        let key = path_key(path);
        let oid = ObjectId::from_lines(&lines);

        let previous = tree.get(&key);
        if previous == Some(&oid) {
            let reverted = draft.unstage_file(&key);
            debug!(path = %key, reverted, "file matches the last commit");
            return Ok(reverted);
        }

        if draft.file(&key) == Some(&oid) {
            return Ok(false);
        }

        // content already known keeps its record, rewriting it could make a chain loop
        let known = self.database().contains(oid.as_ref())
            || self.stage().database().contains(oid.as_ref());
        if !known {
            match previous {
                Some(previous) => {
                    let base = self.database().resolve(previous)?;
                    self.stage().database().put_delta(previous, &base, &lines)?;
                    debug!(path = %key, %oid, base = %previous, "staged delta");
                }
                None => {
                    self.stage().database().put_snapshot(&lines)?;
                    debug!(path = %key, %oid, "staged snapshot");
                }
            }
        }

        draft.stage_file(key, oid);
        Ok(true)
    }
}
