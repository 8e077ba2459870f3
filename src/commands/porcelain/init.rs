use crate::areas::refs::Head;
use crate::areas::repository::Repository;
use crate::areas::{BRANCHES_DIR, OBJECTS_DIR, STAGE_DIR, TEMP_DIR};
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::{IoResultExt, RepositoryError};
use std::io::Write;
use tracing::info;

impl Repository {
    pub fn init(&mut self) -> anyhow::Result<()> {
        let control_path = self.control_path();
        if control_path.exists() {
            return Err(RepositoryError::AlreadyInitialized(control_path.to_path_buf()).into());
        }

        for dir in [OBJECTS_DIR, STAGE_DIR, TEMP_DIR, BRANCHES_DIR] {
            let dir_path = control_path.join(dir);
            std::fs::create_dir_all(&dir_path).with_path("create directory", &dir_path)?;
        }

        let default_branch = BranchName::default_branch();
        self.refs().update_branch(&default_branch, None)?;
        self.refs().set_head(&Head::Branch(default_branch))?;
        info!(path = %control_path.display(), "repository initialized");

        writeln!(
            self.writer(),
            "Initialized empty git-light repository in {}",
            control_path.display()
        )?;

        Ok(())
    }
}
