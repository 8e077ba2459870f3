use crate::areas::NIL;
use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use colored::Colorize;
use std::io::Write;
use tracing::info;

impl Repository {
    /// Create a branch at the commit HEAD points to (`nil` while there is none).
    pub fn branch(&mut self, branch_name: &str) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let branch_name = BranchName::try_parse(branch_name.to_string())?;
        let source_oid = self.refs().head_oid()?;

        self.refs().create_branch(&branch_name, source_oid.as_ref())?;
        info!(branch = %branch_name, "branch created");

        Ok(())
    }

    pub fn delete_branch(&mut self, branch_name: &str) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let branch_name = BranchName::try_parse(branch_name.to_string())?;
        let oid = self.refs().delete_branch(&branch_name)?;

        let short_oid = oid.map_or_else(|| NIL.to_string(), |oid| oid.to_short_oid());
        writeln!(
            self.writer(),
            "Deleted branch {} (was {}).",
            branch_name,
            short_oid
        )?;

        Ok(())
    }

    pub fn list_branches(&self) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let current = self.refs().read_head()?;

        for branch_name in self.refs().list_branches()? {
            if current.branch() == Some(&branch_name) {
                writeln!(self.writer(), "* {}", branch_name.as_ref().green())?;
            } else {
                writeln!(self.writer(), "  {}", branch_name)?;
            }
        }

        Ok(())
    }
}
