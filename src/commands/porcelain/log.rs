use crate::areas::refs::Head;
use crate::areas::repository::Repository;
use crate::artifacts::branch::HEAD_REF_NAME;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub oneline: bool,
    pub abbrev_commit: bool,
    /// Branch to walk instead of HEAD
    pub branch: Option<String>,
}

/// Refs shown next to the commits they point at
struct Decorations {
    head: Head,
    reverse_refs: HashMap<ObjectId, Vec<BranchName>>,
}

impl Repository {
    pub fn log(&self, opts: &LogOptions) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let start = match &opts.branch {
            Some(name) => {
                let name = BranchName::try_parse(name.clone())?;
                self.refs().read_branch(&name)?
            }
            None => self.refs().head_oid()?,
        };
        let decorations = Decorations {
            head: self.refs().read_head()?,
            reverse_refs: self.refs().reverse_refs()?,
        };

        for entry in RevList::new(self.database(), start) {
            let (oid, commit) = entry?;

            if opts.oneline {
                self.show_commit_oneline(&oid, &commit, &decorations)?;
            } else {
                self.show_commit_medium(&oid, &commit, opts.abbrev_commit, &decorations)?;
                writeln!(self.writer())?;
            }
        }

        Ok(())
    }

    fn show_commit_medium(
        &self,
        oid: &ObjectId,
        commit: &Commit,
        abbrev_commit: bool,
        decorations: &Decorations,
    ) -> anyhow::Result<()> {
        let commit_id = if abbrev_commit {
            oid.to_short_oid()
        } else {
            oid.to_string()
        };

        writeln!(
            self.writer(),
            "{}{}",
            format!("commit {commit_id}").yellow(),
            decorations.describe(oid)
        )?;
        writeln!(self.writer(), "Author: {}", commit.committer())?;
        writeln!(self.writer(), "Date:   {}", commit.readable_timestamp())?;
        writeln!(self.writer())?;
        for message_line in commit.message().lines() {
            writeln!(self.writer(), "    {}", message_line)?;
        }

        Ok(())
    }

    fn show_commit_oneline(
        &self,
        oid: &ObjectId,
        commit: &Commit,
        decorations: &Decorations,
    ) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}{} {}",
            oid.to_short_oid().yellow(),
            decorations.describe(oid),
            commit.short_message()
        )?;

        Ok(())
    }
}

impl Decorations {
    /// ` (HEAD -> main, feature)` for a decorated commit, empty otherwise
    fn describe(&self, oid: &ObjectId) -> String {
        let branches = self.reverse_refs.get(oid).cloned().unwrap_or_default();
        let mut names = Vec::new();

        match &self.head {
            Head::Branch(current) if branches.contains(current) => {
                names.push(format!(
                    "{} -> {}",
                    HEAD_REF_NAME.cyan().bold(),
                    current.as_ref().green().bold()
                ));
            }
            Head::Detached(head_oid) if head_oid == oid => {
                names.push(HEAD_REF_NAME.cyan().bold().to_string());
            }
            _ => {}
        }

        names.extend(
            branches
                .iter()
                .filter(|name| self.head.branch() != Some(*name))
                .map(|name| name.as_ref().green().bold().to_string()),
        );

        if names.is_empty() {
            String::new()
        } else {
            format!(" {}{}{}", "(".yellow(), names.join(&", ".yellow().to_string()), ")".yellow())
        }
    }
}
