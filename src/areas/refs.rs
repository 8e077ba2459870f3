//! HEAD and branch refs
//!
//! ## File Format
//!
//! - `branches/<name>` holds the 40-character hash of the branch tip, or
//!   `nil` while the branch has no commits. Names may contain `/`, which
//!   nests the ref file in directories.
//! - `HEAD` holds either the name of the checked-out branch or, when
//!   detached, a commit hash. The content names a branch exactly when
//!   `branches/<content>` exists.
//!
//! Ref files are written under an exclusive lock on the file itself. There is
//! no lock spanning several refs.

use crate::areas::{BRANCHES_DIR, HEAD_FILE, NIL};
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{IoResultExt, RepositoryError, Result};
use derive_new::new;
use file_guard::Lock;
use std::collections::HashMap;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// What `HEAD` points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    Branch(BranchName),
    Detached(ObjectId),
}

impl Head {
    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            Head::Branch(name) => Some(name),
            Head::Detached(_) => None,
        }
    }
}

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the control directory
    path: Box<Path>,
}

impl Refs {
    pub fn read_head(&self) -> Result<Head> {
        let content = self.read_ref_file(&self.head_path())?;

        if self.branch_path(&content).is_file() {
            return Ok(Head::Branch(BranchName::try_parse(content)?));
        }

        if ObjectId::looks_like_oid(&content) {
            return Ok(Head::Detached(ObjectId::try_parse(content)?));
        }

        Err(RepositoryError::NotFound(format!("branch '{content}'")))
    }

    pub fn set_head(&self, head: &Head) -> Result<()> {
        let content = match head {
            Head::Branch(name) => name.to_string(),
            Head::Detached(oid) => oid.to_string(),
        };
        debug!(head = %content, "updating HEAD");

        self.update_ref_file(&self.head_path(), &content)
    }

    /// Commit HEAD currently resolves to; `None` on a branch without commits
    pub fn head_oid(&self) -> Result<Option<ObjectId>> {
        match self.read_head()? {
            Head::Branch(name) => self.read_branch(&name),
            Head::Detached(oid) => Ok(Some(oid)),
        }
    }

    pub fn is_current_branch(&self, name: &BranchName) -> Result<bool> {
        Ok(self.read_head()?.branch() == Some(name))
    }

    pub fn branch_exists(&self, name: &BranchName) -> bool {
        self.branch_path(name.as_ref()).is_file()
    }

    pub fn read_branch(&self, name: &BranchName) -> Result<Option<ObjectId>> {
        let path = self.branch_path(name.as_ref());
        if !path.is_file() {
            return Err(RepositoryError::NotFound(format!("branch '{name}'")));
        }

        let content = self.read_ref_file(&path)?;
        if content == NIL || content.is_empty() {
            return Ok(None);
        }

        ObjectId::try_parse(content).map(Some)
    }

    pub fn update_branch(&self, name: &BranchName, oid: Option<&ObjectId>) -> Result<()> {
        let content = oid.map_or_else(|| NIL.to_string(), ObjectId::to_string);
        debug!(branch = %name, tip = %content, "updating branch");

        self.update_ref_file(&self.branch_path(name.as_ref()), &content)
    }

    pub fn create_branch(&self, name: &BranchName, oid: Option<&ObjectId>) -> Result<()> {
        if self.branch_exists(name) {
            return Err(RepositoryError::BranchExists(name.clone()));
        }

        self.update_branch(name, oid)
    }

    /// Remove a branch ref, returning the commit it pointed at.
    pub fn delete_branch(&self, name: &BranchName) -> Result<Option<ObjectId>> {
        let oid = self.read_branch(name)?;

        if self.is_current_branch(name)? {
            return Err(RepositoryError::ProtectedBranch(name.clone()));
        }

        let branch_path = self.branch_path(name.as_ref());
        std::fs::remove_file(&branch_path).with_path("delete", &branch_path)?;
        self.prune_branch_empty_parent_dirs(&branch_path)?;
        debug!(branch = %name, "branch deleted");

        Ok(oid)
    }

    /// Every branch, sorted by name
    pub fn list_branches(&self) -> Result<Vec<BranchName>> {
        let branches_path = self.branches_path();

        let mut branches = WalkDir::new(&branches_path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(&branches_path).ok()?;
                let name = crate::areas::workspace::path_key(relative_path);
                BranchName::try_parse(name).ok()
            })
            .collect::<Vec<_>>();
        branches.sort();

        Ok(branches)
    }

    /// Branches grouped by the commit they point at
    pub fn reverse_refs(&self) -> Result<HashMap<ObjectId, Vec<BranchName>>> {
        let mut reverse_refs: HashMap<ObjectId, Vec<BranchName>> = HashMap::new();

        for name in self.list_branches()? {
            if let Some(oid) = self.read_branch(&name)? {
                reverse_refs.entry(oid).or_default().push(name);
            }
        }

        Ok(reverse_refs)
    }

    fn read_ref_file(&self, path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(path).with_path("read", path)?;

        Ok(content.trim().to_string())
    }

    fn update_ref_file(&self, path: &Path, raw_ref: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_path("create directory", parent)?;
        }

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_path("open", path)?;
        let mut lock =
            file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1).with_path("lock", path)?;
        lock.deref_mut()
            .write_all(raw_ref.as_bytes())
            .with_path("write", path)?;

        Ok(())
    }

    fn prune_branch_empty_parent_dirs(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && parent != self.branches_path().as_ref()
            && parent.read_dir().with_path("list", parent)?.next().is_none()
        {
            std::fs::remove_dir(parent).with_path("remove", parent)?;
            self.prune_branch_empty_parent_dirs(parent)?;
        }

        Ok(())
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_FILE).into_boxed_path()
    }

    pub fn branches_path(&self) -> Box<Path> {
        self.path.join(BRANCHES_DIR).into_boxed_path()
    }

    fn branch_path(&self, name: &str) -> Box<Path> {
        self.branches_path().join(name).into_boxed_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    struct Control {
        dir: TempDir,
        refs: Refs,
    }

    fn name(raw: &str) -> BranchName {
        BranchName::try_parse(raw.to_string()).unwrap()
    }

    #[fixture]
    fn control() -> Control {
        let dir = TempDir::new().unwrap();
        let refs = Refs::new(dir.path().into());
        refs.update_branch(&name("main"), None).unwrap();
        refs.set_head(&Head::Branch(name("main"))).unwrap();

        Control { dir, refs }
    }

    #[rstest]
    fn fresh_branch_is_nil(control: Control) {
        control.dir.child("branches/main").assert("nil");
        control.dir.child("HEAD").assert("main");

        assert_eq!(control.refs.read_head().unwrap(), Head::Branch(name("main")));
        assert_eq!(control.refs.head_oid().unwrap(), None);
    }

    #[rstest]
    fn head_follows_its_branch(control: Control) {
        let oid = ObjectId::from_lines(&["x"]);
        control.refs.update_branch(&name("main"), Some(&oid)).unwrap();

        assert_eq!(control.refs.head_oid().unwrap(), Some(oid));
    }

    #[rstest]
    fn detached_head_holds_a_hash(control: Control) {
        let oid = ObjectId::from_lines(&["x"]);
        control.refs.set_head(&Head::Detached(oid.clone())).unwrap();

        assert_eq!(control.refs.read_head().unwrap(), Head::Detached(oid.clone()));
        assert_eq!(control.refs.head_oid().unwrap(), Some(oid));
    }

    #[rstest]
    fn creating_an_existing_branch_fails(control: Control) {
        assert!(matches!(
            control.refs.create_branch(&name("main"), None),
            Err(RepositoryError::BranchExists(_))
        ));
    }

    #[rstest]
    fn deleting_the_current_branch_is_refused(control: Control) {
        assert!(matches!(
            control.refs.delete_branch(&name("main")),
            Err(RepositoryError::ProtectedBranch(_))
        ));
        assert!(control.refs.branch_exists(&name("main")));
    }

    #[rstest]
    fn deleting_another_branch_keeps_head(control: Control) {
        let oid = ObjectId::from_lines(&["x"]);
        control
            .refs
            .create_branch(&name("feature/login"), Some(&oid))
            .unwrap();

        assert_eq!(
            control.refs.delete_branch(&name("feature/login")).unwrap(),
            Some(oid)
        );
        assert!(!control.refs.branch_exists(&name("feature/login")));
        control
            .dir
            .child("branches/feature")
            .assert(predicates::path::missing());
        assert_eq!(control.refs.read_head().unwrap(), Head::Branch(name("main")));
    }

    #[rstest]
    fn deleting_an_unknown_branch_is_not_found(control: Control) {
        assert!(control.refs.delete_branch(&name("nope")).unwrap_err().is_not_found());
    }

    #[rstest]
    fn branches_are_listed_sorted(control: Control) {
        control.refs.create_branch(&name("zeta"), None).unwrap();
        control.refs.create_branch(&name("alpha/one"), None).unwrap();

        assert_eq!(
            control.refs.list_branches().unwrap(),
            vec![name("alpha/one"), name("main"), name("zeta")]
        );
    }

    #[rstest]
    fn reverse_refs_skip_nil_branches(control: Control) {
        let oid = ObjectId::from_lines(&["x"]);
        control.refs.create_branch(&name("a"), Some(&oid)).unwrap();
        control.refs.create_branch(&name("b"), Some(&oid)).unwrap();

        let reverse_refs = control.refs.reverse_refs().unwrap();

        assert_eq!(reverse_refs.len(), 1);
        assert_eq!(reverse_refs[&oid], vec![name("a"), name("b")]);
    }
}
