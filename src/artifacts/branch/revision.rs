use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::{ANCESTOR_REGEX, HEAD_REF_NAME, REF_ALIASES};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{RepositoryError, Result};

/// A reference to a commit as written on the command line
///
/// - `HEAD` (or `@`): the commit HEAD points at
/// - `<branch>`: the tip of a branch
/// - `<hash>`: a full 40-character commit hash
/// - `<rev>~<n>`: the n-th ancestor of another revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Head,
    Branch(BranchName),
    Commit(ObjectId),
    Ancestor(Box<Revision>, usize),
}

impl Revision {
    pub fn try_parse(revision: &str) -> Result<Revision> {
        let invalid = || RepositoryError::InvalidRevision(revision.to_string());

        let ancestor_regex = regex::Regex::new(ANCESTOR_REGEX).map_err(|_| invalid())?;
        if let Some(caps) = ancestor_regex.captures(revision) {
            let base_revision = Self::try_parse(&caps[1])?;
            let generations: usize = caps[2].parse().map_err(|_| invalid())?;

            return Ok(Revision::Ancestor(Box::new(base_revision), generations));
        }

        let resolved_name = *REF_ALIASES.get(revision).unwrap_or(&revision);
        if resolved_name == HEAD_REF_NAME {
            return Ok(Revision::Head);
        }

        if ObjectId::looks_like_oid(resolved_name) {
            return Ok(Revision::Commit(ObjectId::try_parse(
                resolved_name.to_string(),
            )?));
        }

        BranchName::try_parse(resolved_name.to_string())
            .map(Revision::Branch)
            .map_err(|_| invalid())
    }

    /// Walks from HEAD without naming anything new to point HEAD at
    pub fn is_relative_to_head(&self) -> bool {
        match self {
            Revision::Head => true,
            Revision::Ancestor(base, _) => base.is_relative_to_head(),
            Revision::Branch(_) | Revision::Commit(_) => false,
        }
    }

    /// Commit this revision names.
    ///
    /// Branches without commits, unknown hashes, hashes of file content and
    /// walks past the root commit are all `NotFound`.
    pub fn resolve(&self, repository: &Repository) -> Result<ObjectId> {
        match self {
            Revision::Head => repository
                .refs()
                .head_oid()?
                .ok_or_else(|| RepositoryError::NotFound("a commit on HEAD".to_string())),
            Revision::Branch(name) => repository
                .refs()
                .read_branch(name)?
                .ok_or_else(|| RepositoryError::NotFound(format!("a commit on branch '{name}'"))),
            Revision::Commit(oid) => match repository.database().load_commit(oid) {
                Ok(_) => Ok(oid.clone()),
                Err(e) if e.is_not_found() || repository.database().holds_delta(oid) => {
                    Err(RepositoryError::NotFound(format!("commit {oid}")))
                }
                Err(e) => Err(e),
            },
            Revision::Ancestor(base, generations) => {
                let base_oid = base.resolve(repository)?;

                repository
                    .database()
                    .ancestor(&base_oid, *generations)?
                    .ok_or_else(|| RepositoryError::NotFound(format!("revision '{self}'")))
            }
        }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Revision::Head => write!(f, "{HEAD_REF_NAME}"),
            Revision::Branch(name) => write!(f, "{name}"),
            Revision::Commit(oid) => write!(f, "{oid}"),
            Revision::Ancestor(base, generations) => write!(f, "{base}~{generations}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("HEAD")]
    #[case("@")]
    fn head_and_its_alias(#[case] revision: &str) {
        assert_eq!(Revision::try_parse(revision).unwrap(), Revision::Head);
    }

    #[test]
    fn branch_names_parse_as_branches() {
        assert_eq!(
            Revision::try_parse("feature/login").unwrap(),
            Revision::Branch(BranchName::try_parse("feature/login".to_string()).unwrap())
        );
    }

    #[test]
    fn full_hashes_parse_as_commits() {
        let oid = ObjectId::from_lines(&["x"]);

        assert_eq!(
            Revision::try_parse(oid.as_ref()).unwrap(),
            Revision::Commit(oid)
        );
    }

    #[test]
    fn ancestors_nest() {
        assert_eq!(
            Revision::try_parse("HEAD~2~1").unwrap(),
            Revision::Ancestor(
                Box::new(Revision::Ancestor(Box::new(Revision::Head), 2)),
                1
            )
        );
        assert!(Revision::try_parse("@~3").unwrap().is_relative_to_head());
        assert!(!Revision::try_parse("main~3").unwrap().is_relative_to_head());
    }

    #[rstest]
    #[case("HEAD~")]
    #[case("~1")]
    #[case("main^")]
    #[case("a..b")]
    fn malformed_revisions_are_rejected(#[case] revision: &str) {
        assert!(matches!(
            Revision::try_parse(revision),
            Err(RepositoryError::InvalidRevision(_))
        ));
    }

    proptest! {
        #[test]
        fn head_ancestors_round_trip(generations in 0usize..10_000) {
            let raw = format!("HEAD~{generations}");
            let revision = Revision::try_parse(&raw).unwrap();

            prop_assert_eq!(revision.to_string(), raw);
            prop_assert_eq!(revision, Revision::Ancestor(Box::new(Revision::Head), generations));
        }
    }
}
