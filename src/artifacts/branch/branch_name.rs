use crate::artifacts::branch::{HEAD_REF_NAME, INVALID_BRANCH_NAME_REGEX};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;

/// Name of the branch created by `init`
pub const DEFAULT_BRANCH: &str = "main";

/// Validated branch name
///
/// Names follow the usual ref-name rules and may contain `/` to group
/// branches into directories under `branches/`. `HEAD` and anything shaped
/// like a full object ID are reserved, since the `HEAD` file could not tell
/// such a branch apart from a detached commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: String) -> Result<Self, RepositoryError> {
        if name.is_empty() || name == HEAD_REF_NAME || ObjectId::looks_like_oid(&name) {
            return Err(RepositoryError::InvalidBranchName(name));
        }

        let re = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)
            .map_err(|_| RepositoryError::InvalidBranchName(name.clone()))?;

        if re.is_match(&name) {
            Err(RepositoryError::InvalidBranchName(name))
        } else {
            Ok(Self(name))
        }
    }

    pub fn default_branch() -> Self {
        Self(DEFAULT_BRANCH.to_string())
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::proptest;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("HEAD")]
    #[case("feature/")]
    #[case("/feature")]
    #[case("a b")]
    #[case("a~1")]
    #[case("a^")]
    #[case("what?")]
    #[case("da39a3ee5e6b4b0d3255bfef95601890afd80709")]
    fn reserved_and_malformed_names_are_rejected(#[case] name: &str) {
        assert!(matches!(
            BranchName::try_parse(name.to_string()),
            Err(RepositoryError::InvalidBranchName(_))
        ));
    }

    #[test]
    fn default_branch_is_main() {
        assert_eq!(BranchName::default_branch().as_ref(), "main");
    }

    proptest! {
        #[test]
        fn plain_names_are_accepted(branch_name in "[a-zA-Z0-9_-]{1,20}") {
            // 40-hex names cannot come out of a 20 character pattern
            assert!(BranchName::try_parse(branch_name).is_ok());
        }

        #[test]
        fn grouped_names_are_accepted(
            prefix in "[a-zA-Z0-9_-]{1,12}",
            suffix in "[a-zA-Z0-9_-]{1,12}"
        ) {
            let branch_name = format!("{}/{}", prefix, suffix);
            assert!(BranchName::try_parse(branch_name).is_ok());
        }

        #[test]
        fn names_starting_with_dot_are_rejected(suffix in "[a-zA-Z0-9_-]+") {
            let branch_name = format!(".{}", suffix);
            assert!(BranchName::try_parse(branch_name).is_err());
        }

        #[test]
        fn names_ending_with_lock_are_rejected(prefix in "[a-zA-Z0-9_-]+") {
            let branch_name = format!("{}.lock", prefix);
            assert!(BranchName::try_parse(branch_name).is_err());
        }

        #[test]
        fn names_with_consecutive_dots_are_rejected(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+"
        ) {
            let branch_name = format!("{}..{}", prefix, suffix);
            assert!(BranchName::try_parse(branch_name).is_err());
        }
    }
}
