//! Content hash identifying stored records
//!
//! Object IDs are 40-character lowercase hexadecimal strings holding a SHA-1
//! digest. The digest is an identity and deduplication key, not a
//! tamper-resistance mechanism.
//!
//! ## Digest input
//!
//! - Line content: the concatenated bytes of every line, without separators
//! - Commits: the concatenated hex IDs of the manifest entries, in manifest order
//!
//! ## Storage
//!
//! Records are stored flat, as `objects/<oid>`.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::errors::RepositoryError;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// SHA-1 content hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// # Returns
    ///
    /// Validated ObjectId or `InvalidRevision` if the length or characters are wrong
    pub fn try_parse(id: String) -> Result<Self, RepositoryError> {
        if id.len() != OBJECT_ID_LENGTH || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(RepositoryError::InvalidRevision(id));
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Whether a string has the shape of a full object ID
    pub fn looks_like_oid(id: &str) -> bool {
        id.len() == OBJECT_ID_LENGTH && id.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Hash a line sequence
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut hasher = Sha1::new();
        for line in lines {
            hasher.update(line.as_ref().as_bytes());
        }

        Self::from_digest(hasher)
    }

    /// Hash a sequence of object IDs by concatenating their hex form
    pub fn from_oids<'o>(oids: impl IntoIterator<Item = &'o ObjectId>) -> Self {
        let mut hasher = Sha1::new();
        for oid in oids {
            hasher.update(oid.as_ref().as_bytes());
        }

        Self::from_digest(hasher)
    }

    fn from_digest(hasher: Sha1) -> Self {
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Get abbreviated form of the object ID
    ///
    /// # Returns
    ///
    /// First 7 characters of the hash
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl TryFrom<String> for ObjectId {
    type Error = RepositoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_parse(value)
    }
}

impl From<ObjectId> for String {
    fn from(oid: ObjectId) -> Self {
        oid.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn line_hash_matches_sha1_of_concatenation() {
        let oid = ObjectId::from_lines(&["x", "y"]);
        let expected = format!("{:x}", Sha1::digest(b"xy"));

        assert_eq!(oid.as_ref(), expected);
        assert_eq!(oid, ObjectId::from_lines(&["xy"]));
        assert_eq!(oid, ObjectId::from_lines(&["", "x", "", "y"]));
    }

    #[test]
    fn hashing_is_stable() {
        let lines = vec!["fn main() {".to_string(), "}".to_string()];
        assert_eq!(ObjectId::from_lines(&lines), ObjectId::from_lines(&lines));
        assert_ne!(ObjectId::from_lines(&lines), ObjectId::from_lines(&["}", "fn main() {"]));
    }

    #[test]
    fn empty_content_hash_is_sha1_of_nothing() {
        let empty: [&str; 0] = [];
        assert_eq!(
            ObjectId::from_lines(&empty).as_ref(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[rstest]
    #[case("")]
    #[case("nil")]
    #[case("da39a3ee5e6b4b0d3255bfef95601890afd8070")]
    #[case("da39a3ee5e6b4b0d3255bfef95601890afd8070z")]
    fn malformed_ids_are_rejected(#[case] id: &str) {
        assert!(ObjectId::try_parse(id.to_string()).is_err());
    }

    #[test]
    fn short_oid_is_seven_characters() {
        let oid = ObjectId::try_parse("da39a3ee5e6b4b0d3255bfef95601890afd80709".to_string())
            .unwrap();
        assert_eq!(oid.to_short_oid(), "da39a3e");
    }
}
