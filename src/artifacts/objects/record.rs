//! Records sharing the object namespace
//!
//! Deltas and commits live side by side under the same kind of key, so the
//! codec stores them as one tagged enum. Loading a key therefore always tells
//! the caller which kind of record it got, instead of trusting the caller to
//! know what to decode into.
//!
//! ## Format
//!
//! On disk: zlib(bincode(`Record`))

use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::delta::Delta;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Delta(Delta),
    Commit(Commit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Delta,
    Commit,
}

impl RecordKind {
    pub fn as_str(&self) -> &str {
        match self {
            RecordKind::Delta => "delta",
            RecordKind::Commit => "commit",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Delta(_) => RecordKind::Delta,
            Record::Commit(_) => RecordKind::Commit,
        }
    }

    pub fn serialize(&self) -> bincode::Result<Bytes> {
        bincode::serialize(self).map(Bytes::from)
    }

    pub fn deserialize(content: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(content)
    }
}

impl From<Delta> for Record {
    fn from(delta: Delta) -> Self {
        Record::Delta(delta)
    }
}

impl From<Commit> for Record {
    fn from(commit: Commit) -> Self {
        Record::Commit(commit)
    }
}
