//! Commit record
//!
//! A commit carries its committer, timestamp, message, the parent it follows
//! and a manifest mapping every path changed in it to the content hash of
//! the new version.
//!
//! ## Identity
//!
//! The commit ID is the SHA-1 of the manifest's content hashes concatenated in
//! manifest order. Message, committer and timestamp are not part of it, so two
//! commits with the same manifest share one ID.
//!
//! ## Lifecycle
//!
//! A commit starts as a draft in the staging area, is finalized once (message,
//! committer and time stamped, ID computed) and is never modified after it
//! has been moved into the object store.

use crate::artifacts::objects::object_id::ObjectId;
use chrono::{DateTime, FixedOffset, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Manifest entry: a tracked path and the content hash of its version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct FileEntry {
    path: String,
    oid: ObjectId,
}

impl FileEntry {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn oid(&self) -> &ObjectId {
        &self.oid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    committer: String,
    timestamp: DateTime<FixedOffset>,
    /// Parent commit; `None` for the root of a branch
    parent: Option<ObjectId>,
    message: String,
    files: Vec<FileEntry>,
}

impl Commit {
    pub fn new(
        committer: String,
        timestamp: DateTime<FixedOffset>,
        parent: Option<ObjectId>,
        message: String,
        files: Vec<FileEntry>,
    ) -> Self {
        Commit {
            committer,
            timestamp,
            parent,
            message,
            files,
        }
    }

    /// Empty draft following `parent`
    pub fn draft(parent: Option<ObjectId>) -> Self {
        Commit::new(
            String::new(),
            DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
            parent,
            String::new(),
            Vec::new(),
        )
    }

    /// Record `path → oid` in the manifest.
    ///
    /// A path already in the manifest keeps its position and gets the new hash.
    pub fn stage_file(&mut self, path: String, oid: ObjectId) {
        match self.files.iter_mut().find(|entry| entry.path == path) {
            Some(entry) => entry.oid = oid,
            None => self.files.push(FileEntry::new(path, oid)),
        }
    }

    /// Drop `path` from the manifest, returning whether it was there
    pub fn unstage_file(&mut self, path: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|entry| entry.path != path);
        before != self.files.len()
    }

    pub fn finalize(
        &mut self,
        message: String,
        committer: String,
        timestamp: DateTime<FixedOffset>,
    ) {
        self.message = message;
        self.committer = committer;
        self.timestamp = timestamp;
    }

    pub fn object_id(&self) -> ObjectId {
        ObjectId::from_oids(self.files.iter().map(FileEntry::oid))
    }

    pub fn committer(&self) -> &str {
        &self.committer
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn file(&self, path: &str) -> Option<&ObjectId> {
        self.files
            .iter()
            .find(|entry| entry.path == path)
            .map(FileEntry::oid)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn short_message(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    /// Format timestamp in human-readable form
    ///
    /// # Returns
    ///
    /// String like "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }
}
