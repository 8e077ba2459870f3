//! Delta record
//!
//! A delta either holds complete content (a full snapshot, no previous
//! hash) or describes how to rebuild content from an earlier version:
//! the edit commands plus the inserted lines, in the order they were met.

use crate::artifacts::diff::myers::{EditOp, shortest_edit_script};
use crate::artifacts::objects::command::{Command, CommandError, CommandScript};
use crate::artifacts::objects::object_id::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    /// Content this delta applies to; `None` marks a full snapshot
    previous: Option<ObjectId>,
    commands: CommandScript,
    data: Vec<String>,
}

impl Delta {
    pub fn new(previous: Option<ObjectId>, commands: CommandScript, data: Vec<String>) -> Self {
        Delta {
            previous,
            commands,
            data,
        }
    }

    pub fn snapshot(lines: Vec<String>) -> Self {
        Delta::new(None, CommandScript::default(), lines)
    }

    /// Diff `src` against `dst` and encode the result as a delta based on `previous`.
    pub fn between(previous: ObjectId, src: &[String], dst: &[String]) -> Self {
        let script = shortest_edit_script(src, dst);
        Delta::encode(&script, src, dst).with_previous(previous)
    }

    /// Encode an edit script; the previous hash is left for the caller to fill.
    ///
    /// Deletions are emitted with their index in `src`, insertions with their
    /// index in `dst` and the position of the inserted line in `data`.
    pub fn encode(script: &[EditOp], src: &[String], dst: &[String]) -> Self {
        let (mut src_index, mut dst_index) = (0, 0);
        let mut commands = CommandScript::default();
        let mut data = Vec::new();

        for op in script {
            match op {
                EditOp::Delete => {
                    commands.push(Command::Delete { row: src_index });
                    src_index += 1;
                }
                EditOp::Insert => {
                    commands.push(Command::Insert {
                        dest: dst_index,
                        data_index: data.len(),
                    });
                    data.push(dst[dst_index].clone());
                    dst_index += 1;
                }
                EditOp::Match => {
                    debug_assert_eq!(src[src_index], dst[dst_index]);
                    src_index += 1;
                    dst_index += 1;
                }
            }
        }

        Delta::new(None, commands, data)
    }

    pub fn with_previous(mut self, previous: ObjectId) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn is_snapshot(&self) -> bool {
        self.previous.is_none()
    }

    pub fn previous(&self) -> Option<&ObjectId> {
        self.previous.as_ref()
    }

    pub fn commands(&self) -> &CommandScript {
        &self.commands
    }

    pub fn data(&self) -> &[String] {
        &self.data
    }

    pub fn into_data(self) -> Vec<String> {
        self.data
    }

    /// Rebuild the target content from its base.
    ///
    /// Every deletion is applied first, in the order stored, each index
    /// shifted down by the number of rows already removed. Insertions follow
    /// against the post-deletion content. Indices that fall outside the
    /// content are reported, never clamped.
    pub fn apply(&self, base: Vec<String>) -> Result<Vec<String>, CommandError> {
        let mut lines = base;

        for (deleted, row) in self.commands.deletions().enumerate() {
            let index = row
                .checked_sub(deleted)
                .filter(|index| *index < lines.len())
                .ok_or(CommandError::DeleteOutOfRange {
                    row,
                    deleted,
                    len: lines.len(),
                })?;
            lines.remove(index);
        }

        for (dest, data_index) in self.commands.insertions() {
            let line = self
                .data
                .get(data_index)
                .ok_or(CommandError::MissingData {
                    data_index,
                    available: self.data.len(),
                })?;
            if dest > lines.len() {
                return Err(CommandError::InsertOutOfRange {
                    dest,
                    len: lines.len(),
                });
            }
            lines.insert(dest, line.clone());
        }

        Ok(lines)
    }
}
