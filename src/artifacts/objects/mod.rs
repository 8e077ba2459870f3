//! Stored record types
//!
//! - **Delta**: file content, either a full snapshot or an edit script against an earlier version
//! - **Commit**: a manifest of changed paths plus metadata, chained to its parent
//!
//! Both are identified by an `ObjectId` and stored through the tagged `Record` enum.

pub mod command;
pub mod commit;
pub mod delta;
pub mod object_id;
pub mod record;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;
