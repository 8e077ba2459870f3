//! Data structures and algorithms of the version-control engine
//!
//! - `branch`: branch names and revision parsing
//! - `core`: shared utilities (pager wrapper)
//! - `diff`: Myers' shortest edit script
//! - `log`: commit history traversal
//! - `objects`: content hashes, edit commands, delta and commit records

pub mod branch;
pub mod core;
pub mod diff;
pub mod log;
pub mod objects;
