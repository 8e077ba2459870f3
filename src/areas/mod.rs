//! Core repository components
//!
//! - `database`: content-addressed record store and delta resolution
//! - `stage`: staging area holding the draft commit and its pending deltas
//! - `refs`: `HEAD` and branch refs
//! - `repository`: the handle tying the areas together
//! - `workspace`: line-level file I/O on the working tree
//!
//! Everything the repository persists lives under the control directory:
//!
//! ```text
//! .git-light/
//!   HEAD              branch name or detached commit hash
//!   branches/<name>   tip commit hash, or "nil"
//!   objects/<hash>    finalized delta and commit records
//!   stage/<hash>      pending delta records
//!   stage/commit      the draft commit
//!   temp/             scratch area used while checking out
//! ```

pub mod database;
pub mod refs;
pub mod repository;
pub mod stage;
pub mod workspace;

pub const CONTROL_DIR: &str = ".git-light";
pub const HEAD_FILE: &str = "HEAD";
pub const BRANCHES_DIR: &str = "branches";
pub const OBJECTS_DIR: &str = "objects";
pub const STAGE_DIR: &str = "stage";
pub const TEMP_DIR: &str = "temp";
/// Stored in place of a hash that does not exist yet
pub const NIL: &str = "nil";
