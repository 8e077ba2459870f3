//! Porcelain commands
//!
//! - `init`: create the repository layout
//! - `add`: stage files for the next commit
//! - `commit`: finalize the staged draft
//! - `checkout`: restore the working tree from a branch, commit or ancestor
//! - `log`: show the commit chain
//! - `branch`: create, delete and list branches

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
