//! git-light: a small, git-inspired version-control engine
//!
//! Snapshots of a file tree are stored as line-based deltas in a
//! content-addressed object store. Commits chain backwards through their
//! parents and every branch is a single mutable ref pointing at its tip.
//!
//! - `areas`: on-disk areas of a repository (object store, staging area, refs, workspace)
//! - `artifacts`: records, diffing and revision handling
//! - `commands`: user-facing commands implemented on top of the areas
//! - `config`: environment-driven settings
//! - `errors`: the error taxonomy shared by every area

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;
