//! Command implementations
//!
//! Commands are methods on `Repository`. They return `anyhow::Result` and
//! write their user-facing output to the repository's writer.

pub mod porcelain;
