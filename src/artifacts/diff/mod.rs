//! Line diffing
//!
//! - `myers`: Myers' shortest edit script between two line sequences

pub mod myers;
