//! # Domain Layer
//!
//! The seen-id table, per-conversation sequence tracking and the verdict
//! types. Pure data structures; time is passed in.

pub mod records;
pub mod sequence;
pub mod verdict;
