//! Configuration storage for Timebell.
//!
//! Owns the single in-memory [`Config`](timebell_types::Config) value and its
//! JSON copy on disk.
//!
//! # Design decisions
//!
//! - **Reject-on-failure**: the in-memory value is swapped only after the
//!   file has been durably replaced, so memory and disk never diverge.
//! - **Atomic replace**: saves write a sibling temporary file, fsync it and
//!   rename it over the target, so a crash mid-write leaves the previous
//!   file intact.
//! - **Short critical sections**: readers contend only with the in-memory
//!   swap, never with a writer's disk I/O. Writers are serialized by a
//!   separate async gate.

mod store;

pub use store::{ConfigStore, StoreError};
