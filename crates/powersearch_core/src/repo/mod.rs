//! Persistence collaborators for tree snapshots.
//!
//! # Responsibility
//! - Define the store contract the tree service saves through.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Stores persist plain records only; live handles never reach storage.

pub mod tree_store;
