//! In-memory tree model for tags and folders.
//!
//! # Responsibility
//! - Define location values, node variants, and the forest arena.
//! - Keep structural invariants independent of rendering and storage.
//!
//! # Invariants
//! - Every non-root node has exactly one parent and is listed once by it.
//! - Child order is significant and is preserved by every operation.

pub mod forest;
pub mod location;
pub mod node;
