//! Tree use-case services.
//!
//! # Responsibility
//! - Own each tree's forest, selection, and decoration lifecycle.
//! - Keep command/UI layers decoupled from storage and render details.

pub mod drag_drop;
pub mod tree_service;
