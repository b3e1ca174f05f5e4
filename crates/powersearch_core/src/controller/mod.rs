//! Command layer driven by host UI events.
//!
//! # Responsibility
//! - Translate editor context and prompt answers into service calls.
//! - Validate user input (names, colors) before anything mutates.

pub mod collaborators;
pub mod color;
pub mod commands;

pub use collaborators::{EditorContext, PromptProvider, ReferenceLocator, WordAtCursor};
pub use commands::{CommandOutcome, RejectReason, TreeController};
