//! Host collaborators consulted before any mutation starts.
//!
//! Every call here is a suspension point owned by the host; a `None` or
//! empty answer means the user cancelled and the command aborts.

use crate::model::location::{Location, Position, TextRange};

/// Word under the cursor, as resolved by the host editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordAtCursor {
    pub range: TextRange,
    pub text: String,
}

/// Snapshot of the active editor when a command was triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorContext {
    pub document_uri: String,
    pub selection: TextRange,
    pub anchor: Position,
    pub word: Option<WordAtCursor>,
}

/// Finds every reference to the symbol at a position.
pub trait ReferenceLocator {
    /// Returns locations in host order; empty means nothing to tag.
    fn locate_references(&mut self, document_uri: &str, position: Position) -> Vec<Location>;
}

/// Asks the user for input.
pub trait PromptProvider {
    /// Free-text input; `None` when dismissed.
    fn prompt_text(&mut self, prompt: &str) -> Option<String>;
    /// Single choice among `choices`; `None` when dismissed.
    fn pick(&mut self, choices: &[&str]) -> Option<String>;
    /// Shows a user-visible message.
    fn show_message(&mut self, message: &str);
}
