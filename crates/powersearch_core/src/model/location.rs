//! Text location value types.
//!
//! # Responsibility
//! - Identify one span of text inside one named document.
//! - Stay plain data so the codec can convert it without loss.
//!
//! # Invariants
//! - `Location` is immutable once built; tree mutations never edit it.
//! - Positions are zero-based line/character pairs, matching editor hosts.

use std::fmt::{Display, Formatter};

/// Zero-based line/character position inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Returns the same line shifted right by `delta` characters.
    pub fn translate(self, delta: u32) -> Self {
        Self {
            line: self.line,
            character: self.character.saturating_add(delta),
        }
    }

    /// Returns the same line at column zero.
    pub fn line_start(self) -> Self {
        Self {
            line: self.line,
            character: 0,
        }
    }
}

/// Half-open span between two positions of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Builds a range from raw `(line, character)` pairs.
    pub fn from_coords(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Self {
        Self {
            start: Position::new(start_line, start_char),
            end: Position::new(end_line, end_char),
        }
    }
}

/// One span of text in one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    document_uri: String,
    range: TextRange,
}

impl Location {
    pub fn new(document_uri: impl Into<String>, range: TextRange) -> Self {
        Self {
            document_uri: document_uri.into(),
            range,
        }
    }

    pub fn document_uri(&self) -> &str {
        &self.document_uri
    }

    pub fn range(&self) -> TextRange {
        self.range
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.document_uri,
            self.range.start.line,
            self.range.start.character,
            self.range.end.line,
            self.range.end.character
        )
    }
}
