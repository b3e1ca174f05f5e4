//! Per-tree runtime settings.
//!
//! # Invariants
//! - Missing JSON fields fall back to `TreeSettings::default()` values.
//! - Two trees with different `tree_key` values never share a snapshot.

use serde::{Deserialize, Serialize};

/// Default persistence key for the tags tree.
pub const DEFAULT_TREE_KEY: &str = "tags";
/// Name of the container that receives references when nothing is selected.
pub const DEFAULT_CONTAINER_NAME: &str = "Default";
/// Color of containers created from a located symbol.
pub const DEFAULT_SYMBOL_COLOR: &str = "#ffff00";
/// Characters covered when tagging a whole line.
pub const DEFAULT_LINE_SPAN: u32 = 1000;
/// Mime type carried by drag payloads.
pub const DEFAULT_DRAG_MIME_TYPE: &str = "application/powersearch";

/// Settings shared by the tree service and its command layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeSettings {
    pub tree_key: String,
    pub default_container_name: String,
    pub symbol_color: String,
    pub line_span: u32,
    pub drag_mime_type: String,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            tree_key: DEFAULT_TREE_KEY.to_string(),
            default_container_name: DEFAULT_CONTAINER_NAME.to_string(),
            symbol_color: DEFAULT_SYMBOL_COLOR.to_string(),
            line_span: DEFAULT_LINE_SPAN,
            drag_mime_type: DEFAULT_DRAG_MIME_TYPE.to_string(),
        }
    }
}

impl TreeSettings {
    /// Settings for a tree stored under `tree_key`, other fields default.
    pub fn for_tree(tree_key: impl Into<String>) -> Self {
        Self {
            tree_key: tree_key.into(),
            ..Self::default()
        }
    }

    /// Parses host-supplied JSON settings.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
