//! Highlight decorations over tagged references.
//!
//! # Responsibility
//! - Define the host render contract (`RenderSurface`).
//! - Keep painted ranges consistent with tree structure and visibility.

pub mod surface;
pub mod sync;

pub use surface::{DecorationHandle, DecorationStyle, RecordingSurface, RenderSurface};
pub use sync::{apply_decorations, clear_decorations, ensure_handle, release_handle};
