//! Render surface contract and an in-memory recording implementation.
//!
//! # Responsibility
//! - Define how core asks a host to create, paint, and dispose highlights.
//! - Provide `RecordingSurface` for hosts without an editor and for tests.
//!
//! # Invariants
//! - `set_highlight_ranges` replaces the full range set of one handle in one
//!   document; it is never additive.
//! - Disposing an unknown or already disposed handle is a no-op.

use crate::model::location::TextRange;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

/// Opaque id of one host-side decoration style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecorationHandle(u64);

impl DecorationHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Foreground color painted over highlighted text.
pub const HIGHLIGHT_TEXT_COLOR: &str = "#1f1f1f";

/// Visual style requested when creating a decoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecorationStyle {
    /// Background and overview-ruler `color`, bold `HIGHLIGHT_TEXT_COLOR` text.
    Highlight { color: String },
    /// Solid one-pixel border marking the reference the user navigated to.
    Focus,
}

impl DecorationStyle {
    pub fn highlight(color: impl Into<String>) -> Self {
        Self::Highlight {
            color: color.into(),
        }
    }
}

/// Host collaborator that draws decorations in open documents.
pub trait RenderSurface {
    /// Allocates one decoration style.
    fn create_decoration(&mut self, style: &DecorationStyle) -> DecorationHandle;
    /// Replaces every range painted with `handle` in `document_uri`.
    fn set_highlight_ranges(
        &mut self,
        handle: DecorationHandle,
        document_uri: &str,
        ranges: &[TextRange],
    );
    /// Releases `handle` and everything painted with it.
    fn dispose_handle(&mut self, handle: DecorationHandle);
    /// Documents currently shown by the host.
    fn visible_documents(&self) -> Vec<String>;
}

/// In-memory surface that records every decoration request.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    next_handle: u64,
    live: BTreeMap<DecorationHandle, DecorationStyle>,
    painted: BTreeMap<(DecorationHandle, String), Vec<TextRange>>,
    visible: BTreeSet<String>,
    created: usize,
    disposed: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a document as visible so redraws also clear it.
    pub fn open_document(&mut self, document_uri: impl Into<String>) {
        self.visible.insert(document_uri.into());
    }

    pub fn close_document(&mut self, document_uri: &str) {
        self.visible.remove(document_uri);
    }

    pub fn is_live(&self, handle: DecorationHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn live_handle_count(&self) -> usize {
        self.live.len()
    }

    pub fn style(&self, handle: DecorationHandle) -> Option<&DecorationStyle> {
        self.live.get(&handle)
    }

    /// Ranges painted with `handle` in one document.
    pub fn ranges(&self, handle: DecorationHandle, document_uri: &str) -> Vec<TextRange> {
        self.painted
            .get(&(handle, document_uri.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Non-empty range sets painted with `handle`, keyed by document.
    pub fn painted_ranges(&self, handle: DecorationHandle) -> BTreeMap<String, Vec<TextRange>> {
        self.painted
            .iter()
            .filter(|((painted_handle, _), ranges)| *painted_handle == handle && !ranges.is_empty())
            .map(|((_, uri), ranges)| (uri.clone(), ranges.clone()))
            .collect()
    }

    /// Total handles ever created.
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Total handles actually released; repeated disposals are not counted.
    pub fn disposed_count(&self) -> usize {
        self.disposed
    }
}

impl RenderSurface for RecordingSurface {
    fn create_decoration(&mut self, style: &DecorationStyle) -> DecorationHandle {
        self.next_handle += 1;
        let handle = DecorationHandle(self.next_handle);
        self.live.insert(handle, style.clone());
        self.created += 1;
        handle
    }

    fn set_highlight_ranges(
        &mut self,
        handle: DecorationHandle,
        document_uri: &str,
        ranges: &[TextRange],
    ) {
        if !self.is_live(handle) {
            warn!(
                "event=paint module=decoration status=skip reason=handle_not_live handle={}",
                handle.raw()
            );
            return;
        }
        let key = (handle, document_uri.to_string());
        if ranges.is_empty() {
            self.painted.remove(&key);
        } else {
            self.painted.insert(key, ranges.to_vec());
        }
    }

    fn dispose_handle(&mut self, handle: DecorationHandle) {
        if self.live.remove(&handle).is_none() {
            debug!(
                "event=dispose module=decoration status=skip reason=already_disposed handle={}",
                handle.raw()
            );
            return;
        }
        self.painted
            .retain(|(painted_handle, _), _| *painted_handle != handle);
        self.disposed += 1;
    }

    fn visible_documents(&self) -> Vec<String> {
        self.visible.iter().cloned().collect()
    }
}
