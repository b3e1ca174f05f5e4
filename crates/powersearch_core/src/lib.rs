//! Core domain logic for PowerSearch tag and folder trees.
//! This crate owns the tree model, its persistence codec, and the
//! decoration bookkeeping; hosts supply rendering and storage.

pub mod codec;
pub mod config;
pub mod controller;
pub mod db;
pub mod decoration;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use codec::{CodecError, PersistData, PersistKind};
pub use config::TreeSettings;
pub use controller::{CommandOutcome, EditorContext, PromptProvider, ReferenceLocator, TreeController};
pub use decoration::{DecorationHandle, DecorationStyle, RecordingSurface, RenderSurface};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::forest::{TagForest, TreeError, TreeResult};
pub use model::location::{Location, Position, TextRange};
pub use model::node::{ContainerDraft, NodeDraft, NodeId, NodeKind, ParentRef, TreeNode};
pub use repo::tree_store::{
    InMemoryTreeStore, SqliteTreeStore, TreeStore, TreeStoreError, TreeStoreResult,
};
pub use service::drag_drop::{DragPayload, DropOutcome};
pub use service::tree_service::{
    Selection, TagTreeService, TreeChange, TreeServiceError, TreeServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
