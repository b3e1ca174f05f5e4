//! Tag tree mutation engine.
//!
//! # Responsibility
//! - Funnel every structural change of one tree through one owner.
//! - Keep decorations in sync with the nodes each mutation touched.
//! - Persist the whole top-level list and notify listeners once per mutation.
//!
//! # Invariants
//! - A mutating operation saves and notifies exactly once; failed
//!   validation saves and notifies zero times.
//! - `selected` is `None` or a container currently linked in this tree.
//! - Selection is per service instance; trees never share it.
//! - Every decoration handle is released on removal, recolor, and teardown.

use crate::codec::{dump_forest, parse_forest, CodecError};
use crate::config::TreeSettings;
use crate::decoration::surface::{DecorationHandle, DecorationStyle, RenderSurface};
use crate::decoration::sync::{
    apply_decorations, clear_decorations, ensure_handle, release_handle, release_removed,
};
use crate::model::forest::{InsertPosition, TagForest, TreeError};
use crate::model::location::Location;
use crate::model::node::{ContainerDraft, NodeDraft, NodeId, NodeKind, ParentRef, TreeNode};
use crate::repo::tree_store::{TreeStore, TreeStoreError};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from tree service operations.
#[derive(Debug)]
pub enum TreeServiceError {
    /// Container name is blank after trim.
    InvalidName,
    /// Structural lookup or edit failed.
    Tree(TreeError),
    /// Snapshot could not be dumped or parsed.
    Codec(CodecError),
    /// Persistence collaborator failed.
    Store(TreeStoreError),
    /// A dragged index path no longer resolves in the current tree.
    StaleDragPath(Vec<usize>),
    /// Dropped nodes do not share one parent.
    MixedDragParents,
}

impl Display for TreeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "container name must not be blank"),
            Self::Tree(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::StaleDragPath(path) => {
                write!(f, "dragged node at {path:?} no longer exists")
            }
            Self::MixedDragParents => write!(f, "dragged nodes must share one parent"),
        }
    }
}

impl Error for TreeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TreeError> for TreeServiceError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

impl From<CodecError> for TreeServiceError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<TreeStoreError> for TreeServiceError {
    fn from(value: TreeStoreError) -> Self {
        Self::Store(value)
    }
}

/// Result type used by tree service operations.
pub type TreeServiceResult<T> = Result<T, TreeServiceError>;

/// Change notification fired once per committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    Added(NodeId),
    ReferenceAppended { container: NodeId, reference: NodeId },
    Removed(NodeId),
    Renamed(NodeId),
    Recolored(NodeId),
    Selected(NodeId),
    Expanded(NodeId),
    VisibilityChanged(NodeId),
    Moved { nodes: Vec<NodeId>, target: ParentRef },
    Reset,
}

/// Result of selecting a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A container became the append target.
    Container(NodeId),
    /// A reference was picked; the host should open this location.
    Navigate(Location),
}

type ChangeListener = Box<dyn FnMut(&TreeChange)>;

/// Mutation engine for one tree (tags or folders).
pub struct TagTreeService<S: TreeStore, D: RenderSurface> {
    pub(super) settings: TreeSettings,
    pub(super) forest: TagForest,
    pub(super) store: S,
    pub(super) surface: D,
    selected: Option<NodeId>,
    focus: Option<DecorationHandle>,
    listeners: Vec<ChangeListener>,
}

impl<S: TreeStore, D: RenderSurface> TagTreeService<S, D> {
    /// Creates a service over an empty tree without reading the store.
    pub fn new(store: S, surface: D, settings: TreeSettings) -> Self {
        Self {
            settings,
            forest: TagForest::new(),
            store,
            surface,
            selected: None,
            focus: None,
            listeners: Vec::new(),
        }
    }

    /// Creates a service and rebuilds the tree from the store.
    ///
    /// Loading neither saves nor notifies.
    pub fn load(store: S, surface: D, settings: TreeSettings) -> TreeServiceResult<Self> {
        let mut service = Self::new(store, surface, settings);
        let records = service.store.load_top_level_nodes()?;
        parse_forest(&records, &mut service.forest, &mut service.surface)?;
        service.refresh_decorations();
        info!(
            "event=tree_load module=service status=ok tree_key={} top_level={} nodes={}",
            service.settings.tree_key,
            service.forest.top_level().len(),
            service.forest.len()
        );
        Ok(service)
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    pub fn forest(&self) -> &TagForest {
        &self.forest
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    /// Mutable surface access for hosts that track open documents.
    pub fn surface_mut(&mut self) -> &mut D {
        &mut self.surface
    }

    /// Currently selected container, if any.
    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Registers a listener called once per committed mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&TreeChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn top_level(&self) -> &[NodeId] {
        self.forest.top_level()
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.forest.get(id)
    }

    /// Children of a container, or of the root when `parent` is `None`.
    pub fn children(&self, parent: Option<NodeId>) -> TreeServiceResult<&[NodeId]> {
        let parent = parent.map_or(ParentRef::Root, ParentRef::Container);
        Ok(self.forest.children_of(parent)?)
    }

    /// Parent container; top-level and unknown nodes report `None`.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.forest.get(id)?.parent().container_id()
    }

    /// Inserts `draft` at the front of `parent` (the root when `None`).
    ///
    /// # Errors
    /// - `InvalidName` for a blank container name.
    /// - `Tree` when `parent` is missing or a reference leaf.
    pub fn add_node(&mut self, draft: NodeDraft, parent: Option<NodeId>) -> TreeServiceResult<NodeId> {
        let parent = parent.map_or(ParentRef::Root, ParentRef::Container);
        let id = self.insert_draft(draft, parent, InsertPosition::Front)?;
        self.commit(TreeChange::Added(id))?;
        Ok(id)
    }

    /// Appends a reference to the selected container.
    ///
    /// Without a selection, the top-level container named
    /// `default_container_name` is used, created first if absent; it then
    /// becomes the selection.
    pub fn add_reference_to_selected(&mut self, location: Location) -> TreeServiceResult<NodeId> {
        let container = match self.selected {
            Some(id) if self.forest.container(id).is_ok() => id,
            _ => self.default_container()?,
        };
        self.selected = Some(container);

        let reference = self.forest.insert(
            NodeDraft::reference(location),
            ParentRef::Container(container),
            InsertPosition::Back,
        )?;
        self.forest.container_mut(container)?.expanded = true;
        apply_decorations(&mut self.forest, &mut self.surface, &[container]);
        self.commit(TreeChange::ReferenceAppended {
            container,
            reference,
        })?;
        Ok(reference)
    }

    /// Removes `id` and its subtree, releasing every handle it held.
    ///
    /// # Errors
    /// - `Tree(NodeNotFound)` for unknown ids.
    /// - `Tree(DetachedNode)` when the node is not listed by its parent;
    ///   the tree is left untouched.
    pub fn remove_node(&mut self, id: NodeId) -> TreeServiceResult<()> {
        let node = self.forest.get(id).ok_or(TreeError::NodeNotFound(id))?;
        let kind = node.kind();
        let parent = node.parent();
        if self.forest.index_path(id).is_none() {
            error!("event=node_remove module=service status=error error_code=detached_node node={id}");
            return Err(TreeError::DetachedNode(id).into());
        }

        if self
            .selected
            .is_some_and(|selected| self.forest.find_descendant(id, selected))
        {
            self.selected = None;
        }
        let mut removed = self.forest.remove_subtree(id)?;
        let released = release_removed(&mut removed, &mut self.surface);
        debug!(
            "event=node_remove module=service status=ok removed={} released_handles={released}",
            removed.len()
        );

        if let (NodeKind::Reference, ParentRef::Container(parent_id)) = (kind, parent) {
            apply_decorations(&mut self.forest, &mut self.surface, &[parent_id]);
        }
        self.commit(TreeChange::Removed(id))
    }

    /// Renames a container.
    pub fn rename_node(&mut self, id: NodeId, name: impl Into<String>) -> TreeServiceResult<()> {
        let name = normalize_name(name.into())?;
        self.forest.container_mut(id)?.name = name;
        self.commit(TreeChange::Renamed(id))
    }

    /// Replaces a container's color; `None` (or blank) removes it.
    ///
    /// The previous handle is always released before a new one is acquired.
    pub fn recolor(&mut self, id: NodeId, color: Option<String>) -> TreeServiceResult<()> {
        let color = color
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let container = self.forest.container_mut(id)?;
        release_handle(container, &mut self.surface);
        container.color = color;
        ensure_handle(container, &mut self.surface);
        apply_decorations(&mut self.forest, &mut self.surface, &[id]);
        self.commit(TreeChange::Recolored(id))
    }

    /// Selects a container, or focuses a reference for navigation.
    ///
    /// Selecting a reference does not mutate the tree and does not notify.
    pub fn select(&mut self, id: NodeId) -> TreeServiceResult<Selection> {
        match self.forest.get(id).ok_or(TreeError::NodeNotFound(id))? {
            TreeNode::Container(_) => {
                self.selected = Some(id);
                self.forest.container_mut(id)?.expanded = true;
                self.commit(TreeChange::Selected(id))?;
                Ok(Selection::Container(id))
            }
            TreeNode::Reference(reference) => {
                let location = reference.location.clone();
                self.focus_location(&location);
                Ok(Selection::Navigate(location))
            }
        }
    }

    /// Sets a container's expanded flag.
    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> TreeServiceResult<()> {
        self.forest.container_mut(id)?.expanded = expanded;
        self.commit(TreeChange::Expanded(id))
    }

    /// Hides or shows a container and, through inheritance, its subtree.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> TreeServiceResult<()> {
        self.forest.container_mut(id)?.hidden = hidden;
        if hidden {
            clear_decorations(&mut self.forest, &mut self.surface, &[id]);
        } else {
            apply_decorations(&mut self.forest, &mut self.surface, &[id]);
        }
        self.commit(TreeChange::VisibilityChanged(id))
    }

    /// Repaints the whole forest, e.g. after the visible editors changed.
    pub fn refresh_decorations(&mut self) {
        let top_level = self.forest.top_level().to_vec();
        apply_decorations(&mut self.forest, &mut self.surface, &top_level);
    }

    /// Drops every node and the persisted snapshot.
    pub fn reset(&mut self) -> TreeServiceResult<()> {
        let mut removed = self.forest.drain();
        release_removed(&mut removed, &mut self.surface);
        self.release_focus();
        self.selected = None;

        let cleared = self.store.clear_persisted().map_err(TreeServiceError::from);
        if let Err(err) = &cleared {
            error!("event=tree_reset module=service status=error error={err}");
        }
        self.notify(&TreeChange::Reset);
        cleared
    }

    /// Releases every decoration handle. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        let top_level = self.forest.top_level().to_vec();
        clear_decorations(&mut self.forest, &mut self.surface, &top_level);
        self.release_focus();
    }

    pub(super) fn commit(&mut self, change: TreeChange) -> TreeServiceResult<()> {
        let saved = self.persist();
        match &saved {
            Ok(()) => debug!(
                "event=tree_commit module=service status=ok tree_key={} change={change:?}",
                self.settings.tree_key
            ),
            Err(err) => error!(
                "event=tree_commit module=service status=error tree_key={} error={err}",
                self.settings.tree_key
            ),
        }
        self.notify(&change);
        saved
    }

    fn persist(&mut self) -> TreeServiceResult<()> {
        let records = dump_forest(&self.forest)?;
        self.store.save_top_level_nodes(&records)?;
        Ok(())
    }

    fn notify(&mut self, change: &TreeChange) {
        for listener in &mut self.listeners {
            listener(change);
        }
    }

    fn insert_draft(
        &mut self,
        draft: NodeDraft,
        parent: ParentRef,
        position: InsertPosition,
    ) -> TreeServiceResult<NodeId> {
        let draft = match draft {
            NodeDraft::Container(container) => NodeDraft::Container(ContainerDraft {
                name: normalize_name(container.name)?,
                ..container
            }),
            reference @ NodeDraft::Reference(_) => reference,
        };
        let is_reference = matches!(draft, NodeDraft::Reference(_));

        let id = self.forest.insert(draft, parent, position)?;
        for node_id in self.forest.subtree(id) {
            if let Ok(container) = self.forest.container_mut(node_id) {
                ensure_handle(container, &mut self.surface);
            }
        }
        apply_decorations(&mut self.forest, &mut self.surface, &[id]);
        if let (true, ParentRef::Container(parent_id)) = (is_reference, parent) {
            apply_decorations(&mut self.forest, &mut self.surface, &[parent_id]);
        }
        Ok(id)
    }

    fn default_container(&mut self) -> TreeServiceResult<NodeId> {
        let name = self.settings.default_container_name.clone();
        let existing = self.forest.top_level().iter().copied().find(|id| {
            self.forest
                .container(*id)
                .is_ok_and(|container| container.name() == name)
        });
        match existing {
            Some(id) => Ok(id),
            None => self.insert_draft(NodeDraft::container(name), ParentRef::Root, InsertPosition::Front),
        }
    }

    fn focus_location(&mut self, location: &Location) {
        self.release_focus();
        let handle = self.surface.create_decoration(&DecorationStyle::Focus);
        self.surface
            .set_highlight_ranges(handle, location.document_uri(), &[location.range()]);
        self.focus = Some(handle);
    }

    fn release_focus(&mut self) {
        if let Some(handle) = self.focus.take() {
            self.surface.dispose_handle(handle);
        }
    }
}

impl<S: TreeStore, D: RenderSurface> Drop for TagTreeService<S, D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn normalize_name(value: String) -> TreeServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        warn!("event=name_validate module=service status=error error_code=blank_name");
        return Err(TreeServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}
