//! Tree node variants.
//!
//! # Responsibility
//! - Define the container/reference sum type stored in the forest arena.
//! - Define detached drafts used to build subtrees before they are linked.
//!
//! # Invariants
//! - Parent links are non-owning ids; ownership lives in `children` lists.
//! - A container owns at most one decoration handle, and only while colored.
//! - Reference nodes never own children or decoration handles.

use crate::decoration::DecorationHandle;
use crate::model::location::Location;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable in-memory node identifier. Never persisted.
pub type NodeId = Uuid;

/// Non-owning link from a node to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentRef {
    /// The implicit root; the node is top-level.
    Root,
    /// A container node in the same forest.
    Container(NodeId),
}

impl ParentRef {
    /// Returns the container id, or `None` for the root.
    pub fn container_id(self) -> Option<NodeId> {
        match self {
            Self::Root => None,
            Self::Container(id) => Some(id),
        }
    }
}

/// Discriminant of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Reference,
}

/// Named, colorable grouping node ("tag" or "folder").
#[derive(Debug)]
pub struct ContainerNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) color: Option<String>,
    pub(crate) decoration: Option<DecorationHandle>,
    /// Documents holding ranges under `decoration` as of the last paint.
    pub(crate) painted_documents: BTreeSet<String>,
    pub(crate) anchor: Option<Location>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: ParentRef,
    pub(crate) expanded: bool,
    pub(crate) hidden: bool,
}

impl ContainerNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Live decoration handle, present only while colored and drawn.
    pub fn decoration(&self) -> Option<DecorationHandle> {
        self.decoration
    }

    /// Location of the symbol this container was created from, if any.
    pub fn anchor(&self) -> Option<&Location> {
        self.anchor.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> ParentRef {
        self.parent
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Own hidden flag. See `TagForest::is_effectively_hidden` for inheritance.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

/// Leaf node pointing at one span of text.
#[derive(Debug)]
pub struct ReferenceNode {
    pub(crate) id: NodeId,
    pub(crate) location: Location,
    pub(crate) parent: ParentRef,
}

impl ReferenceNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn parent(&self) -> ParentRef {
        self.parent
    }
}

/// One node stored in the forest arena.
#[derive(Debug)]
pub enum TreeNode {
    Container(ContainerNode),
    Reference(ReferenceNode),
}

impl TreeNode {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Container(node) => node.id,
            Self::Reference(node) => node.id,
        }
    }

    pub fn parent(&self) -> ParentRef {
        match self {
            Self::Container(node) => node.parent,
            Self::Reference(node) => node.parent,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Container(_) => NodeKind::Container,
            Self::Reference(_) => NodeKind::Reference,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerNode> {
        match self {
            Self::Container(node) => Some(node),
            Self::Reference(_) => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceNode> {
        match self {
            Self::Container(_) => None,
            Self::Reference(node) => Some(node),
        }
    }

    pub(crate) fn as_container_mut(&mut self) -> Option<&mut ContainerNode> {
        match self {
            Self::Container(node) => Some(node),
            Self::Reference(_) => None,
        }
    }

    pub(crate) fn set_parent(&mut self, parent: ParentRef) {
        match self {
            Self::Container(node) => node.parent = parent,
            Self::Reference(node) => node.parent = parent,
        }
    }
}

/// Detached container description, linked into a forest on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDraft {
    pub name: String,
    pub color: Option<String>,
    pub anchor: Option<Location>,
    pub hidden: bool,
    pub expanded: bool,
    pub children: Vec<NodeDraft>,
}

impl ContainerDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            anchor: None,
            hidden: false,
            expanded: false,
            children: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_anchor(mut self, anchor: Location) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_child(mut self, child: impl Into<NodeDraft>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeDraft>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Detached subtree, the input shape of insert operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeDraft {
    Container(ContainerDraft),
    Reference(Location),
}

impl NodeDraft {
    pub fn reference(location: Location) -> Self {
        Self::Reference(location)
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self::Container(ContainerDraft::new(name))
    }
}

impl From<ContainerDraft> for NodeDraft {
    fn from(value: ContainerDraft) -> Self {
        Self::Container(value)
    }
}

impl From<Location> for NodeDraft {
    fn from(value: Location) -> Self {
        Self::Reference(value)
    }
}
