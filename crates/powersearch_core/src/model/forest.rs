//! Arena-backed tag forest.
//!
//! # Responsibility
//! - Own every node of one tree and the ordered top-level list.
//! - Provide path addressing (`index_path`/`resolve_path`) and traversal.
//! - Perform structural edits (link, unlink, move) for the service layer.
//!
//! # Invariants
//! - Every linked node appears exactly once in its parent's `children`.
//! - Parent links are ids, never owning pointers; they are rebuilt on insert.
//! - The forest stays acyclic: moves into a moved node's own subtree fail.

use crate::model::node::{ContainerNode, NodeDraft, NodeId, ParentRef, ReferenceNode, TreeNode};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type used by forest operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Structural errors raised by forest operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Node id is not present in the forest.
    NodeNotFound(NodeId),
    /// Node exists but is a reference leaf where a container is required.
    NotAContainer(NodeId),
    /// Index path is empty; the root itself is not addressable.
    EmptyPath,
    /// Index path step `depth` does not exist in the current tree.
    PathOutOfBounds { path: Vec<usize>, depth: usize },
    /// Node claims a parent that does not list it as a child.
    DetachedNode(NodeId),
    /// Linking `node` under `parent` would make the tree cyclic.
    CycleDetected { node: NodeId, parent: NodeId },
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "tree node not found: {id}"),
            Self::NotAContainer(id) => write!(f, "tree node is not a container: {id}"),
            Self::EmptyPath => write!(f, "index path must not be empty"),
            Self::PathOutOfBounds { path, depth } => {
                write!(f, "index path {path:?} does not resolve at depth {depth}")
            }
            Self::DetachedNode(id) => {
                write!(f, "tree node {id} is not listed by its parent")
            }
            Self::CycleDetected { node, parent } => {
                write!(f, "linking node {node} under {parent} would create a cycle")
            }
        }
    }
}

impl Error for TreeError {}

/// Insert position among the new siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Front,
    Back,
}

/// One tree of containers and references under an implicit root.
#[derive(Debug, Default)]
pub struct TagForest {
    top_level: Vec<NodeId>,
    nodes: HashMap<NodeId, TreeNode>,
}

impl TagForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the root has no children.
    pub fn is_empty(&self) -> bool {
        self.top_level.is_empty()
    }

    /// Number of linked nodes, root excluded.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(&id)
    }

    /// Loads one container, failing for missing ids and reference leaves.
    pub fn container(&self, id: NodeId) -> TreeResult<&ContainerNode> {
        self.nodes
            .get(&id)
            .ok_or(TreeError::NodeNotFound(id))?
            .as_container()
            .ok_or(TreeError::NotAContainer(id))
    }

    pub(crate) fn container_mut(&mut self, id: NodeId) -> TreeResult<&mut ContainerNode> {
        self.nodes
            .get_mut(&id)
            .ok_or(TreeError::NodeNotFound(id))?
            .as_container_mut()
            .ok_or(TreeError::NotAContainer(id))
    }

    /// Ordered children of the root or of one container.
    pub fn children_of(&self, parent: ParentRef) -> TreeResult<&[NodeId]> {
        match parent {
            ParentRef::Root => Ok(&self.top_level),
            ParentRef::Container(id) => Ok(&self.container(id)?.children),
        }
    }

    fn children_of_mut(&mut self, parent: ParentRef) -> TreeResult<&mut Vec<NodeId>> {
        match parent {
            ParentRef::Root => Ok(&mut self.top_level),
            ParentRef::Container(id) => Ok(&mut self.container_mut(id)?.children),
        }
    }

    /// Builds `draft` and links it under `parent`.
    ///
    /// Parent links of the whole new subtree are assigned while descending.
    /// No decoration handle is acquired here.
    ///
    /// # Errors
    /// - `NodeNotFound`/`NotAContainer` when `parent` cannot own children.
    pub fn insert(
        &mut self,
        draft: NodeDraft,
        parent: ParentRef,
        position: InsertPosition,
    ) -> TreeResult<NodeId> {
        self.children_of(parent)?;
        let id = self.build(draft, parent);
        let siblings = self.children_of_mut(parent)?;
        match position {
            InsertPosition::Front => siblings.insert(0, id),
            InsertPosition::Back => siblings.push(id),
        }
        Ok(id)
    }

    fn build(&mut self, draft: NodeDraft, parent: ParentRef) -> NodeId {
        let id = Uuid::new_v4();
        match draft {
            NodeDraft::Reference(location) => {
                self.nodes.insert(
                    id,
                    TreeNode::Reference(ReferenceNode {
                        id,
                        location,
                        parent,
                    }),
                );
            }
            NodeDraft::Container(draft) => {
                let children = draft
                    .children
                    .into_iter()
                    .map(|child| self.build(child, ParentRef::Container(id)))
                    .collect();
                self.nodes.insert(
                    id,
                    TreeNode::Container(ContainerNode {
                        id,
                        name: draft.name,
                        color: draft.color,
                        decoration: None,
                        painted_documents: BTreeSet::new(),
                        anchor: draft.anchor,
                        children,
                        parent,
                        expanded: draft.expanded,
                        hidden: draft.hidden,
                    }),
                );
            }
        }
        id
    }

    /// Removes `id` from its parent's children and returns its old index.
    ///
    /// # Errors
    /// - `NodeNotFound` for unknown ids.
    /// - `DetachedNode` when the parent does not list the node.
    pub(crate) fn unlink(&mut self, id: NodeId) -> TreeResult<usize> {
        let parent = self.get(id).ok_or(TreeError::NodeNotFound(id))?.parent();
        let siblings = self
            .children_of_mut(parent)
            .map_err(|_| TreeError::DetachedNode(id))?;
        let index = siblings
            .iter()
            .position(|sibling| *sibling == id)
            .ok_or(TreeError::DetachedNode(id))?;
        siblings.remove(index);
        Ok(index)
    }

    /// Unlinks `id` and drops its whole subtree from the arena.
    ///
    /// Returns the removed nodes in pre-order so callers can release
    /// resources they hold.
    pub(crate) fn remove_subtree(&mut self, id: NodeId) -> TreeResult<Vec<TreeNode>> {
        self.unlink(id)?;
        let removed = self
            .subtree(id)
            .into_iter()
            .filter_map(|node_id| self.nodes.remove(&node_id))
            .collect();
        Ok(removed)
    }

    /// Drops every node and returns them.
    pub(crate) fn drain(&mut self) -> Vec<TreeNode> {
        self.top_level.clear();
        self.nodes.drain().map(|(_, node)| node).collect()
    }

    /// Computes child indices from the root down to `id`.
    ///
    /// Returns `None` when any step of the parent walk is inconsistent:
    /// unknown node, a parent that does not list its child, or a cycle.
    pub fn index_path(&self, id: NodeId) -> Option<Vec<usize>> {
        let mut indices = Vec::new();
        let mut cursor = id;
        for _ in 0..=self.nodes.len() {
            let parent = self.get(cursor)?.parent();
            let siblings = self.children_of(parent).ok()?;
            indices.push(siblings.iter().position(|sibling| *sibling == cursor)?);
            match parent {
                ParentRef::Root => {
                    indices.reverse();
                    return Some(indices);
                }
                ParentRef::Container(parent_id) => cursor = parent_id,
            }
        }
        None
    }

    /// Resolves an index path produced by `index_path` against this forest.
    ///
    /// # Errors
    /// - `EmptyPath` for `[]`.
    /// - `PathOutOfBounds` when a step is missing or descends into a leaf.
    pub fn resolve_path(&self, path: &[usize]) -> TreeResult<NodeId> {
        if path.is_empty() {
            return Err(TreeError::EmptyPath);
        }
        let out_of_bounds = |depth: usize| TreeError::PathOutOfBounds {
            path: path.to_vec(),
            depth,
        };

        let mut cursor = ParentRef::Root;
        let mut resolved = None;
        for (depth, index) in path.iter().enumerate() {
            let siblings = self
                .children_of(cursor)
                .map_err(|_| out_of_bounds(depth))?;
            let id = *siblings.get(*index).ok_or_else(|| out_of_bounds(depth))?;
            resolved = Some(id);
            cursor = ParentRef::Container(id);
        }
        resolved.ok_or(TreeError::EmptyPath)
    }

    /// Depth-first containment test: is `target` equal to or below `root`?
    pub fn find_descendant(&self, root: NodeId, target: NodeId) -> bool {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if let Some(TreeNode::Container(container)) = self.get(current) {
                stack.extend(container.children.iter().copied());
            }
        }
        false
    }

    /// Pre-order ids of `id` and every descendant.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut ordered = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            ordered.push(current);
            if let TreeNode::Container(container) = node {
                stack.extend(container.children.iter().rev().copied());
            }
        }
        ordered
    }

    /// Strict ancestor containers of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut cursor = self.get(id).map(TreeNode::parent);
        while let Some(ParentRef::Container(parent_id)) = cursor {
            if chain.contains(&parent_id) {
                break;
            }
            chain.push(parent_id);
            cursor = self.get(parent_id).map(TreeNode::parent);
        }
        chain
    }

    /// Own `hidden` flag OR'd with every strict ancestor's flag.
    pub fn is_effectively_hidden(&self, id: NodeId) -> bool {
        let own = self
            .get(id)
            .and_then(TreeNode::as_container)
            .is_some_and(ContainerNode::is_hidden);
        own || self.ancestors(id).into_iter().any(|ancestor| {
            self.container(ancestor)
                .map(ContainerNode::is_hidden)
                .unwrap_or(false)
        })
    }

    /// Moves sibling `nodes` to the end of `target`, keeping their order.
    ///
    /// All checks run before the first edit, so a failure leaves the
    /// forest untouched.
    ///
    /// # Errors
    /// - `NodeNotFound`/`DetachedNode` for nodes not linked under one parent.
    /// - `NotAContainer` when `target` is a reference leaf.
    /// - `CycleDetected` when `target` lies inside a moved subtree.
    pub(crate) fn move_nodes(&mut self, nodes: &[NodeId], target: ParentRef) -> TreeResult<()> {
        let Some(first) = nodes.first() else {
            return Ok(());
        };
        let source = self.get(*first).ok_or(TreeError::NodeNotFound(*first))?.parent();
        let siblings = self.children_of(source)?;
        for node in nodes {
            let parent = self.get(*node).ok_or(TreeError::NodeNotFound(*node))?.parent();
            if parent != source || !siblings.contains(node) {
                return Err(TreeError::DetachedNode(*node));
            }
        }
        self.children_of(target)?;
        if let ParentRef::Container(target_id) = target {
            if let Some(node) = nodes
                .iter()
                .find(|node| self.find_descendant(**node, target_id))
            {
                return Err(TreeError::CycleDetected {
                    node: *node,
                    parent: target_id,
                });
            }
        }

        self.children_of_mut(source)?
            .retain(|sibling| !nodes.contains(sibling));
        self.children_of_mut(target)?.extend(nodes.iter().copied());
        for node in nodes {
            if let Some(moved) = self.get_mut(*node) {
                moved.set_parent(target);
            }
        }
        Ok(())
    }
}
