//! Path-addressed drag-and-drop reparenting.
//!
//! # Responsibility
//! - Turn dragged sibling nodes into a transferable list of index paths.
//! - Re-resolve those paths at drop time and move the nodes atomically.
//!
//! # Invariants
//! - Drag start never mutates the tree.
//! - Only same-parent selections produce a payload.
//! - Every path is resolved and the move validated before the first edit;
//!   a stale path fails the whole drop and leaves the tree untouched.
//! - Dropping onto the dragged nodes' own parent is a no-op.

use crate::decoration::surface::RenderSurface;
use crate::decoration::sync::{apply_decorations, clear_decorations};
use crate::model::forest::TreeError;
use crate::model::node::{NodeId, ParentRef, TreeNode};
use crate::repo::tree_store::TreeStore;
use crate::service::tree_service::{TagTreeService, TreeChange, TreeServiceError, TreeServiceResult};
use log::{debug, error};
use serde::{Deserialize, Serialize};

/// Transferred drag data: one index path per dragged node.
///
/// Serializes as a plain array of integer arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DragPayload {
    paths: Vec<Vec<usize>>,
}

impl DragPayload {
    pub fn from_paths(paths: Vec<Vec<usize>>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[Vec<usize>] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Result of a completed drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nodes were reparented under `target`.
    Moved { count: usize, target: ParentRef },
    /// Nothing to do; the tree was neither saved nor notified.
    Unchanged,
}

impl<S: TreeStore, D: RenderSurface> TagTreeService<S, D> {
    /// Starts a drag over `nodes`.
    ///
    /// Returns `None` for an empty selection or one whose nodes have
    /// different parents.
    pub fn drag_start(&self, nodes: &[NodeId]) -> Option<DragPayload> {
        let first = nodes.first()?;
        let parent = self.forest.get(*first)?.parent();
        let same_parent = nodes
            .iter()
            .all(|node| self.forest.get(*node).map(TreeNode::parent) == Some(parent));
        if !same_parent {
            debug!(
                "event=drag_start module=service status=skip reason=mixed_parents count={}",
                nodes.len()
            );
            return None;
        }

        let mut paths = Vec::with_capacity(nodes.len());
        for node in nodes {
            match self.forest.index_path(*node) {
                Some(path) => paths.push(path),
                None => error!(
                    "event=drag_start module=service status=error error_code=detached_node node={node}"
                ),
            }
        }
        if paths.is_empty() {
            return None;
        }
        debug!(
            "event=drag_start module=service status=ok count={} mime={}",
            paths.len(),
            self.settings.drag_mime_type
        );
        Some(DragPayload { paths })
    }

    /// Drops a payload onto `target` (the root when `None`).
    ///
    /// A reference target stands for its parent container. Moved nodes
    /// are appended to the target in their original relative order.
    ///
    /// # Errors
    /// - `StaleDragPath` when any path no longer resolves.
    /// - `MixedDragParents` when resolved nodes have different parents.
    /// - `Tree(NodeNotFound)` for an unknown target.
    /// - `Tree(CycleDetected)` when the target lies inside a dragged subtree.
    pub fn drop_nodes(
        &mut self,
        target: Option<NodeId>,
        payload: &DragPayload,
    ) -> TreeServiceResult<DropOutcome> {
        if payload.is_empty() {
            return Ok(DropOutcome::Unchanged);
        }

        let mut nodes: Vec<NodeId> = Vec::with_capacity(payload.paths.len());
        for path in &payload.paths {
            let node = self.forest.resolve_path(path).map_err(|err| {
                error!(
                    "event=drop module=service status=error error_code=stale_path path={path:?} error={err}"
                );
                TreeServiceError::StaleDragPath(path.clone())
            })?;
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }

        let source = self.parent_ref(nodes[0])?;
        for node in &nodes[1..] {
            if self.parent_ref(*node)? != source {
                return Err(TreeServiceError::MixedDragParents);
            }
        }

        let destination = match target {
            None => ParentRef::Root,
            Some(id) => match self.forest.get(id).ok_or(TreeError::NodeNotFound(id))? {
                TreeNode::Container(_) => ParentRef::Container(id),
                TreeNode::Reference(reference) => reference.parent,
            },
        };
        if destination == source {
            debug!("event=drop module=service status=skip reason=same_parent");
            return Ok(DropOutcome::Unchanged);
        }

        self.forest.move_nodes(&nodes, destination)?;
        clear_decorations(&mut self.forest, &mut self.surface, &nodes);
        let top_level = self.forest.top_level().to_vec();
        apply_decorations(&mut self.forest, &mut self.surface, &top_level);

        let count = nodes.len();
        self.commit(TreeChange::Moved {
            nodes,
            target: destination,
        })?;
        Ok(DropOutcome::Moved {
            count,
            target: destination,
        })
    }

    fn parent_ref(&self, id: NodeId) -> TreeServiceResult<ParentRef> {
        Ok(self
            .forest
            .get(id)
            .ok_or(TreeError::NodeNotFound(id))?
            .parent())
    }
}
