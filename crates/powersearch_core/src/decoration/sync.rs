//! Decoration synchronizer.
//!
//! # Responsibility
//! - Paint each colored container's direct references with its handle.
//! - Release handles for subtrees that are hidden, removed, or torn down.
//!
//! # Invariants
//! - Painting replaces a handle's range set; repeated calls are idempotent.
//! - A document painted last time but not this time is sent an empty set.
//! - Only direct reference children are painted, never transitive ones.
//! - An effectively hidden container is skipped together with its subtree.
//! - Clearing releases handles but keeps `color`, so a redraw restores them.

use crate::decoration::surface::{DecorationHandle, DecorationStyle, RenderSurface};
use crate::model::forest::TagForest;
use crate::model::location::TextRange;
use crate::model::node::{ContainerNode, NodeId, TreeNode};
use log::trace;
use std::collections::{BTreeMap, BTreeSet};

/// Returns the container's handle, creating one from `color` if missing.
///
/// Uncolored containers get no handle.
pub fn ensure_handle<S>(container: &mut ContainerNode, surface: &mut S) -> Option<DecorationHandle>
where
    S: RenderSurface + ?Sized,
{
    if let Some(handle) = container.decoration {
        return Some(handle);
    }
    let color = container.color.as_deref()?;
    let handle = surface.create_decoration(&DecorationStyle::highlight(color));
    container.decoration = Some(handle);
    Some(handle)
}

/// Releases the container's handle, if any. Returns whether one was held.
pub fn release_handle<S>(container: &mut ContainerNode, surface: &mut S) -> bool
where
    S: RenderSurface + ?Sized,
{
    container.painted_documents.clear();
    match container.decoration.take() {
        Some(handle) => {
            surface.dispose_handle(handle);
            true
        }
        None => false,
    }
}

/// Paints every visible colored container reachable from `nodes`.
///
/// Effective visibility is computed once per entry node from its ancestor
/// chain; below that, only each container's own flag is consulted.
pub fn apply_decorations<S>(forest: &mut TagForest, surface: &mut S, nodes: &[NodeId])
where
    S: RenderSurface + ?Sized,
{
    for entry in nodes {
        match forest.get(*entry) {
            Some(TreeNode::Container(_)) => {}
            _ => continue,
        }
        if forest.is_effectively_hidden(*entry) {
            trace!("event=apply_decorations module=decoration status=skip reason=hidden");
            continue;
        }

        let mut stack = vec![*entry];
        while let Some(current) = stack.pop() {
            paint_container(forest, surface, current);
            if let Ok(container) = forest.container(current) {
                stack.extend(container.children.iter().rev().copied().filter(|child| {
                    forest
                        .container(*child)
                        .is_ok_and(|nested| !nested.is_hidden())
                }));
            }
        }
    }
}

/// Releases every container handle in the subtrees rooted at `nodes`.
pub fn clear_decorations<S>(forest: &mut TagForest, surface: &mut S, nodes: &[NodeId])
where
    S: RenderSurface + ?Sized,
{
    for entry in nodes {
        for id in forest.subtree(*entry) {
            if let Ok(container) = forest.container_mut(id) {
                release_handle(container, surface);
            }
        }
    }
}

/// Releases handles held by nodes already taken out of the forest.
pub(crate) fn release_removed<S>(removed: &mut [TreeNode], surface: &mut S) -> usize
where
    S: RenderSurface + ?Sized,
{
    let mut released = 0;
    for node in removed.iter_mut() {
        if let TreeNode::Container(container) = node {
            if release_handle(container, surface) {
                released += 1;
            }
        }
    }
    released
}

fn paint_container<S>(forest: &mut TagForest, surface: &mut S, id: NodeId)
where
    S: RenderSurface + ?Sized,
{
    let Ok(container) = forest.container(id) else {
        return;
    };
    if container.color.is_none() {
        return;
    }

    let mut by_document: BTreeMap<String, Vec<TextRange>> = BTreeMap::new();
    for child in &container.children {
        if let Some(TreeNode::Reference(reference)) = forest.get(*child) {
            by_document
                .entry(reference.location.document_uri().to_string())
                .or_default()
                .push(reference.location.range());
        }
    }
    let painted: BTreeSet<String> = by_document.keys().cloned().collect();
    for document in surface.visible_documents() {
        by_document.entry(document).or_default();
    }

    let Ok(container) = forest.container_mut(id) else {
        return;
    };
    for stale in &container.painted_documents {
        by_document.entry(stale.clone()).or_default();
    }
    let Some(handle) = ensure_handle(container, surface) else {
        return;
    };
    container.painted_documents = painted;
    for (document, ranges) in &by_document {
        surface.set_highlight_ranges(handle, document, ranges);
    }
}
