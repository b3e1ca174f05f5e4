//! Persisted tree shape and conversion to/from the live forest.
//!
//! # Responsibility
//! - Define the JSON-serializable `PersistData` record.
//! - Dump live nodes without handles or parent links.
//! - Parse records back, relinking parents and recreating handles.
//!
//! # Invariants
//! - `parse(dump(x))` equals `x` up to node ids and handle identity.
//! - Parsing validates the whole record before linking anything.
//! - Container `type` is written as `container`; `tag`/`folder` are read too.

use crate::decoration::surface::RenderSurface;
use crate::decoration::sync::ensure_handle;
use crate::model::forest::{InsertPosition, TagForest, TreeError};
use crate::model::location::{Location, Position, TextRange};
use crate::model::node::{ContainerDraft, NodeDraft, NodeId, ParentRef, TreeNode};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from dumping or parsing persisted trees.
#[derive(Debug)]
pub enum CodecError {
    /// Container record has no `name`.
    MissingName,
    /// Reference record has no `location`.
    MissingLocation,
    /// Live tree lookup failed while dumping or linking.
    Tree(TreeError),
    /// JSON text could not be encoded or decoded.
    Json(serde_json::Error),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "persisted container has no name"),
            Self::MissingLocation => write!(f, "persisted reference has no location"),
            Self::Tree(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "invalid persisted tree json: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::MissingName | Self::MissingLocation => None,
        }
    }
}

impl From<TreeError> for CodecError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Persisted node variant tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistKind {
    #[serde(rename = "container", alias = "tag", alias = "folder")]
    Container,
    #[serde(rename = "ref")]
    Reference,
}

/// Persisted position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionData {
    pub line: u32,
    #[serde(rename = "char", alias = "character")]
    pub character: u32,
}

/// Persisted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeData {
    pub start: PositionData,
    pub end: PositionData,
}

/// Persisted location, plain strings and integers only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationData {
    #[serde(alias = "uriString")]
    pub uri: String,
    pub range: RangeData,
}

impl From<&Location> for LocationData {
    fn from(value: &Location) -> Self {
        let range = value.range();
        Self {
            uri: value.document_uri().to_string(),
            range: RangeData {
                start: PositionData {
                    line: range.start.line,
                    character: range.start.character,
                },
                end: PositionData {
                    line: range.end.line,
                    character: range.end.character,
                },
            },
        }
    }
}

impl From<LocationData> for Location {
    fn from(value: LocationData) -> Self {
        Location::new(
            value.uri,
            TextRange::new(
                Position::new(value.range.start.line, value.range.start.character),
                Position::new(value.range.end.line, value.range.end.character),
            ),
        )
    }
}

/// Persisted node record (recursive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistData {
    #[serde(rename = "type")]
    pub kind: PersistKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    #[serde(
        default,
        alias = "references",
        skip_serializing_if = "Option::is_none"
    )]
    pub children: Option<Vec<PersistData>>,
}

impl PersistData {
    /// Reference record for one location.
    pub fn reference(location: &Location) -> Self {
        Self {
            kind: PersistKind::Reference,
            name: None,
            location: Some(location.into()),
            color: None,
            hidden: false,
            children: None,
        }
    }
}

/// Dumps one live node and its subtree.
pub fn dump(forest: &TagForest, id: NodeId) -> CodecResult<PersistData> {
    match forest.get(id).ok_or(TreeError::NodeNotFound(id))? {
        TreeNode::Reference(reference) => Ok(PersistData::reference(&reference.location)),
        TreeNode::Container(container) => {
            let children = container
                .children
                .iter()
                .map(|child| dump(forest, *child))
                .collect::<CodecResult<Vec<_>>>()?;
            Ok(PersistData {
                kind: PersistKind::Container,
                name: Some(container.name.clone()),
                location: container.anchor.as_ref().map(LocationData::from),
                color: container.color.clone(),
                hidden: container.hidden,
                children: Some(children),
            })
        }
    }
}

/// Dumps every top-level node in order.
pub fn dump_forest(forest: &TagForest) -> CodecResult<Vec<PersistData>> {
    forest
        .top_level()
        .iter()
        .map(|id| dump(forest, *id))
        .collect()
}

/// Converts one record into a detached draft without touching any forest.
pub fn to_draft(data: &PersistData) -> CodecResult<NodeDraft> {
    match data.kind {
        PersistKind::Reference => {
            let location = data.location.clone().ok_or(CodecError::MissingLocation)?;
            Ok(NodeDraft::Reference(location.into()))
        }
        PersistKind::Container => {
            let name = data.name.clone().ok_or(CodecError::MissingName)?;
            let children = data
                .children
                .iter()
                .flatten()
                .map(to_draft)
                .collect::<CodecResult<Vec<_>>>()?;
            Ok(NodeDraft::Container(ContainerDraft {
                name,
                color: data.color.clone(),
                anchor: data.location.clone().map(Location::from),
                hidden: data.hidden,
                expanded: false,
                children,
            }))
        }
    }
}

/// Parses one record and links it at the end of `parent`.
///
/// Every colored container of the new subtree receives a fresh handle.
pub fn parse<S>(
    data: &PersistData,
    parent: ParentRef,
    forest: &mut TagForest,
    surface: &mut S,
) -> CodecResult<NodeId>
where
    S: RenderSurface + ?Sized,
{
    let draft = to_draft(data)?;
    link_draft(draft, parent, forest, surface)
}

/// Parses a top-level list into the root, in order.
///
/// All records are validated first, so a malformed list links nothing.
pub fn parse_forest<S>(
    records: &[PersistData],
    forest: &mut TagForest,
    surface: &mut S,
) -> CodecResult<Vec<NodeId>>
where
    S: RenderSurface + ?Sized,
{
    let drafts = records
        .iter()
        .map(to_draft)
        .collect::<CodecResult<Vec<_>>>()?;
    drafts
        .into_iter()
        .map(|draft| link_draft(draft, ParentRef::Root, forest, surface))
        .collect()
}

fn link_draft<S>(
    draft: NodeDraft,
    parent: ParentRef,
    forest: &mut TagForest,
    surface: &mut S,
) -> CodecResult<NodeId>
where
    S: RenderSurface + ?Sized,
{
    let id = forest.insert(draft, parent, InsertPosition::Back)?;
    for node_id in forest.subtree(id) {
        if let Ok(container) = forest.container_mut(node_id) {
            ensure_handle(container, surface);
        }
    }
    Ok(id)
}

/// Encodes a top-level list as JSON text.
pub fn to_json(records: &[PersistData]) -> CodecResult<String> {
    Ok(serde_json::to_string(records)?)
}

/// Decodes a top-level list from JSON text.
pub fn from_json(text: &str) -> CodecResult<Vec<PersistData>> {
    Ok(serde_json::from_str(text)?)
}
