//! Thin command handlers between host UI events and the tree service.
//!
//! # Responsibility
//! - Gather input from host collaborators, then call one service operation.
//!
//! # Invariants
//! - Cancelled or rejected input never reaches the service.
//! - Each handler performs at most one mutating service call.

use crate::controller::collaborators::{EditorContext, PromptProvider, ReferenceLocator};
use crate::controller::color::{color_choices, normalize_custom_color, parse_color_choice, ColorChoice};
use crate::decoration::surface::RenderSurface;
use crate::model::location::{Location, TextRange};
use crate::model::node::{ContainerDraft, NodeDraft, NodeId};
use crate::repo::tree_store::TreeStore;
use crate::service::tree_service::{Selection, TagTreeService, TreeServiceResult};
use log::debug;

const NAME_PROMPT: &str = "Enter folder name";
const CUSTOM_COLOR_PROMPT: &str = "Write a color in #xxxxxx format";
const INVALID_COLOR_MESSAGE: &str = "Invalid color format!";

/// Why a command refused user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The locator found no references for the symbol.
    NoReferences,
    /// The cursor is not on a word.
    NoWordAtCursor,
    /// Custom color did not match the hex format.
    InvalidColor(String),
    /// Picker returned an entry that is not offered.
    UnknownChoice(String),
}

/// Result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The service applied a mutation affecting this node.
    Applied(NodeId),
    /// A reference was selected; the host should open this location.
    Navigate(Location),
    /// The user dismissed a prompt.
    Cancelled,
    /// Input was rejected; nothing changed.
    Rejected(RejectReason),
}

/// Command layer bound to one tree.
pub struct TreeController<'a, S: TreeStore, D: RenderSurface> {
    tree: &'a mut TagTreeService<S, D>,
}

impl<'a, S: TreeStore, D: RenderSurface> TreeController<'a, S, D> {
    pub fn new(tree: &'a mut TagTreeService<S, D>) -> Self {
        Self { tree }
    }

    /// Tags every reference of the symbol under the cursor in a new
    /// colored container named after the symbol.
    pub fn color_symbol(
        &mut self,
        editor: &EditorContext,
        locator: &mut impl ReferenceLocator,
    ) -> TreeServiceResult<CommandOutcome> {
        let Some(word) = &editor.word else {
            return Ok(rejected(RejectReason::NoWordAtCursor));
        };
        let references = locator.locate_references(&editor.document_uri, editor.anchor);
        if references.is_empty() {
            return Ok(rejected(RejectReason::NoReferences));
        }

        let draft = ContainerDraft::new(word.text.clone())
            .with_anchor(Location::new(editor.document_uri.clone(), word.range))
            .with_color(self.tree.settings().symbol_color.clone())
            .with_children(references.into_iter().map(NodeDraft::reference));
        let id = self.tree.add_node(draft.into(), None)?;
        Ok(CommandOutcome::Applied(id))
    }

    /// Tags the current selection into the selected container.
    pub fn color_selection(&mut self, editor: &EditorContext) -> TreeServiceResult<CommandOutcome> {
        let location = Location::new(editor.document_uri.clone(), editor.selection);
        let id = self.tree.add_reference_to_selected(location)?;
        Ok(CommandOutcome::Applied(id))
    }

    /// Tags the cursor line into the selected container.
    pub fn color_line(&mut self, editor: &EditorContext) -> TreeServiceResult<CommandOutcome> {
        let span = self.tree.settings().line_span;
        let range = TextRange::new(editor.anchor.line_start(), editor.anchor.translate(span));
        let location = Location::new(editor.document_uri.clone(), range);
        let id = self.tree.add_reference_to_selected(location)?;
        Ok(CommandOutcome::Applied(id))
    }

    /// Picks a swatch, a custom hex color, or no color for a container.
    pub fn change_color(
        &mut self,
        node: NodeId,
        prompts: &mut impl PromptProvider,
    ) -> TreeServiceResult<CommandOutcome> {
        self.tree.forest().container(node)?;

        let Some(choice) = prompts.pick(&color_choices()) else {
            return Ok(CommandOutcome::Cancelled);
        };
        let color = match parse_color_choice(&choice) {
            None => return Ok(rejected(RejectReason::UnknownChoice(choice))),
            Some(ColorChoice::None) => None,
            Some(ColorChoice::Swatch(swatch)) => Some(swatch.value.to_string()),
            Some(ColorChoice::Custom) => {
                let Some(input) = prompts.prompt_text(CUSTOM_COLOR_PROMPT) else {
                    return Ok(CommandOutcome::Cancelled);
                };
                match normalize_custom_color(&input) {
                    Some(color) => Some(color),
                    None => {
                        prompts.show_message(INVALID_COLOR_MESSAGE);
                        return Ok(rejected(RejectReason::InvalidColor(input)));
                    }
                }
            }
        };

        self.tree.recolor(node, color)?;
        Ok(CommandOutcome::Applied(node))
    }

    /// Renames a container from prompted input.
    pub fn rename(
        &mut self,
        node: NodeId,
        prompts: &mut impl PromptProvider,
    ) -> TreeServiceResult<CommandOutcome> {
        self.tree.forest().container(node)?;
        let Some(name) = prompt_name(prompts) else {
            return Ok(CommandOutcome::Cancelled);
        };
        self.tree.rename_node(node, name)?;
        Ok(CommandOutcome::Applied(node))
    }

    /// Creates an empty container under `parent` (the root when `None`).
    pub fn add_folder(
        &mut self,
        parent: Option<NodeId>,
        prompts: &mut impl PromptProvider,
    ) -> TreeServiceResult<CommandOutcome> {
        let Some(name) = prompt_name(prompts) else {
            return Ok(CommandOutcome::Cancelled);
        };
        let id = self.tree.add_node(NodeDraft::container(name), parent)?;
        Ok(CommandOutcome::Applied(id))
    }

    pub fn remove(&mut self, node: NodeId) -> TreeServiceResult<CommandOutcome> {
        self.tree.remove_node(node)?;
        Ok(CommandOutcome::Applied(node))
    }

    pub fn select(&mut self, node: NodeId) -> TreeServiceResult<CommandOutcome> {
        match self.tree.select(node)? {
            Selection::Container(id) => Ok(CommandOutcome::Applied(id)),
            Selection::Navigate(location) => Ok(CommandOutcome::Navigate(location)),
        }
    }
}

fn prompt_name(prompts: &mut impl PromptProvider) -> Option<String> {
    prompts
        .prompt_text(NAME_PROMPT)
        .filter(|name| !name.trim().is_empty())
}

fn rejected(reason: RejectReason) -> CommandOutcome {
    debug!("event=command module=controller status=skip reason={reason:?}");
    CommandOutcome::Rejected(reason)
}
