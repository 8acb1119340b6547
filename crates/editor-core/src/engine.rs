use serde::{Deserialize, Serialize};

use crate::command::{CommandError, EditorCommand};
use crate::document::{EditorDocument, MAX_LIST_DEPTH};
use crate::ops::{attachment, blocks, marks, table, Applied};
use crate::selection::SelectionRange;

/// Engine limits. Zero fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Number of list levels available to indent, at most 8.
    pub max_list_depth: u8,
    pub max_table_rows: usize,
    pub max_table_cols: usize,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_list_depth == 0 || self.max_list_depth > MAX_LIST_DEPTH {
            self.max_list_depth = MAX_LIST_DEPTH;
        }
        if self.max_table_rows == 0 {
            self.max_table_rows = 100;
        }
        if self.max_table_cols == 0 {
            self.max_table_cols = 20;
        }
        self
    }
}

/// Applies [`EditorCommand`]s to immutable documents.
///
/// `apply` never mutates its input. Selections are clamped into the document
/// first, and commands that do not fit the selection return the document
/// unchanged. Only malformed payloads produce a [`CommandError`].
#[derive(Debug, Clone)]
pub struct EditorEngine {
    config: EditorConfig,
}

impl Default for EditorEngine {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorEngine {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config: config.with_defaults(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn apply(
        &self,
        document: &EditorDocument,
        selection: &SelectionRange,
        command: EditorCommand,
    ) -> Result<Applied, CommandError> {
        let selection = selection.resolve(document);
        tracing::trace!(
            target: "berry::engine",
            command = command.name(),
            anchor = ?selection.anchor,
            focus = ?selection.focus,
            "applying command"
        );

        let doc = document.clone();
        match command {
            EditorCommand::ToggleMark { mark } => marks::toggle_mark(doc, selection, mark),
            EditorCommand::SetBlock { block } => blocks::set_block(doc, selection, block),
            EditorCommand::IndentList => Ok(blocks::change_list_depth(
                doc,
                selection,
                1,
                self.config.max_list_depth,
            )),
            EditorCommand::OutdentList => Ok(blocks::change_list_depth(
                doc,
                selection,
                -1,
                self.config.max_list_depth,
            )),
            EditorCommand::InsertTable { rows, cols } => {
                table::insert_table(doc, selection, rows, cols, &self.config)
            }
            EditorCommand::InsertRow { placement } => {
                Ok(table::insert_row(doc, selection, placement, &self.config))
            }
            EditorCommand::InsertColumn { placement } => {
                Ok(table::insert_column(doc, selection, placement, &self.config))
            }
            EditorCommand::DeleteRow => Ok(table::delete_row(doc, selection)),
            EditorCommand::DeleteColumn => Ok(table::delete_column(doc, selection)),
            EditorCommand::DeleteTable => Ok(table::delete_table(doc, selection)),
            EditorCommand::InsertAttachment { upload } => {
                attachment::insert_attachment(doc, selection, upload)
            }
            EditorCommand::InsertInlineAttachment { upload, emoji } => {
                attachment::insert_inline_attachment(doc, selection, upload, emoji)
            }
            EditorCommand::SetAttachmentLayout { id, patch } => {
                attachment::set_layout(doc, selection, &id, patch)
            }
        }
    }
}

pub(crate) fn unchanged(doc: EditorDocument, selection: SelectionRange, reason: &str) -> Applied {
    tracing::debug!(target: "berry::engine", reason, "command left document unchanged");
    Applied::new(doc, selection)
}
