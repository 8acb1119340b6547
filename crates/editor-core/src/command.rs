use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::document::{ImageAlign, ImageWidth, InlineMark, ListType, WrapSide};

/// The closed set of edits understood by [`EditorEngine`](crate::EditorEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    ToggleMark {
        mark: InlineMark,
    },
    SetBlock {
        block: BlockType,
    },
    IndentList,
    OutdentList,
    InsertTable {
        rows: usize,
        cols: usize,
    },
    InsertRow {
        placement: Placement,
    },
    InsertColumn {
        placement: Placement,
    },
    DeleteRow,
    DeleteColumn,
    DeleteTable,
    InsertAttachment {
        upload: UploadResult,
    },
    InsertInlineAttachment {
        upload: UploadResult,
        #[serde(default)]
        emoji: Option<String>,
    },
    SetAttachmentLayout {
        id: String,
        patch: LayoutPatch,
    },
}

impl EditorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            EditorCommand::ToggleMark { .. } => "toggle_mark",
            EditorCommand::SetBlock { .. } => "set_block",
            EditorCommand::IndentList => "indent_list",
            EditorCommand::OutdentList => "outdent_list",
            EditorCommand::InsertTable { .. } => "insert_table",
            EditorCommand::InsertRow { .. } => "insert_row",
            EditorCommand::InsertColumn { .. } => "insert_column",
            EditorCommand::DeleteRow => "delete_row",
            EditorCommand::DeleteColumn => "delete_column",
            EditorCommand::DeleteTable => "delete_table",
            EditorCommand::InsertAttachment { .. } => "insert_attachment",
            EditorCommand::InsertInlineAttachment { .. } => "insert_inline_attachment",
            EditorCommand::SetAttachmentLayout { .. } => "set_attachment_layout",
        }
    }

    pub fn toggle(mark: InlineMark) -> Self {
        EditorCommand::ToggleMark { mark }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    Heading { level: u8 },
    ListItem { list_type: ListType },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Before,
    #[default]
    After,
}

/// Metadata handed over by a host upload adapter once a file is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    pub filename: String,
    pub filesize: u64,
    pub content_type: String,
}

/// Partial update of an image layout. `None` leaves a field unchanged;
/// `wrap` and `width` take `Some(None)` to clear.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayoutPatch {
    #[serde(default)]
    pub align: Option<ImageAlign>,
    #[serde(default, deserialize_with = "double_option")]
    pub wrap: Option<Option<WrapSide>>,
    #[serde(default)]
    pub padding_px: Option<u32>,
    #[serde(default, deserialize_with = "double_option")]
    pub width: Option<Option<ImageWidth>>,
}

/// Maps an explicit `null` to `Some(None)` so it can clear a field.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

impl LayoutPatch {
    pub fn is_empty(&self) -> bool {
        *self == LayoutPatch::default()
    }
}

/// Malformed command payloads. Selections that do not fit the command are
/// clamped or ignored instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("heading level must be between 1 and 6, got {0}")]
    InvalidHeadingLevel(u8),
    #[error("table needs at least one row and one column, got {rows}x{cols}")]
    InvalidTableSize { rows: usize, cols: usize },
    #[error("table of {rows}x{cols} exceeds the {max_rows}x{max_cols} limit")]
    TableTooLarge {
        rows: usize,
        cols: usize,
        max_rows: usize,
        max_cols: usize,
    },
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("url is not http, https or blob: {0}")]
    UnsafeUrl(String),
    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}
