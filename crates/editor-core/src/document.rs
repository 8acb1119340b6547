use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize_block, normalize_inlines};

/// Lists nest at most this many levels (depth `0..MAX_LIST_DEPTH`).
pub const MAX_LIST_DEPTH: u8 = 8;

/// A normalized, never-empty sequence of blocks.
///
/// Top-level blocks are reference counted so that a command only clones the
/// blocks it touches; every other block is shared with the input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentRepr")]
pub struct EditorDocument {
    blocks: Vec<Arc<BlockNode>>,
}

#[derive(Deserialize)]
struct DocumentRepr {
    #[serde(default)]
    blocks: Vec<BlockNode>,
}

impl From<DocumentRepr> for EditorDocument {
    fn from(value: DocumentRepr) -> Self {
        EditorDocument::from_blocks(value.blocks)
    }
}

impl Default for EditorDocument {
    fn default() -> Self {
        Self {
            blocks: vec![Arc::new(BlockNode::empty_paragraph())],
        }
    }
}

impl EditorDocument {
    /// Builds a document from arbitrary blocks, normalizing them.
    pub fn from_blocks(blocks: impl IntoIterator<Item = BlockNode>) -> Self {
        let blocks: Vec<Arc<BlockNode>> = blocks
            .into_iter()
            .filter_map(normalize_block)
            .map(Arc::new)
            .collect();
        if blocks.is_empty() {
            return Self::default();
        }
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Arc<BlockNode>] {
        &self.blocks
    }

    pub fn block(&self, ix: usize) -> Option<&BlockNode> {
        self.blocks.get(ix).map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.len() == 1
            && matches!(self.blocks[0].as_ref(), BlockNode::Paragraph { inlines } if inlines.is_empty())
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Arc<BlockNode>> {
        &mut self.blocks
    }

    /// Resolves a block path: `[block]`, extended by `[row, col, block]` for
    /// each table level.
    pub fn block_at(&self, path: &[usize]) -> Option<&BlockNode> {
        let (&first, mut rest) = path.split_first()?;
        let mut block = self.blocks.get(first)?.as_ref();
        while !rest.is_empty() {
            let [row, col, ix, tail @ ..] = rest else {
                return None;
            };
            let BlockNode::Table(table) = block else {
                return None;
            };
            block = table.cell(*row, *col)?.blocks.get(*ix)?;
            rest = tail;
        }
        Some(block)
    }

    pub(crate) fn block_at_mut(&mut self, path: &[usize]) -> Option<&mut BlockNode> {
        let (&first, mut rest) = path.split_first()?;
        let mut block = Arc::make_mut(self.blocks.get_mut(first)?);
        while !rest.is_empty() {
            let [row, col, ix, tail @ ..] = rest else {
                return None;
            };
            let BlockNode::Table(table) = block else {
                return None;
            };
            block = table
                .rows
                .get_mut(*row)?
                .get_mut(*col)?
                .blocks
                .get_mut(*ix)?;
            rest = tail;
        }
        Some(block)
    }

    /// Paths of all text and attachment blocks in document order. Table
    /// blocks are never leaves; their cells are walked instead.
    pub fn leaf_paths(&self) -> Vec<Vec<usize>> {
        fn walk(block: &BlockNode, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            let BlockNode::Table(table) = block else {
                out.push(path.clone());
                return;
            };
            for (row_ix, row) in table.rows.iter().enumerate() {
                for (col_ix, cell) in row.iter().enumerate() {
                    for (ix, child) in cell.blocks.iter().enumerate() {
                        path.extend([row_ix, col_ix, ix]);
                        walk(child, path, out);
                        path.truncate(path.len() - 3);
                    }
                }
            }
        }

        let mut out = Vec::new();
        let mut path = Vec::new();
        for (ix, block) in self.blocks.iter().enumerate() {
            path.push(ix);
            walk(block, &mut path, &mut out);
            path.pop();
        }
        out
    }

    pub fn find_attachment(&self, id: &str) -> Option<&AttachmentNode> {
        self.blocks.iter().find_map(|block| block.find_attachment(id))
    }

    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for (ix, block) in self.blocks.iter().enumerate() {
            if ix > 0 {
                out.push('\n');
            }
            out.push_str(&block.to_plain_text());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockNode {
    Paragraph {
        #[serde(default)]
        inlines: Vec<InlineNode>,
    },
    Heading {
        level: u8,
        #[serde(default)]
        inlines: Vec<InlineNode>,
    },
    ListItem {
        list_type: ListType,
        #[serde(default)]
        depth: u8,
        #[serde(default)]
        inlines: Vec<InlineNode>,
    },
    Table(TableNode),
    /// Block-level attachment. Void: owns no inline content.
    Attachment(AttachmentNode),
}

impl BlockNode {
    pub fn paragraph(inlines: Vec<InlineNode>) -> Self {
        BlockNode::Paragraph { inlines }
    }

    pub fn empty_paragraph() -> Self {
        BlockNode::Paragraph {
            inlines: Vec::new(),
        }
    }

    pub fn text_paragraph(text: impl Into<String>) -> Self {
        let mut inlines = vec![InlineNode::text(text)];
        normalize_inlines(&mut inlines);
        BlockNode::Paragraph { inlines }
    }

    pub fn inlines(&self) -> Option<&[InlineNode]> {
        match self {
            BlockNode::Paragraph { inlines }
            | BlockNode::Heading { inlines, .. }
            | BlockNode::ListItem { inlines, .. } => Some(inlines),
            BlockNode::Table(_) | BlockNode::Attachment(_) => None,
        }
    }

    pub(crate) fn inlines_mut(&mut self) -> Option<&mut Vec<InlineNode>> {
        match self {
            BlockNode::Paragraph { inlines }
            | BlockNode::Heading { inlines, .. }
            | BlockNode::ListItem { inlines, .. } => Some(inlines),
            BlockNode::Table(_) | BlockNode::Attachment(_) => None,
        }
    }

    pub fn is_text_block(&self) -> bool {
        self.inlines().is_some()
    }

    /// Length of the linear inline content; zero for void and table blocks.
    pub fn content_len(&self) -> usize {
        self.inlines().map(inline_content_len).unwrap_or(0)
    }

    /// Same block kind carrying `inlines`.
    pub(crate) fn with_inlines(&self, inlines: Vec<InlineNode>) -> Self {
        match self {
            BlockNode::Paragraph { .. } => BlockNode::Paragraph { inlines },
            BlockNode::Heading { level, .. } => BlockNode::Heading {
                level: *level,
                inlines,
            },
            BlockNode::ListItem {
                list_type, depth, ..
            } => BlockNode::ListItem {
                list_type: *list_type,
                depth: *depth,
                inlines,
            },
            BlockNode::Table(_) | BlockNode::Attachment(_) => BlockNode::Paragraph { inlines },
        }
    }

    /// Block that receives the right half when this block is split.
    pub(crate) fn split_successor(&self, inlines: Vec<InlineNode>) -> Self {
        match self {
            BlockNode::ListItem { .. } => self.with_inlines(inlines),
            _ => BlockNode::Paragraph { inlines },
        }
    }

    pub fn find_attachment(&self, id: &str) -> Option<&AttachmentNode> {
        match self {
            BlockNode::Attachment(attachment) => (attachment.id == id).then_some(attachment),
            BlockNode::Table(table) => table
                .rows
                .iter()
                .flatten()
                .flat_map(|cell| cell.blocks.iter())
                .find_map(|block| block.find_attachment(id)),
            _ => self.inlines()?.iter().find_map(|inline| match inline {
                InlineNode::Attachment(attachment) if attachment.id == id => Some(attachment),
                _ => None,
            }),
        }
    }

    pub fn to_plain_text(&self) -> String {
        match self {
            BlockNode::Table(table) => table
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| {
                            cell.blocks
                                .iter()
                                .map(BlockNode::to_plain_text)
                                .collect::<Vec<_>>()
                                .join(" ")
                        })
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            BlockNode::Attachment(attachment) => attachment.plain_text().to_string(),
            _ => {
                let mut out = String::new();
                for inline in self.inlines().unwrap_or_default() {
                    match inline {
                        InlineNode::Text(run) => out.push_str(&run.text),
                        InlineNode::Attachment(attachment) => out.push_str(attachment.plain_text()),
                    }
                }
                out
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    Unordered,
    Ordered,
}

impl ListType {
    pub fn tag(self) -> &'static str {
        match self {
            ListType::Unordered => "ul",
            ListType::Ordered => "ol",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableNode {
    /// Rectangular after normalization; every row has the same cell count.
    pub rows: Vec<Vec<Cell>>,
}

impl TableNode {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: (0..rows)
                .map(|_| (0..cols).map(|_| Cell::empty()).collect())
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row)?.get(col)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub blocks: Vec<BlockNode>,
    #[serde(default)]
    pub header: bool,
}

impl Cell {
    pub fn empty() -> Self {
        Self {
            blocks: vec![BlockNode::empty_paragraph()],
            header: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineNode {
    Text(TextRun),
    Attachment(AttachmentNode),
}

impl InlineNode {
    pub fn text(text: impl Into<String>) -> Self {
        InlineNode::Text(TextRun {
            text: text.into(),
            marks: Marks::default(),
        })
    }

    pub fn styled(text: impl Into<String>, marks: Marks) -> Self {
        InlineNode::Text(TextRun {
            text: text.into(),
            marks,
        })
    }

    /// Width in the linear content: byte length for text, one for an
    /// attachment.
    pub fn len(&self) -> usize {
        match self {
            InlineNode::Text(run) => run.text.len(),
            InlineNode::Attachment(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn inline_content_len(inlines: &[InlineNode]) -> usize {
    inlines.iter().map(InlineNode::len).sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

/// Formatting carried by a text run. Valued marks hold normalized values:
/// colors as `#rrggbb`, links as absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Marks {
    pub fn is_plain(&self) -> bool {
        *self == Marks::default()
    }

    pub fn contains(&self, mark: &InlineMark) -> bool {
        match mark {
            InlineMark::Bold => self.bold,
            InlineMark::Italic => self.italic,
            InlineMark::Underline => self.underline,
            InlineMark::Strikethrough => self.strikethrough,
            InlineMark::Color(value) => self.color.as_deref() == Some(value),
            InlineMark::Highlight(value) => self.highlight.as_deref() == Some(value),
            InlineMark::Link(value) => self.link.as_deref() == Some(value),
        }
    }

    pub fn insert(&mut self, mark: InlineMark) {
        match mark {
            InlineMark::Bold => self.bold = true,
            InlineMark::Italic => self.italic = true,
            InlineMark::Underline => self.underline = true,
            InlineMark::Strikethrough => self.strikethrough = true,
            InlineMark::Color(value) => self.color = Some(value),
            InlineMark::Highlight(value) => self.highlight = Some(value),
            InlineMark::Link(value) => self.link = Some(value),
        }
    }

    /// Removes the mark of the same kind, whatever its value.
    pub fn remove(&mut self, mark: &InlineMark) {
        match mark {
            InlineMark::Bold => self.bold = false,
            InlineMark::Italic => self.italic = false,
            InlineMark::Underline => self.underline = false,
            InlineMark::Strikethrough => self.strikethrough = false,
            InlineMark::Color(_) => self.color = None,
            InlineMark::Highlight(_) => self.highlight = None,
            InlineMark::Link(_) => self.link = None,
        }
    }

    pub fn to_vec(&self) -> Vec<InlineMark> {
        let mut out = Vec::new();
        if self.bold {
            out.push(InlineMark::Bold);
        }
        if self.italic {
            out.push(InlineMark::Italic);
        }
        if self.underline {
            out.push(InlineMark::Underline);
        }
        if self.strikethrough {
            out.push(InlineMark::Strikethrough);
        }
        if let Some(color) = &self.color {
            out.push(InlineMark::Color(color.clone()));
        }
        if let Some(color) = &self.highlight {
            out.push(InlineMark::Highlight(color.clone()));
        }
        if let Some(url) = &self.link {
            out.push(InlineMark::Link(url.clone()));
        }
        out
    }
}

impl FromIterator<InlineMark> for Marks {
    fn from_iter<T: IntoIterator<Item = InlineMark>>(iter: T) -> Self {
        let mut marks = Marks::default();
        for mark in iter {
            marks.insert(mark);
        }
        marks
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mark", content = "value", rename_all = "snake_case")]
pub enum InlineMark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Color(String),
    Highlight(String),
    Link(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentNode {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
    #[serde(default)]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub kind: AttachmentKind,
}

impl AttachmentNode {
    pub fn is_image(&self) -> bool {
        self.kind.is_image()
    }

    pub fn layout(&self) -> Option<&ImageLayout> {
        match &self.kind {
            AttachmentKind::Image(layout) => Some(layout),
            AttachmentKind::Document => None,
        }
    }

    fn plain_text(&self) -> &str {
        self.emoji.as_deref().unwrap_or(&self.filename)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image(ImageLayout),
    Document,
}

impl AttachmentKind {
    pub fn is_image(&self) -> bool {
        matches!(self, AttachmentKind::Image(_))
    }

    /// Images are recognized by an `image/*` content type; without a
    /// content type, by the presence of an `<img>`.
    pub fn derive(content_type: &str, has_img: bool) -> Self {
        let image = if content_type.is_empty() {
            has_img
        } else {
            content_type
                .get(..6)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
        };
        if image {
            AttachmentKind::Image(ImageLayout::default())
        } else {
            AttachmentKind::Document
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageLayout {
    #[serde(default)]
    pub align: ImageAlign,
    /// Side the text flows around, `None` when the image does not wrap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<WrapSide>,
    #[serde(default)]
    pub padding_px: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<ImageWidth>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl ImageAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageAlign::Left => "left",
            ImageAlign::Center => "center",
            ImageAlign::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(ImageAlign::Left),
            "center" => Some(ImageAlign::Center),
            "right" => Some(ImageAlign::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapSide {
    Left,
    Right,
}

impl WrapSide {
    pub fn as_str(self) -> &'static str {
        match self {
            WrapSide::Left => "left",
            WrapSide::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(WrapSide::Left),
            "right" => Some(WrapSide::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageWidth {
    pub value: u32,
    pub unit: WidthUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidthUnit {
    Percent,
    Pixel,
}

impl WidthUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            WidthUnit::Percent => "percent",
            WidthUnit::Pixel => "pixel",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "percent" => Some(WidthUnit::Percent),
            "pixel" => Some(WidthUnit::Pixel),
            _ => None,
        }
    }

    /// CSS suffix used in `width` declarations.
    pub fn css_suffix(self) -> &'static str {
        match self {
            WidthUnit::Percent => "%",
            WidthUnit::Pixel => "px",
        }
    }
}
