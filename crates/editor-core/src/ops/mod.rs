//! Command implementations. Every op receives a clone of the input document
//! (cheap, blocks are shared) plus a resolved selection, and returns the new
//! document with the selection to report.

use std::sync::Arc;

use serde::Serialize;

use crate::document::{BlockNode, EditorDocument, InlineNode};
use crate::normalize::normalize_inlines;
use crate::selection::{Point, SelectionRange};

pub(crate) mod attachment;
pub(crate) mod blocks;
pub(crate) mod marks;
pub(crate) mod table;

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied {
    pub document: EditorDocument,
    pub selection: SelectionRange,
}

impl Applied {
    pub(crate) fn new(document: EditorDocument, selection: SelectionRange) -> Self {
        Self {
            document,
            selection,
        }
    }

    pub(crate) fn caret(document: EditorDocument, point: Point) -> Self {
        Self::new(document, SelectionRange::collapsed(point))
    }
}

/// Leaf paths between two resolved points, inclusive.
pub(crate) fn leaves_in_range(doc: &EditorDocument, start: &Point, end: &Point) -> Vec<Vec<usize>> {
    doc.leaf_paths()
        .into_iter()
        .filter(|path| *path >= start.path && *path <= end.path)
        .collect()
}

/// Local `[from, to)` offsets of `path` within the ordered range.
pub(crate) fn local_span(path: &[usize], len: usize, start: &Point, end: &Point) -> (usize, usize) {
    let from = if path == start.path.as_slice() {
        start.offset
    } else {
        0
    };
    let to = if path == end.path.as_slice() {
        end.offset
    } else {
        len
    };
    (from.min(len), to.min(len))
}

/// Innermost table around a leaf path: `(table_path, row, col)`.
pub(crate) fn enclosing_table(path: &[usize]) -> Option<(Vec<usize>, usize, usize)> {
    if path.len() < 4 {
        return None;
    }
    let split = path.len() - 3;
    Some((path[..split].to_vec(), path[split], path[split + 1]))
}

/// Number of blocks in the container holding `path`.
pub(crate) fn container_len(doc: &EditorDocument, path: &[usize]) -> usize {
    match enclosing_table(path) {
        None => doc.len(),
        Some((table_path, row, col)) => match doc.block_at(&table_path) {
            Some(BlockNode::Table(table)) => table
                .cell(row, col)
                .map(|cell| cell.blocks.len())
                .unwrap_or(0),
            _ => 0,
        },
    }
}

/// Replaces the block at `path` by `replacement` inside its container.
pub(crate) fn splice_block(doc: &mut EditorDocument, path: &[usize], replacement: Vec<BlockNode>) {
    let Some((&ix, _)) = path.split_last() else {
        return;
    };
    match enclosing_table(path) {
        None => {
            let blocks = doc.blocks_mut();
            if ix < blocks.len() {
                blocks.splice(ix..=ix, replacement.into_iter().map(Arc::new));
            }
        }
        Some((table_path, row, col)) => {
            let Some(BlockNode::Table(table)) = doc.block_at_mut(&table_path) else {
                return;
            };
            let Some(cell) = table.rows.get_mut(row).and_then(|r| r.get_mut(col)) else {
                return;
            };
            if ix < cell.blocks.len() {
                cell.blocks.splice(ix..=ix, replacement);
            }
        }
    }
}

/// Splits inline content at a linear offset, cutting a text run in two when
/// needed.
pub(crate) fn split_inlines(inlines: &[InlineNode], offset: usize) -> (Vec<InlineNode>, Vec<InlineNode>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut cursor = 0usize;
    for inline in inlines {
        let len = inline.len();
        if cursor + len <= offset {
            left.push(inline.clone());
        } else if cursor >= offset {
            right.push(inline.clone());
        } else if let InlineNode::Text(run) = inline {
            let at = offset - cursor;
            left.push(InlineNode::styled(&run.text[..at], run.marks.clone()));
            right.push(InlineNode::styled(&run.text[at..], run.marks.clone()));
        } else {
            right.push(inline.clone());
        }
        cursor += len;
    }
    normalize_inlines(&mut left);
    normalize_inlines(&mut right);
    (left, right)
}

/// Where a block insertion landed.
pub(crate) struct Inserted {
    pub block: Vec<usize>,
    /// The block right after the inserted one; always exists.
    pub next: Vec<usize>,
}

/// Inserts `block` at a resolved point.
///
/// At offset zero the block goes before the host. Otherwise the host is
/// split and the block goes between both halves; when the split leaves no
/// right half and nothing follows, an empty paragraph is appended so the
/// caret has somewhere to go.
pub(crate) fn insert_block(doc: &mut EditorDocument, at: &Point, block: BlockNode) -> Inserted {
    let Some((&ix, container)) = at.path.split_last() else {
        return insert_block(doc, &Point::start(), block);
    };
    let Some(host) = doc.block_at(&at.path).cloned() else {
        return insert_block(doc, &Point::start(), block);
    };
    let followed = ix + 1 < container_len(doc, &at.path);
    let path_with = |ix: usize| {
        let mut path = container.to_vec();
        path.push(ix);
        path
    };

    if at.offset == 0 || !host.is_text_block() {
        splice_block(doc, &at.path, vec![block, host]);
        return Inserted {
            block: path_with(ix),
            next: path_with(ix + 1),
        };
    }

    let (left, right) = split_inlines(host.inlines().unwrap_or_default(), at.offset);
    let mut replacement = vec![host.with_inlines(left), block];
    if !right.is_empty() {
        replacement.push(host.split_successor(right));
    } else if !followed {
        replacement.push(BlockNode::empty_paragraph());
    }
    splice_block(doc, &at.path, replacement);
    Inserted {
        block: path_with(ix + 1),
        next: path_with(ix + 2),
    }
}
