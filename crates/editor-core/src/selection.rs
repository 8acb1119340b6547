use serde::{Deserialize, Serialize};

use crate::document::{BlockNode, EditorDocument, InlineNode};

/// A position in the document.
///
/// `path` addresses a leaf block (`[block]`, extended by `[row, col, block]`
/// per table level). `offset` is a byte offset into the block's linear inline
/// content, where an inline attachment occupies one unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }

    pub fn start() -> Self {
        Self::new(vec![0], 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub anchor: Point,
    pub focus: Point,
}

impl SelectionRange {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    /// Span inside a single top-level block.
    pub fn in_block(block: usize, start: usize, end: usize) -> Self {
        Self::new(Point::new(vec![block], start), Point::new(vec![block], end))
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// `(start, end)` in document order.
    pub fn ordered(&self) -> (Point, Point) {
        if self.focus < self.anchor {
            (self.focus.clone(), self.anchor.clone())
        } else {
            (self.anchor.clone(), self.focus.clone())
        }
    }

    /// Clamps both points into `doc`.
    pub fn resolve(&self, doc: &EditorDocument) -> SelectionRange {
        SelectionRange {
            anchor: resolve_point(doc, &self.anchor),
            focus: resolve_point(doc, &self.focus),
        }
    }
}

/// Clamps a point onto an existing leaf block and a valid offset.
///
/// Out-of-range indices are clamped, a path that stops at a table descends
/// into its first cell, and a path that continues past a leaf is truncated.
pub fn resolve_point(doc: &EditorDocument, point: &Point) -> Point {
    let requested = point.path.first().copied().unwrap_or(0);
    let ix = requested.min(doc.len().saturating_sub(1));
    let Some(block) = doc.block(ix) else {
        return Point::start();
    };

    let mut path = vec![ix];
    // A clamped index points past the end, so the request lands at the end
    // of the document.
    let offset = if ix == requested {
        resolve_in_block(block, &point.path[1.min(point.path.len())..], point.offset, &mut path)
    } else {
        resolve_end(block, &mut path)
    };
    Point::new(path, offset)
}

fn resolve_in_block(block: &BlockNode, rest: &[usize], offset: usize, path: &mut Vec<usize>) -> usize {
    let BlockNode::Table(table) = block else {
        return block
            .inlines()
            .map(|inlines| clamp_offset(inlines, offset))
            .unwrap_or(0);
    };

    let (row, col, ix, tail, offset) = match rest {
        [row, col, ix, tail @ ..] => (*row, *col, *ix, tail, offset),
        _ => (0, 0, 0, &[][..], 0),
    };
    let row = row.min(table.row_count().saturating_sub(1));
    let col = col.min(table.col_count().saturating_sub(1));
    let Some(cell) = table.cell(row, col) else {
        return 0;
    };
    let ix = ix.min(cell.blocks.len().saturating_sub(1));
    let Some(child) = cell.blocks.get(ix) else {
        return 0;
    };
    path.extend([row, col, ix]);
    resolve_in_block(child, tail, offset, path)
}

fn resolve_end(block: &BlockNode, path: &mut Vec<usize>) -> usize {
    let BlockNode::Table(table) = block else {
        return block.content_len();
    };
    let row = table.row_count().saturating_sub(1);
    let col = table.col_count().saturating_sub(1);
    let Some(cell) = table.cell(row, col) else {
        return 0;
    };
    let ix = cell.blocks.len().saturating_sub(1);
    let Some(child) = cell.blocks.get(ix) else {
        return 0;
    };
    path.extend([row, col, ix]);
    resolve_end(child, path)
}

/// Clamps `offset` to the content length and onto a char boundary of the
/// run it falls into.
pub fn clamp_offset(inlines: &[InlineNode], offset: usize) -> usize {
    let mut cursor = 0usize;
    for inline in inlines {
        let len = inline.len();
        if offset < cursor + len {
            if let InlineNode::Text(run) = inline {
                let mut local = offset - cursor;
                while local > 0 && !run.text.is_char_boundary(local) {
                    local -= 1;
                }
                return cursor + local;
            }
            return offset.max(cursor);
        }
        cursor += len;
    }
    cursor
}
