//! Structural invariants every [`EditorDocument`](crate::EditorDocument)
//! upholds. Normalization is idempotent.

use crate::document::{BlockNode, Cell, InlineNode, TableNode, MAX_LIST_DEPTH};

/// Normalizes a block, returning `None` when nothing of it survives (a table
/// without cells).
pub(crate) fn normalize_block(block: BlockNode) -> Option<BlockNode> {
    match block {
        BlockNode::Paragraph { mut inlines } => {
            normalize_inlines(&mut inlines);
            Some(BlockNode::Paragraph { inlines })
        }
        BlockNode::Heading { level, mut inlines } => {
            normalize_inlines(&mut inlines);
            Some(BlockNode::Heading {
                level: level.clamp(1, 6),
                inlines,
            })
        }
        BlockNode::ListItem {
            list_type,
            depth,
            mut inlines,
        } => {
            normalize_inlines(&mut inlines);
            Some(BlockNode::ListItem {
                list_type,
                depth: depth.min(MAX_LIST_DEPTH - 1),
                inlines,
            })
        }
        BlockNode::Table(table) => normalize_table(table).map(BlockNode::Table),
        BlockNode::Attachment(attachment) => Some(BlockNode::Attachment(attachment)),
    }
}

/// Drops empty text runs and merges adjacent runs with equal marks.
pub(crate) fn normalize_inlines(inlines: &mut Vec<InlineNode>) {
    let mut out: Vec<InlineNode> = Vec::with_capacity(inlines.len());
    for inline in inlines.drain(..) {
        match inline {
            InlineNode::Text(run) if run.text.is_empty() => {}
            InlineNode::Text(run) => match out.last_mut() {
                Some(InlineNode::Text(prev)) if prev.marks == run.marks => {
                    prev.text.push_str(&run.text);
                }
                _ => out.push(InlineNode::Text(run)),
            },
            attachment @ InlineNode::Attachment(_) => out.push(attachment),
        }
    }
    *inlines = out;
}

fn normalize_table(table: TableNode) -> Option<TableNode> {
    let cols = table.rows.iter().map(Vec::len).max().unwrap_or(0);
    if cols == 0 {
        return None;
    }

    let rows = table
        .rows
        .into_iter()
        .filter(|row| !row.is_empty())
        .map(|row| {
            let mut cells: Vec<Cell> = row.into_iter().map(normalize_cell).collect();
            cells.resize_with(cols, Cell::empty);
            cells
        })
        .collect();
    Some(TableNode { rows })
}

fn normalize_cell(cell: Cell) -> Cell {
    let mut blocks: Vec<BlockNode> = cell.blocks.into_iter().filter_map(normalize_block).collect();
    if blocks.is_empty() {
        blocks.push(BlockNode::empty_paragraph());
    }
    Cell {
        blocks,
        header: cell.header,
    }
}
