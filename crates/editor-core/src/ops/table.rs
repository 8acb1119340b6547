use crate::command::{CommandError, Placement};
use crate::document::{BlockNode, Cell, EditorDocument, TableNode};
use crate::engine::{unchanged, EditorConfig};
use crate::ops::{enclosing_table, insert_block, splice_block, Applied};
use crate::selection::{resolve_point, Point, SelectionRange};

pub(crate) fn insert_table(
    mut doc: EditorDocument,
    selection: SelectionRange,
    rows: usize,
    cols: usize,
    config: &EditorConfig,
) -> Result<Applied, CommandError> {
    if rows == 0 || cols == 0 {
        return Err(CommandError::InvalidTableSize { rows, cols });
    }
    if rows > config.max_table_rows || cols > config.max_table_cols {
        return Err(CommandError::TableTooLarge {
            rows,
            cols,
            max_rows: config.max_table_rows,
            max_cols: config.max_table_cols,
        });
    }

    let inserted = insert_block(
        &mut doc,
        &selection.focus,
        BlockNode::Table(TableNode::new(rows, cols)),
    );
    let caret = cell_point(&inserted.block, 0, 0);
    Ok(Applied::caret(doc, caret))
}

/// Innermost table around the selection focus.
struct TableTarget {
    path: Vec<usize>,
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
}

fn target(doc: &EditorDocument, selection: &SelectionRange) -> Option<TableTarget> {
    let (path, row, col) = enclosing_table(&selection.focus.path)?;
    let BlockNode::Table(table) = doc.block_at(&path)? else {
        return None;
    };
    Some(TableTarget {
        rows: table.row_count(),
        cols: table.col_count(),
        path,
        row,
        col,
    })
}

fn table_mut<'a>(doc: &'a mut EditorDocument, path: &[usize]) -> Option<&'a mut TableNode> {
    match doc.block_at_mut(path)? {
        BlockNode::Table(table) => Some(table),
        _ => None,
    }
}

fn cell_point(table_path: &[usize], row: usize, col: usize) -> Point {
    let mut path = table_path.to_vec();
    path.extend([row, col, 0]);
    Point::new(path, 0)
}

/// Caret at the start of a cell, descending into nested tables.
fn caret_in_cell(doc: EditorDocument, table_path: &[usize], row: usize, col: usize) -> Applied {
    let caret = resolve_point(&doc, &cell_point(table_path, row, col));
    Applied::caret(doc, caret)
}

/// Replaces the table by an empty paragraph.
fn degrade(mut doc: EditorDocument, table_path: &[usize]) -> Applied {
    splice_block(&mut doc, table_path, vec![BlockNode::empty_paragraph()]);
    Applied::caret(doc, Point::new(table_path.to_vec(), 0))
}

pub(crate) fn insert_row(
    mut doc: EditorDocument,
    selection: SelectionRange,
    placement: Placement,
    config: &EditorConfig,
) -> Applied {
    let Some(at) = target(&doc, &selection) else {
        return unchanged(doc, selection, "selection is not in a table");
    };
    if at.rows >= config.max_table_rows {
        return unchanged(doc, selection, "table row limit reached");
    }

    let row = match placement {
        Placement::Before => at.row,
        Placement::After => at.row + 1,
    };
    let cells = (0..at.cols).map(|_| Cell::empty()).collect();
    if let Some(table) = table_mut(&mut doc, &at.path) {
        table.rows.insert(row, cells);
    }
    caret_in_cell(doc, &at.path, row, at.col)
}

pub(crate) fn insert_column(
    mut doc: EditorDocument,
    selection: SelectionRange,
    placement: Placement,
    config: &EditorConfig,
) -> Applied {
    let Some(at) = target(&doc, &selection) else {
        return unchanged(doc, selection, "selection is not in a table");
    };
    if at.cols >= config.max_table_cols {
        return unchanged(doc, selection, "table column limit reached");
    }

    let col = match placement {
        Placement::Before => at.col,
        Placement::After => at.col + 1,
    };
    if let Some(table) = table_mut(&mut doc, &at.path) {
        for row in &mut table.rows {
            // New cells follow the header state of their row.
            let header = row.get(at.col).is_some_and(|cell| cell.header);
            row.insert(
                col,
                Cell {
                    header,
                    ..Cell::empty()
                },
            );
        }
    }
    caret_in_cell(doc, &at.path, at.row, col)
}

pub(crate) fn delete_row(mut doc: EditorDocument, selection: SelectionRange) -> Applied {
    let Some(at) = target(&doc, &selection) else {
        return unchanged(doc, selection, "selection is not in a table");
    };
    if at.rows <= 1 {
        return degrade(doc, &at.path);
    }

    if let Some(table) = table_mut(&mut doc, &at.path) {
        table.rows.remove(at.row);
    }
    caret_in_cell(doc, &at.path, at.row.min(at.rows - 2), at.col)
}

pub(crate) fn delete_column(mut doc: EditorDocument, selection: SelectionRange) -> Applied {
    let Some(at) = target(&doc, &selection) else {
        return unchanged(doc, selection, "selection is not in a table");
    };
    if at.cols <= 1 {
        return degrade(doc, &at.path);
    }

    if let Some(table) = table_mut(&mut doc, &at.path) {
        for row in &mut table.rows {
            if at.col < row.len() {
                row.remove(at.col);
            }
        }
    }
    caret_in_cell(doc, &at.path, at.row, at.col.min(at.cols - 2))
}

pub(crate) fn delete_table(doc: EditorDocument, selection: SelectionRange) -> Applied {
    let Some(at) = target(&doc, &selection) else {
        return unchanged(doc, selection, "selection is not in a table");
    };
    degrade(doc, &at.path)
}
