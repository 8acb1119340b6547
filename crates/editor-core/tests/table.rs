use berry_editor_core::{
    document_from_html, document_to_html, BlockNode, CommandError, EditorCommand, EditorConfig,
    EditorDocument, EditorEngine, Placement, Point, SelectionRange, TableNode,
};

fn caret(path: Vec<usize>) -> SelectionRange {
    SelectionRange::collapsed(Point::new(path, 0))
}

fn table_at(doc: &EditorDocument, ix: usize) -> &TableNode {
    match doc.block(ix) {
        Some(BlockNode::Table(table)) => table,
        other => panic!("expected table, got {other:?}"),
    }
}

/// "a", a 2x3 table, "b".
fn doc_with_table() -> EditorDocument {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>ab</p>");
    engine
        .apply(
            &doc,
            &SelectionRange::in_block(0, 1, 1),
            EditorCommand::InsertTable { rows: 2, cols: 3 },
        )
        .unwrap()
        .document
}

#[test]
fn insert_table_splits_the_host_block() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>ab</p>");

    let applied = engine
        .apply(
            &doc,
            &SelectionRange::in_block(0, 1, 1),
            EditorCommand::InsertTable { rows: 2, cols: 3 },
        )
        .unwrap();

    let row = format!("<tr>{}</tr>", "<td><p></p></td>".repeat(3));
    assert_eq!(
        document_to_html(&applied.document),
        format!(
            "<p>a</p><table class=\"berry-table\"><tbody>{}</tbody></table><p>b</p>",
            row.repeat(2)
        )
    );
    assert_eq!(applied.selection, caret(vec![1, 0, 0, 0]));
}

#[test]
fn insert_table_at_block_start_goes_before() {
    let engine = EditorEngine::default();
    let doc = EditorDocument::default();

    let applied = engine
        .apply(
            &doc,
            &SelectionRange::in_block(0, 0, 0),
            EditorCommand::InsertTable { rows: 1, cols: 1 },
        )
        .unwrap();

    assert_eq!(applied.document.len(), 2);
    assert_eq!(table_at(&applied.document, 0).row_count(), 1);
    assert_eq!(
        applied.document.block(1),
        Some(&BlockNode::empty_paragraph())
    );
}

#[test]
fn table_size_is_validated() {
    let engine = EditorEngine::default();
    let doc = EditorDocument::default();
    let selection = SelectionRange::in_block(0, 0, 0);

    assert_eq!(
        engine.apply(&doc, &selection, EditorCommand::InsertTable { rows: 0, cols: 2 }),
        Err(CommandError::InvalidTableSize { rows: 0, cols: 2 })
    );
    assert_eq!(
        engine.apply(
            &doc,
            &selection,
            EditorCommand::InsertTable { rows: 101, cols: 2 }
        ),
        Err(CommandError::TableTooLarge {
            rows: 101,
            cols: 2,
            max_rows: 100,
            max_cols: 20,
        })
    );
}

#[test]
fn insert_row_and_column_move_the_caret() {
    let engine = EditorEngine::default();
    let doc = doc_with_table();

    let rows = engine
        .apply(
            &doc,
            &caret(vec![1, 0, 1, 0]),
            EditorCommand::InsertRow {
                placement: Placement::After,
            },
        )
        .unwrap();
    assert_eq!(table_at(&rows.document, 1).row_count(), 3);
    assert_eq!(rows.selection, caret(vec![1, 1, 1, 0]));

    let cols = engine
        .apply(
            &rows.document,
            &rows.selection,
            EditorCommand::InsertColumn {
                placement: Placement::Before,
            },
        )
        .unwrap();
    let table = table_at(&cols.document, 1);
    assert_eq!((table.row_count(), table.col_count()), (3, 4));
    assert_eq!(cols.selection, caret(vec![1, 1, 1, 0]));
}

#[test]
fn new_column_follows_the_header_row() {
    let engine = EditorEngine::default();
    let doc = document_from_html(
        "<table><tr><th><p>h</p></th></tr><tr><td><p>v</p></td></tr></table>",
    );

    let applied = engine
        .apply(
            &doc,
            &caret(vec![0, 0, 0, 0]),
            EditorCommand::InsertColumn {
                placement: Placement::After,
            },
        )
        .unwrap();

    let table = table_at(&applied.document, 0);
    assert!(table.cell(0, 1).is_some_and(|cell| cell.header));
    assert!(table.cell(1, 1).is_some_and(|cell| !cell.header));
    assert!(document_to_html(&applied.document).contains("<tr><th><p>h</p></th><th><p></p></th></tr>"));
}

#[test]
fn delete_row_keeps_the_column() {
    let engine = EditorEngine::default();
    let doc = doc_with_table();

    let applied = engine
        .apply(&doc, &caret(vec![1, 1, 2, 0]), EditorCommand::DeleteRow)
        .unwrap();

    assert_eq!(table_at(&applied.document, 1).row_count(), 1);
    assert_eq!(applied.selection, caret(vec![1, 0, 2, 0]));
}

#[test]
fn deleting_the_last_row_or_column_degrades_to_a_paragraph() {
    let engine = EditorEngine::default();
    let doc = engine
        .apply(
            &EditorDocument::default(),
            &SelectionRange::in_block(0, 0, 0),
            EditorCommand::InsertTable { rows: 1, cols: 2 },
        )
        .unwrap()
        .document;

    let rows = engine
        .apply(&doc, &caret(vec![0, 0, 1, 0]), EditorCommand::DeleteRow)
        .unwrap();
    assert_eq!(document_to_html(&rows.document), "<p></p><p></p>");
    assert_eq!(rows.selection, caret(vec![0]));

    let cols = engine
        .apply(&doc, &caret(vec![0, 0, 1, 0]), EditorCommand::DeleteColumn)
        .unwrap();
    assert_eq!(table_at(&cols.document, 0).col_count(), 1);
    assert_eq!(cols.selection, caret(vec![0, 0, 0, 0]));

    let gone = engine
        .apply(&cols.document, &cols.selection, EditorCommand::DeleteColumn)
        .unwrap();
    assert_eq!(document_to_html(&gone.document), "<p></p><p></p>");
}

#[test]
fn delete_table_replaces_it() {
    let engine = EditorEngine::default();
    let doc = doc_with_table();

    let applied = engine
        .apply(&doc, &caret(vec![1, 1, 1, 0]), EditorCommand::DeleteTable)
        .unwrap();
    assert_eq!(document_to_html(&applied.document), "<p>a</p><p></p><p>b</p>");
}

#[test]
fn table_commands_outside_a_table_do_nothing() {
    let engine = EditorEngine::default();
    let doc = doc_with_table();

    for command in [
        EditorCommand::InsertRow {
            placement: Placement::Before,
        },
        EditorCommand::DeleteColumn,
        EditorCommand::DeleteTable,
    ] {
        let applied = engine.apply(&doc, &caret(vec![0]), command).unwrap();
        assert_eq!(applied.document, doc);
    }
}

#[test]
fn row_limit_turns_insert_into_a_no_op() {
    let engine = EditorEngine::new(EditorConfig {
        max_table_rows: 2,
        ..EditorConfig::default()
    });
    let doc = doc_with_table();

    let applied = engine
        .apply(
            &doc,
            &caret(vec![1, 0, 0, 0]),
            EditorCommand::InsertRow {
                placement: Placement::After,
            },
        )
        .unwrap();
    assert_eq!(applied.document, doc);
}

#[test]
fn selection_stopping_at_a_table_enters_its_first_cell() {
    let engine = EditorEngine::default();
    let doc = doc_with_table();

    let applied = engine
        .apply(&doc, &caret(vec![1]), EditorCommand::DeleteRow)
        .unwrap();
    assert_eq!(table_at(&applied.document, 1).row_count(), 1);
}
