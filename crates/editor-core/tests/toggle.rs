use berry_editor_core::{
    document_from_html, document_to_html, CommandError, EditorCommand, EditorEngine, InlineMark,
    InlineNode, Marks, Point, SelectionRange,
};

fn bold() -> EditorCommand {
    EditorCommand::toggle(InlineMark::Bold)
}

#[test]
fn bold_wraps_the_selected_word() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>alpha beta gamma</p>");

    let applied = engine
        .apply(&doc, &SelectionRange::in_block(0, 6, 10), bold())
        .unwrap();

    assert_eq!(
        document_to_html(&applied.document),
        "<p>alpha <strong>beta</strong> gamma</p>"
    );
    assert_eq!(applied.selection, SelectionRange::in_block(0, 6, 10));
}

#[test]
fn toggling_twice_restores_the_runs() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>alpha <em>beta</em> gamma</p>");
    let selection = SelectionRange::in_block(0, 3, 8);

    let once = engine.apply(&doc, &selection, bold()).unwrap();
    assert_ne!(once.document, doc);

    let twice = engine.apply(&once.document, &once.selection, bold()).unwrap();
    assert_eq!(twice.document, doc);
}

#[test]
fn partially_marked_selection_is_marked_everywhere() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p><strong>ab</strong>cd</p>");

    let applied = engine
        .apply(&doc, &SelectionRange::in_block(0, 1, 3), bold())
        .unwrap();

    assert_eq!(
        document_to_html(&applied.document),
        "<p><strong>abc</strong>d</p>"
    );
}

#[test]
fn collapsed_selection_is_a_no_op() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>alpha</p>");

    let applied = engine
        .apply(&doc, &SelectionRange::in_block(0, 2, 2), bold())
        .unwrap();

    assert_eq!(applied.document, doc);
}

#[test]
fn backwards_selection_across_blocks() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>one</p><p>two</p>");
    let selection = SelectionRange::new(Point::new(vec![1], 2), Point::new(vec![0], 1));

    let applied = engine.apply(&doc, &selection, bold()).unwrap();

    assert_eq!(
        document_to_html(&applied.document),
        "<p>o<strong>ne</strong></p><p><strong>tw</strong>o</p>"
    );
    assert_eq!(
        applied.selection,
        SelectionRange::new(Point::new(vec![0], 1), Point::new(vec![1], 2))
    );
}

#[test]
fn out_of_range_focus_is_clamped() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>abc</p>");

    let applied = engine
        .apply(&doc, &SelectionRange::in_block(0, 0, 100), bold())
        .unwrap();

    assert_eq!(
        document_to_html(&applied.document),
        "<p><strong>abc</strong></p>"
    );
    assert_eq!(applied.selection.focus, Point::new(vec![0], 3));
}

#[test]
fn colors_are_normalized() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>alpha beta gamma</p>");
    let selection = SelectionRange::in_block(0, 6, 10);

    let colored = engine
        .apply(
            &doc,
            &selection,
            EditorCommand::toggle(InlineMark::Color("#0EA5E9".into())),
        )
        .unwrap();
    assert_eq!(
        document_to_html(&colored.document),
        "<p>alpha <span style=\"color:#0ea5e9\">beta</span> gamma</p>"
    );

    let highlighted = engine
        .apply(
            &colored.document,
            &selection,
            EditorCommand::toggle(InlineMark::Highlight("rgb(225, 29, 72)".into())),
        )
        .unwrap();
    let Some(InlineNode::Text(run)) = highlighted
        .document
        .block(0)
        .and_then(|block| block.inlines())
        .and_then(|inlines| inlines.get(1))
    else {
        panic!("expected a text run");
    };
    assert_eq!(
        run.marks,
        Marks {
            color: Some("#0ea5e9".into()),
            highlight: Some("#e11d48".into()),
            ..Marks::default()
        }
    );
    assert!(document_to_html(&highlighted.document)
        .contains("<span style=\"color:#0ea5e9; background-color:#e11d48\">beta</span>"));
}

#[test]
fn a_different_color_replaces_the_existing_one() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p><span style=\"color:#ff0000\">red</span></p>");

    let applied = engine
        .apply(
            &doc,
            &SelectionRange::in_block(0, 0, 3),
            EditorCommand::toggle(InlineMark::Color("#00f".into())),
        )
        .unwrap();

    assert_eq!(
        document_to_html(&applied.document),
        "<p><span style=\"color:#0000ff\">red</span></p>"
    );
}

#[test]
fn links_wrap_other_marks() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p><strong>docs</strong></p>");

    let applied = engine
        .apply(
            &doc,
            &SelectionRange::in_block(0, 0, 4),
            EditorCommand::toggle(InlineMark::Link("https://example.com/docs".into())),
        )
        .unwrap();

    assert_eq!(
        document_to_html(&applied.document),
        "<p><a href=\"https://example.com/docs\"><strong>docs</strong></a></p>"
    );
}

#[test]
fn malformed_mark_values_are_errors() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>abc</p>");
    let selection = SelectionRange::in_block(0, 0, 3);

    assert_eq!(
        engine.apply(
            &doc,
            &selection,
            EditorCommand::toggle(InlineMark::Color("#12".into()))
        ),
        Err(CommandError::InvalidColor("#12".into()))
    );
    assert_eq!(
        engine.apply(
            &doc,
            &selection,
            EditorCommand::toggle(InlineMark::Link("javascript:alert(1)".into()))
        ),
        Err(CommandError::UnsafeUrl("javascript:alert(1)".into()))
    );
}

#[test]
fn toggle_reaches_text_inside_table_cells() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<table><tr><td><p>cell</p></td></tr></table>");
    let selection = SelectionRange::new(
        Point::new(vec![0, 0, 0, 0], 0),
        Point::new(vec![0, 0, 0, 0], 4),
    );

    let applied = engine
        .apply(&doc, &selection, EditorCommand::toggle(InlineMark::Italic))
        .unwrap();

    assert!(document_to_html(&applied.document).contains("<td><p><em>cell</em></p></td>"));
}
