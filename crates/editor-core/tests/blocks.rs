use berry_editor_core::{
    document_from_html, document_to_html, BlockNode, BlockType, CommandError, EditorCommand,
    EditorConfig, EditorEngine, ListType, Point, SelectionRange,
};

fn set_block(block: BlockType) -> EditorCommand {
    EditorCommand::SetBlock { block }
}

#[test]
fn heading_keeps_inline_content() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>Title <em>here</em></p><p>body</p>");

    let applied = engine
        .apply(
            &doc,
            &SelectionRange::in_block(0, 0, 0),
            set_block(BlockType::Heading { level: 2 }),
        )
        .unwrap();

    assert_eq!(
        document_to_html(&applied.document),
        "<h2>Title <em>here</em></h2><p>body</p>"
    );
    assert_eq!(applied.document.block(1), doc.block(1));
}

#[test]
fn heading_level_outside_range_is_rejected() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>x</p>");

    for level in [0, 7] {
        assert_eq!(
            engine.apply(
                &doc,
                &SelectionRange::in_block(0, 0, 0),
                set_block(BlockType::Heading { level })
            ),
            Err(CommandError::InvalidHeadingLevel(level))
        );
    }
}

#[test]
fn block_transform_covers_every_selected_block() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<h1>one</h1><p>two</p><p>three</p>");
    let selection = SelectionRange::new(Point::new(vec![0], 1), Point::new(vec![1], 0));

    let applied = engine
        .apply(
            &doc,
            &selection,
            set_block(BlockType::ListItem {
                list_type: ListType::Ordered,
            }),
        )
        .unwrap();

    assert_eq!(
        document_to_html(&applied.document),
        "<ol><li>one</li><li>two</li></ol><p>three</p>"
    );
}

#[test]
fn changing_list_type_keeps_depth() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<ul><li>a<ul><li>b</li></ul></li></ul>");

    let applied = engine
        .apply(
            &doc,
            &SelectionRange::in_block(1, 0, 0),
            set_block(BlockType::ListItem {
                list_type: ListType::Ordered,
            }),
        )
        .unwrap();

    assert_eq!(
        applied.document.block(1),
        Some(&BlockNode::ListItem {
            list_type: ListType::Ordered,
            depth: 1,
            inlines: doc.block(1).and_then(|b| b.inlines()).unwrap().to_vec(),
        })
    );
    assert_eq!(
        document_to_html(&applied.document),
        "<ul><li>a<ol><li>b</li></ol></li></ul>"
    );
}

#[test]
fn set_block_on_an_attachment_is_a_no_op() {
    let engine = EditorEngine::default();
    let doc = document_from_html(
        "<figure data-berry-attachment-id=\"x\" data-berry-url=\"https://example.com/file.png\"></figure>",
    );
    assert!(matches!(doc.block(0), Some(BlockNode::Attachment(_))));

    let applied = engine
        .apply(
            &doc,
            &SelectionRange::in_block(0, 0, 0),
            set_block(BlockType::Paragraph),
        )
        .unwrap();
    assert_eq!(applied.document, doc);
}

#[test]
fn indent_nests_under_the_previous_item() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<ul><li>a</li><li>b</li></ul>");

    let applied = engine
        .apply(&doc, &SelectionRange::in_block(1, 0, 0), EditorCommand::IndentList)
        .unwrap();

    assert_eq!(
        document_to_html(&applied.document),
        "<ul><li>a<ul><li>b</li></ul></li></ul>"
    );

    let back = engine
        .apply(
            &applied.document,
            &applied.selection,
            EditorCommand::OutdentList,
        )
        .unwrap();
    assert_eq!(back.document, doc);
}

#[test]
fn outdent_at_top_level_leaves_the_list() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<ul><li>a</li><li>b</li></ul>");

    let applied = engine
        .apply(&doc, &SelectionRange::in_block(0, 0, 0), EditorCommand::OutdentList)
        .unwrap();

    assert_eq!(
        document_to_html(&applied.document),
        "<p>a</p><ul><li>b</li></ul>"
    );
}

#[test]
fn indent_stops_at_the_configured_depth() {
    let engine = EditorEngine::new(EditorConfig {
        max_list_depth: 2,
        ..EditorConfig::default()
    });
    let doc = document_from_html("<ul><li>a</li></ul>");
    let selection = SelectionRange::in_block(0, 0, 0);

    let once = engine
        .apply(&doc, &selection, EditorCommand::IndentList)
        .unwrap();
    let twice = engine
        .apply(&once.document, &selection, EditorCommand::IndentList)
        .unwrap();

    assert!(matches!(
        twice.document.block(0),
        Some(BlockNode::ListItem { depth: 1, .. })
    ));
    assert_eq!(twice.document, once.document);
}

#[test]
fn indent_ignores_paragraphs() {
    let engine = EditorEngine::default();
    let doc = document_from_html("<p>a</p>");

    let applied = engine
        .apply(&doc, &SelectionRange::in_block(0, 0, 1), EditorCommand::IndentList)
        .unwrap();
    assert_eq!(applied.document, doc);
}
