use berry_editor_core::{
    document_from_html, document_to_html, EditorCommand, EditorEngine, InlineNode, Point,
    SelectionRange, UploadResult,
};

fn smile() -> UploadResult {
    UploadResult {
        id: "emoji-smile".into(),
        url: "https://cdn.example.com/smile.png".into(),
        preview_url: None,
        filename: "smile.png".into(),
        filesize: 120,
        content_type: "image/png".into(),
    }
}

fn insert_emoji(offset: usize, html: &str) -> berry_editor_core::Applied {
    EditorEngine::default()
        .apply(
            &document_from_html(html),
            &SelectionRange::in_block(0, offset, offset),
            EditorCommand::InsertInlineAttachment {
                upload: smile(),
                emoji: Some("😀".into()),
            },
        )
        .unwrap()
}

#[test]
fn emoji_is_inserted_inline_at_the_caret() {
    let applied = insert_emoji(2, "<p>hi there</p>");

    let inlines = applied.document.block(0).and_then(|b| b.inlines()).unwrap();
    assert_eq!(inlines.len(), 3);
    assert_eq!(inlines[0], InlineNode::text("hi"));
    assert!(matches!(
        &inlines[1],
        InlineNode::Attachment(a) if a.emoji.as_deref() == Some("😀") && a.id == "emoji-smile"
    ));
    assert_eq!(inlines[2], InlineNode::text(" there"));
    assert_eq!(
        applied.selection,
        SelectionRange::collapsed(Point::new(vec![0], 3))
    );
}

#[test]
fn emoji_serializes_as_img_with_metadata() {
    let applied = insert_emoji(2, "<p>hi</p>");

    assert_eq!(
        document_to_html(&applied.document),
        "<p>hi<img alt=\"😀\" class=\"berry-emoji\" data-berry-attachment-id=\"emoji-smile\" \
         data-berry-content-type=\"image/png\" data-berry-emoji=\"😀\" \
         data-berry-filename=\"smile.png\" data-berry-filesize=\"120\" \
         data-berry-url=\"https://cdn.example.com/smile.png\" \
         src=\"https://cdn.example.com/smile.png\"></p>"
    );
}

#[test]
fn emoji_counts_as_one_offset_unit() {
    let engine = EditorEngine::default();
    let applied = insert_emoji(2, "<p>hi there</p>");

    // "hi" + emoji + " t"
    let bolded = engine
        .apply(
            &applied.document,
            &SelectionRange::in_block(0, 3, 5),
            EditorCommand::toggle(berry_editor_core::InlineMark::Bold),
        )
        .unwrap();
    assert!(document_to_html(&bolded.document).ends_with("><strong> t</strong>here</p>"));
}

#[test]
fn emoji_needs_a_text_block() {
    let engine = EditorEngine::default();
    let doc = document_from_html(
        "<figure data-berry-attachment-id=\"x\" data-berry-url=\"https://example.com/f.png\"></figure>",
    );

    let applied = engine
        .apply(
            &doc,
            &SelectionRange::in_block(0, 0, 0),
            EditorCommand::InsertInlineAttachment {
                upload: smile(),
                emoji: Some("😀".into()),
            },
        )
        .unwrap();
    assert_eq!(applied.document, doc);
}

#[test]
fn emoji_survives_a_round_trip() {
    let applied = insert_emoji(0, "<p><strong>bold</strong> text</p>");
    let html = document_to_html(&applied.document);
    assert_eq!(document_from_html(&html), applied.document);
}
