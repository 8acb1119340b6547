//! Mapping between sanitized HTML and [`EditorDocument`].
//!
//! Reading always goes through the sanitizer. Writing emits only markup the
//! sanitizer keeps unchanged, so `document_from_html(document_to_html(d))`
//! returns `d` for any document the mapper or the engine produced.

mod read;
mod write;

pub use read::document_from_html;
pub use write::document_to_html;

use crate::document::EditorDocument;

/// The canonical minimal document: one empty paragraph.
pub fn create_empty_document() -> EditorDocument {
    EditorDocument::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockNode, InlineNode, ListType, Marks};

    #[test]
    fn empty_document_serializes_to_empty_paragraph() {
        assert_eq!(document_to_html(&create_empty_document()), "<p></p>");
        assert_eq!(document_from_html(""), create_empty_document());
    }

    #[test]
    fn loose_text_becomes_paragraph() {
        let doc = document_from_html("hello <b>world</b>\n<p>next</p>\n");
        let bold = Marks {
            bold: true,
            ..Marks::default()
        };
        assert_eq!(
            doc.block(0),
            Some(&BlockNode::paragraph(vec![
                InlineNode::text("hello "),
                InlineNode::styled("world", bold),
            ]))
        );
        assert_eq!(doc.block(1), Some(&BlockNode::text_paragraph("next")));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn nested_lists_read_one_level_deeper() {
        let doc = document_from_html("<ul><li>a<ol><li>b</li></ol></li><li>c</li></ul>");
        let depths: Vec<(ListType, u8)> = doc
            .blocks()
            .iter()
            .filter_map(|block| match block.as_ref() {
                BlockNode::ListItem {
                    list_type, depth, ..
                } => Some((*list_type, *depth)),
                _ => None,
            })
            .collect();
        assert_eq!(
            depths,
            vec![
                (ListType::Unordered, 0),
                (ListType::Ordered, 1),
                (ListType::Unordered, 0),
            ]
        );
    }
}
