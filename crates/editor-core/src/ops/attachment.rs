use std::sync::Arc;

use berry_html::policy::is_mime_type;
use berry_html::{is_safe_url, PolicyConfig};

use crate::command::{CommandError, LayoutPatch, UploadResult};
use crate::document::{
    AttachmentKind, AttachmentNode, BlockNode, EditorDocument, ImageLayout, InlineNode, WidthUnit,
};
use crate::engine::unchanged;
use crate::normalize::normalize_inlines;
use crate::ops::{insert_block, split_inlines, Applied};
use crate::selection::{resolve_point, Point, SelectionRange};

const MAX_ID_LEN: usize = 256;
const MAX_FILENAME_LEN: usize = 1024;
const MAX_EMOJI_LEN: usize = 32;

/// Validates an upload against the same rules the sanitizer applies to the
/// attributes it turns into.
pub(crate) fn attachment_from_upload(
    upload: UploadResult,
    emoji: Option<String>,
) -> Result<AttachmentNode, CommandError> {
    if upload.id.is_empty() || upload.id.chars().count() > MAX_ID_LEN {
        return Err(CommandError::InvalidAttachment(format!(
            "id must be 1 to {MAX_ID_LEN} characters"
        )));
    }
    if !is_safe_url(&upload.url) {
        return Err(CommandError::UnsafeUrl(upload.url));
    }
    if let Some(preview) = &upload.preview_url {
        if !is_safe_url(preview) {
            return Err(CommandError::UnsafeUrl(preview.clone()));
        }
    }
    if upload.filename.chars().count() > MAX_FILENAME_LEN {
        return Err(CommandError::InvalidAttachment(format!(
            "filename longer than {MAX_FILENAME_LEN} characters"
        )));
    }
    if !is_mime_type(&upload.content_type) {
        return Err(CommandError::InvalidAttachment(format!(
            "content type {:?} is not a mime type",
            upload.content_type
        )));
    }
    if let Some(emoji) = &emoji {
        let len = emoji.chars().count();
        if len == 0 || len > MAX_EMOJI_LEN {
            return Err(CommandError::InvalidAttachment(format!(
                "emoji must be 1 to {MAX_EMOJI_LEN} characters"
            )));
        }
    }

    let kind = AttachmentKind::derive(&upload.content_type, false);
    Ok(AttachmentNode {
        id: upload.id,
        url: upload.url,
        preview_url: upload.preview_url,
        filename: upload.filename,
        filesize: upload.filesize,
        content_type: upload.content_type,
        emoji,
        kind,
    })
}

pub(crate) fn insert_attachment(
    mut doc: EditorDocument,
    selection: SelectionRange,
    upload: UploadResult,
) -> Result<Applied, CommandError> {
    let attachment = attachment_from_upload(upload, None)?;
    let inserted = insert_block(&mut doc, &selection.focus, BlockNode::Attachment(attachment));
    let caret = resolve_point(&doc, &Point::new(inserted.next, 0));
    Ok(Applied::caret(doc, caret))
}

/// Inserts an inline attachment (typically an emoji image) at the focus.
pub(crate) fn insert_inline_attachment(
    mut doc: EditorDocument,
    selection: SelectionRange,
    upload: UploadResult,
    emoji: Option<String>,
) -> Result<Applied, CommandError> {
    let attachment = attachment_from_upload(upload, emoji)?;
    let focus = selection.focus.clone();
    let Some(inlines) = doc.block_at_mut(&focus.path).and_then(|block| block.inlines_mut()) else {
        return Ok(unchanged(doc, selection, "focus is not in a text block"));
    };

    let (mut left, right) = split_inlines(inlines, focus.offset);
    left.push(InlineNode::Attachment(attachment));
    left.extend(right);
    normalize_inlines(&mut left);
    *inlines = left;

    Ok(Applied::caret(doc, Point::new(focus.path, focus.offset + 1)))
}

/// Patches the layout of every image attachment with `id`. Documents and
/// unknown ids are left alone.
pub(crate) fn set_layout(
    mut doc: EditorDocument,
    selection: SelectionRange,
    id: &str,
    patch: LayoutPatch,
) -> Result<Applied, CommandError> {
    validate_patch(&patch)?;
    if patch.is_empty() {
        return Ok(unchanged(doc, selection, "empty layout patch"));
    }

    let mut changed = 0usize;
    for block in doc.blocks_mut().iter_mut() {
        if !block.find_attachment(id).is_some_and(AttachmentNode::is_image) {
            continue;
        }
        changed += patch_block(Arc::make_mut(block), id, &patch);
    }

    if changed == 0 {
        return Ok(unchanged(doc, selection, "no image attachment with this id"));
    }
    Ok(Applied::new(doc, selection))
}

fn validate_patch(patch: &LayoutPatch) -> Result<(), CommandError> {
    let limits = &PolicyConfig::global().style;
    if let Some(padding) = patch.padding_px {
        if f64::from(padding) > limits.padding_max_px {
            return Err(CommandError::InvalidLayout(format!(
                "padding {padding}px exceeds {}px",
                limits.padding_max_px
            )));
        }
    }
    if let Some(Some(width)) = patch.width {
        let valid = match width.unit {
            WidthUnit::Percent => width.value > 0 && f64::from(width.value) <= limits.width_max_percent,
            WidthUnit::Pixel => width.value > 0 && f64::from(width.value) <= limits.width_max_px,
        };
        if !valid {
            return Err(CommandError::InvalidLayout(format!(
                "width {}{} out of range",
                width.value,
                width.unit.css_suffix()
            )));
        }
    }
    Ok(())
}

fn patch_block(block: &mut BlockNode, id: &str, patch: &LayoutPatch) -> usize {
    match block {
        BlockNode::Attachment(attachment) => patch_attachment(attachment, id, patch),
        BlockNode::Table(table) => table
            .rows
            .iter_mut()
            .flatten()
            .flat_map(|cell| cell.blocks.iter_mut())
            .map(|block| patch_block(block, id, patch))
            .sum(),
        _ => block
            .inlines_mut()
            .map(|inlines| {
                inlines
                    .iter_mut()
                    .map(|inline| match inline {
                        InlineNode::Attachment(attachment) => {
                            patch_attachment(attachment, id, patch)
                        }
                        InlineNode::Text(_) => 0,
                    })
                    .sum()
            })
            .unwrap_or(0),
    }
}

fn patch_attachment(attachment: &mut AttachmentNode, id: &str, patch: &LayoutPatch) -> usize {
    if attachment.id != id {
        return 0;
    }
    let AttachmentKind::Image(layout) = &mut attachment.kind else {
        return 0;
    };
    apply_patch(layout, patch);
    1
}

fn apply_patch(layout: &mut ImageLayout, patch: &LayoutPatch) {
    if let Some(align) = patch.align {
        layout.align = align;
    }
    if let Some(wrap) = patch.wrap {
        layout.wrap = wrap;
    }
    if let Some(padding) = patch.padding_px {
        layout.padding_px = padding;
    }
    if let Some(width) = patch.width {
        layout.width = width;
    }
}
