use crate::command::{BlockType, CommandError};
use crate::document::{BlockNode, EditorDocument};
use crate::engine::unchanged;
use crate::ops::{leaves_in_range, Applied};
use crate::selection::SelectionRange;

/// Converts every text block touched by the selection, keeping inlines.
pub(crate) fn set_block(
    mut doc: EditorDocument,
    selection: SelectionRange,
    target: BlockType,
) -> Result<Applied, CommandError> {
    if let BlockType::Heading { level } = target {
        if !(1..=6).contains(&level) {
            return Err(CommandError::InvalidHeadingLevel(level));
        }
    }

    let (start, end) = selection.ordered();
    let mut changed = 0usize;
    for path in leaves_in_range(&doc, &start, &end) {
        let Some(current) = doc.block_at(&path) else {
            continue;
        };
        let Some(next) = convert(current, target) else {
            continue;
        };
        if next == *current {
            continue;
        }
        if let Some(block) = doc.block_at_mut(&path) {
            *block = next;
            changed += 1;
        }
    }

    if changed == 0 {
        return Ok(unchanged(doc, selection, "no text block to convert"));
    }
    Ok(Applied::new(doc, SelectionRange::new(start, end)))
}

fn convert(block: &BlockNode, target: BlockType) -> Option<BlockNode> {
    let inlines = block.inlines()?.to_vec();
    Some(match target {
        BlockType::Paragraph => BlockNode::Paragraph { inlines },
        BlockType::Heading { level } => BlockNode::Heading { level, inlines },
        BlockType::ListItem { list_type } => {
            let depth = match block {
                BlockNode::ListItem { depth, .. } => *depth,
                _ => 0,
            };
            BlockNode::ListItem {
                list_type,
                depth,
                inlines,
            }
        }
    })
}

/// Moves selected list items `delta` levels. Outdenting a top-level item
/// turns it back into a paragraph.
pub(crate) fn change_list_depth(
    mut doc: EditorDocument,
    selection: SelectionRange,
    delta: i8,
    max_depth: u8,
) -> Applied {
    let (start, end) = selection.ordered();
    let max_level = max_depth.saturating_sub(1);
    let mut changed = 0usize;

    for path in leaves_in_range(&doc, &start, &end) {
        let Some(BlockNode::ListItem {
            list_type,
            depth,
            inlines,
        }) = doc.block_at(&path)
        else {
            continue;
        };

        let next = if delta < 0 && *depth == 0 {
            BlockNode::Paragraph {
                inlines: inlines.clone(),
            }
        } else {
            let depth = depth.saturating_add_signed(delta).min(max_level);
            BlockNode::ListItem {
                list_type: *list_type,
                depth,
                inlines: inlines.clone(),
            }
        };
        if doc.block_at(&path) == Some(&next) {
            continue;
        }
        if let Some(block) = doc.block_at_mut(&path) {
            *block = next;
            changed += 1;
        }
    }

    if changed == 0 {
        return unchanged(doc, selection, "no list item to move");
    }
    Applied::new(doc, SelectionRange::new(start, end))
}
