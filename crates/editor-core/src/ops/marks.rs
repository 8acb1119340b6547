use berry_html::{is_safe_url, parse_color};

use crate::command::CommandError;
use crate::document::{inline_content_len, EditorDocument, InlineMark, InlineNode, Marks, TextRun};
use crate::engine::unchanged;
use crate::normalize::normalize_inlines;
use crate::ops::{leaves_in_range, local_span, Applied};
use crate::selection::SelectionRange;

/// Toggles `mark` over the selected text.
///
/// The mark is removed when every selected run already carries it (for
/// valued marks, with the same value) and set everywhere otherwise, so two
/// identical toggles restore the original runs.
pub(crate) fn toggle_mark(
    mut doc: EditorDocument,
    selection: SelectionRange,
    mark: InlineMark,
) -> Result<Applied, CommandError> {
    let mark = validate_mark(mark)?;
    if selection.is_collapsed() {
        return Ok(unchanged(doc, selection, "collapsed selection"));
    }

    let (start, end) = selection.ordered();
    let spans: Vec<(Vec<usize>, usize, usize)> = leaves_in_range(&doc, &start, &end)
        .into_iter()
        .filter_map(|path| {
            let inlines = doc.block_at(&path)?.inlines()?;
            let (from, to) = local_span(&path, inline_content_len(inlines), &start, &end);
            (from < to).then_some((path, from, to))
        })
        .collect();

    let mut any_text = false;
    let mut all_marked = true;
    for (path, from, to) in &spans {
        let Some(inlines) = doc.block_at(path).and_then(|block| block.inlines()) else {
            continue;
        };
        for run in runs_in_span(inlines, *from, *to) {
            any_text = true;
            all_marked &= run.marks.contains(&mark);
        }
    }
    if !any_text {
        return Ok(unchanged(doc, selection, "no text selected"));
    }

    let apply = |marks: &mut Marks| {
        if all_marked {
            marks.remove(&mark);
        } else {
            marks.insert(mark.clone());
        }
    };
    for (path, from, to) in spans {
        let Some(inlines) = doc.block_at_mut(&path).and_then(|block| block.inlines_mut()) else {
            continue;
        };
        *inlines = apply_marks(inlines, from, to, &apply);
    }

    Ok(Applied::new(doc, SelectionRange::new(start, end)))
}

/// Normalizes valued marks and rejects values the sanitizer would strip.
pub(crate) fn validate_mark(mark: InlineMark) -> Result<InlineMark, CommandError> {
    match mark {
        InlineMark::Color(value) => parse_color(&value)
            .map(InlineMark::Color)
            .ok_or(CommandError::InvalidColor(value)),
        InlineMark::Highlight(value) => parse_color(&value)
            .map(InlineMark::Highlight)
            .ok_or(CommandError::InvalidColor(value)),
        InlineMark::Link(url) if !is_safe_url(&url) => Err(CommandError::UnsafeUrl(url)),
        mark => Ok(mark),
    }
}

fn runs_in_span(inlines: &[InlineNode], from: usize, to: usize) -> impl Iterator<Item = &TextRun> {
    let mut cursor = 0usize;
    inlines.iter().filter_map(move |inline| {
        let start = cursor;
        cursor += inline.len();
        match inline {
            InlineNode::Text(run) if cursor > from && start < to => Some(run),
            _ => None,
        }
    })
}

/// Rewrites the marks of the text in `[from, to)`, splitting runs that
/// straddle either boundary.
pub(crate) fn apply_marks(
    inlines: &[InlineNode],
    from: usize,
    to: usize,
    apply: &dyn Fn(&mut Marks),
) -> Vec<InlineNode> {
    let mut out: Vec<InlineNode> = Vec::with_capacity(inlines.len() + 2);
    let mut cursor = 0usize;

    for inline in inlines {
        let start = cursor;
        let end = cursor + inline.len();
        cursor = end;

        let InlineNode::Text(run) = inline else {
            out.push(inline.clone());
            continue;
        };
        if end <= from || start >= to {
            out.push(inline.clone());
            continue;
        }

        let a = from.saturating_sub(start);
        let b = (to - start).min(run.text.len());
        let mut marks = run.marks.clone();
        apply(&mut marks);

        out.push(InlineNode::styled(&run.text[..a], run.marks.clone()));
        out.push(InlineNode::styled(&run.text[a..b], marks));
        out.push(InlineNode::styled(&run.text[b..], run.marks.clone()));
    }

    normalize_inlines(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> Marks {
        Marks {
            bold: true,
            ..Marks::default()
        }
    }

    #[test]
    fn apply_marks_splits_straddling_runs() {
        let inlines = vec![InlineNode::text("hello world")];
        let out = apply_marks(&inlines, 2, 7, &|marks| marks.bold = true);
        assert_eq!(
            out,
            vec![
                InlineNode::text("he"),
                InlineNode::styled("llo w", bold()),
                InlineNode::text("orld"),
            ]
        );
    }

    #[test]
    fn colors_are_normalized_and_validated() {
        assert_eq!(
            validate_mark(InlineMark::Color("rgb(255, 0, 0)".into())),
            Ok(InlineMark::Color("#ff0000".into()))
        );
        assert_eq!(
            validate_mark(InlineMark::Highlight("tomato".into())),
            Err(CommandError::InvalidColor("tomato".into()))
        );
        assert_eq!(
            validate_mark(InlineMark::Link("javascript:alert(1)".into())),
            Err(CommandError::UnsafeUrl("javascript:alert(1)".into()))
        );
    }
}
