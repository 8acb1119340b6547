use berry_html::policy::{
    ATTR_ATTACHMENT_ID, ATTR_CONTENT_TYPE, ATTR_EMOJI, ATTR_FILENAME, ATTR_FILESIZE,
    ATTR_IMAGE_ALIGN, ATTR_IMAGE_PADDING, ATTR_IMAGE_WIDTH, ATTR_IMAGE_WIDTH_UNIT,
    ATTR_IMAGE_WRAP, ATTR_IMAGE_WRAP_SIDE, ATTR_PREVIEW_URL, ATTR_URL,
};
use berry_html::{is_safe_url, parse_color, parse_html, sanitize_tree, ElementNode, GenericNode};

use crate::document::{
    AttachmentKind, AttachmentNode, BlockNode, Cell, EditorDocument, ImageAlign, ImageLayout,
    ImageWidth, InlineNode, ListType, Marks, TableNode, WidthUnit, WrapSide,
};

/// Sanitizes `html` and folds the result into a document.
pub fn document_from_html(html: &str) -> EditorDocument {
    let tree = sanitize_tree(&parse_html(html));
    let blocks = read_blocks(tree.children());
    tracing::debug!(
        target: "berry::mapper",
        blocks = blocks.len(),
        "read document from html"
    );
    EditorDocument::from_blocks(blocks)
}

fn read_blocks(nodes: &[GenericNode]) -> Vec<BlockNode> {
    let mut reader = BlockReader::default();
    reader.nodes(nodes);
    reader.finish()
}

/// Collects blocks in document order. Inline content found between blocks
/// is gathered into an implicit paragraph.
#[derive(Default)]
struct BlockReader {
    blocks: Vec<BlockNode>,
    loose: InlineReader,
}

impl BlockReader {
    fn nodes(&mut self, nodes: &[GenericNode]) {
        for node in nodes {
            self.node(node);
        }
    }

    fn node(&mut self, node: &GenericNode) {
        let el = match node {
            GenericNode::Text(text) => {
                self.loose.text(&text.text, &Marks::default());
                return;
            }
            GenericNode::Element(el) => el,
        };

        match el.tag.as_str() {
            "p" => self.push(BlockNode::Paragraph {
                inlines: read_inlines(&el.children),
            }),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = el.tag[1..].parse().unwrap_or(1);
                self.push(BlockNode::Heading {
                    level,
                    inlines: read_inlines(&el.children),
                });
            }
            "ul" | "ol" => {
                self.flush_loose();
                read_list(el, 0, &mut self.blocks);
            }
            "li" => {
                self.flush_loose();
                read_list_item(el, ListType::Unordered, 0, &mut self.blocks);
            }
            "table" => self.push(BlockNode::Table(read_table(el))),
            "figure" => match figure_attachment(el) {
                Some(attachment) => self.push(BlockNode::Attachment(attachment)),
                None => self.container(el),
            },
            "div" | "tbody" | "tr" | "td" | "th" => self.container(el),
            _ => self.loose.node(node, &Marks::default()),
        }
    }

    fn container(&mut self, el: &ElementNode) {
        self.flush_loose();
        self.nodes(&el.children);
        self.flush_loose();
    }

    fn push(&mut self, block: BlockNode) {
        self.flush_loose();
        self.blocks.push(block);
    }

    /// Whitespace around loose inline content is source formatting, not text.
    fn flush_loose(&mut self) {
        let mut inlines = std::mem::take(&mut self.loose).finish();
        if is_blank(&inlines) {
            return;
        }
        trim_edges(&mut inlines);
        self.blocks.push(BlockNode::Paragraph { inlines });
    }

    fn finish(mut self) -> Vec<BlockNode> {
        self.flush_loose();
        self.blocks
    }
}

fn is_blank(inlines: &[InlineNode]) -> bool {
    inlines.iter().all(|inline| match inline {
        InlineNode::Text(run) => run.text.trim().is_empty(),
        InlineNode::Attachment(_) => false,
    })
}

fn trim_edges(inlines: &mut Vec<InlineNode>) {
    if let Some(InlineNode::Text(run)) = inlines.first_mut() {
        run.text = run.text.trim_start().to_string();
    }
    if let Some(InlineNode::Text(run)) = inlines.last_mut() {
        run.text = run.text.trim_end().to_string();
    }
    inlines.retain(|inline| !inline.is_empty());
}

fn list_type_of(tag: &str) -> ListType {
    if tag == "ol" {
        ListType::Ordered
    } else {
        ListType::Unordered
    }
}

/// Reads a `ul`/`ol` whose items sit at `depth`. A list nested directly in
/// the list is one level deeper.
fn read_list(list: &ElementNode, depth: u8, out: &mut Vec<BlockNode>) {
    let list_type = list_type_of(&list.tag);
    let mut stray = InlineReader::default();

    for child in &list.children {
        match child {
            GenericNode::Element(el) if el.tag == "li" => {
                flush_stray(&mut stray, list_type, depth, out);
                read_list_item(el, list_type, depth, out);
            }
            GenericNode::Element(el) if matches!(el.tag.as_str(), "ul" | "ol") => {
                flush_stray(&mut stray, list_type, depth, out);
                read_list(el, depth.saturating_add(1), out);
            }
            other => stray.node(other, &Marks::default()),
        }
    }
    flush_stray(&mut stray, list_type, depth, out);
}

/// Content directly inside a list but outside any `li` becomes its own item.
fn flush_stray(stray: &mut InlineReader, list_type: ListType, depth: u8, out: &mut Vec<BlockNode>) {
    let inlines = std::mem::take(stray).finish();
    if !is_blank(&inlines) {
        out.push(BlockNode::ListItem {
            list_type,
            depth,
            inlines,
        });
    }
}

/// Reads one `li`. Its inline content becomes an item at `depth`; the first
/// nested list closes that item, even when it is empty.
fn read_list_item(li: &ElementNode, list_type: ListType, depth: u8, out: &mut Vec<BlockNode>) {
    let mut inline = InlineReader::default();
    let mut emitted = false;

    for child in &li.children {
        match child {
            GenericNode::Element(el) if matches!(el.tag.as_str(), "ul" | "ol") => {
                let inlines = std::mem::take(&mut inline).finish();
                if !emitted || !is_blank(&inlines) {
                    out.push(BlockNode::ListItem {
                        list_type,
                        depth,
                        inlines,
                    });
                    emitted = true;
                }
                read_list(el, depth.saturating_add(1), out);
            }
            other => inline.node(other, &Marks::default()),
        }
    }

    let inlines = inline.finish();
    if !emitted || !is_blank(&inlines) {
        out.push(BlockNode::ListItem {
            list_type,
            depth,
            inlines,
        });
    }
}

fn read_table(table: &ElementNode) -> TableNode {
    let mut rows = Vec::new();
    collect_rows(&table.children, &mut rows);
    TableNode { rows }
}

/// Rows of this table only; nested tables are read as cell content.
fn collect_rows(nodes: &[GenericNode], rows: &mut Vec<Vec<Cell>>) {
    for el in nodes.iter().filter_map(GenericNode::as_element) {
        match el.tag.as_str() {
            "tr" => rows.push(read_row(el)),
            "table" => {}
            _ => collect_rows(&el.children, rows),
        }
    }
}

fn read_row(tr: &ElementNode) -> Vec<Cell> {
    tr.children
        .iter()
        .filter_map(GenericNode::as_element)
        .filter(|el| matches!(el.tag.as_str(), "td" | "th"))
        .map(|el| Cell {
            blocks: read_blocks(&el.children),
            header: el.tag == "th",
        })
        .collect()
}

fn read_inlines(nodes: &[GenericNode]) -> Vec<InlineNode> {
    let mut reader = InlineReader::default();
    for node in nodes {
        reader.node(node, &Marks::default());
    }
    reader.finish()
}

/// Folds inline markup into runs. Block markup met in inline position is
/// flattened into the surrounding text.
#[derive(Default)]
struct InlineReader {
    out: Vec<InlineNode>,
}

impl InlineReader {
    fn text(&mut self, text: &str, marks: &Marks) {
        if !text.is_empty() {
            self.out.push(InlineNode::styled(text, marks.clone()));
        }
    }

    fn node(&mut self, node: &GenericNode, marks: &Marks) {
        let el = match node {
            GenericNode::Text(text) => return self.text(&text.text, marks),
            GenericNode::Element(el) => el,
        };

        let mut marks = marks.clone();
        match el.tag.as_str() {
            "br" => return self.text("\n", &marks),
            "img" => {
                if let Some(attachment) = img_attachment(el) {
                    self.out.push(InlineNode::Attachment(attachment));
                }
                return;
            }
            "figure" => {
                if let Some(attachment) = figure_attachment(el) {
                    self.out.push(InlineNode::Attachment(attachment));
                    return;
                }
            }
            "strong" | "b" => marks.bold = true,
            "em" | "i" => marks.italic = true,
            "u" => marks.underline = true,
            "s" | "strike" => marks.strikethrough = true,
            "span" => {
                if let Some(color) = style_value(el, "color").and_then(parse_color) {
                    marks.color = Some(color);
                }
                if let Some(color) = style_value(el, "background-color").and_then(parse_color) {
                    marks.highlight = Some(color);
                }
            }
            "a" => {
                if let Some(href) = el.attr("href").filter(|href| is_safe_url(href)) {
                    marks.link = Some(href.to_string());
                }
            }
            _ => {}
        }

        for child in &el.children {
            self.node(child, &marks);
        }
    }

    fn finish(self) -> Vec<InlineNode> {
        self.out
    }
}

fn style_value<'a>(el: &'a ElementNode, property: &str) -> Option<&'a str> {
    el.attr("style")?
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| value.trim())
}

fn has_class(el: &ElementNode, token: &str) -> bool {
    el.attr("class")
        .is_some_and(|class| class.split_whitespace().any(|t| t == token))
}

fn text_of(el: &ElementNode) -> String {
    el.children.iter().map(GenericNode::text_content).collect()
}

fn find_descendant<'a>(el: &'a ElementNode, tag: &str) -> Option<&'a ElementNode> {
    el.children
        .iter()
        .filter_map(GenericNode::as_element)
        .find_map(|child| {
            if child.tag == tag {
                Some(child)
            } else {
                find_descendant(child, tag)
            }
        })
}

/// A `figure` is an attachment when it carries attachment metadata, the
/// attachment class, or an image, and some URL its kind can write back is
/// found. Otherwise it is read as a plain container.
fn figure_attachment(figure: &ElementNode) -> Option<AttachmentNode> {
    let img = find_descendant(figure, "img");
    let link = find_descendant(figure, "a");
    let marked = figure.attrs.keys().any(|name| name.starts_with("data-berry-"))
        || has_class(figure, "berry-attachment")
        || img.is_some();
    if !marked {
        return None;
    }

    // `img[src]` may hold a `data:` image, which only an image attachment can
    // write back.
    let is_image = AttachmentKind::derive(
        figure.attr(ATTR_CONTENT_TYPE).unwrap_or_default(),
        img.is_some(),
    )
    .is_image();
    let url = figure
        .attr(ATTR_URL)
        .or_else(|| {
            img.and_then(|img| img.attr("src"))
                .filter(|src| is_image || is_safe_url(src))
        })
        .or_else(|| link.and_then(|a| a.attr("href")))?;
    let filename = match figure.attr(ATTR_FILENAME) {
        Some(name) => name.to_string(),
        None => img
            .and_then(|img| img.attr("alt"))
            .map(str::to_string)
            .or_else(|| link.map(text_of))
            .unwrap_or_default(),
    };

    let mut attachment = base_attachment(figure, url, filename, img.is_some());
    if let AttachmentKind::Image(layout) = &mut attachment.kind {
        *layout = read_layout(figure, img);
    }
    Some(attachment)
}

/// An `img` in inline position: an emoji or an inline attachment.
fn img_attachment(img: &ElementNode) -> Option<AttachmentNode> {
    let url = img.attr(ATTR_URL).or_else(|| img.attr("src"))?;
    let emoji = img
        .attr(ATTR_EMOJI)
        .map(str::to_string)
        .or_else(|| {
            has_class(img, "berry-emoji")
                .then(|| img.attr("alt"))
                .flatten()
                .filter(|alt| !alt.is_empty())
                .map(str::to_string)
        });
    let filename = img
        .attr(ATTR_FILENAME)
        .or_else(|| emoji.is_none().then(|| img.attr("alt")).flatten())
        .unwrap_or_default()
        .to_string();

    let mut attachment = base_attachment(img, url, filename, true);
    attachment.emoji = emoji;
    if let AttachmentKind::Image(layout) = &mut attachment.kind {
        *layout = read_layout(img, Some(img));
    }
    Some(attachment)
}

fn base_attachment(el: &ElementNode, url: &str, filename: String, has_img: bool) -> AttachmentNode {
    let content_type = el.attr(ATTR_CONTENT_TYPE).unwrap_or_default().to_string();
    AttachmentNode {
        id: el.attr(ATTR_ATTACHMENT_ID).unwrap_or_default().to_string(),
        url: url.to_string(),
        preview_url: el.attr(ATTR_PREVIEW_URL).map(str::to_string),
        filename,
        filesize: el
            .attr(ATTR_FILESIZE)
            .and_then(|size| size.parse().ok())
            .unwrap_or(0),
        kind: AttachmentKind::derive(&content_type, has_img),
        content_type,
        emoji: None,
    }
}

/// Layout from `data-berry-image-*`, falling back to classes and inline
/// styles for markup that predates the data attributes.
fn read_layout(el: &ElementNode, img: Option<&ElementNode>) -> ImageLayout {
    let align = el
        .attr(ATTR_IMAGE_ALIGN)
        .and_then(ImageAlign::parse)
        .or_else(|| {
            [ImageAlign::Left, ImageAlign::Center, ImageAlign::Right]
                .into_iter()
                .find(|align| has_class(el, &format!("berry-image-align-{}", align.as_str())))
        })
        .unwrap_or_default();

    let wrapping = match el.attr(ATTR_IMAGE_WRAP) {
        Some(flag) => flag == "true",
        None => has_class(el, "berry-image-wrap"),
    };
    let wrap = wrapping.then(|| {
        el.attr(ATTR_IMAGE_WRAP_SIDE)
            .and_then(WrapSide::parse)
            .unwrap_or(WrapSide::Right)
    });

    let padding_px = el
        .attr(ATTR_IMAGE_PADDING)
        .and_then(|value| value.parse().ok())
        .or_else(|| style_value(el, "padding").and_then(|value| css_number(value, "px")))
        .unwrap_or(0);

    let width = data_width(el).or_else(|| img.and_then(style_width));

    ImageLayout {
        align,
        wrap,
        padding_px,
        width,
    }
}

fn data_width(el: &ElementNode) -> Option<ImageWidth> {
    let value: u32 = el.attr(ATTR_IMAGE_WIDTH)?.parse().ok()?;
    let unit = el
        .attr(ATTR_IMAGE_WIDTH_UNIT)
        .and_then(WidthUnit::parse)
        .unwrap_or(WidthUnit::Percent);
    (value > 0).then_some(ImageWidth { value, unit })
}

fn style_width(img: &ElementNode) -> Option<ImageWidth> {
    let value = style_value(img, "width")?;
    [WidthUnit::Percent, WidthUnit::Pixel]
        .into_iter()
        .find_map(|unit| {
            let value = css_number(value, unit.css_suffix())?;
            Some(ImageWidth { value, unit })
        })
        .filter(|width| width.value > 0)
}

/// `12px` / `12.4px` with the given suffix, rounded to an integer.
fn css_number(value: &str, suffix: &str) -> Option<u32> {
    let number: f64 = value.strip_suffix(suffix)?.trim().parse().ok()?;
    (number.is_finite() && number >= 0.0).then(|| number.round() as u32)
}
