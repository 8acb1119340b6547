use berry_html::policy::{
    sanitize_attribute, ATTR_ATTACHMENT_ID, ATTR_CONTENT_TYPE, ATTR_EMOJI, ATTR_FILENAME,
    ATTR_FILESIZE, ATTR_IMAGE_ALIGN, ATTR_IMAGE_PADDING, ATTR_IMAGE_WIDTH, ATTR_IMAGE_WIDTH_UNIT,
    ATTR_IMAGE_WRAP, ATTR_IMAGE_WRAP_SIDE, ATTR_PREVIEW_URL, ATTR_URL,
};
use berry_html::{parse_color, serialize_html, ElementNode, GenericNode, PolicyConfig};

use crate::document::{
    AttachmentKind, AttachmentNode, BlockNode, Cell, EditorDocument, ImageAlign, ImageLayout,
    InlineNode, ListType, Marks, TableNode,
};

/// Serializes a document. The output is already in sanitized form.
pub fn document_to_html(doc: &EditorDocument) -> String {
    let children = write_blocks(doc.blocks().iter().map(AsRef::as_ref));
    serialize_html(&GenericNode::fragment(children))
}

fn write_blocks<'a>(blocks: impl IntoIterator<Item = &'a BlockNode>) -> Vec<GenericNode> {
    let blocks: Vec<&BlockNode> = blocks.into_iter().collect();
    let mut out = Vec::new();
    let mut ix = 0usize;

    while ix < blocks.len() {
        let mut items = Vec::new();
        while let Some(BlockNode::ListItem {
            list_type,
            depth,
            inlines,
        }) = blocks.get(ix)
        {
            items.push(ListEntry {
                list_type: *list_type,
                depth: *depth,
                inlines,
            });
            ix += 1;
        }

        if items.is_empty() {
            out.push(write_block(blocks[ix]));
            ix += 1;
            continue;
        }

        let mut pos = 0usize;
        while pos < items.len() {
            out.push(list_element(&items, &mut pos, 0).into());
        }
    }
    out
}

fn write_block(block: &BlockNode) -> GenericNode {
    match block {
        BlockNode::Paragraph { inlines } => element_with_inlines("p", inlines).into(),
        BlockNode::Heading { level, inlines } => {
            element_with_inlines(&format!("h{}", (*level).clamp(1, 6)), inlines).into()
        }
        BlockNode::ListItem {
            list_type,
            depth,
            inlines,
        } => {
            let items = [ListEntry {
                list_type: *list_type,
                depth: *depth,
                inlines,
            }];
            list_element(&items, &mut 0, 0).into()
        }
        BlockNode::Table(table) => write_table(table).into(),
        BlockNode::Attachment(attachment) => write_figure(attachment).into(),
    }
}

struct ListEntry<'a> {
    list_type: ListType,
    depth: u8,
    inlines: &'a [InlineNode],
}

/// Builds one `ul`/`ol` at `depth` from `items[*pos..]`.
///
/// Deeper items nest in the preceding `li`; a deeper item with no `li`
/// before it nests directly in the list. Both forms read back one level
/// deeper.
fn list_element(items: &[ListEntry], pos: &mut usize, depth: u8) -> ElementNode {
    let list_type = items[*pos].list_type;
    let mut list = ElementNode::new(list_type.tag());

    while let Some(item) = items.get(*pos) {
        if item.depth < depth {
            break;
        }
        if item.depth > depth {
            list.children.push(list_element(items, pos, depth + 1).into());
            continue;
        }
        if item.list_type != list_type {
            break;
        }

        let mut li = element_with_inlines("li", item.inlines);
        *pos += 1;
        while items.get(*pos).is_some_and(|next| next.depth > depth) {
            li.children.push(list_element(items, pos, depth + 1).into());
        }
        list.children.push(li.into());
    }
    list
}

fn write_table(table: &TableNode) -> ElementNode {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let cells = row.iter().map(|cell| write_cell(cell).into()).collect();
            ElementNode::new("tr").with_children(cells).into()
        })
        .collect();
    let tbody = ElementNode::new("tbody").with_children(rows);
    let mut el = ElementNode::new("table").with_children(vec![tbody.into()]);
    set_attr(&mut el, "class", "berry-table");
    el
}

fn write_cell(cell: &Cell) -> ElementNode {
    let tag = if cell.header { "th" } else { "td" };
    ElementNode::new(tag).with_children(write_blocks(&cell.blocks))
}

fn element_with_inlines(tag: &str, inlines: &[InlineNode]) -> ElementNode {
    let mut el = ElementNode::new(tag);
    for inline in inlines {
        match inline {
            InlineNode::Text(run) => {
                for node in wrap_marks(text_nodes(&run.text), &run.marks) {
                    el.push_child(node);
                }
            }
            InlineNode::Attachment(attachment) => {
                el.push_child(write_inline_attachment(attachment).into());
            }
        }
    }
    el
}

/// Text with `\n` turned into `<br>`.
fn text_nodes(text: &str) -> Vec<GenericNode> {
    let mut out = Vec::new();
    for (ix, part) in text.split('\n').enumerate() {
        if ix > 0 {
            out.push(GenericNode::element("br"));
        }
        if !part.is_empty() {
            out.push(GenericNode::text(part));
        }
    }
    out
}

/// Wraps content in mark tags, outermost first: `a`, `span`, `strong`,
/// `em`, `u`, `s`.
fn wrap_marks(mut nodes: Vec<GenericNode>, marks: &Marks) -> Vec<GenericNode> {
    for (on, tag) in [
        (marks.strikethrough, "s"),
        (marks.underline, "u"),
        (marks.italic, "em"),
        (marks.bold, "strong"),
    ] {
        if on {
            nodes = vec![ElementNode::new(tag).with_children(nodes).into()];
        }
    }

    let mut declarations = Vec::new();
    if let Some(color) = marks.color.as_deref().and_then(parse_color) {
        declarations.push(format!("color:{color}"));
    }
    if let Some(color) = marks.highlight.as_deref().and_then(parse_color) {
        declarations.push(format!("background-color:{color}"));
    }
    if !declarations.is_empty() {
        let mut span = ElementNode::new("span").with_children(nodes);
        set_attr(&mut span, "style", &declarations.join("; "));
        nodes = vec![span.into()];
    }

    if let Some(link) = &marks.link {
        let mut a = ElementNode::new("a").with_children(nodes);
        set_attr(&mut a, "href", link);
        nodes = vec![a.into()];
    }
    nodes
}

fn write_figure(attachment: &AttachmentNode) -> ElementNode {
    let mut figure = ElementNode::new("figure");
    let mut classes = vec!["berry-attachment"];
    match &attachment.kind {
        AttachmentKind::Image(layout) => {
            classes.push("berry-attachment-image");
            classes.push(match layout.align {
                ImageAlign::Left => "berry-image-align-left",
                ImageAlign::Center => "berry-image-align-center",
                ImageAlign::Right => "berry-image-align-right",
            });
            if layout.wrap.is_some() {
                classes.push("berry-image-wrap");
            }
            if layout.padding_px > 0 {
                set_attr(&mut figure, "style", &format!("padding:{}px", layout.padding_px));
            }

            let mut img = ElementNode::new("img");
            set_attr(&mut img, "src", &attachment.url);
            set_attr(&mut img, "alt", &attachment.filename);
            if let Some(width) = layout.width {
                set_attr(
                    &mut img,
                    "style",
                    &format!("width:{}{}", width.value, width.unit.css_suffix()),
                );
            }
            figure.children.push(img.into());
        }
        AttachmentKind::Document => {
            classes.push("berry-attachment-document");
            let mut a = ElementNode::new("a").with_children(text_nodes(&attachment.filename));
            set_attr(&mut a, "href", &attachment.url);
            figure.children.push(a.into());
        }
    }
    set_attr(&mut figure, "class", &classes.join(" "));
    set_attachment_attrs(&mut figure, attachment);
    figure
}

fn write_inline_attachment(attachment: &AttachmentNode) -> ElementNode {
    let mut img = ElementNode::new("img");
    let class = match (&attachment.emoji, &attachment.kind) {
        (Some(_), _) => "berry-emoji",
        (None, AttachmentKind::Image(_)) => "berry-attachment berry-attachment-image",
        (None, AttachmentKind::Document) => "berry-attachment berry-attachment-document",
    };
    set_attr(&mut img, "class", class);
    set_attr(&mut img, "src", &attachment.url);
    set_attr(
        &mut img,
        "alt",
        attachment.emoji.as_deref().unwrap_or(&attachment.filename),
    );
    set_attachment_attrs(&mut img, attachment);
    img
}

fn set_attachment_attrs(el: &mut ElementNode, attachment: &AttachmentNode) {
    set_attr(el, ATTR_ATTACHMENT_ID, &attachment.id);
    set_attr(el, ATTR_URL, &attachment.url);
    if let Some(preview) = &attachment.preview_url {
        set_attr(el, ATTR_PREVIEW_URL, preview);
    }
    set_attr(el, ATTR_FILENAME, &attachment.filename);
    set_attr(el, ATTR_FILESIZE, &attachment.filesize.to_string());
    set_attr(el, ATTR_CONTENT_TYPE, &attachment.content_type);
    if let Some(emoji) = &attachment.emoji {
        set_attr(el, ATTR_EMOJI, emoji);
    }
    if let AttachmentKind::Image(layout) = &attachment.kind {
        set_layout_attrs(el, layout);
    }
}

/// Only non-default layout fields are written; reading fills in defaults.
fn set_layout_attrs(el: &mut ElementNode, layout: &ImageLayout) {
    if layout.align != ImageAlign::Left {
        set_attr(el, ATTR_IMAGE_ALIGN, layout.align.as_str());
    }
    if let Some(side) = layout.wrap {
        set_attr(el, ATTR_IMAGE_WRAP, "true");
        set_attr(el, ATTR_IMAGE_WRAP_SIDE, side.as_str());
    }
    if layout.padding_px > 0 {
        set_attr(el, ATTR_IMAGE_PADDING, &layout.padding_px.to_string());
    }
    if let Some(width) = layout.width {
        set_attr(el, ATTR_IMAGE_WIDTH, &width.value.to_string());
        set_attr(el, ATTR_IMAGE_WIDTH_UNIT, width.unit.as_str());
    }
}

/// Sets an attribute when the sanitizer policy would keep it, in the form
/// the policy would produce.
fn set_attr(el: &mut ElementNode, name: &str, value: &str) {
    let limits = &PolicyConfig::global().style;
    if let Some(value) = sanitize_attribute(&el.tag, name, value, limits) {
        el.attrs.insert(name.to_string(), value);
    }
}
