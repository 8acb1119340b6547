//! Permissive HTML fragment parser.
//!
//! The parser never fails: comments, doctypes and processing instructions are
//! skipped, unmatched end tags are ignored, and open elements are closed at
//! end of input. Tree construction is a plain stack (no implied end tags), so
//! re-parsing serialized output reproduces the same tree.

use crate::config::ParseLimits;
use crate::entities::{decode_attribute_entities, decode_entities};
use crate::node::{ElementNode, GenericNode, TextNode, FRAGMENT_TAG};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text up to the matching end tag.
const RAW_TEXT_TAGS: &[&str] = &[
    "script", "style", "iframe", "noscript", "noembed", "noframes", "xmp",
];

/// Raw text elements whose content still decodes character references.
const ESCAPABLE_RAW_TEXT_TAGS: &[&str] = &["textarea", "title"];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Parses an HTML fragment with the default limits.
pub fn parse_html(html: &str) -> GenericNode {
    parse_html_with(html, &ParseLimits::default())
}

pub fn parse_html_with(html: &str, limits: &ParseLimits) -> GenericNode {
    let mut parser = Parser {
        input: html,
        pos: 0,
        builder: TreeBuilder::new(limits.max_depth),
    };
    parser.run();
    parser.builder.finish()
}

struct StartTag {
    name: String,
    attrs: Vec<(String, String)>,
    self_closing: bool,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    builder: TreeBuilder,
}

impl Parser<'_> {
    fn run(&mut self) {
        let input = self.input;
        while self.pos < input.len() {
            let rest = &input[self.pos..];
            let Some(lt) = rest.find('<') else {
                self.builder.text(&decode_entities(rest));
                self.pos = input.len();
                break;
            };
            if lt > 0 {
                self.builder.text(&decode_entities(&rest[..lt]));
                self.pos += lt;
            }
            self.markup();
        }
    }

    /// Handles the construct starting at `self.pos`, which is a `<`.
    fn markup(&mut self) {
        let input = self.input;
        let rest = &input[self.pos..];
        let next = rest.as_bytes().get(1).copied();

        if rest.starts_with("<!--") {
            self.pos = match rest[4..].find("-->") {
                Some(end) => self.pos + 4 + end + 3,
                None => input.len(),
            };
            return;
        }

        match next {
            Some(b'!') | Some(b'?') => self.skip_past_gt(),
            Some(b'/') => match rest.as_bytes().get(2) {
                Some(b) if b.is_ascii_alphabetic() => {
                    let name = self.end_tag();
                    self.builder.close(&name);
                }
                Some(b'>') => self.pos += 3,
                // `</` followed by anything else is a bogus comment.
                _ => self.skip_past_gt(),
            },
            Some(b) if b.is_ascii_alphabetic() => {
                let Some(tag) = self.start_tag() else {
                    return;
                };
                self.open(tag);
            }
            _ => {
                self.builder.text("<");
                self.pos += 1;
            }
        }
    }

    fn skip_past_gt(&mut self) {
        let input = self.input;
        self.pos = match input[self.pos..].find('>') {
            Some(gt) => self.pos + gt + 1,
            None => input.len(),
        };
    }

    fn open(&mut self, tag: StartTag) {
        let StartTag {
            name,
            attrs,
            self_closing,
        } = tag;
        let mut element = ElementNode::new(name.clone());
        for (key, value) in attrs {
            element.attrs.entry(key).or_insert(value);
        }

        if is_void_tag(&name) || self_closing {
            self.builder.append(GenericNode::Element(element));
            return;
        }

        let raw = RAW_TEXT_TAGS.contains(&name.as_str());
        let escapable = ESCAPABLE_RAW_TEXT_TAGS.contains(&name.as_str());
        if raw || escapable {
            let input = self.input;
            let content_start = self.pos;
            let content_end = find_end_tag(input, content_start, &name).unwrap_or(input.len());
            let content = &input[content_start..content_end];
            if !content.is_empty() {
                let text = if escapable {
                    decode_entities(content).into_owned()
                } else {
                    content.to_string()
                };
                element.children.push(GenericNode::Text(TextNode { text }));
            }
            self.builder.append(GenericNode::Element(element));
            self.pos = content_end;
            if self.pos < input.len() {
                // Consume the matching end tag.
                self.end_tag();
            }
            return;
        }

        self.builder.push(element);
    }

    /// Parses `</name ...>` at `self.pos` and returns the lowercased name.
    fn end_tag(&mut self) -> String {
        let input = self.input;
        let bytes = input.as_bytes();
        let start = self.pos + 2;
        let mut i = start;
        while i < bytes.len() && !is_tag_name_terminator(bytes[i]) {
            i += 1;
        }
        let name = input[start..i].to_ascii_lowercase();
        self.pos = i;
        self.skip_past_gt();
        name
    }

    /// Parses a start tag at `self.pos`. Returns `None` when input ends inside
    /// the tag, in which case the incomplete tag is dropped.
    fn start_tag(&mut self) -> Option<StartTag> {
        let input = self.input;
        let bytes = input.as_bytes();
        let start = self.pos + 1;
        let mut i = start;
        while i < bytes.len() && !is_tag_name_terminator(bytes[i]) {
            i += 1;
        }
        let name = input[start..i].to_ascii_lowercase();

        let mut attrs: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                tracing::trace!(target: "berry::parser", tag = %name, "input ended inside tag");
                self.pos = bytes.len();
                return None;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    if bytes.get(i + 1) == Some(&b'>') {
                        self_closing = true;
                        i += 2;
                        break;
                    }
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let name_start = i;
            // A leading `=` belongs to the attribute name.
            i += 1;
            while i < bytes.len()
                && !matches!(bytes[i], b'=' | b'>' | b'/')
                && !bytes[i].is_ascii_whitespace()
            {
                i += 1;
            }
            let attr_name = input[name_start..i].to_ascii_lowercase();

            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let mut value = String::new();
            if bytes.get(i) == Some(&b'=') {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                match bytes.get(i).copied() {
                    Some(quote) if quote == b'"' || quote == b'\'' => {
                        let value_start = i + 1;
                        let value_end = input[value_start..]
                            .find(quote as char)
                            .map(|ix| value_start + ix)
                            .unwrap_or(bytes.len());
                        value = decode_attribute_entities(&input[value_start..value_end])
                            .into_owned();
                        i = (value_end + 1).min(bytes.len());
                    }
                    Some(_) => {
                        let value_start = i;
                        while i < bytes.len()
                            && bytes[i] != b'>'
                            && !bytes[i].is_ascii_whitespace()
                        {
                            i += 1;
                        }
                        value = decode_attribute_entities(&input[value_start..i]).into_owned();
                    }
                    None => {}
                }
            }

            if is_valid_attr_name(&attr_name) {
                attrs.push((attr_name, value));
            } else {
                tracing::trace!(
                    target: "berry::parser",
                    attr = %attr_name,
                    "dropping malformed attribute name"
                );
            }
        }

        self.pos = i;
        Some(StartTag {
            name,
            attrs,
            self_closing,
        })
    }
}

fn is_tag_name_terminator(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'/' || b == b'>'
}

fn is_valid_attr_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
}

/// Finds the byte index of `</name` (case-insensitive) terminated by
/// whitespace, `/`, `>` or end of input.
fn find_end_tag(input: &str, from: usize, name: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let needle = name.as_bytes();
    let mut search = from;
    while let Some(ix) = input[search..].find("</") {
        let at = search + ix;
        let name_start = at + 2;
        let name_end = name_start + needle.len();
        if name_end <= bytes.len()
            && bytes[name_start..name_end].eq_ignore_ascii_case(needle)
            && bytes
                .get(name_end)
                .is_none_or(|&b| is_tag_name_terminator(b))
        {
            return Some(at);
        }
        search = at + 2;
    }
    None
}

struct TreeBuilder {
    /// Open elements; index 0 is the fragment root.
    stack: Vec<ElementNode>,
    max_depth: usize,
}

impl TreeBuilder {
    fn new(max_depth: usize) -> Self {
        Self {
            stack: vec![ElementNode::new(FRAGMENT_TAG)],
            max_depth,
        }
    }

    fn current(&mut self) -> &mut ElementNode {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.current().push_child(GenericNode::Text(TextNode {
            text: text.to_string(),
        }));
    }

    fn append(&mut self, node: GenericNode) {
        self.current().push_child(node);
    }

    fn push(&mut self, element: ElementNode) {
        if self.stack.len() > self.max_depth {
            tracing::trace!(
                target: "berry::parser",
                tag = %element.tag,
                max_depth = self.max_depth,
                "nesting limit reached, flattening element"
            );
            return;
        }
        self.stack.push(element);
    }

    fn close(&mut self, name: &str) {
        let Some(ix) = self.stack.iter().skip(1).rposition(|el| el.tag == name) else {
            tracing::trace!(target: "berry::parser", tag = %name, "ignoring unmatched end tag");
            return;
        };
        let target_len = ix + 1;
        while self.stack.len() > target_len {
            self.pop_into_parent();
        }
    }

    fn pop_into_parent(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(el) = self.stack.pop() {
            self.current().push_child(GenericNode::Element(el));
        }
    }

    fn finish(mut self) -> GenericNode {
        while self.stack.len() > 1 {
            self.pop_into_parent();
        }
        let root = self
            .stack
            .pop()
            .unwrap_or_else(|| ElementNode::new(FRAGMENT_TAG));
        GenericNode::Element(root)
    }
}
