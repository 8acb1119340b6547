use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tag of the synthetic element returned by [`crate::parse_html`].
pub const FRAGMENT_TAG: &str = "#fragment";

pub type Attributes = BTreeMap<String, String>;

/// Element tree produced by the parser and filtered by the sanitizer.
///
/// Text nodes carry neither attributes nor children; attribute order is not
/// significant, so a sorted map keeps serialization deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum GenericNode {
    Element(ElementNode),
    Text(TextNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    #[serde(default)]
    pub attrs: Attributes,
    #[serde(default)]
    pub children: Vec<GenericNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
}

impl GenericNode {
    pub fn element(tag: impl Into<String>) -> Self {
        GenericNode::Element(ElementNode::new(tag))
    }

    pub fn text(text: impl Into<String>) -> Self {
        GenericNode::Text(TextNode { text: text.into() })
    }

    pub fn fragment(children: Vec<GenericNode>) -> Self {
        GenericNode::Element(ElementNode {
            tag: FRAGMENT_TAG.to_string(),
            attrs: Attributes::new(),
            children,
        })
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            GenericNode::Element(el) => Some(el),
            GenericNode::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            GenericNode::Text(t) => Some(&t.text),
            GenericNode::Element(_) => None,
        }
    }

    pub fn children(&self) -> &[GenericNode] {
        match self {
            GenericNode::Element(el) => &el.children,
            GenericNode::Text(_) => &[],
        }
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self, GenericNode::Element(el) if el.tag == FRAGMENT_TAG)
    }
}

fn collect_text(node: &GenericNode, out: &mut String) {
    match node {
        GenericNode::Text(t) => out.push_str(&t.text),
        GenericNode::Element(el) => {
            for child in &el.children {
                collect_text(child, out);
            }
        }
    }
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn with_children(mut self, children: Vec<GenericNode>) -> Self {
        self.children = children;
        self
    }

    /// Appends a child, merging it into a trailing text node when both are text.
    pub fn push_child(&mut self, child: GenericNode) {
        push_merging_text(&mut self.children, child);
    }
}

impl From<ElementNode> for GenericNode {
    fn from(value: ElementNode) -> Self {
        GenericNode::Element(value)
    }
}

pub(crate) fn push_merging_text(children: &mut Vec<GenericNode>, child: GenericNode) {
    if let GenericNode::Text(next) = &child {
        if next.text.is_empty() {
            return;
        }
        if let Some(GenericNode::Text(prev)) = children.last_mut() {
            prev.text.push_str(&next.text);
            return;
        }
    }
    children.push(child);
}
