use crate::node::{ElementNode, GenericNode, FRAGMENT_TAG};
use crate::parser::is_void_tag;

/// Serializes a tree back to HTML. A `#fragment` root emits only its children.
pub fn serialize_html(node: &GenericNode) -> String {
    let mut out = String::new();
    match node {
        GenericNode::Element(el) if el.tag == FRAGMENT_TAG => {
            serialize_children(&el.children, &mut out);
        }
        _ => serialize_node(node, &mut out),
    }
    out
}

pub fn serialize_children(children: &[GenericNode], out: &mut String) {
    for child in children {
        serialize_node(child, out);
    }
}

fn serialize_node(node: &GenericNode, out: &mut String) {
    match node {
        GenericNode::Text(t) => escape_text_into(&t.text, out),
        GenericNode::Element(el) => serialize_element(el, out),
    }
}

fn serialize_element(el: &ElementNode, out: &mut String) {
    if el.tag == FRAGMENT_TAG {
        serialize_children(&el.children, out);
        return;
    }

    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        push_attr(out, name, value);
    }
    out.push('>');

    if is_void_tag(&el.tag) {
        return;
    }

    serialize_children(&el.children, out);
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}

/// Appends ` name="value"` with the value escaped.
pub fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_attr_into(value, out);
    out.push('"');
}

fn escape_text_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr_into(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_html;

    #[test]
    fn void_elements_have_no_end_tag() {
        let root = parse_html(r#"<p>a<br>b<img src="x.png"></p>"#);
        assert_eq!(serialize_html(&root), r#"<p>a<br>b<img src="x.png"></p>"#);
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let root = parse_html(r#"<a title="&quot;q&quot; &amp; more">1 &lt; 2</a>"#);
        assert_eq!(
            serialize_html(&root),
            r#"<a title="&quot;q&quot; &amp; more">1 &lt; 2</a>"#
        );
    }
}
