use berry_html::{
    parse_html, parse_html_with, serialize_html, GenericNode, ParseLimits, FRAGMENT_TAG,
};

fn first_element(root: &GenericNode) -> &berry_html::ElementNode {
    root.children()
        .iter()
        .find_map(GenericNode::as_element)
        .expect("element child")
}

#[test]
fn root_is_a_fragment() {
    let root = parse_html("hello");
    assert!(root.is_fragment());
    assert_eq!(root.as_element().map(|el| el.tag.as_str()), Some(FRAGMENT_TAG));
    assert_eq!(root.children(), &[GenericNode::text("hello")]);
}

#[test]
fn void_elements_are_childless() {
    let root = parse_html("<p>a<br>b<img src=x.png>c</p>");
    let p = first_element(&root);
    assert_eq!(p.children.len(), 5);
    assert_eq!(p.children[1].as_element().map(|el| el.children.len()), Some(0));
    assert_eq!(
        p.children[3].as_element().and_then(|el| el.attr("src")),
        Some("x.png")
    );
}

#[test]
fn names_are_lowercased_and_first_duplicate_wins() {
    let root = parse_html(r#"<P CLASS="a" class="b" Data-X='y'>t</P>"#);
    let p = first_element(&root);
    assert_eq!(p.tag, "p");
    assert_eq!(p.attr("class"), Some("a"));
    assert_eq!(p.attr("data-x"), Some("y"));
}

#[test]
fn character_references_are_decoded() {
    let root = parse_html("<p title=\"&quot;x&quot;\">&lt;&#65;&#x42;&nbsp;&copy;&bogus;</p>");
    let p = first_element(&root);
    assert_eq!(p.attr("title"), Some("\"x\""));
    assert_eq!(root.text_content(), "<AB\u{a0}\u{a9}&bogus;");
}

#[test]
fn comments_doctype_and_processing_instructions_are_discarded() {
    let root = parse_html("<!DOCTYPE html><!-- c --><?xml version=\"1.0\"?><p>x</p><!-- open");
    assert_eq!(serialize_html(&root), "<p>x</p>");
}

#[test]
fn unbalanced_markup_degrades_gracefully() {
    assert_eq!(serialize_html(&parse_html("<b><i>x</b>y</i>")), "<b><i>x</i></b>y");
    assert_eq!(serialize_html(&parse_html("</p>x</div>")), "x");
    assert_eq!(serialize_html(&parse_html("<p><span>x")), "<p><span>x</span></p>");
    assert_eq!(serialize_html(&parse_html("a <b")), "a ");
    assert_eq!(serialize_html(&parse_html("1 < 2 <3")), "1 &lt; 2 &lt;3");
}

#[test]
fn raw_text_content_is_not_parsed() {
    let root = parse_html("<script>if (a < b) { x = '</p>'; }</script>after");
    let script = first_element(&root);
    assert_eq!(script.tag, "script");
    assert_eq!(
        script.children[0].as_text(),
        Some("if (a < b) { x = '</p>'; }")
    );
    assert_eq!(root.children()[1].as_text(), Some("after"));
}

#[test]
fn self_closing_non_void_is_empty() {
    assert_eq!(serialize_html(&parse_html("<p/>x")), "<p></p>x");
}

#[test]
fn depth_limit_flattens_nesting() {
    let limits = ParseLimits { max_depth: 2 };
    let root = parse_html_with("<div><div><div>x</div></div></div>", &limits);
    assert_eq!(serialize_html(&root), "<div><div>x</div></div>");
}

#[test]
fn serialized_output_reparses_to_the_same_tree() {
    let root = parse_html(r#"<ul><li>a &amp; b<ul><li title='q"'>c</li></ul></li></ul>"#);
    let again = parse_html(&serialize_html(&root));
    assert_eq!(root, again);
}
