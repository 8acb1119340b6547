use serde::Serialize;

use crate::config::PolicyConfig;
use crate::node::{push_merging_text, ElementNode, GenericNode};
use crate::parser::{is_void_tag, parse_html_with};
use crate::policy::{enforce_link_rel, sanitize_attribute, tag_disposition, TagDisposition};
use crate::serialize::serialize_html;
use crate::style::sanitize_style;

/// Counts of what a sanitize pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    /// Elements dropped together with their subtree.
    pub removed_elements: usize,
    /// Unknown wrappers replaced by their children.
    pub unwrapped_elements: usize,
    pub removed_attributes: usize,
    pub removed_declarations: usize,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        *self == SanitizeReport::default()
    }
}

/// Applies the fixed allowlist with the numeric bounds of a [`PolicyConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Sanitizer<'a> {
    config: &'a PolicyConfig,
}

impl Default for Sanitizer<'static> {
    fn default() -> Self {
        Self {
            config: PolicyConfig::global(),
        }
    }
}

impl<'a> Sanitizer<'a> {
    pub fn new(config: &'a PolicyConfig) -> Self {
        Self { config }
    }

    pub fn sanitize(&self, html: &str) -> String {
        self.sanitize_with_report(html).0
    }

    pub fn sanitize_with_report(&self, html: &str) -> (String, SanitizeReport) {
        let root = parse_html_with(html, &self.config.parse);
        let (clean, report) = self.sanitize_tree(&root);
        if !report.is_clean() {
            tracing::debug!(
                target: "berry::sanitize",
                removed_elements = report.removed_elements,
                unwrapped_elements = report.unwrapped_elements,
                removed_attributes = report.removed_attributes,
                removed_declarations = report.removed_declarations,
                "sanitized html"
            );
        }
        (serialize_html(&clean), report)
    }

    /// Filters an already parsed tree. The result is always a fragment.
    pub fn sanitize_tree(&self, root: &GenericNode) -> (GenericNode, SanitizeReport) {
        let mut report = SanitizeReport::default();
        let mut children = Vec::new();
        match root {
            GenericNode::Element(el) if root.is_fragment() => {
                self.children_into(&el.children, &mut children, &mut report);
            }
            _ => self.children_into(std::slice::from_ref(root), &mut children, &mut report),
        }
        (GenericNode::fragment(children), report)
    }

    fn children_into(
        &self,
        children: &[GenericNode],
        out: &mut Vec<GenericNode>,
        report: &mut SanitizeReport,
    ) {
        for child in children {
            match child {
                GenericNode::Text(_) => push_merging_text(out, child.clone()),
                GenericNode::Element(el) => match tag_disposition(&el.tag) {
                    TagDisposition::Remove => {
                        tracing::trace!(target: "berry::sanitize", tag = %el.tag, "removing element");
                        report.removed_elements += 1;
                    }
                    TagDisposition::Unwrap => {
                        tracing::trace!(target: "berry::sanitize", tag = %el.tag, "unwrapping element");
                        report.unwrapped_elements += 1;
                        self.children_into(&el.children, out, report);
                    }
                    TagDisposition::Keep => {
                        let clean = self.element(el, report);
                        push_merging_text(out, GenericNode::Element(clean));
                    }
                },
            }
        }
    }

    fn element(&self, el: &ElementNode, report: &mut SanitizeReport) -> ElementNode {
        let limits = &self.config.style;
        let mut clean = ElementNode::new(el.tag.clone());

        for (name, value) in &el.attrs {
            let kept = if name == "style" {
                let outcome = sanitize_style(value, limits);
                report.removed_declarations += outcome.removed;
                outcome.value
            } else {
                sanitize_attribute(&el.tag, name, value, limits)
            };
            match kept {
                Some(kept) => {
                    clean.attrs.insert(name.clone(), kept);
                }
                None => {
                    tracing::trace!(
                        target: "berry::sanitize",
                        tag = %el.tag,
                        attr = %name,
                        "removing attribute"
                    );
                    report.removed_attributes += 1;
                }
            }
        }

        enforce_link_rel(&clean.tag, &mut clean.attrs);

        if !is_void_tag(&el.tag) {
            self.children_into(&el.children, &mut clean.children, report);
        }
        clean
    }
}

/// Sanitizes untrusted HTML with the process-wide policy.
pub fn sanitize_html(html: &str) -> String {
    Sanitizer::default().sanitize(html)
}

pub fn sanitize_html_with_report(html: &str) -> (String, SanitizeReport) {
    Sanitizer::default().sanitize_with_report(html)
}

pub fn sanitize_tree(root: &GenericNode) -> GenericNode {
    Sanitizer::default().sanitize_tree(root).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_wrappers_merge_adjacent_text() {
        let (html, report) = sanitize_html_with_report("<p>a<section>b</section>c</p>");
        assert_eq!(html, "<p>abc</p>");
        assert_eq!(report.unwrapped_elements, 1);
    }

    #[test]
    fn void_elements_lose_children_from_synthetic_trees() {
        let br = ElementNode::new("br").with_children(vec![GenericNode::text("x")]);
        let root = GenericNode::fragment(vec![br.into()]);
        assert_eq!(serialize_html(&sanitize_tree(&root)), "<br>");
    }

    #[test]
    fn custom_limits_apply() {
        let config = PolicyConfig::from_json_str(r#"{ "style": { "padding_max_px": 10 } }"#)
            .expect("valid config");
        let sanitizer = Sanitizer::new(&config);
        assert_eq!(
            sanitizer.sanitize(r#"<p style="padding:20px">x</p>"#),
            "<p>x</p>"
        );
        assert_eq!(
            sanitizer.sanitize(r#"<p style="padding:8px">x</p>"#),
            r#"<p style="padding:8px">x</p>"#
        );
    }
}
