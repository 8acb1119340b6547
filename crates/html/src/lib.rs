//! HTML fragment parsing, serialization and allowlist sanitization for the
//! berry editor.
//!
//! [`sanitize_html`] is the single gate untrusted markup passes through. Its
//! output is balanced, attribute-sorted HTML, and feeding it back in returns
//! the same string.

mod config;
mod entities;
mod node;
mod parser;
pub mod policy;
mod sanitize;
mod serialize;
pub mod style;

pub use config::{ParseLimits, PolicyConfig, StyleLimits};
pub use entities::{decode_attribute_entities, decode_entities};
pub use node::{Attributes, ElementNode, GenericNode, TextNode, FRAGMENT_TAG};
pub use parser::{is_void_tag, parse_html, parse_html_with};
pub use policy::{is_safe_image_src, is_safe_url};
pub use sanitize::{
    sanitize_html, sanitize_html_with_report, sanitize_tree, SanitizeReport, Sanitizer,
};
pub use serialize::serialize_html;
pub use style::parse_color;
