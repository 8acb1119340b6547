//! Tag, attribute and URL allowlists.
//!
//! Everything here is plain static data plus small validators so the tables
//! can be tested independently of the tree walk in [`crate::sanitize`].

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::config::StyleLimits;
use crate::node::Attributes;
use crate::style::sanitize_style;

pub const ALLOWED_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "strong", "b", "em", "i", "u", "s", "strike", "ul",
    "ol", "li", "table", "tbody", "tr", "td", "th", "figure", "div", "span", "a", "img", "br",
];

/// Tags removed together with their whole subtree, text included.
pub const DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "noscript",
    "noembed", "noframes", "template", "svg", "math", "textarea", "select", "button", "input",
    "form", "head", "title", "meta", "link", "base",
];

pub const CLASS_TOKENS: &[&str] = &[
    "berry-attachment",
    "berry-attachment-image",
    "berry-attachment-document",
    "berry-emoji",
    "berry-table",
    "berry-image-align-left",
    "berry-image-align-center",
    "berry-image-align-right",
    "berry-image-wrap",
];

pub const ATTR_ATTACHMENT_ID: &str = "data-berry-attachment-id";
pub const ATTR_URL: &str = "data-berry-url";
pub const ATTR_PREVIEW_URL: &str = "data-berry-preview-url";
pub const ATTR_FILENAME: &str = "data-berry-filename";
pub const ATTR_FILESIZE: &str = "data-berry-filesize";
pub const ATTR_CONTENT_TYPE: &str = "data-berry-content-type";
pub const ATTR_IMAGE_ALIGN: &str = "data-berry-image-align";
pub const ATTR_IMAGE_WRAP: &str = "data-berry-image-wrap";
pub const ATTR_IMAGE_WRAP_SIDE: &str = "data-berry-image-wrap-side";
pub const ATTR_IMAGE_PADDING: &str = "data-berry-image-padding";
pub const ATTR_IMAGE_WIDTH: &str = "data-berry-image-width";
pub const ATTR_IMAGE_WIDTH_UNIT: &str = "data-berry-image-width-unit";
pub const ATTR_EMOJI: &str = "data-berry-emoji";

/// Attachment and emoji metadata, allowed on `figure` and `img` only.
pub const BERRY_DATA_ATTRS: &[&str] = &[
    ATTR_ATTACHMENT_ID,
    ATTR_URL,
    ATTR_PREVIEW_URL,
    ATTR_FILENAME,
    ATTR_FILESIZE,
    ATTR_CONTENT_TYPE,
    ATTR_IMAGE_ALIGN,
    ATTR_IMAGE_WRAP,
    ATTR_IMAGE_WRAP_SIDE,
    ATTR_IMAGE_PADDING,
    ATTR_IMAGE_WIDTH,
    ATTR_IMAGE_WIDTH_UNIT,
    ATTR_EMOJI,
];

pub const GLOBAL_ATTRS: &[&str] = &["class", "style"];

const TAG_ATTRS: &[(&str, &[&str])] = &[
    ("a", &["href", "title", "target", "rel"]),
    ("img", &["src", "alt", "title", "width", "height"]),
    ("td", &["colspan", "rowspan"]),
    ("th", &["colspan", "rowspan"]),
    ("ol", &["start"]),
];

pub const URL_ATTRS: &[&str] = &["href", "src", ATTR_URL, ATTR_PREVIEW_URL];

pub const ALLOWED_SCHEMES: &[&str] = &["http", "https", "blob"];

const MAX_ID_LEN: usize = 256;
const MAX_TEXT_ATTR_LEN: usize = 1024;
const MAX_EMOJI_LEN: usize = 32;
const MAX_SPAN: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagDisposition {
    Keep,
    /// Drop the wrapper, keep (sanitized) children in place.
    Unwrap,
    /// Drop the element and its subtree.
    Remove,
}

pub fn tag_disposition(tag: &str) -> TagDisposition {
    if ALLOWED_TAGS.contains(&tag) {
        TagDisposition::Keep
    } else if DROPPED_TAGS.contains(&tag) {
        TagDisposition::Remove
    } else {
        TagDisposition::Unwrap
    }
}

pub fn is_allowed_attribute(tag: &str, name: &str) -> bool {
    if GLOBAL_ATTRS.contains(&name) {
        return true;
    }
    if matches!(tag, "figure" | "img") && BERRY_DATA_ATTRS.contains(&name) {
        return true;
    }
    TAG_ATTRS
        .iter()
        .find(|(t, _)| *t == tag)
        .is_some_and(|(_, attrs)| attrs.contains(&name))
}

/// Returns the value to keep for `name` on `tag`, or `None` to drop it.
pub fn sanitize_attribute(
    tag: &str,
    name: &str,
    value: &str,
    limits: &StyleLimits,
) -> Option<String> {
    if !is_allowed_attribute(tag, name) {
        return None;
    }

    match name {
        "class" => sanitize_class(value),
        "style" => sanitize_style(value, limits).value,
        "src" if tag == "img" => is_safe_image_src(value).then(|| value.to_string()),
        "href" | "src" | ATTR_URL | ATTR_PREVIEW_URL => is_safe_url(value).then(|| value.to_string()),
        "alt" | "title" | ATTR_FILENAME => {
            (value.chars().count() <= MAX_TEXT_ATTR_LEN).then(|| value.to_string())
        }
        "target" => matches!(value, "_blank" | "_self").then(|| value.to_string()),
        "rel" => {
            let ok = value.split_whitespace().all(|token| {
                token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
            });
            (ok && !value.trim().is_empty()).then(|| value.to_string())
        }
        "width" | "height" => parse_u32(value)
            .filter(|&n| n <= 100_000)
            .map(|_| value.to_string()),
        "colspan" | "rowspan" => parse_u32(value)
            .filter(|&n| (1..=MAX_SPAN).contains(&n))
            .map(|_| value.to_string()),
        "start" => parse_u32(value).map(|_| value.to_string()),
        ATTR_ATTACHMENT_ID => {
            (!value.is_empty() && value.chars().count() <= MAX_ID_LEN).then(|| value.to_string())
        }
        ATTR_FILESIZE => parse_u64(value).map(|_| value.to_string()),
        ATTR_CONTENT_TYPE => is_mime_type(value).then(|| value.to_string()),
        ATTR_IMAGE_ALIGN => {
            matches!(value, "left" | "center" | "right").then(|| value.to_string())
        }
        ATTR_IMAGE_WRAP => matches!(value, "true" | "false").then(|| value.to_string()),
        ATTR_IMAGE_WRAP_SIDE => matches!(value, "left" | "right").then(|| value.to_string()),
        ATTR_IMAGE_PADDING => parse_u32(value)
            .filter(|&n| f64::from(n) <= limits.padding_max_px)
            .map(|_| value.to_string()),
        ATTR_IMAGE_WIDTH => parse_u32(value)
            .filter(|&n| n <= 100_000)
            .map(|_| value.to_string()),
        ATTR_IMAGE_WIDTH_UNIT => matches!(value, "percent" | "pixel").then(|| value.to_string()),
        ATTR_EMOJI => {
            let len = value.chars().count();
            (len > 0 && len <= MAX_EMOJI_LEN).then(|| value.to_string())
        }
        _ => None,
    }
}

/// A link opening a new browsing context must not hand it `window.opener`:
/// `target="_blank"` forces a `noopener` token into `rel`.
pub fn enforce_link_rel(tag: &str, attrs: &mut Attributes) {
    if tag != "a" || attrs.get("target").map(String::as_str) != Some("_blank") {
        return;
    }
    let rel = attrs.entry("rel".to_string()).or_default();
    if rel
        .split_whitespace()
        .any(|token| token.eq_ignore_ascii_case("noopener"))
    {
        return;
    }
    if !rel.is_empty() {
        rel.push(' ');
    }
    rel.push_str("noopener");
}

/// Keeps recognized class tokens verbatim, drops the rest.
pub fn sanitize_class(value: &str) -> Option<String> {
    let kept: Vec<&str> = value
        .split_whitespace()
        .filter(|token| CLASS_TOKENS.contains(token))
        .collect();
    (!kept.is_empty()).then(|| kept.join(" "))
}

/// `http:`, `https:` and `blob:` URLs. Relative and scheme-less values are
/// rejected.
pub fn is_safe_url(value: &str) -> bool {
    match Url::parse(value.trim()) {
        Ok(url) => ALLOWED_SCHEMES.contains(&url.scheme()),
        Err(_) => false,
    }
}

/// Like [`is_safe_url`], additionally accepting base64 raster `data:` images.
pub fn is_safe_image_src(value: &str) -> bool {
    is_safe_url(value) || data_image_re().is_match(value.trim())
}

pub fn is_mime_type(value: &str) -> bool {
    mime_re().is_match(value)
}

fn data_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^data:image/(png|jpe?g|gif|webp|avif);base64,[a-z0-9+/=]*$")
            .expect("valid regex")
    })
}

fn mime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]{0,126}/[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]{0,126}$")
            .expect("valid regex")
    })
}

fn parse_u32(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn parse_u64(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
