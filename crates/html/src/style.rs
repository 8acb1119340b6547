//! Inline `style` policy: an allowlist of CSS properties, each paired with a
//! validator that either rejects the value or returns its canonical form.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::StyleLimits;

pub type StyleValidator = fn(&str, &StyleLimits) -> Option<String>;

/// Allowed properties and their validators.
pub const STYLE_PROPERTIES: &[(&str, StyleValidator)] = &[
    ("text-align", text_align),
    ("line-height", line_height),
    ("color", color),
    ("background-color", color),
    ("font-size", font_size),
    ("font-family", font_family),
    ("border", border),
    ("border-collapse", border_collapse),
    ("width", width),
    ("padding", padding),
];

/// Result of filtering a whole `style` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleOutcome {
    /// Canonical declarations, or `None` when nothing survived.
    pub value: Option<String>,
    pub removed: usize,
}

pub fn validator_for(property: &str) -> Option<StyleValidator> {
    STYLE_PROPERTIES
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, validator)| *validator)
}

/// Validates one `property: value` pair and returns the canonical value.
pub fn sanitize_declaration(property: &str, value: &str, limits: &StyleLimits) -> Option<String> {
    let property = property.trim().to_ascii_lowercase();
    let value = value.trim();
    if value.is_empty() || has_forbidden_syntax(value) {
        return None;
    }
    let validator = validator_for(&property)?;
    validator(value, limits)
}

/// Filters a `style` attribute, keeping allowed declarations in canonical
/// form joined by `; `. A repeated property keeps its last accepted value.
pub fn sanitize_style(style: &str, limits: &StyleLimits) -> StyleOutcome {
    let mut kept: Vec<(String, String)> = Vec::new();
    let mut removed = 0usize;

    for declaration in style.split(';') {
        let declaration = declaration.trim();
        if declaration.is_empty() {
            continue;
        }
        let Some((property, value)) = declaration.split_once(':') else {
            removed += 1;
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        match sanitize_declaration(&property, value, limits) {
            Some(value) => match kept.iter_mut().find(|(p, _)| *p == property) {
                Some(existing) => existing.1 = value,
                None => kept.push((property, value)),
            },
            None => {
                tracing::trace!(
                    target: "berry::sanitize",
                    property = %property,
                    value = %value.trim(),
                    "dropping style declaration"
                );
                removed += 1;
            }
        }
    }

    let value = (!kept.is_empty()).then(|| {
        kept.iter()
            .map(|(p, v)| format!("{p}:{v}"))
            .collect::<Vec<_>>()
            .join("; ")
    });
    StyleOutcome { value, removed }
}

fn has_forbidden_syntax(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.contains("!important")
        || lower.contains("/*")
        || lower.contains('\\')
        || lower.contains('<')
        || lower.contains('{')
        || lower.contains('}')
}

fn number_unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?|\.\d+)(px|%)?$").expect("valid regex"))
}

fn hex_color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid regex"))
}

fn rgb_color_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^rgba?\(\s*(\d{1,3})(?:\s*,\s*|\s+)(\d{1,3})(?:\s*,\s*|\s+)(\d{1,3})\s*(?:[,/]\s*(?:\d*\.?\d+%?)\s*)?\)$",
        )
        .expect("valid regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LengthUnit {
    None,
    Px,
    Percent,
}

/// Parses an unsigned number with an optional `px` / `%` unit. Digit runs
/// too long for `f64` are rejected rather than read as infinity.
pub fn parse_length(value: &str) -> Option<(f64, LengthUnit)> {
    let caps = number_unit_re().captures(value.trim())?;
    let number: f64 = caps.get(1)?.as_str().parse().ok()?;
    if !number.is_finite() {
        return None;
    }
    let unit = match caps.get(2).map(|m| m.as_str()) {
        Some("px") => LengthUnit::Px,
        Some("%") => LengthUnit::Percent,
        _ => LengthUnit::None,
    };
    Some((number, unit))
}

/// Formats a number without leading or trailing zeros (`0.5`, `12`).
pub fn format_number(n: f64) -> String {
    let rounded = (n * 10_000.0).round() / 10_000.0;
    format!("{rounded}")
}

/// Parses a hex or `rgb()`/`rgba()` color into lowercase `#rrggbb`.
pub fn parse_color(value: &str) -> Option<String> {
    let value = value.trim();
    if let Some(caps) = hex_color_re().captures(value) {
        let digits = caps.get(1)?.as_str().to_ascii_lowercase();
        if digits.len() == 3 {
            let mut expanded = String::with_capacity(7);
            expanded.push('#');
            for ch in digits.chars() {
                expanded.push(ch);
                expanded.push(ch);
            }
            return Some(expanded);
        }
        return Some(format!("#{digits}"));
    }

    let caps = rgb_color_re().captures(value)?;
    let mut channels = [0u8; 3];
    for (ix, channel) in channels.iter_mut().enumerate() {
        let n: u16 = caps.get(ix + 1)?.as_str().parse().ok()?;
        *channel = u8::try_from(n).ok()?;
    }
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        channels[0], channels[1], channels[2]
    ))
}

fn text_align(value: &str, _limits: &StyleLimits) -> Option<String> {
    let value = value.to_ascii_lowercase();
    matches!(value.as_str(), "left" | "center" | "right" | "justify").then_some(value)
}

fn line_height(value: &str, limits: &StyleLimits) -> Option<String> {
    match parse_length(value)? {
        (n, LengthUnit::None) if n <= limits.line_height_max => Some(format_number(n)),
        _ => None,
    }
}

fn font_size(value: &str, limits: &StyleLimits) -> Option<String> {
    match parse_length(&value.to_ascii_lowercase())? {
        (n, LengthUnit::Px) if n >= limits.font_size_min_px && n <= limits.font_size_max_px => {
            Some(format!("{}px", format_number(n)))
        }
        _ => None,
    }
}

fn color(value: &str, _limits: &StyleLimits) -> Option<String> {
    parse_color(value)
}

fn font_family(value: &str, _limits: &StyleLimits) -> Option<String> {
    let mut families: Vec<String> = Vec::new();
    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() || entry.contains(&['(', ')', ';', ':'][..]) {
            return None;
        }

        let quoted = entry.len() >= 2
            && ((entry.starts_with('"') && entry.ends_with('"'))
                || (entry.starts_with('\'') && entry.ends_with('\'')));
        if quoted {
            let inner = entry[1..entry.len() - 1].trim();
            if inner.is_empty() || inner.contains(&['"', '\''][..]) {
                return None;
            }
            families.push(format!("\"{inner}\""));
            continue;
        }

        let bare_ok = entry
            .chars()
            .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_');
        if !bare_ok {
            return None;
        }
        families.push(entry.split_whitespace().collect::<Vec<_>>().join(" "));
    }
    (!families.is_empty()).then(|| families.join(", "))
}

fn border(value: &str, limits: &StyleLimits) -> Option<String> {
    let (width, rest) = value.trim().split_once(char::is_whitespace)?;
    let (style, color) = rest.trim_start().split_once(char::is_whitespace)?;

    let width = match parse_length(&width.to_ascii_lowercase())? {
        (n, LengthUnit::Px) if n <= limits.border_width_max_px => n,
        _ => return None,
    };
    if !style.eq_ignore_ascii_case("solid") {
        return None;
    }
    let color = parse_color(color)?;
    Some(format!("{}px solid {color}", format_number(width)))
}

fn border_collapse(value: &str, _limits: &StyleLimits) -> Option<String> {
    let value = value.to_ascii_lowercase();
    matches!(value.as_str(), "collapse" | "separate").then_some(value)
}

fn width(value: &str, limits: &StyleLimits) -> Option<String> {
    match parse_length(&value.to_ascii_lowercase())? {
        (n, LengthUnit::Percent) if n <= limits.width_max_percent => {
            Some(format!("{}%", format_number(n)))
        }
        (n, LengthUnit::Px) if n <= limits.width_max_px => {
            Some(format!("{}px", format_number(n)))
        }
        _ => None,
    }
}

fn padding(value: &str, limits: &StyleLimits) -> Option<String> {
    match parse_length(&value.to_ascii_lowercase())? {
        (n, LengthUnit::Px) if n <= limits.padding_max_px => {
            Some(format!("{}px", format_number(n)))
        }
        (n, LengthUnit::None) if n == 0.0 => Some("0px".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(property: &str, value: &str) -> Option<String> {
        sanitize_declaration(property, value, &StyleLimits::default())
    }

    #[test]
    fn colors_normalize_to_lowercase_six_digit_hex() {
        assert_eq!(check("color", "rgb(14,165,233)").as_deref(), Some("#0ea5e9"));
        assert_eq!(
            check("background-color", "rgba(225, 29, 72, 1)").as_deref(),
            Some("#e11d48")
        );
        assert_eq!(check("color", "#ABC").as_deref(), Some("#aabbcc"));
        assert_eq!(check("color", "#0EA5E9").as_deref(), Some("#0ea5e9"));
        assert_eq!(check("color", "#12"), None);
        assert_eq!(check("color", "rgb(300,0,0)"), None);
        assert_eq!(check("color", "red"), None);
    }

    #[test]
    fn numeric_bounds_are_inclusive() {
        assert_eq!(check("line-height", "3").as_deref(), Some("3"));
        assert_eq!(check("line-height", "0"), Some("0".to_string()));
        assert_eq!(check("line-height", "6"), None);
        assert_eq!(check("line-height", "1.5em"), None);
        assert_eq!(check("font-size", "6px").as_deref(), Some("6px"));
        assert_eq!(check("font-size", "96px").as_deref(), Some("96px"));
        assert_eq!(check("font-size", "5px"), None);
        assert_eq!(check("font-size", "97px"), None);
        assert_eq!(check("padding", "100px").as_deref(), Some("100px"));
        assert_eq!(check("padding", "999px"), None);
        assert_eq!(check("padding", "-10px"), None);
    }

    #[test]
    fn numbers_are_canonicalized() {
        assert_eq!(check("font-size", "012.50px").as_deref(), Some("12.5px"));
        assert_eq!(check("line-height", ".5").as_deref(), Some("0.5"));
        assert_eq!(check("width", "060%").as_deref(), Some("60%"));
    }

    #[test]
    fn font_family_rejects_function_syntax() {
        assert_eq!(
            check("font-family", "'Open Sans',  Arial , sans-serif").as_deref(),
            Some("\"Open Sans\", Arial, sans-serif")
        );
        assert_eq!(check("font-family", "url(https://evil/x.woff)"), None);
        assert_eq!(check("font-family", "Arial, expression(alert(1))"), None);
        assert_eq!(check("font-family", "Arial,,"), None);
    }

    #[test]
    fn border_only_allows_solid() {
        assert_eq!(
            check("border", "1px solid #000").as_deref(),
            Some("1px solid #000000")
        );
        assert_eq!(
            check("border", "2px solid rgb(0, 0, 0)").as_deref(),
            Some("2px solid #000000")
        );
        assert_eq!(check("border", "2px dashed #000"), None);
        assert_eq!(check("border", "1px solid"), None);
    }

    #[test]
    fn width_accepts_percent_and_pixels_only() {
        assert_eq!(check("width", "60%").as_deref(), Some("60%"));
        assert_eq!(check("width", "320px").as_deref(), Some("320px"));
        assert_eq!(check("width", "calc(100% - 10px)"), None);
        assert_eq!(check("width", "120%"), None);
        assert_eq!(check("width", "10em"), None);
        assert_eq!(check("width", "10000px").as_deref(), Some("10000px"));
        assert_eq!(check("width", "10001px"), None);
    }

    #[test]
    fn unknown_and_important_declarations_are_dropped() {
        assert_eq!(check("position", "absolute"), None);
        assert_eq!(check("color", "#000 !important"), None);
        assert_eq!(check("text-align", "diagonal"), None);
        assert_eq!(check("TEXT-ALIGN", "Center").as_deref(), Some("center"));
    }

    #[test]
    fn sanitize_style_keeps_last_value_and_counts_removals() {
        let outcome = sanitize_style(
            "color: #fff; position:absolute; color: rgb(0,0,0); garbage",
            &StyleLimits::default(),
        );
        assert_eq!(outcome.value.as_deref(), Some("color:#000000"));
        assert_eq!(outcome.removed, 2);

        let outcome = sanitize_style("position:fixed", &StyleLimits::default());
        assert_eq!(outcome.value, None);
        assert_eq!(outcome.removed, 1);
    }

    #[test]
    fn sanitize_style_is_stable() {
        let limits = StyleLimits::default();
        let once = sanitize_style(
            "text-align:CENTER;font-family:'A B', c;border:1px SOLID #FFF;padding:0",
            &limits,
        );
        let value = once.value.expect("declarations survive");
        let twice = sanitize_style(&value, &limits);
        assert_eq!(twice.value.as_deref(), Some(value.as_str()));
        assert_eq!(twice.removed, 0);
    }
}
