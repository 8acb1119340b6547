use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Numeric bounds enforced by the style and attribute policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleLimits {
    pub font_size_min_px: f64,
    pub font_size_max_px: f64,
    pub line_height_max: f64,
    pub padding_max_px: f64,
    pub border_width_max_px: f64,
    pub width_max_percent: f64,
    pub width_max_px: f64,
}

impl Default for StyleLimits {
    fn default() -> Self {
        Self {
            font_size_min_px: 6.0,
            font_size_max_px: 96.0,
            line_height_max: 3.0,
            padding_max_px: 100.0,
            border_width_max_px: 20.0,
            width_max_percent: 100.0,
            width_max_px: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseLimits {
    /// Open elements deeper than this are flattened into their parent.
    pub max_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// Tunable part of the sanitizer policy. The tag/attribute allowlists are
/// fixed tables; only numeric bounds are configurable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub style: StyleLimits,
    pub parse: ParseLimits,
}

impl PolicyConfig {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Process-wide default policy.
    pub fn global() -> &'static PolicyConfig {
        static DEFAULT: OnceLock<PolicyConfig> = OnceLock::new();
        DEFAULT.get_or_init(PolicyConfig::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config = PolicyConfig::from_json_str(r#"{ "style": { "padding_max_px": 40 } }"#)
            .expect("valid config");
        assert_eq!(config.style.padding_max_px, 40.0);
        assert_eq!(config.style.font_size_min_px, 6.0);
        assert_eq!(config.parse.max_depth, 256);
    }
}
