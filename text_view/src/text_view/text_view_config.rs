// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

use crate::{CommonResult, DEFAULT_CLICK_AFFINITY_THRESHOLD, DEFAULT_FONT_SIZE,
            DEFAULT_OVERDRAW_MULTIPLIER, LayoutConfig, ResolverOptions, TextAttributes,
            TextViewError, ViewportConfig};

/// Settings for a [`crate::TextView`]. Every field has a default, so a JSON document
/// only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextViewConfig {
    /// When `false` lines never wrap and the content grows as wide as its longest line.
    pub width_tracks_text_view: bool,
    pub container_width: f64,
    pub line_fragment_padding: f64,
    pub overdraw_multiplier: f64,
    pub click_affinity_threshold: f64,
    pub allows_undo: bool,
    /// `0` means unlimited.
    pub levels_of_undo: usize,
    pub is_editable: bool,
    pub is_selectable: bool,
    pub shows_invisible_characters: bool,
    pub typing_coalescing: bool,
    pub scale_factor: f64,
    pub default_font_size: f64,
}

impl Default for TextViewConfig {
    fn default() -> Self {
        Self {
            width_tracks_text_view: true,
            container_width: 500.0,
            line_fragment_padding: 0.0,
            overdraw_multiplier: DEFAULT_OVERDRAW_MULTIPLIER,
            click_affinity_threshold: DEFAULT_CLICK_AFFINITY_THRESHOLD,
            allows_undo: true,
            levels_of_undo: 0,
            is_editable: true,
            is_selectable: true,
            shows_invisible_characters: false,
            typing_coalescing: true,
            scale_factor: 1.0,
            default_font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl TextViewConfig {
    pub fn from_json_str(json: &str) -> CommonResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|error| {
            TextViewError::InvalidConfiguration {
                reason: error.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CommonResult<()> {
        let invalid = |reason: &str| -> CommonResult<()> {
            Err(TextViewError::InvalidConfiguration {
                reason: reason.to_string(),
            }
            .into())
        };
        if !(self.container_width.is_finite() && self.container_width > 0.0) {
            return invalid("container_width must be a positive number");
        }
        if !(self.default_font_size.is_finite() && self.default_font_size > 0.0) {
            return invalid("default_font_size must be a positive number");
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return invalid("scale_factor must be a positive number");
        }
        if self.overdraw_multiplier < 0.0 || self.line_fragment_padding < 0.0 {
            return invalid("overdraw_multiplier and line_fragment_padding can't be negative");
        }
        Ok(())
    }

    #[must_use]
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            container_width: self.container_width,
            wraps: self.width_tracks_text_view,
            line_fragment_padding: self.line_fragment_padding,
        }
    }

    #[must_use]
    pub fn viewport_config(&self) -> ViewportConfig {
        ViewportConfig {
            overdraw_multiplier: self.overdraw_multiplier,
            scale_factor: self.scale_factor,
            shows_invisible_characters: self.shows_invisible_characters,
        }
    }

    #[must_use]
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            allow_outside: true,
            affinity_threshold: self.click_affinity_threshold,
        }
    }

    #[must_use]
    pub fn default_attributes(&self) -> TextAttributes {
        TextAttributes::default().with_font_size(self.default_font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            TextViewConfig::from_json_str(r#"{ "container_width": 320.0, "typing_coalescing": false }"#)
                .unwrap();
        assert_eq!(config.container_width, 320.0);
        assert!(!config.typing_coalescing);
        assert_eq!(config.overdraw_multiplier, DEFAULT_OVERDRAW_MULTIPLIER);
        assert!(config.layout_config().wraps);
    }

    #[test]
    fn test_invalid_json_is_a_diagnostic() {
        let error = TextViewConfig::from_json_str("{ not json").unwrap_err();
        assert!(error.to_string().starts_with("⚙️ Invalid configuration"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let error = TextViewConfig::from_json_str(r#"{ "container_width": -1.0 }"#).unwrap_err();
        assert!(error.to_string().contains("container_width"));
    }

    #[test]
    fn test_no_wrap_config() {
        let config = TextViewConfig {
            width_tracks_text_view: false,
            ..Default::default()
        };
        assert_eq!(config.layout_config().wrap_width(), f64::MAX);
    }
}
