//! Picker configuration.
//!
//! Every field has a default, so an empty YAML or JSON document is a valid
//! configuration. Files ending in `.json` are read as JSON, anything else as
//! YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::result::{PickError, PickResult};

/// Configuration for a picking session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Class marking elements the picker created; these are never picked
    pub ignore_class: String,
    /// Class given to iframe/embed/object placeholders
    pub placeholder_class: String,
    /// Id prefix for placeholders, followed by a running index
    pub placeholder_id_prefix: String,
    /// Class given to highlight border regions
    pub border_class: String,
    /// Border thickness in pixels
    pub border_width: f32,
    /// Gap between the element and its border in pixels
    pub border_padding: f32,
    /// Extra height of the bottom border, which carries the label
    pub label_height: f32,
    /// Attributes that may carry a blockable resource URL, in lookup order
    pub url_attributes: Vec<String>,
    /// Tags that are never selectable
    pub restricted_tags: Vec<String>,
    /// Tags replaced by placeholders while picking
    pub substitute_tags: Vec<String>,
    /// Stacking order of the post-selection overlay
    pub overlay_z_index: i64,
    /// Id of the preview `<style>` element
    pub preview_style_id: String,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            ignore_class: "rulepick-ignore".to_string(),
            placeholder_class: "rulepick-placeholder".to_string(),
            placeholder_id_prefix: "rulepick-placeholder-".to_string(),
            border_class: "rulepick-border".to_string(),
            border_width: 5.0,
            border_padding: 2.0,
            label_height: 6.0,
            url_attributes: vec!["src".to_string(), "data".to_string()],
            restricted_tags: ["html", "head", "body", "base"]
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
            substitute_tags: ["iframe", "embed", "object"]
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
            overlay_z_index: 2_147_483_647,
            preview_style_id: "rulepick-preview".to_string(),
        }
    }
}

impl PickerConfig {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> PickerConfigBuilder {
        PickerConfigBuilder::default()
    }

    /// Parse YAML text
    pub fn from_yaml_str(text: &str) -> PickResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON text
    pub fn from_json_str(text: &str) -> PickResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json` or YAML file
    pub fn load(path: &Path) -> PickResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Check values that would break picking
    pub fn validate(&self) -> PickResult<()> {
        if self.ignore_class.trim().is_empty() || self.ignore_class.contains(char::is_whitespace) {
            return Err(PickError::config("ignore_class must be a single class name"));
        }
        if self.placeholder_class.contains(char::is_whitespace) {
            return Err(PickError::config("placeholder_class must be a single class name"));
        }
        if self.border_width.is_nan() || self.border_width <= 0.0 {
            return Err(PickError::config("border_width must be positive"));
        }
        if self.border_padding < 0.0 || self.label_height < 0.0 {
            return Err(PickError::config(
                "border_padding and label_height must not be negative",
            ));
        }
        if self.url_attributes.iter().any(|a| a.trim().is_empty()) {
            return Err(PickError::config("url_attributes must not contain blanks"));
        }
        Ok(())
    }

    /// Whether `tag` can never be picked
    #[must_use]
    pub fn is_restricted(&self, tag: &str) -> bool {
        crate::locator::is_structural_tag(tag, &self.restricted_tags)
    }

    /// Whether elements with `tag` get a placeholder while picking
    #[must_use]
    pub fn is_substituted(&self, tag: &str) -> bool {
        self.substitute_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Builder for `PickerConfig`
#[derive(Debug, Clone, Default)]
pub struct PickerConfigBuilder {
    config: PickerConfig,
}

impl PickerConfigBuilder {
    /// Set the picker-internal class
    #[must_use]
    pub fn ignore_class(mut self, class: impl Into<String>) -> Self {
        self.config.ignore_class = class.into();
        self
    }

    /// Set the placeholder id prefix
    #[must_use]
    pub fn placeholder_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.placeholder_id_prefix = prefix.into();
        self
    }

    /// Set border thickness and padding
    #[must_use]
    pub fn border(mut self, width: f32, padding: f32) -> Self {
        self.config.border_width = width;
        self.config.border_padding = padding;
        self
    }

    /// Set resource URL attribute names
    #[must_use]
    pub fn url_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.url_attributes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the overlay stacking order
    #[must_use]
    pub fn overlay_z_index(mut self, z_index: i64) -> Self {
        self.config.overlay_z_index = z_index;
        self
    }

    /// Build and validate
    pub fn build(self) -> PickResult<PickerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
