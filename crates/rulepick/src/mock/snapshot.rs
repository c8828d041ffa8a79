//! Serializable page snapshots.
//!
//! A snapshot is the static shape of a rendered page: element tags,
//! attributes, computed styles and geometry. The CLI reads them from JSON and
//! tests build them with the `with_*` helpers.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dom::BoundingBox;
use crate::result::{PickError, PickResult};

/// A whole page: its location and the `body` subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Page URL
    pub url: String,
    /// The `body` element
    pub body: ElementSnapshot,
}

impl PageSnapshot {
    /// Create a snapshot with an empty body
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: ElementSnapshot::new("body"),
        }
    }

    /// Replace the body subtree
    #[must_use]
    pub fn with_body(mut self, body: ElementSnapshot) -> Self {
        self.body = body;
        self
    }

    /// Parse from JSON text
    pub fn from_json(json: &str) -> PickResult<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Read a JSON snapshot file
    pub fn load(path: &Path) -> PickResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> PickResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> PickResult<()> {
        if !self.body.tag.eq_ignore_ascii_case("body") {
            return Err(PickError::snapshot(format!(
                "root element must be <body>, found <{}>",
                self.body.tag
            )));
        }
        if self.url.trim().is_empty() {
            return Err(PickError::snapshot("page url is empty"));
        }
        self.body.validate()
    }
}

/// One element and its subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Tag name
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Computed style properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
    /// Rendered geometry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<BoundingBox>,
    /// Leading text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Element children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSnapshot>,
}

fn default_tag() -> String {
    "div".to_string()
}

impl Default for ElementSnapshot {
    fn default() -> Self {
        Self::new("div")
    }
}

impl ElementSnapshot {
    /// Create an element with the given tag
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            rect: None,
            text: None,
            children: Vec::new(),
        }
    }

    /// Set the id attribute
    #[must_use]
    pub fn with_id(self, id: &str) -> Self {
        self.with_attr("id", id)
    }

    /// Add a class token
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        let value = match self.attributes.get("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.attributes.insert("class".to_string(), value);
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Set a style property
    #[must_use]
    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.style.insert(property.to_string(), value.to_string());
        self
    }

    /// Set the geometry
    #[must_use]
    pub fn with_rect(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.rect = Some(BoundingBox::new(x, y, width, height));
        self
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Add a child element
    #[must_use]
    pub fn with_child(mut self, child: ElementSnapshot) -> Self {
        self.children.push(child);
        self
    }

    /// Number of elements in this subtree, self included
    #[must_use]
    pub fn element_count(&self) -> usize {
        1 + self.children.iter().map(Self::element_count).sum::<usize>()
    }

    fn validate(&self) -> PickResult<()> {
        let valid_tag = !self.tag.is_empty()
            && self
                .tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid_tag {
            return Err(PickError::snapshot(format!("invalid tag name {:?}", self.tag)));
        }
        self.children.iter().try_for_each(Self::validate)
    }
}
