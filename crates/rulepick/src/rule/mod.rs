//! Filter rule construction.
//!
//! Turns a picked element plus scope options into rule text for a content
//! filtering engine, and inverts rule text back into a selector that can
//! preview-hide what the rule would match.
//!
//! Two wire forms exist:
//!
//! - element hiding: `<domain?>##<selector>`
//! - network blocking: `||<url-fragment>$domain=<domain>` (option omitted in
//!   one-domain mode)
//!
//! ```rust
//! use rulepick::dom::DomTree;
//! use rulepick::mock::{ElementSnapshot, MockDom};
//! use rulepick::rule::{construct_rule_text, RuleOptions};
//!
//! let mut dom = MockDom::new("http://example.com/");
//! let body = dom.body().unwrap();
//! dom.mount(
//!     &body,
//!     &ElementSnapshot::new("div")
//!         .with_id("ad1")
//!         .with_child(ElementSnapshot::new("img").with_class("banner")),
//! );
//! let img = dom.find("0/0").unwrap();
//! let text = construct_rule_text(&dom, &img, &RuleOptions::new(dom.location()));
//! assert_eq!(text, "example.com##div#ad1 > img.banner");
//! ```

mod escape;
mod resource;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub use escape::css_escape;
pub use resource::{crop_domain, is_resource_url, resource_host, url_pattern};

use crate::dom::DomTree;
use crate::locator::element_position;

/// Element-hiding marker
pub const CSS_RULE_MARK: &str = "##";

/// Start of the rule options section
pub const RULE_OPTIONS_MARK: &str = "$";

/// Attributes that may carry a blockable resource URL, in lookup order
pub const RESOURCE_URL_ATTRIBUTES: [&str; 2] = ["src", "data"];

/// Kind of rule to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// Element hiding by CSS selector
    #[default]
    Css,
    /// Network request blocking by URL pattern
    Url,
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css => write!(f, "CSS"),
            Self::Url => write!(f, "URL"),
        }
    }
}

/// How a CSS selector describes the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CssSelectorType {
    /// Full parent-child path up to the nearest id or `body`
    #[default]
    StrictFull,
    /// The target alone: `tag#id.class`
    Strict,
    /// Any element sharing one of the target's classes
    Similar,
}

impl fmt::Display for CssSelectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrictFull => write!(f, "STRICT_FULL"),
            Self::Strict => write!(f, "STRICT"),
            Self::Similar => write!(f, "SIMILAR"),
        }
    }
}

/// Inputs to rule construction besides the element itself
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    /// CSS or URL rule
    pub rule_type: RuleType,
    /// Selector flavour for CSS rules
    pub css_selector_type: CssSelectorType,
    /// Omit the domain restriction
    pub is_block_one_domain: bool,
    /// Location of the page the element lives on
    pub url: String,
    /// Resource URL to block; looked up on the element when absent
    pub url_mask: Option<String>,
    /// Classes to use instead of the element's own
    pub class_list: Option<Vec<String>>,
    /// Leave the tag name out of the target segment
    pub exclude_tag_name: Option<bool>,
    /// Leave the id out of the target segment
    pub exclude_id: Option<bool>,
    /// Raw attribute selector text appended to CSS selectors
    pub attributes: Option<String>,
}

impl RuleOptions {
    /// Default options for a page
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the rule type
    #[must_use]
    pub const fn with_rule_type(mut self, rule_type: RuleType) -> Self {
        self.rule_type = rule_type;
        self
    }

    /// Set the selector flavour
    #[must_use]
    pub const fn with_selector_type(mut self, selector_type: CssSelectorType) -> Self {
        self.css_selector_type = selector_type;
        self
    }

    /// Toggle one-domain mode
    #[must_use]
    pub const fn with_one_domain(mut self, one_domain: bool) -> Self {
        self.is_block_one_domain = one_domain;
        self
    }

    /// Override the resource URL
    #[must_use]
    pub fn with_url_mask(mut self, mask: impl Into<String>) -> Self {
        self.url_mask = Some(mask.into());
        self
    }

    /// Override the class list
    #[must_use]
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_list = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    /// Include or suppress the tag name
    #[must_use]
    pub const fn with_exclude_tag_name(mut self, exclude: bool) -> Self {
        self.exclude_tag_name = Some(exclude);
        self
    }

    /// Include or suppress the id
    #[must_use]
    pub const fn with_exclude_id(mut self, exclude: bool) -> Self {
        self.exclude_id = Some(exclude);
        self
    }

    /// Append raw attribute selector text
    #[must_use]
    pub fn with_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.attributes = Some(attributes.into());
        self
    }
}

/// A constructed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// CSS or URL
    pub kind: RuleType,
    /// Selector (CSS) or network pattern (URL)
    pub body: String,
    /// Cropped site domain the rule is restricted to
    pub domain: Option<String>,
}

impl Rule {
    /// Element-hiding rule
    #[must_use]
    pub fn css(selector: impl Into<String>, domain: Option<String>) -> Self {
        Self {
            kind: RuleType::Css,
            body: selector.into(),
            domain,
        }
    }

    /// Network-blocking rule
    #[must_use]
    pub fn url(pattern: impl Into<String>, domain: Option<String>) -> Self {
        Self {
            kind: RuleType::Url,
            body: pattern.into(),
            domain,
        }
    }

    /// Whether the rule only applies on one site
    #[must_use]
    pub const fn is_domain_restricted(&self) -> bool {
        self.domain.is_some()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.domain) {
            (RuleType::Css, Some(domain)) => write!(f, "{domain}{CSS_RULE_MARK}{}", self.body),
            (RuleType::Css, None) => write!(f, "{CSS_RULE_MARK}{}", self.body),
            (RuleType::Url, Some(domain)) => {
                write!(f, "{}{RULE_OPTIONS_MARK}domain={domain}", self.body)
            }
            (RuleType::Url, None) => write!(f, "{}", self.body),
        }
    }
}

/// One attribute of a described element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    /// Attribute name
    pub name: String,
    /// Attribute value
    pub value: String,
}

/// What the host needs to decide which rule options to offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Lower-case tag name
    pub tag_name: String,
    /// Class tokens
    pub classes: Vec<String>,
    /// All attributes
    pub attributes: Vec<AttributeInfo>,
    /// First attribute value that resolves to a resource URL
    pub resource_url: Option<String>,
    /// Whether `resource_url` is set
    pub has_resource_url: bool,
    /// Whether the element has at least one class
    pub has_class_attribute: bool,
    /// Whether the element has a non-blank id
    pub has_id_attribute: bool,
}

/// First attribute among `names` whose value resolves to a resource URL
pub fn resource_url<D: DomTree + ?Sized, S: AsRef<str>>(
    dom: &D,
    node: &D::Node,
    names: &[S],
) -> Option<String> {
    let base = dom.location();
    names
        .iter()
        .filter_map(|name| dom.attribute(node, name.as_ref()))
        .find(|value| is_resource_url(value, &base))
}

/// Describe `node` using the default resource-URL attributes
pub fn describe_node<D: DomTree + ?Sized>(dom: &D, node: &D::Node) -> ElementInfo {
    describe_node_with(dom, node, &RESOURCE_URL_ATTRIBUTES)
}

/// Describe `node`, looking for resource URLs in `url_attributes`
pub fn describe_node_with<D: DomTree + ?Sized, S: AsRef<str>>(
    dom: &D,
    node: &D::Node,
    url_attributes: &[S],
) -> ElementInfo {
    let classes = dom.class_list(node);
    let resource_url = resource_url(dom, node, url_attributes);
    ElementInfo {
        tag_name: dom.tag_name(node),
        has_class_attribute: !classes.is_empty(),
        classes,
        attributes: dom
            .attributes(node)
            .into_iter()
            .map(|(name, value)| AttributeInfo { name, value })
            .collect(),
        has_resource_url: resource_url.is_some(),
        resource_url,
        has_id_attribute: dom.id(node).is_some_and(|id| !id.trim().is_empty()),
    }
}

/// `tag#id.c1.c2` with each part individually suppressible
fn compound_selector<D: DomTree + ?Sized>(
    dom: &D,
    node: &D::Node,
    classes: &[String],
    exclude_tag_name: bool,
    exclude_id: bool,
) -> String {
    let mut selector = if exclude_tag_name {
        String::new()
    } else {
        dom.tag_name(node)
    };
    if !exclude_id {
        if let Some(id) = dom.id(node) {
            selector.push('#');
            selector.push_str(&css_escape(&id));
        }
    }
    for class in classes {
        selector.push('.');
        selector.push_str(&css_escape(class));
    }
    selector
}

fn position_pseudo<D: DomTree + ?Sized>(dom: &D, node: &D::Node) -> String {
    match element_position(dom, node) {
        (_, 0 | 1) => String::new(),
        (1, _) => ":first-child".to_string(),
        (index, count) if index == count => ":last-child".to_string(),
        (index, _) => format!(":nth-child({index})"),
    }
}

fn strict_full_selector<D: DomTree + ?Sized>(
    dom: &D,
    target: &D::Node,
    options: &RuleOptions,
) -> String {
    let body = dom.body();
    let root = dom.document_element();
    let exclude_tag_name = options.exclude_tag_name.unwrap_or(false);
    let exclude_id = options.exclude_id.unwrap_or(false);
    let mut path = Vec::new();
    let mut current = target.clone();
    while let Some(parent) = dom.parent(&current) {
        if Some(&current) == body.as_ref() || current == root {
            break;
        }
        let is_target = current == *target;
        if dom.id(&current).is_some() {
            // an id anchors the path; classes on an id-bearing target only
            // appear when explicitly requested
            let segment = if is_target {
                let classes = options.class_list.clone().unwrap_or_default();
                compound_selector(dom, &current, &classes, exclude_tag_name, exclude_id)
            } else {
                compound_selector(dom, &current, &[], false, false)
            };
            path.push(segment);
            break;
        }
        let segment = if is_target {
            let classes = options
                .class_list
                .clone()
                .unwrap_or_else(|| dom.class_list(&current));
            compound_selector(dom, &current, &classes, exclude_tag_name, exclude_id)
        } else {
            compound_selector(dom, &current, &dom.class_list(&current), false, false)
        };
        path.push(segment + &position_pseudo(dom, &current));
        current = parent;
    }
    path.reverse();
    path.join(" > ")
}

/// Bare CSS selector for `node` under `options`, without marker or domain
pub fn css_selector<D: DomTree + ?Sized>(dom: &D, node: &D::Node, options: &RuleOptions) -> String {
    let classes = || {
        options
            .class_list
            .clone()
            .unwrap_or_else(|| dom.class_list(node))
    };
    match options.css_selector_type {
        CssSelectorType::StrictFull => strict_full_selector(dom, node, options),
        CssSelectorType::Strict => compound_selector(
            dom,
            node,
            &classes(),
            options.exclude_tag_name.unwrap_or(false),
            options.exclude_id.unwrap_or(false),
        ),
        CssSelectorType::Similar => classes()
            .iter()
            .map(|class| format!(".{}", css_escape(class)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Build the rule for `node`, or `None` when nothing selectable remains
///
/// A URL rule requested for an element without a usable resource URL is
/// built as a CSS rule instead.
pub fn build_rule<D: DomTree + ?Sized>(dom: &D, node: &D::Node, options: &RuleOptions) -> Option<Rule> {
    let cropped = crop_domain(&options.url);
    let domain = (!options.is_block_one_domain && !cropped.is_empty()).then_some(cropped);

    if options.rule_type == RuleType::Url {
        let resource = options
            .url_mask
            .clone()
            .filter(|mask| !mask.trim().is_empty())
            .or_else(|| resource_url(dom, node, &RESOURCE_URL_ATTRIBUTES));
        match resource {
            Some(resource) => return Some(Rule::url(url_pattern(&resource), domain)),
            None => debug!(tag = %dom.tag_name(node), "no resource URL, building a CSS rule"),
        }
    }

    let mut selector = css_selector(dom, node, options);
    if let Some(attributes) = &options.attributes {
        selector.push_str(attributes);
    }
    if selector.is_empty() {
        return None;
    }
    Some(Rule::css(selector, domain))
}

/// Rule text for `node`; empty when nothing selectable remains
pub fn construct_rule_text<D: DomTree + ?Sized>(
    dom: &D,
    node: &D::Node,
    options: &RuleOptions,
) -> String {
    let text = build_rule(dom, node, options)
        .map(|rule| rule.to_string())
        .unwrap_or_default();
    trace!(
        rule_type = %options.rule_type,
        selector_type = %options.css_selector_type,
        rule = %text,
        "constructed rule"
    );
    text
}

/// Selector matching what `rule_text` would hide or block
///
/// Element-hiding rules yield their selector. Network rules yield an
/// attribute-contains selector on `src` built from the URL fragment.
#[must_use]
pub fn selector_from_rule_text(rule_text: &str) -> Option<String> {
    if rule_text.is_empty() {
        return None;
    }
    if let Some(index) = rule_text.find(CSS_RULE_MARK) {
        let rest = &rule_text[index + CSS_RULE_MARK.len()..];
        let selector = options_start(rest).map_or(rest, |options| &rest[..options]);
        return (!selector.is_empty()).then(|| selector.to_string());
    }
    let head = rule_text
        .find(RULE_OPTIONS_MARK)
        .map_or(rule_text, |options| &rule_text[..options]);
    let fragment: String = head.chars().filter(|c| *c != '|' && *c != '^').collect();
    if !resource::is_url_fragment(&fragment) {
        return None;
    }
    let quoted = fragment.replace('\\', "\\\\").replace('"', "\\\"");
    Some(format!("[src*=\"{quoted}\"]"))
}

/// Byte offset of the options marker trailing a selector
///
/// A `$` escaped with a backslash or inside an attribute selector belongs to
/// the selector.
fn options_start(selector: &str) -> Option<usize> {
    let mut chars = selector.char_indices();
    let mut in_brackets = false;
    let mut quote = None;
    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' | '\'' if in_brackets => match quote {
                Some(open) if open == c => quote = None,
                None => quote = Some(c),
                Some(_) => {}
            },
            _ if quote.is_some() => {}
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            '$' if !in_brackets => return Some(index),
            _ => {}
        }
    }
    None
}
