//! Rulepick: interactive element picker and filter-rule generator
//!
//! Point at an element on a live page, widen or narrow the pick along its
//! lineage, and get back a blocking rule for a content-filtering engine:
//! an element-hiding rule (`example.com##div#ad1 > img.banner`) or a
//! network rule (`||ads.example.net/x.gif$domain=example.com`).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     RULEPICK Architecture                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐          │
//! │   │ Picker      │    │ Scope       │    │ Rule        │          │
//! │   │ Session     │───►│ Controller  │───►│ Builder     │──► text  │
//! │   └─────┬───────┘    └──────┬──────┘    └─────────────┘          │
//! │         │ highlight          │ preview                            │
//! │   ┌─────▼───────────────────▼──────┐                             │
//! │   │ DomTree / DomMut (host adapter) │  browser, MockDom           │
//! │   └─────────────────────────────────┘                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core never touches a real browser. Hosts implement
//! [`DomTree`]/[`DomMut`] and forward captured events; [`MockDom`] is the
//! headless implementation used by tests and the CLI.

#![warn(missing_docs)]

pub mod config;
pub mod dom;
pub mod event;
pub mod highlight;
pub mod locator;
pub mod mock;
#[allow(clippy::missing_const_for_fn)]
pub mod picker;
pub mod preview;
pub mod result;
#[allow(clippy::doc_markdown)]
pub mod rule;
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub mod scope;

pub use config::{PickerConfig, PickerConfigBuilder};
pub use dom::{BoundingBox, DomMut, DomTree};
pub use event::{EventKind, EventResponse, PickerEvent};
pub use highlight::{BorderGeometry, BorderHighlighter, BorderStyle, Highlighter};
pub use locator::{ancestor_chain, single_child_descendants};
pub use mock::{ElementSnapshot, MockDom, NodeId, PageSnapshot};
pub use picker::{ListenerSet, PickerSession, SelectionCallback, Substitution, SubstitutionLog};
pub use preview::{preview_css, RulePreview};
pub use result::{PickError, PickResult};
pub use rule::{
    build_rule, construct_rule_text, describe_node, selector_from_rule_text, CssSelectorType,
    ElementInfo, Rule, RuleOptions, RuleType,
};
pub use scope::{OptionAvailability, ScopeController, ScopeOptions, ScopeSlider};

/// Everything a host needs for a picking session
pub mod prelude {
    pub use super::config::*;
    pub use super::dom::*;
    pub use super::event::*;
    pub use super::highlight::*;
    pub use super::locator::{ancestor_chain, single_child_descendants};
    pub use super::mock::{ElementSnapshot, MockDom, NodeId, PageSnapshot};
    pub use super::picker::*;
    pub use super::preview::*;
    pub use super::result::*;
    pub use super::rule::{
        build_rule, construct_rule_text, css_escape, describe_node, describe_node_with,
        selector_from_rule_text, AttributeInfo, CssSelectorType, ElementInfo, Rule, RuleOptions,
        RuleType,
    };
    pub use super::scope::*;
}
