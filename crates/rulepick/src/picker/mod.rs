//! Interactive element picking session.
//!
//! A [`PickerSession`] owns everything a pick operation changes in the host
//! document: the capture listeners bound on page elements, the placeholders
//! standing in for `iframe`/`embed`/`object` elements, the highlight and the
//! post-selection overlay. The host forwards each captured event to
//! [`PickerSession::handle_event`] and applies the returned
//! [`EventResponse`].
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use rulepick::prelude::*;
//!
//! let mut dom = MockDom::new("http://example.com/");
//! let body = dom.body().unwrap();
//! let ad = dom.mount(&body, &ElementSnapshot::new("div").with_id("ad"));
//!
//! let picked = Rc::new(RefCell::new(None));
//! let sink = Rc::clone(&picked);
//! let mut session = PickerSession::start(
//!     &mut dom,
//!     move |node: &NodeId| *sink.borrow_mut() = Some(*node),
//!     None,
//!     PickerConfig::default(),
//! );
//! let response = session.handle_event(&mut dom, &PickerEvent::click(ad));
//! assert!(response.is_consumed());
//! assert_eq!(*picked.borrow(), Some(ad));
//! session.close(&mut dom);
//! ```

mod listeners;
mod substitution;

use std::fmt;

use tracing::{debug, trace, warn};

pub use listeners::ListenerSet;
pub use substitution::{Substitution, SubstitutionLog};

use crate::config::PickerConfig;
use crate::dom::DomMut;
use crate::event::{EventKind, EventResponse, PickerEvent};
use crate::highlight::{BorderHighlighter, Highlighter};
use crate::rule::{resource_host, resource_url};

/// Callback receiving the finally chosen element
pub type SelectionCallback<N> = Box<dyn FnMut(&N)>;

/// One pick operation over a host document
pub struct PickerSession<D: DomMut> {
    config: PickerConfig,
    on_selected: SelectionCallback<D::Node>,
    highlighter: Box<dyn Highlighter<D>>,
    listeners: ListenerSet<D::Node>,
    substitutions: SubstitutionLog<D::Node>,
    force_selected: Option<D::Node>,
    selection: Option<D::Node>,
    overlay: Option<D::Node>,
    unbound: bool,
    ignore_touch_end: bool,
}

impl<D: DomMut> fmt::Debug for PickerSession<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickerSession")
            .field("highlighter", &self.highlighter)
            .field("listeners", &self.listeners.len())
            .field("substitutions", &self.substitutions.len())
            .field("force_selected", &self.force_selected)
            .field("selection", &self.selection)
            .field("unbound", &self.unbound)
            .field("ignore_touch_end", &self.ignore_touch_end)
            .finish_non_exhaustive()
    }
}

impl<D: DomMut> PickerSession<D> {
    /// Begin a session
    ///
    /// Placeholders are swapped in before any listener is bound, so hover
    /// tracking never sees the embedded content they cover. Without a
    /// `highlighter` a [`BorderHighlighter`] built from `config` is used.
    pub fn start<F>(
        dom: &mut D,
        on_selected: F,
        highlighter: Option<Box<dyn Highlighter<D>>>,
        config: PickerConfig,
    ) -> Self
    where
        F: FnMut(&D::Node) + 'static,
    {
        let highlighter: Box<dyn Highlighter<D>> = match highlighter {
            Some(highlighter) => highlighter,
            None => Box::new(BorderHighlighter::<D::Node>::from_config(&config)),
        };
        let mut session = Self {
            config,
            on_selected: Box::new(on_selected),
            highlighter,
            listeners: ListenerSet::new(),
            substitutions: SubstitutionLog::new(),
            force_selected: None,
            selection: None,
            overlay: None,
            unbound: false,
            ignore_touch_end: false,
        };
        session.highlighter.init(dom);
        let placeholders = session.substitute_embeds(dom);
        session.bind(dom);
        debug!(
            placeholders,
            listeners = session.listeners.len(),
            "picker session started"
        );
        session
    }

    /// Route one captured event
    pub fn handle_event(&mut self, dom: &mut D, event: &PickerEvent<D::Node>) -> EventResponse {
        if !event.is_trusted {
            trace!(kind = event.kind.as_str(), "ignoring synthetic event");
            return EventResponse::PASS;
        }
        if self.unbound {
            return EventResponse::PASS;
        }
        match event.kind {
            EventKind::MouseOver => self.on_mouse_over(dom, &event.target),
            EventKind::MouseOut => {
                let target = &event.target;
                let internal =
                    self.is_ignored(dom, target) && self.placeholder_for(dom, target).is_none();
                if internal || self.is_restricted(dom, target) {
                    return EventResponse::PASS;
                }
                self.highlighter.remove(dom);
                self.selection = None;
                EventResponse::PASS
            }
            EventKind::Click => self.on_click(dom, &event.target),
            EventKind::TouchStart => EventResponse::STOP,
            EventKind::TouchMove | EventKind::GestureEnd => {
                self.ignore_touch_end = true;
                EventResponse::PASS
            }
            EventKind::TouchEnd => {
                if std::mem::take(&mut self.ignore_touch_end) {
                    return EventResponse::STOP;
                }
                self.on_mouse_over(dom, &event.target);
                self.on_click(dom, &event.target)
            }
        }
    }

    /// Drop the highlight, selection and placeholders; listeners stay bound
    pub fn reset(&mut self, dom: &mut D) {
        self.highlighter.remove(dom);
        self.selection = None;
        self.force_selected = None;
        self.overlay = None;
        self.ignore_touch_end = false;
        self.substitutions.revert_all(dom);
    }

    /// Highlight `node` and stop tracking the pointer
    pub fn select_element(&mut self, dom: &mut D, node: &D::Node) {
        self.listeners.detach_all(dom);
        self.substitutions.revert_all(dom);
        self.overlay = None;
        self.highlighter.add(dom, node);
        self.selection = Some(node.clone());
        self.unbound = true;
    }

    /// End the session, leaving the document as it was found
    pub fn close(mut self, dom: &mut D) {
        let listeners = self.listeners.detach_all(dom);
        self.highlighter.remove(dom);
        self.highlighter.finalize(dom);
        let reverted = self.substitutions.revert_all(dom);
        self.unbound = true;
        debug!(listeners, reverted, "picker session closed");
    }

    /// Currently highlighted element
    #[must_use]
    pub const fn selection(&self) -> Option<&D::Node> {
        self.selection.as_ref()
    }

    /// Element last chosen by click
    #[must_use]
    pub const fn force_selected(&self) -> Option<&D::Node> {
        self.force_selected.as_ref()
    }

    /// Whether pointer tracking has stopped
    #[must_use]
    pub const fn is_unbound(&self) -> bool {
        self.unbound
    }

    /// Whether the next touch end will be ignored
    #[must_use]
    pub const fn ignores_next_touch_end(&self) -> bool {
        self.ignore_touch_end
    }

    /// Outstanding document edits
    #[must_use]
    pub const fn substitutions(&self) -> &SubstitutionLog<D::Node> {
        &self.substitutions
    }

    /// Placeholders currently in the document
    #[must_use]
    pub fn placeholders(&self) -> Vec<D::Node> {
        self.substitutions
            .entries()
            .iter()
            .filter_map(|entry| match entry {
                Substitution::Swap { surrogate, .. } => Some(surrogate.clone()),
                Substitution::Insert { .. } => None,
            })
            .collect()
    }

    /// Post-selection overlay, while present
    #[must_use]
    pub const fn overlay(&self) -> Option<&D::Node> {
        self.overlay.as_ref()
    }

    /// Session configuration
    #[must_use]
    pub const fn config(&self) -> &PickerConfig {
        &self.config
    }

    fn is_ignored(&self, dom: &D, node: &D::Node) -> bool {
        dom.has_class(node, &self.config.ignore_class)
    }

    fn is_restricted(&self, dom: &D, node: &D::Node) -> bool {
        self.config.is_restricted(&dom.tag_name(node))
    }

    /// Placeholder containing `node`, itself included
    fn placeholder_for(&self, dom: &D, node: &D::Node) -> Option<D::Node> {
        let mut current = Some(node.clone());
        while let Some(candidate) = current {
            if self.substitutions.original_of(&candidate).is_some() {
                return Some(candidate);
            }
            current = dom.parent(&candidate);
        }
        None
    }

    /// Nearest force-selected node among `target` and its ancestors
    fn hover_target(&self, dom: &D, target: &D::Node) -> D::Node {
        match &self.force_selected {
            Some(chosen) if chosen == target || dom.is_ancestor_of(chosen, target) => chosen.clone(),
            _ => target.clone(),
        }
    }

    fn on_mouse_over(&mut self, dom: &mut D, target: &D::Node) -> EventResponse {
        let node = if let Some(placeholder) = self.placeholder_for(dom, target) {
            placeholder
        } else if self.is_ignored(dom, target) || self.is_restricted(dom, target) {
            return EventResponse::PASS;
        } else {
            self.hover_target(dom, target)
        };
        self.highlighter.add(dom, &node);
        self.selection = Some(node);
        EventResponse::STOP
    }

    fn on_click(&mut self, dom: &mut D, target: &D::Node) -> EventResponse {
        let target = self
            .highlighter
            .bordered_target(target)
            .unwrap_or_else(|| target.clone());
        if let Some(placeholder) = self.placeholder_for(dom, &target) {
            self.select_placeholder(dom, &placeholder);
            return EventResponse::CONSUME;
        }
        if self.overlay.as_ref() == Some(&target) {
            return EventResponse::CONSUME;
        }
        if self.is_ignored(dom, &target) {
            return EventResponse::PASS;
        }
        if self.is_restricted(dom, &target) {
            return EventResponse::CONSUME;
        }

        self.force_selected = Some(target.clone());
        self.highlighter.remove(dom);
        self.block_clicks_on(dom, &target);
        self.highlighter.add(dom, &target);
        self.selection = Some(target.clone());
        debug!(tag = %dom.tag_name(&target), "element selected");
        (self.on_selected)(&target);
        EventResponse::CONSUME
    }

    fn select_placeholder(&mut self, dom: &mut D, placeholder: &D::Node) {
        let Some(original) = self.substitutions.original_of(placeholder).cloned() else {
            return;
        };
        self.highlighter.remove(dom);
        self.substitutions.revert_all(dom);
        self.overlay = None;
        self.selection = Some(original.clone());
        self.block_clicks_on(dom, &original);
        debug!(tag = %dom.tag_name(&original), "embedded element selected");
        (self.on_selected)(&original);
    }

    /// Layer a transparent overlay over `node`, replacing any previous one
    fn block_clicks_on(&mut self, dom: &mut D, node: &D::Node) {
        if let Some(previous) = self.overlay.take() {
            self.substitutions.undo_node(dom, &previous);
        }
        let Some(body) = dom.body() else {
            return;
        };
        let rect = dom
            .bounding_box(node)
            .relative_to(&dom.bounding_box(&body));
        let overlay = dom.create_element("div");
        dom.set_attribute(&overlay, "class", &self.config.ignore_class);
        dom.set_style(&overlay, "position", "absolute");
        dom.set_style(&overlay, "z-index", &self.config.overlay_z_index.to_string());
        dom.set_style(&overlay, "left", &format!("{}px", rect.x));
        dom.set_style(&overlay, "top", &format!("{}px", rect.y));
        dom.set_style(&overlay, "width", &format!("{}px", rect.width));
        dom.set_style(&overlay, "height", &format!("{}px", rect.height));
        dom.set_style(&overlay, "background-color", "transparent");
        self.substitutions.insert(dom, &body, &overlay);
        self.listeners
            .attach_all(dom, [overlay.clone()], &EventKind::SELECT);
        self.overlay = Some(overlay);
    }

    /// Swap visible embedded content for placeholders, returning the count
    fn substitute_embeds(&mut self, dom: &mut D) -> usize {
        let Some(body) = dom.body() else {
            return 0;
        };
        let mut candidates: Vec<D::Node> = Vec::new();
        for node in dom.descendants(&body) {
            let eligible = self.config.is_substituted(&dom.tag_name(&node))
                && !self.is_ignored(dom, &node)
                && dom.is_displayed(&node)
                && !dom.bounding_box(&node).is_empty()
                && !candidates.iter().any(|c| dom.is_ancestor_of(c, &node));
            if eligible {
                candidates.push(node);
            }
        }
        for (index, original) in candidates.iter().enumerate() {
            let placeholder = self.make_placeholder(dom, original, index);
            if !self.substitutions.swap(dom, original, &placeholder) {
                continue;
            }
            let parts = dom.descendants(&placeholder);
            self.listeners.attach_all(
                dom,
                std::iter::once(placeholder).chain(parts),
                &EventKind::SELECT,
            );
        }
        candidates.len()
    }

    fn make_placeholder(&self, dom: &mut D, original: &D::Node, index: usize) -> D::Node {
        let config = &self.config;
        let rect = dom.bounding_box(original);
        let host = resource_url(&*dom, original, &config.url_attributes)
            .and_then(|url| resource_host(&url, &dom.location()))
            .unwrap_or_default();

        let placeholder = dom.create_element("div");
        dom.set_attribute(
            &placeholder,
            "class",
            &format!("{} {}", config.ignore_class, config.placeholder_class),
        );
        dom.set_attribute(
            &placeholder,
            "id",
            &format!("{}{index}", config.placeholder_id_prefix),
        );
        dom.set_style(&placeholder, "width", &format!("{}px", rect.width));
        dom.set_style(&placeholder, "height", &format!("{}px", rect.height));
        for property in ["position", "top", "bottom", "left", "right"] {
            if let Some(value) = dom.computed_style(original, property) {
                dom.set_style(&placeholder, property, &value);
            }
        }

        let icon = dom.create_element("div");
        dom.set_attribute(
            &icon,
            "class",
            &format!("{} {}-icon", config.ignore_class, config.placeholder_class),
        );
        let domain = dom.create_element("div");
        dom.set_attribute(
            &domain,
            "class",
            &format!("{} {}-domain", config.ignore_class, config.placeholder_class),
        );
        dom.set_text(&domain, &host);
        dom.append_child(&icon, &domain);
        dom.append_child(&placeholder, &icon);
        placeholder
    }

    /// Capture listeners on page elements and on the picker's own surfaces
    fn bind(&mut self, dom: &mut D) {
        let Some(body) = dom.body() else {
            return;
        };
        let pages: Vec<D::Node> = dom
            .descendants(&body)
            .into_iter()
            .filter(|node| !self.is_ignored(dom, node))
            .collect();
        self.listeners.attach_all(dom, pages, &EventKind::ALL);
        let surfaces = self.highlighter.elements();
        self.listeners.attach_all(dom, surfaces, &EventKind::SELECT);
    }
}

impl<D: DomMut> Drop for PickerSession<D> {
    fn drop(&mut self) {
        if !self.substitutions.is_empty() {
            warn!(
                outstanding = self.substitutions.len(),
                "picker session dropped without close; document edits not reverted"
            );
        }
    }
}
