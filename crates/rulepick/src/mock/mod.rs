//! Headless document for tests and the command-line host.
//!
//! `MockDom` is an arena of element and text nodes with just enough of the
//! browser model for picking: computed styles, geometry, and capture-phase
//! listener bookkeeping. Text nodes live in the tree but are never reported
//! as element children, so sibling positions match what a browser computes.
//!
//! ```rust
//! use rulepick::dom::DomTree;
//! use rulepick::mock::{ElementSnapshot, MockDom};
//!
//! let mut dom = MockDom::new("http://example.com/");
//! let body = dom.body().unwrap();
//! let ad = dom.mount(&body, &ElementSnapshot::new("div").with_id("ad1"));
//! assert_eq!(dom.find("#ad1").unwrap(), ad);
//! ```

mod selector;
mod snapshot;
#[cfg(any(test, feature = "proptest"))]
pub mod strategies;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use snapshot::{ElementSnapshot, PageSnapshot};

use crate::dom::{BoundingBox, DomMut, DomTree};
use crate::event::EventKind;
use crate::result::{PickError, PickResult};

/// Handle to a node in a [`MockDom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct MockNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    style: BTreeMap<String, String>,
    rect: BoundingBox,
    listeners: Vec<EventKind>,
}

impl MockNode {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            style: BTreeMap::new(),
            rect: BoundingBox::default(),
            listeners: Vec::new(),
        }
    }

    const fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }
}

/// Arena-backed document
#[derive(Debug, Clone)]
pub struct MockDom {
    nodes: Vec<MockNode>,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    location: String,
}

impl MockDom {
    /// Default viewport size given to `html` and `body`
    pub const VIEWPORT: BoundingBox = BoundingBox::new(0.0, 0.0, 1280.0, 800.0);

    /// Create an empty `html/head/body` document loaded from `location`
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            html: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            location: location.into(),
        };
        dom.html = dom.alloc_element("html");
        dom.head = dom.alloc_element("head");
        dom.body = dom.alloc_element("body");
        let (html, head, body) = (dom.html, dom.head, dom.body);
        dom.link(html, head, None);
        dom.link(html, body, None);
        dom.node_mut(html).rect = Self::VIEWPORT;
        dom.node_mut(body).rect = Self::VIEWPORT;
        dom
    }

    /// Build a document from a snapshot
    #[must_use]
    pub fn from_snapshot(page: &PageSnapshot) -> Self {
        let mut dom = Self::new(page.url.clone());
        let body = dom.body;
        dom.apply_snapshot(body, &page.body);
        dom
    }

    /// Parse a JSON snapshot into a document
    pub fn from_json(json: &str) -> PickResult<Self> {
        Ok(Self::from_snapshot(&PageSnapshot::from_json(json)?))
    }

    /// Load a JSON snapshot file into a document
    pub fn load(path: &Path) -> PickResult<Self> {
        Ok(Self::from_snapshot(&PageSnapshot::load(path)?))
    }

    /// Append a snapshot subtree under `parent`, returning its root
    pub fn mount(&mut self, parent: &NodeId, element: &ElementSnapshot) -> NodeId {
        let node = self.alloc_element(&element.tag);
        self.apply_snapshot(node, element);
        self.link(*parent, node, None);
        node
    }

    /// Append a text node under `parent`
    pub fn append_text(&mut self, parent: &NodeId, text: &str) -> NodeId {
        let node = self.alloc(NodeData::Text(text.to_string()));
        self.link(*parent, node, None);
        node
    }

    /// Set rendered geometry
    pub fn set_rect(&mut self, node: &NodeId, rect: BoundingBox) {
        self.node_mut(*node).rect = rect;
    }

    /// Inline style value as last set
    #[must_use]
    pub fn style(&self, node: &NodeId, property: &str) -> Option<&str> {
        self.node(*node).style.get(property).map(String::as_str)
    }

    /// Resolve `#id` or an element index path below `body` such as `0/2/1`
    pub fn find(&self, query: &str) -> PickResult<NodeId> {
        let query = query.trim();
        if let Some(id) = query.strip_prefix('#') {
            return self
                .element_by_id(id)
                .ok_or_else(|| PickError::not_found(query));
        }
        if query.is_empty() || query == "body" {
            return Ok(self.body);
        }
        let mut node = self.body;
        for segment in query.trim_matches('/').split('/') {
            let index: usize = segment
                .parse()
                .map_err(|_| PickError::not_found(query))?;
            node = *self
                .children(&node)
                .get(index)
                .ok_or_else(|| PickError::not_found(query))?;
        }
        Ok(node)
    }

    /// First attached element with the given id, in document order
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(&self.html)
            .into_iter()
            .find(|node| self.id(node).as_deref() == Some(id))
    }

    /// Element index path from `body`, the inverse of [`MockDom::find`]
    #[must_use]
    pub fn path_of(&self, node: &NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = *node;
        while current != self.body {
            let parent = self.node(current).parent?;
            let index = self.children(&parent).iter().position(|c| *c == current)?;
            segments.push(index.to_string());
            current = parent;
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    /// Concatenated text of the subtree
    #[must_use]
    pub fn text_content(&self, node: &NodeId) -> String {
        match &self.node(*node).data {
            NodeData::Text(text) => text.clone(),
            NodeData::Element { .. } => self
                .node(*node)
                .children
                .iter()
                .map(|child| self.text_content(child))
                .collect(),
        }
    }

    /// Whether the node is reachable from the document element
    #[must_use]
    pub fn is_attached(&self, node: &NodeId) -> bool {
        let mut current = Some(*node);
        while let Some(id) = current {
            if id == self.html {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    /// Whether a listener for `kind` is registered on `node`
    #[must_use]
    pub fn has_listener(&self, node: &NodeId, kind: EventKind) -> bool {
        self.node(*node).listeners.contains(&kind)
    }

    /// Total registered listeners across the arena
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.nodes.iter().map(|n| n.listeners.len()).sum()
    }

    /// Markup of the subtree with attributes in insertion order
    #[must_use]
    pub fn outer_html(&self, node: &NodeId) -> String {
        let mut out = String::new();
        self.write_html(*node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let entry = self.node(node);
        match &entry.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attributes {
                    out.push_str(&format!(" {key}=\"{}\"", value.replace('"', "&quot;")));
                }
                out.push('>');
                for child in &entry.children {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }

    fn apply_snapshot(&mut self, node: NodeId, element: &ElementSnapshot) {
        for (key, value) in &element.attributes {
            self.set_attribute(&node, key, value);
        }
        for (key, value) in &element.style {
            self.set_style(&node, key, value);
        }
        if let Some(rect) = element.rect {
            self.node_mut(node).rect = rect;
        }
        if let Some(text) = &element.text {
            self.append_text(&node, text);
        }
        for child in &element.children {
            self.mount(&node, child);
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(MockNode::new(data));
        NodeId(self.nodes.len() - 1)
    }

    fn alloc_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    fn node(&self, id: NodeId) -> &MockNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut MockNode {
        &mut self.nodes[id.0]
    }

    fn unlink(&mut self, child: NodeId) {
        if let Some(parent) = self.node_mut(child).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != child);
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId, anchor: Option<NodeId>) {
        self.unlink(child);
        let siblings = &mut self.nodes[parent.0].children;
        match anchor.and_then(|a| siblings.iter().position(|c| *c == a)) {
            Some(index) => siblings.insert(index, child),
            None => siblings.push(child),
        }
        self.node_mut(child).parent = Some(parent);
    }
}

impl DomTree for MockDom {
    type Node = NodeId;

    fn document_element(&self) -> NodeId {
        self.html
    }

    fn head(&self) -> Option<NodeId> {
        Some(self.head)
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn location(&self) -> String {
        self.location.clone()
    }

    fn tag_name(&self, node: &NodeId) -> String {
        match &self.node(*node).data {
            NodeData::Element { tag, .. } => tag.clone(),
            NodeData::Text(_) => "#text".to_string(),
        }
    }

    fn attributes(&self, node: &NodeId) -> Vec<(String, String)> {
        match &self.node(*node).data {
            NodeData::Element { attributes, .. } => attributes.clone(),
            NodeData::Text(_) => Vec::new(),
        }
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.node(*node).parent
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.node(*node)
            .children
            .iter()
            .copied()
            .filter(|c| self.node(*c).is_element())
            .collect()
    }

    fn bounding_box(&self, node: &NodeId) -> BoundingBox {
        self.node(*node).rect
    }

    fn computed_style(&self, node: &NodeId, property: &str) -> Option<String> {
        self.node(*node).style.get(property).cloned()
    }
}

impl DomMut for MockDom {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc_element(tag)
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
        if let NodeData::Element { attributes, .. } = &mut self.node_mut(*node).data {
            let name = name.to_ascii_lowercase();
            match attributes.iter_mut().find(|(key, _)| *key == name) {
                Some(entry) => entry.1 = value.to_string(),
                None => attributes.push((name, value.to_string())),
            }
        }
    }

    fn set_style(&mut self, node: &NodeId, property: &str, value: &str) {
        self.node_mut(*node)
            .style
            .insert(property.to_string(), value.to_string());
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        for child in std::mem::take(&mut self.node_mut(*node).children) {
            self.node_mut(child).parent = None;
        }
        self.append_text(node, text);
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.link(*parent, *child, None);
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, anchor: Option<&NodeId>) {
        self.link(*parent, *child, anchor.copied());
    }

    fn replace_child(&mut self, parent: &NodeId, new_child: &NodeId, old_child: &NodeId) {
        if self.node(*old_child).parent != Some(*parent) {
            return;
        }
        self.unlink(*new_child);
        let siblings = &mut self.nodes[parent.0].children;
        if let Some(index) = siblings.iter().position(|c| c == old_child) {
            siblings[index] = *new_child;
        }
        self.node_mut(*old_child).parent = None;
        self.node_mut(*new_child).parent = Some(*parent);
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) {
        if self.node(*child).parent == Some(*parent) {
            self.unlink(*child);
        }
    }

    fn add_listener(&mut self, node: &NodeId, kind: EventKind) {
        let listeners = &mut self.node_mut(*node).listeners;
        if !listeners.contains(&kind) {
            listeners.push(kind);
        }
    }

    fn remove_listener(&mut self, node: &NodeId, kind: EventKind) {
        self.node_mut(*node).listeners.retain(|k| *k != kind);
    }
}
