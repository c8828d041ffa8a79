//! Host document abstraction.
//!
//! The picker never owns page elements. It sees them through [`DomTree`] for
//! queries and through [`DomMut`] for the few mutations a session performs
//! (listeners, placeholders, highlight borders, preview styles). One adapter
//! exists per host: [`crate::mock::MockDom`] for headless use and tests, and a
//! browser binding supplied by the embedding extension.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::event::EventKind;

/// Axis-aligned element geometry in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether the box covers no pixels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// This box expressed relative to `origin`'s top-left corner
    #[must_use]
    pub fn relative_to(&self, origin: &Self) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y, self.width, self.height)
    }
}

/// Read-only view of a live document
pub trait DomTree {
    /// Borrowed element handle
    type Node: Clone + PartialEq + Debug + 'static;

    /// The `html` element
    fn document_element(&self) -> Self::Node;

    /// The `head` element, if the document has one
    fn head(&self) -> Option<Self::Node>;

    /// The `body` element, if the document has one
    fn body(&self) -> Option<Self::Node>;

    /// Page location the document was loaded from
    fn location(&self) -> String;

    /// Lower-case tag name
    fn tag_name(&self, node: &Self::Node) -> String;

    /// All attributes in document order
    fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;

    /// Parent element
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Element children in order; text and comment nodes are skipped
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Rendered geometry in viewport coordinates
    fn bounding_box(&self, node: &Self::Node) -> BoundingBox;

    /// Computed style value for a CSS property
    fn computed_style(&self, node: &Self::Node, property: &str) -> Option<String>;

    /// Single attribute value
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String> {
        self.attributes(node)
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Non-empty `id` attribute
    fn id(&self, node: &Self::Node) -> Option<String> {
        self.attribute(node, "id").filter(|id| !id.is_empty())
    }

    /// Class tokens, whitespace separated, first occurrence wins
    fn class_list(&self, node: &Self::Node) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        if let Some(raw) = self.attribute(node, "class") {
            for token in raw.split_ascii_whitespace() {
                if !classes.iter().any(|c| c == token) {
                    classes.push(token.to_string());
                }
            }
        }
        classes
    }

    /// Whether the class list contains `class`
    fn has_class(&self, node: &Self::Node, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|raw| raw.split_ascii_whitespace().any(|c| c == class))
    }

    /// Whether the element is rendered (`display` is not `none`)
    fn is_displayed(&self, node: &Self::Node) -> bool {
        self.computed_style(node, "display")
            .map_or(true, |display| display.trim() != "none")
    }

    /// Whether `ancestor` is a proper ancestor of `node`
    fn is_ancestor_of(&self, ancestor: &Self::Node, node: &Self::Node) -> bool {
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if &parent == ancestor {
                return true;
            }
            current = self.parent(&parent);
        }
        false
    }

    /// Element descendants of `root` in document order, `root` excluded
    fn descendants(&self, root: &Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Node> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(self.children(&node).into_iter().rev());
            out.push(node);
        }
        out
    }
}

/// Mutating operations a picking session needs
pub trait DomMut: DomTree {
    /// Create a detached element
    fn create_element(&mut self, tag: &str) -> Self::Node;

    /// Set an attribute
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);

    /// Set an inline style property
    fn set_style(&mut self, node: &Self::Node, property: &str, value: &str);

    /// Replace all children with a single text node
    fn set_text(&mut self, node: &Self::Node, text: &str);

    /// Append `child` as the last child of `parent`, detaching it first
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Insert `child` before `anchor`, or at the end when `anchor` is `None`
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, anchor: Option<&Self::Node>);

    /// Put `new_child` where `old_child` was; `old_child` becomes detached
    fn replace_child(&mut self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node);

    /// Detach `child` from `parent`
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Register a capture-phase listener for `kind` on `node`
    fn add_listener(&mut self, node: &Self::Node, kind: EventKind);

    /// Unregister a listener added with [`DomMut::add_listener`]
    fn remove_listener(&mut self, node: &Self::Node, kind: EventKind);

    /// Detach `node` from its parent, if attached
    fn detach(&mut self, node: &Self::Node) {
        if let Some(parent) = self.parent(node) {
            self.remove_child(&parent, node);
        }
    }

    /// Add `class` to the class attribute unless already present
    fn add_class(&mut self, node: &Self::Node, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let value = match self.attribute(node, "class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attribute(node, "class", &value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod bounding_box_tests {
        use super::*;

        #[test]
        fn test_edges() {
            let bb = BoundingBox::new(10.0, 20.0, 100.0, 50.0);
            assert_eq!(bb.right(), 110.0);
            assert_eq!(bb.bottom(), 70.0);
            assert!(!bb.is_empty());
        }

        #[test]
        fn test_empty() {
            assert!(BoundingBox::new(0.0, 0.0, 0.0, 10.0).is_empty());
            assert!(BoundingBox::default().is_empty());
        }

        #[test]
        fn test_relative_to() {
            let body = BoundingBox::new(0.0, -200.0, 800.0, 2000.0);
            let el = BoundingBox::new(30.0, 40.0, 10.0, 10.0);
            assert_eq!(el.relative_to(&body), BoundingBox::new(30.0, 240.0, 10.0, 10.0));
        }
    }

    mod provided_method_tests {
        use super::*;
        use crate::mock::{ElementSnapshot, MockDom};

        fn fixture() -> (MockDom, <MockDom as DomTree>::Node) {
            let mut dom = MockDom::new("http://example.com/");
            let body = dom.body().unwrap();
            let node = dom.mount(
                &body,
                &ElementSnapshot::new("div")
                    .with_id("x")
                    .with_attr("class", " a  b a ")
                    .with_child(ElementSnapshot::new("span")),
            );
            (dom, node)
        }

        #[test]
        fn test_class_list_dedup() {
            let (dom, node) = fixture();
            assert_eq!(dom.class_list(&node), vec!["a", "b"]);
            assert!(dom.has_class(&node, "b"));
            assert!(!dom.has_class(&node, "c"));
        }

        #[test]
        fn test_empty_id_is_none() {
            let mut dom = MockDom::new("http://example.com/");
            let body = dom.body().unwrap();
            let node = dom.mount(&body, &ElementSnapshot::new("p").with_attr("id", ""));
            assert_eq!(dom.id(&node), None);
        }

        #[test]
        fn test_is_ancestor_of() {
            let (dom, node) = fixture();
            let span = dom.children(&node)[0];
            let body = dom.body().unwrap();
            assert!(dom.is_ancestor_of(&body, &span));
            assert!(dom.is_ancestor_of(&node, &span));
            assert!(!dom.is_ancestor_of(&span, &node));
            assert!(!dom.is_ancestor_of(&node, &node));
        }

        #[test]
        fn test_add_class() {
            let (mut dom, node) = fixture();
            dom.add_class(&node, "c");
            dom.add_class(&node, "c");
            assert_eq!(dom.class_list(&node), vec!["a", "b", "c"]);
        }

        #[test]
        fn test_descendants_document_order() {
            let (dom, node) = fixture();
            let body = dom.body().unwrap();
            let all = dom.descendants(&body);
            assert_eq!(all[0], node);
            assert_eq!(all.len(), 2);
        }
    }
}
