//! Reversible document edits made during a session.
//!
//! Every node swap or insertion the picker performs is appended to a
//! [`SubstitutionLog`]. Tearing a session down is then a matter of undoing
//! the log in reverse order.

use tracing::trace;

use crate::dom::DomMut;

/// One reversible edit
#[derive(Debug, Clone, PartialEq)]
pub enum Substitution<N> {
    /// `surrogate` took the place of `original` under `parent`
    Swap {
        /// Page node taken out of the document
        original: N,
        /// Picker-owned node put in its place
        surrogate: N,
        /// Parent both share
        parent: N,
        /// Next sibling at swap time
        anchor: Option<N>,
    },
    /// Picker-owned node added to the document
    Insert {
        /// Inserted node
        node: N,
    },
}

impl<N: Clone + PartialEq> Substitution<N> {
    /// Picker-owned node this edit put into the document
    pub fn surrogate(&self) -> &N {
        match self {
            Self::Swap { surrogate, .. } => surrogate,
            Self::Insert { node } => node,
        }
    }

    fn undo<D: DomMut<Node = N> + ?Sized>(&self, dom: &mut D) {
        match self {
            Self::Swap {
                original,
                surrogate,
                parent,
                anchor,
            } => {
                if dom.parent(surrogate).as_ref() == Some(parent) {
                    dom.replace_child(parent, original, surrogate);
                } else {
                    // surrogate was moved or removed by the page
                    dom.detach(surrogate);
                    let anchor = anchor
                        .as_ref()
                        .filter(|a| dom.parent(a).as_ref() == Some(parent));
                    dom.insert_before(parent, original, anchor);
                }
            }
            Self::Insert { node } => dom.detach(node),
        }
    }
}

/// Ordered record of a session's edits
#[derive(Debug, Clone)]
pub struct SubstitutionLog<N> {
    entries: Vec<Substitution<N>>,
}

impl<N> Default for SubstitutionLog<N> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<N: Clone + PartialEq> SubstitutionLog<N> {
    /// Empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `surrogate` in place of `original` and record it
    ///
    /// Does nothing and returns `false` when `original` is detached.
    pub fn swap<D: DomMut<Node = N> + ?Sized>(&mut self, dom: &mut D, original: &N, surrogate: &N) -> bool {
        let Some(parent) = dom.parent(original) else {
            return false;
        };
        let siblings = dom.children(&parent);
        let anchor = siblings
            .iter()
            .position(|s| s == original)
            .and_then(|i| siblings.get(i + 1).cloned());
        dom.replace_child(&parent, surrogate, original);
        self.entries.push(Substitution::Swap {
            original: original.clone(),
            surrogate: surrogate.clone(),
            parent,
            anchor,
        });
        true
    }

    /// Append `node` to `parent` and record it
    pub fn insert<D: DomMut<Node = N> + ?Sized>(&mut self, dom: &mut D, parent: &N, node: &N) {
        dom.append_child(parent, node);
        self.entries.push(Substitution::Insert { node: node.clone() });
    }

    /// Undo the most recent edit whose surrogate is `node`
    pub fn undo_node<D: DomMut<Node = N> + ?Sized>(&mut self, dom: &mut D, node: &N) -> bool {
        let Some(index) = self.entries.iter().rposition(|e| e.surrogate() == node) else {
            return false;
        };
        let entry = self.entries.remove(index);
        entry.undo(dom);
        true
    }

    /// Undo every edit, newest first
    pub fn revert_all<D: DomMut<Node = N> + ?Sized>(&mut self, dom: &mut D) -> usize {
        let count = self.entries.len();
        while let Some(entry) = self.entries.pop() {
            entry.undo(dom);
        }
        if count > 0 {
            trace!(count, "reverted substitutions");
        }
        count
    }

    /// Page node replaced by `surrogate`, if it is a recorded placeholder
    #[must_use]
    pub fn original_of(&self, surrogate: &N) -> Option<&N> {
        self.entries.iter().find_map(|entry| match entry {
            Substitution::Swap {
                original,
                surrogate: s,
                ..
            } if s == surrogate => Some(original),
            _ => None,
        })
    }

    /// Recorded edits, oldest first
    #[must_use]
    pub fn entries(&self) -> &[Substitution<N>] {
        &self.entries
    }

    /// Number of outstanding edits
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing needs reverting
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;
    use crate::mock::{ElementSnapshot, MockDom, NodeId, PageSnapshot};

    fn page() -> MockDom {
        MockDom::from_snapshot(
            &PageSnapshot::new("http://example.com/").with_body(
                ElementSnapshot::new("body")
                    .with_child(ElementSnapshot::new("p").with_text("a"))
                    .with_child(ElementSnapshot::new("iframe").with_attr("src", "http://ads.test/f"))
                    .with_child(ElementSnapshot::new("p").with_text("b")),
            ),
        )
    }

    mod swap_tests {
        use super::*;

        #[test]
        fn test_swap_and_revert_restores_markup() {
            let mut dom = page();
            let html = dom.document_element();
            let before = dom.outer_html(&html);
            let iframe = dom.find("1").unwrap();
            let div = dom.create_element("div");
            let mut log: SubstitutionLog<NodeId> = SubstitutionLog::new();
            assert!(log.swap(&mut dom, &iframe, &div));
            assert_eq!(dom.find("1").unwrap(), div);
            assert!(!dom.is_attached(&iframe));
            assert_eq!(log.original_of(&div), Some(&iframe));

            assert_eq!(log.revert_all(&mut dom), 1);
            assert_eq!(dom.outer_html(&html), before);
            assert!(log.is_empty());
        }

        #[test]
        fn test_swap_detached_is_noop() {
            let mut dom = page();
            let loose = dom.create_element("iframe");
            let div = dom.create_element("div");
            let mut log = SubstitutionLog::new();
            assert!(!log.swap(&mut dom, &loose, &div));
            assert!(log.is_empty());
        }

        #[test]
        fn test_revert_after_page_removed_surrogate() {
            let mut dom = page();
            let html = dom.document_element();
            let before = dom.outer_html(&html);
            let iframe = dom.find("1").unwrap();
            let div = dom.create_element("div");
            let mut log = SubstitutionLog::new();
            log.swap(&mut dom, &iframe, &div);
            dom.detach(&div);
            log.revert_all(&mut dom);
            assert_eq!(dom.outer_html(&html), before);
        }
    }

    mod insert_tests {
        use super::*;

        #[test]
        fn test_insert_and_undo_node() {
            let mut dom = page();
            let body = dom.body().unwrap();
            let overlay = dom.create_element("div");
            let mut log = SubstitutionLog::new();
            log.insert(&mut dom, &body, &overlay);
            assert_eq!(dom.children(&body).len(), 4);
            assert!(log.undo_node(&mut dom, &overlay));
            assert!(!log.undo_node(&mut dom, &overlay));
            assert_eq!(dom.children(&body).len(), 3);
        }

        #[test]
        fn test_revert_order_is_newest_first() {
            let mut dom = page();
            let html = dom.document_element();
            let before = dom.outer_html(&html);
            let body = dom.body().unwrap();
            let iframe = dom.find("1").unwrap();
            let div = dom.create_element("div");
            let overlay = dom.create_element("div");
            let mut log = SubstitutionLog::new();
            log.swap(&mut dom, &iframe, &div);
            log.insert(&mut dom, &body, &overlay);
            assert_eq!(log.len(), 2);
            assert_eq!(log.revert_all(&mut dom), 2);
            assert_eq!(dom.outer_html(&html), before);
        }
    }
}
