//! Bulk listener bookkeeping with symmetric attach and detach.

use crate::dom::DomMut;
use crate::event::EventKind;

/// Every `(node, kind)` pair a session registered
#[derive(Debug, Clone)]
pub struct ListenerSet<N> {
    bound: Vec<(N, EventKind)>,
}

impl<N> Default for ListenerSet<N> {
    fn default() -> Self {
        Self { bound: Vec::new() }
    }
}

impl<N: Clone + PartialEq> ListenerSet<N> {
    /// Empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind each of `kinds` on each of `nodes`, skipping pairs already bound
    pub fn attach_all<D, I>(&mut self, dom: &mut D, nodes: I, kinds: &[EventKind]) -> usize
    where
        D: DomMut<Node = N> + ?Sized,
        I: IntoIterator<Item = N>,
    {
        let mut added = 0;
        for node in nodes {
            for &kind in kinds {
                if self.contains(&node, kind) {
                    continue;
                }
                dom.add_listener(&node, kind);
                self.bound.push((node.clone(), kind));
                added += 1;
            }
        }
        added
    }

    /// Unbind everything; calling again is a no-op
    pub fn detach_all<D>(&mut self, dom: &mut D) -> usize
    where
        D: DomMut<Node = N> + ?Sized,
    {
        let removed = self.bound.len();
        for (node, kind) in self.bound.drain(..) {
            dom.remove_listener(&node, kind);
        }
        removed
    }

    /// Whether `kind` is bound on `node`
    #[must_use]
    pub fn contains(&self, node: &N, kind: EventKind) -> bool {
        self.bound.iter().any(|(n, k)| n == node && *k == kind)
    }

    /// Number of bound pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    /// Whether nothing is bound
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;
    use crate::mock::{ElementSnapshot, MockDom, NodeId, PageSnapshot};

    fn page() -> MockDom {
        MockDom::from_snapshot(&PageSnapshot::new("http://example.com/").with_body(
            ElementSnapshot::new("body")
                .with_child(ElementSnapshot::new("p"))
                .with_child(ElementSnapshot::new("p")),
        ))
    }

    #[test]
    fn test_attach_skips_duplicates() {
        let mut dom = page();
        let body = dom.body().unwrap();
        let nodes = dom.children(&body);
        let mut set: ListenerSet<NodeId> = ListenerSet::new();
        assert_eq!(set.attach_all(&mut dom, nodes.clone(), &EventKind::ALL), 14);
        assert_eq!(set.attach_all(&mut dom, nodes.clone(), &EventKind::SELECT), 0);
        assert_eq!(set.len(), 14);
        assert!(set.contains(&nodes[0], EventKind::Click));
        assert_eq!(dom.listener_count(), 14);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let mut dom = page();
        let body = dom.body().unwrap();
        let nodes = dom.children(&body);
        let mut set = ListenerSet::new();
        set.attach_all(&mut dom, nodes, &EventKind::SELECT);
        assert_eq!(set.detach_all(&mut dom), 8);
        assert_eq!(set.detach_all(&mut dom), 0);
        assert!(set.is_empty());
        assert_eq!(dom.listener_count(), 0);
    }
}
