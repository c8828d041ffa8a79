//! Read-only tree walks around a picked element.
//!
//! Both walks stay inside `body`: neither `body` nor `html` is ever offered
//! as a scope.

use crate::dom::DomTree;

/// Ancestors of `node`, nearest first, stopping below `body`
///
/// A node outside `body` (for example in `head`) stops at `html` instead.
pub fn ancestor_chain<D: DomTree + ?Sized>(dom: &D, node: &D::Node) -> Vec<D::Node> {
    let body = dom.body();
    let root = dom.document_element();
    let mut chain = Vec::new();
    let mut current = dom.parent(node);
    while let Some(parent) = current {
        if Some(&parent) == body.as_ref() || parent == root {
            break;
        }
        current = dom.parent(&parent);
        chain.push(parent);
    }
    chain
}

/// The unbroken single-child lineage below `node`, top-down
///
/// Empty as soon as `node` has zero or several element children.
pub fn single_child_descendants<D: DomTree + ?Sized>(dom: &D, node: &D::Node) -> Vec<D::Node> {
    let mut chain = Vec::new();
    let mut current = node.clone();
    loop {
        let mut children = dom.children(&current);
        if children.len() != 1 {
            break;
        }
        let only = children.remove(0);
        chain.push(only.clone());
        current = only;
    }
    chain
}

/// 1-based position of `node` among its parent's element children and the
/// number of those children; `(1, 1)` for a parentless node
pub fn element_position<D: DomTree + ?Sized>(dom: &D, node: &D::Node) -> (usize, usize) {
    let Some(parent) = dom.parent(node) else {
        return (1, 1);
    };
    let siblings = dom.children(&parent);
    let index = siblings.iter().position(|s| s == node).map_or(1, |i| i + 1);
    (index, siblings.len())
}

/// Whether the tag never makes sense as a pick
#[must_use]
pub fn is_structural_tag(tag: &str, restricted: &[String]) -> bool {
    restricted.iter().any(|r| r.eq_ignore_ascii_case(tag))
}
