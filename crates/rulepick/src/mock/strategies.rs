//! Proptest strategies over headless pages.
//!
//! Trees are small and shallow so generated documents stay readable in
//! shrunk failure output, but they exercise ids, repeated classes, resource
//! URLs, text siblings and single-child chains. Some ids and classes need
//! CSS escaping.

use proptest::prelude::*;

use super::{ElementSnapshot, PageSnapshot};

const TAGS: [&str; 8] = ["div", "span", "p", "section", "img", "a", "ul", "li"];
const CLASSES: [&str; 10] = [
    "ad", "banner", "promo", "row", "x-1", "sponsored", "w-1/2", "a:b", "price$", "v1.2",
];
const IDS: [&str; 4] = ["1ad", "top:slot", "cost$", "-9"];
const HOSTS: [&str; 3] = ["ads.example.net", "cdn.example.org", "www.example.com"];

/// A single element with random tag, id, classes and resource URL
pub fn any_leaf() -> impl Strategy<Value = ElementSnapshot> {
    (
        prop::sample::select(TAGS.to_vec()),
        prop::option::weighted(
            0.25,
            prop_oneof![
                3 => (0u8..20).prop_map(|n| format!("el{n}")),
                1 => prop::sample::select(IDS.to_vec()).prop_map(str::to_string),
            ],
        ),
        prop::collection::vec(prop::sample::select(CLASSES.to_vec()), 0..3),
        prop::option::weighted(0.3, (prop::sample::select(HOSTS.to_vec()), 0u8..50)),
        prop::option::weighted(0.2, "[a-z]{1,6}"),
    )
        .prop_map(|(tag, id, classes, src, text)| {
            let mut el = ElementSnapshot::new(tag).with_rect(0.0, 0.0, 100.0, 40.0);
            if let Some(id) = id {
                el = el.with_id(&id);
            }
            for class in classes {
                el = el.with_class(class);
            }
            if let Some((host, n)) = src {
                el = el.with_attr("src", &format!("http://{host}/res/{n}.gif"));
            }
            if let Some(text) = text {
                el = el.with_text(&text);
            }
            el
        })
}

/// A random element subtree up to four levels deep
pub fn any_element_tree() -> impl Strategy<Value = ElementSnapshot> {
    any_leaf().prop_recursive(4, 24, 4, |inner| {
        (any_leaf(), prop::collection::vec(inner, 0..4)).prop_map(|(mut parent, children)| {
            parent.children = children;
            parent
        })
    })
}

/// A random page whose body holds one to three subtrees
pub fn any_page() -> impl Strategy<Value = PageSnapshot> {
    (
        prop::sample::select(vec![
            "http://example.com/",
            "http://www.example.com:8080/news",
            "https://shop.example.org/item?id=1",
        ]),
        prop::collection::vec(any_element_tree(), 1..4),
    )
        .prop_map(|(url, children)| {
            let mut body = ElementSnapshot::new("body");
            body.children = children;
            PageSnapshot::new(url).with_body(body)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;
    use crate::mock::MockDom;

    proptest! {
        #[test]
        fn prop_snapshot_element_count_matches_dom(page in any_page()) {
            let dom = MockDom::from_snapshot(&page);
            let body = dom.body().unwrap();
            prop_assert_eq!(dom.descendants(&body).len() + 1, page.body.element_count());
        }

        #[test]
        fn prop_path_roundtrip(page in any_page()) {
            let dom = MockDom::from_snapshot(&page);
            let body = dom.body().unwrap();
            for node in dom.descendants(&body) {
                let path = dom.path_of(&node).unwrap();
                prop_assert_eq!(dom.find(&path).unwrap(), node);
            }
        }
    }
}
