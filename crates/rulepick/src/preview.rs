//! Temporary hiding of whatever a rule would hide.

use tracing::debug;

use crate::config::PickerConfig;
use crate::dom::DomMut;
use crate::rule::selector_from_rule_text;

/// Stylesheet text hiding everything `rule_text` targets
#[must_use]
pub fn preview_css(rule_text: &str) -> Option<String> {
    selector_from_rule_text(rule_text).map(|selector| format!("{selector} {{display: none !important;}}"))
}

/// A `<style>` element injected into `head` while previewing
#[derive(Debug, Clone)]
pub struct RulePreview<N> {
    style: Option<N>,
}

impl<N> Default for RulePreview<N> {
    fn default() -> Self {
        Self { style: None }
    }
}

impl<N: Clone + PartialEq> RulePreview<N> {
    /// Inactive preview
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide what `rule_text` matches, replacing any previous preview
    ///
    /// Returns `false` when no selector can be derived or the document has
    /// no `head`.
    pub fn show<D>(&mut self, dom: &mut D, rule_text: &str, config: &PickerConfig) -> bool
    where
        D: DomMut<Node = N> + ?Sized,
    {
        self.hide(dom);
        let Some(css) = preview_css(rule_text) else {
            return false;
        };
        let Some(head) = dom.head() else {
            return false;
        };
        let style = dom.create_element("style");
        dom.set_attribute(&style, "type", "text/css");
        dom.set_attribute(&style, "id", &config.preview_style_id);
        dom.set_attribute(&style, "class", &config.ignore_class);
        dom.set_text(&style, &css);
        dom.append_child(&head, &style);
        debug!(rule = rule_text, "previewing rule");
        self.style = Some(style);
        true
    }

    /// Remove the injected stylesheet; returns whether one was present
    pub fn hide<D>(&mut self, dom: &mut D) -> bool
    where
        D: DomMut<Node = N> + ?Sized,
    {
        match self.style.take() {
            Some(style) => {
                dom.detach(&style);
                true
            }
            None => false,
        }
    }

    /// Whether a stylesheet is injected
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.style.is_some()
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
                    .with_child(ElementSnapshot::new("div").with_class("banner"))
                    .with_child(ElementSnapshot::new("img").with_attr("src", "http://ads.example.net/x.gif")),
            ),
        )
    }

    #[test]
    fn test_preview_css() {
        assert_eq!(
            preview_css("example.com##.banner").as_deref(),
            Some(".banner {display: none !important;}")
        );
        assert_eq!(
            preview_css("||ads.example.net/x.gif$domain=example.com").as_deref(),
            Some("[src*=\"ads.example.net/x.gif\"] {display: none !important;}")
        );
        assert_eq!(preview_css(""), None);
    }

    #[test]
    fn test_show_injects_into_head() {
        let mut dom = page();
        let head = dom.head().unwrap();
        let mut preview: RulePreview<NodeId> = RulePreview::new();
        assert!(preview.show(&mut dom, "example.com##.banner", &PickerConfig::default()));
        assert!(preview.is_active());
        let style = dom.children(&head)[0];
        assert_eq!(dom.tag_name(&style), "style");
        assert_eq!(dom.attribute(&style, "type").as_deref(), Some("text/css"));
        assert_eq!(dom.id(&style).as_deref(), Some("rulepick-preview"));
        assert_eq!(dom.text_content(&style), ".banner {display: none !important;}");
    }

    #[test]
    fn test_selector_matches_target() {
        let mut dom = page();
        let img = dom.find("1").unwrap();
        let css = preview_css("||ads.example.net/x.gif$domain=example.com").unwrap();
        let selector = css.trim_end_matches(" {display: none !important;}");
        assert_eq!(dom.query_selector_all(selector).unwrap(), vec![img]);
        let mut preview = RulePreview::new();
        assert!(preview.show(&mut dom, "||ads.example.net/x.gif", &PickerConfig::default()));
        preview.hide(&mut dom);
    }

    #[test]
    fn test_show_replaces_and_hide_is_idempotent() {
        let mut dom = page();
        let head = dom.head().unwrap();
        let config = PickerConfig::default();
        let mut preview = RulePreview::new();
        preview.show(&mut dom, "##.a", &config);
        preview.show(&mut dom, "##.b", &config);
        assert_eq!(dom.children(&head).len(), 1);
        assert!(preview.hide(&mut dom));
        assert!(!preview.hide(&mut dom));
        assert!(dom.children(&head).is_empty());
    }

    #[test]
    fn test_unusable_rule_shows_nothing() {
        let mut dom = page();
        let mut preview = RulePreview::new();
        assert!(!preview.show(&mut dom, "example.com##", &PickerConfig::default()));
        assert!(!preview.is_active());
    }
}
