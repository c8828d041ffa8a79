//! Widening and narrowing a picked element.
//!
//! [`ScopeSlider`] maps a one-dimensional position to a node on the
//! `ancestors…, target, …descendants` ladder. Position 1 is the farthest
//! ancestor, `ancestors + 1` the picked element and the last position the
//! deepest single-child descendant.
//!
//! [`ScopeController`] keeps rule text, option toggles and the preview in
//! step with the slider.

use std::fmt;

use tracing::debug;

use crate::config::PickerConfig;
use crate::dom::{DomMut, DomTree};
use crate::locator::{ancestor_chain, single_child_descendants};
use crate::picker::PickerSession;
use crate::preview::RulePreview;
use crate::rule::{
    construct_rule_text, describe_node_with, CssSelectorType, ElementInfo, RuleOptions, RuleType,
};

/// Position ↔ node mapping along an element's lineage
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeSlider<N> {
    ancestors: Vec<N>,
    target: N,
    descendants: Vec<N>,
    position: usize,
}

impl<N: Clone + PartialEq> ScopeSlider<N> {
    /// Lowest position
    pub const MIN: usize = 1;

    /// Slider over explicit chains; `ancestors` nearest first,
    /// `descendants` top-down
    #[must_use]
    pub fn new(ancestors: Vec<N>, target: N, descendants: Vec<N>) -> Self {
        let position = ancestors.len() + 1;
        Self {
            ancestors,
            target,
            descendants,
            position,
        }
    }

    /// Slider around `target` in `dom`
    pub fn around<D: DomTree<Node = N> + ?Sized>(dom: &D, target: &N) -> Self {
        Self::new(
            ancestor_chain(dom, target),
            target.clone(),
            single_child_descendants(dom, target),
        )
    }

    /// Number of positions
    #[must_use]
    pub fn len(&self) -> usize {
        self.ancestors.len() + self.descendants.len() + 1
    }

    /// Always `false`: the picked element has a position
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest position
    #[must_use]
    pub fn max(&self) -> usize {
        self.len()
    }

    /// Position of the picked element
    #[must_use]
    pub fn origin(&self) -> usize {
        self.ancestors.len() + 1
    }

    /// Current position
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The originally picked element
    #[must_use]
    pub const fn target(&self) -> &N {
        &self.target
    }

    /// Node at `position`, or `None` outside `MIN..=max`
    #[must_use]
    pub fn node_at(&self, position: usize) -> Option<&N> {
        if !(Self::MIN..=self.max()).contains(&position) {
            return None;
        }
        let origin = self.origin();
        if position < origin {
            self.ancestors.get(origin - position - 1)
        } else if position == origin {
            Some(&self.target)
        } else {
            self.descendants.get(position - origin - 1)
        }
    }

    /// Node at the current position
    #[must_use]
    pub fn current(&self) -> &N {
        self.node_at(self.position).unwrap_or(&self.target)
    }

    /// Move to `position`, clamped into range, returning the scoped node
    pub fn set_position(&mut self, position: usize) -> &N {
        self.position = position.clamp(Self::MIN, self.max());
        self.current()
    }

    /// Whether there is anything to scope
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.max() > Self::MIN
    }

    /// Position under a pointer at `page_x` on a track starting at
    /// `offset_left` and `width` wide
    #[must_use]
    pub fn position_from_offset(&self, page_x: f32, offset_left: f32, width: f32) -> usize {
        if width <= 0.0 || !width.is_finite() || !page_x.is_finite() {
            return self.position;
        }
        let (min, max) = (Self::MIN as f32, self.max() as f32);
        let value = ((max - min) / width * (page_x - offset_left) + min).round();
        value.clamp(min, max) as usize
    }

    /// Number of track ticks
    #[must_use]
    pub fn tick_count(&self) -> usize {
        self.max() - Self::MIN
    }

    /// Whether tick `index` lies left of the handle
    #[must_use]
    pub const fn is_tick_filled(&self, index: usize) -> bool {
        index + 1 < self.position
    }

    /// Handle offset along the track in percent
    #[must_use]
    pub fn handle_percent(&self) -> f32 {
        let ticks = self.tick_count();
        if ticks == 0 {
            return 0.0;
        }
        (self.position - Self::MIN) as f32 * 100.0 / ticks as f32
    }
}

/// User-facing rule options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeOptions {
    /// Block the element's resource URL instead of hiding it
    pub block_by_url: bool,
    /// Hide every element sharing one of its classes
    pub block_similar: bool,
    /// Apply the rule on every site, not just this one
    pub one_domain: bool,
}

/// Which options may currently be offered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionAvailability {
    /// The scoped element has a resource URL and similar-blocking is off
    pub block_by_url: bool,
    /// The scoped element has classes and URL-blocking is off
    pub block_similar: bool,
}

/// Slider, options, rule text and preview for one picked element
pub struct ScopeController<D: DomMut> {
    slider: ScopeSlider<D::Node>,
    info: ElementInfo,
    options: ScopeOptions,
    availability: OptionAvailability,
    rule_text: String,
    preview: RulePreview<D::Node>,
    config: PickerConfig,
}

impl<D: DomMut> fmt::Debug for ScopeController<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeController")
            .field("slider", &self.slider)
            .field("options", &self.options)
            .field("availability", &self.availability)
            .field("rule_text", &self.rule_text)
            .field("previewing", &self.preview.is_active())
            .finish_non_exhaustive()
    }
}

impl<D: DomMut> ScopeController<D> {
    /// Controller for an element the picker just reported
    pub fn new(dom: &D, target: &D::Node, config: PickerConfig) -> Self {
        let slider = ScopeSlider::around(dom, target);
        let info = describe_node_with(dom, target, &config.url_attributes);
        let mut controller = Self {
            slider,
            info,
            options: ScopeOptions::default(),
            availability: OptionAvailability::default(),
            rule_text: String::new(),
            preview: RulePreview::new(),
            config,
        };
        controller.refresh(dom);
        controller
    }

    /// Move the slider and re-scope
    ///
    /// Drops any preview, re-highlights through `picker`, resets the option
    /// toggles and recomputes rule text and option availability.
    pub fn move_to(&mut self, dom: &mut D, picker: &mut PickerSession<D>, position: usize) -> &D::Node {
        self.preview.hide(dom);
        let node = self.slider.set_position(position).clone();
        picker.select_element(dom, &node);
        self.info = describe_node_with(&*dom, &node, &self.config.url_attributes);
        self.options = ScopeOptions::default();
        self.refresh(dom);
        debug!(
            position = self.slider.position(),
            tag = %self.info.tag_name,
            "scope changed"
        );
        self.slider.current()
    }

    /// Move the slider to where the pointer is on the track
    pub fn drag_to(
        &mut self,
        dom: &mut D,
        picker: &mut PickerSession<D>,
        page_x: f32,
        offset_left: f32,
        width: f32,
    ) -> &D::Node {
        let position = self.slider.position_from_offset(page_x, offset_left, width);
        self.move_to(dom, picker, position)
    }

    /// Toggle URL blocking
    pub fn set_block_by_url(&mut self, dom: &mut D, on: bool) {
        self.options.block_by_url = on && self.availability.block_by_url;
        self.changed(dom);
    }

    /// Toggle similar-element hiding
    pub fn set_block_similar(&mut self, dom: &mut D, on: bool) {
        self.options.block_similar = on && self.availability.block_similar;
        self.changed(dom);
    }

    /// Toggle the site-wide rule
    pub fn set_one_domain(&mut self, dom: &mut D, on: bool) {
        self.options.one_domain = on;
        self.changed(dom);
    }

    /// Switch the preview on or off, returning the new state
    ///
    /// Turning it on clears the picker's highlight; turning it off
    /// re-highlights the scoped element.
    pub fn toggle_preview(&mut self, dom: &mut D, picker: &mut PickerSession<D>) -> bool {
        if self.preview.is_active() {
            self.preview.hide(dom);
            let node = self.slider.current().clone();
            picker.select_element(dom, &node);
            false
        } else {
            picker.reset(dom);
            self.preview.show(dom, &self.rule_text, &self.config)
        }
    }

    /// Remove the preview and hand back the final rule text
    pub fn finish(mut self, dom: &mut D) -> String {
        self.preview.hide(dom);
        std::mem::take(&mut self.rule_text)
    }

    /// Rule options for the current state
    #[must_use]
    pub fn rule_options(&self, url: &str) -> RuleOptions {
        let rule_type = if self.options.block_by_url {
            RuleType::Url
        } else {
            RuleType::Css
        };
        let selector_type = if self.options.block_similar {
            CssSelectorType::Similar
        } else {
            CssSelectorType::StrictFull
        };
        let options = RuleOptions::new(url)
            .with_rule_type(rule_type)
            .with_selector_type(selector_type)
            .with_one_domain(self.options.one_domain);
        match &self.info.resource_url {
            Some(resource) => options.with_url_mask(resource.clone()),
            None => options,
        }
    }

    /// Slider state
    #[must_use]
    pub const fn slider(&self) -> &ScopeSlider<D::Node> {
        &self.slider
    }

    /// Currently scoped element
    #[must_use]
    pub fn node(&self) -> &D::Node {
        self.slider.current()
    }

    /// Description of the scoped element
    #[must_use]
    pub const fn info(&self) -> &ElementInfo {
        &self.info
    }

    /// Option toggles
    #[must_use]
    pub const fn options(&self) -> ScopeOptions {
        self.options
    }

    /// Options that may be offered
    #[must_use]
    pub const fn availability(&self) -> OptionAvailability {
        self.availability
    }

    /// Current rule text
    #[must_use]
    pub fn rule_text(&self) -> &str {
        &self.rule_text
    }

    /// Whether a preview stylesheet is injected
    #[must_use]
    pub const fn is_previewing(&self) -> bool {
        self.preview.is_active()
    }

    /// Whether the detailed options should open without user action
    #[must_use]
    pub fn shows_details_by_default(&self) -> bool {
        !self.slider.is_visible()
    }

    fn changed(&mut self, dom: &mut D) {
        self.refresh(dom);
        if self.preview.is_active() {
            self.preview.show(dom, &self.rule_text, &self.config);
        }
    }

    fn refresh(&mut self, dom: &D) {
        self.availability = OptionAvailability {
            block_by_url: self.info.has_resource_url && !self.options.block_similar,
            block_similar: self.info.has_class_attribute && !self.options.block_by_url,
        };
        self.options.block_by_url &= self.availability.block_by_url;
        self.options.block_similar &= self.availability.block_similar;
        let options = self.rule_options(&dom.location());
        self.rule_text = construct_rule_text(dom, self.slider.current(), &options);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::mock::{ElementSnapshot, MockDom, NodeId, PageSnapshot};

    fn ad_page(img_class: &str) -> MockDom {
        MockDom::from_snapshot(
            &PageSnapshot::new("http://example.com/").with_body(
                ElementSnapshot::new("body").with_child(
                    ElementSnapshot::new("div").with_id("ad1").with_child(
                        ElementSnapshot::new("img")
                            .with_class(img_class)
                            .with_attr("src", "http://ads.example.net/x.gif"),
                    ),
                ),
            ),
        )
    }

    fn session(dom: &mut MockDom) -> PickerSession<MockDom> {
        PickerSession::start(dom, |_: &NodeId| {}, None, PickerConfig::default())
    }

    mod slider_tests {
        use super::*;

        fn slider() -> ScopeSlider<&'static str> {
            ScopeSlider::new(vec!["parent", "grandparent"], "target", vec!["child", "grandchild"])
        }

        #[test]
        fn test_mapping() {
            let s = slider();
            assert_eq!(s.len(), 5);
            assert_eq!(s.origin(), 3);
            assert_eq!(s.node_at(1), Some(&"grandparent"));
            assert_eq!(s.node_at(2), Some(&"parent"));
            assert_eq!(s.node_at(3), Some(&"target"));
            assert_eq!(s.node_at(4), Some(&"child"));
            assert_eq!(s.node_at(5), Some(&"grandchild"));
            assert_eq!(s.node_at(0), None);
            assert_eq!(s.node_at(6), None);
        }

        #[test]
        fn test_set_position_clamps() {
            let mut s = slider();
            assert_eq!(*s.set_position(0), "grandparent");
            assert_eq!(s.position(), 1);
            assert_eq!(*s.set_position(99), "grandchild");
            assert_eq!(s.position(), 5);
        }

        #[test]
        fn test_position_from_offset() {
            let s = slider();
            assert_eq!(s.position_from_offset(100.0, 100.0, 200.0), 1);
            assert_eq!(s.position_from_offset(200.0, 100.0, 200.0), 3);
            assert_eq!(s.position_from_offset(300.0, 100.0, 200.0), 5);
            assert_eq!(s.position_from_offset(-50.0, 100.0, 200.0), 1);
            assert_eq!(s.position_from_offset(900.0, 100.0, 200.0), 5);
            assert_eq!(s.position_from_offset(150.0, 100.0, 0.0), 3);
        }

        #[test]
        fn test_ticks_and_handle() {
            let mut s = slider();
            assert_eq!(s.tick_count(), 4);
            assert!(s.is_tick_filled(0));
            assert!(s.is_tick_filled(1));
            assert!(!s.is_tick_filled(2));
            assert!((s.handle_percent() - 50.0).abs() < f32::EPSILON);
            s.set_position(1);
            assert!(s.handle_percent().abs() < f32::EPSILON);
        }

        #[test]
        fn test_single_position_hidden() {
            let s = ScopeSlider::new(Vec::new(), 7, Vec::new());
            assert!(!s.is_visible());
            assert_eq!(s.tick_count(), 0);
            assert!(s.handle_percent().abs() < f32::EPSILON);
        }

        #[test]
        fn test_around_dom() {
            let dom = ad_page("banner");
            let div = dom.find("0").unwrap();
            let img = dom.find("0/0").unwrap();
            let s = ScopeSlider::around(&dom, &div);
            assert_eq!(s.len(), 2);
            assert_eq!(s.node_at(1), Some(&div));
            assert_eq!(s.node_at(2), Some(&img));
        }
    }

    mod controller_tests {
        use super::*;

        #[test]
        fn test_initial_rule() {
            let dom = ad_page("banner");
            let img = dom.find("0/0").unwrap();
            let controller: ScopeController<MockDom> =
                ScopeController::new(&dom, &img, PickerConfig::default());
            assert_eq!(controller.rule_text(), "example.com##div#ad1 > img.banner");
            assert_eq!(
                controller.availability(),
                OptionAvailability {
                    block_by_url: true,
                    block_similar: true
                }
            );
            assert!(!controller.shows_details_by_default());
        }

        #[test]
        fn test_one_step_up() {
            let mut dom = ad_page("banner");
            let img = dom.find("0/0").unwrap();
            let div = dom.find("0").unwrap();
            let mut picker = session(&mut dom);
            let mut controller = ScopeController::new(&dom, &img, PickerConfig::default());
            let origin = controller.slider().origin();
            assert_eq!(*controller.move_to(&mut dom, &mut picker, origin - 1), div);
            assert_eq!(controller.rule_text(), "example.com##div#ad1");
            assert_eq!(picker.selection(), Some(&div));
            assert!(picker.is_unbound());
            assert_eq!(controller.availability(), OptionAvailability::default());
            picker.close(&mut dom);
        }

        #[test]
        fn test_url_mode() {
            let mut dom = ad_page("banner");
            let img = dom.find("0/0").unwrap();
            let mut controller: ScopeController<MockDom> =
                ScopeController::new(&dom, &img, PickerConfig::default());
            controller.set_block_by_url(&mut dom, true);
            assert_eq!(
                controller.rule_text(),
                "||ads.example.net/x.gif$domain=example.com"
            );
            assert!(!controller.availability().block_similar);
            controller.set_one_domain(&mut dom, true);
            assert_eq!(controller.rule_text(), "||ads.example.net/x.gif");
        }

        #[test]
        fn test_similar_mode() {
            let mut dom = ad_page("banner promo");
            let img = dom.find("0/0").unwrap();
            let mut controller: ScopeController<MockDom> =
                ScopeController::new(&dom, &img, PickerConfig::default());
            controller.set_block_similar(&mut dom, true);
            assert_eq!(controller.rule_text(), "example.com##.banner, .promo");
            controller.set_block_by_url(&mut dom, true);
            assert!(!controller.options().block_by_url);
            assert_eq!(controller.rule_text(), "example.com##.banner, .promo");
        }

        #[test]
        fn test_move_resets_options() {
            let mut dom = ad_page("banner");
            let img = dom.find("0/0").unwrap();
            let mut picker = session(&mut dom);
            let mut controller = ScopeController::new(&dom, &img, PickerConfig::default());
            controller.set_block_by_url(&mut dom, true);
            controller.set_one_domain(&mut dom, true);
            let origin = controller.slider().origin();
            controller.move_to(&mut dom, &mut picker, origin);
            assert_eq!(controller.options(), ScopeOptions::default());
            assert_eq!(controller.rule_text(), "example.com##div#ad1 > img.banner");
            picker.close(&mut dom);
        }

        #[test]
        fn test_lone_leaf_shows_details() {
            let dom = MockDom::from_snapshot(
                &PageSnapshot::new("http://example.com/")
                    .with_body(ElementSnapshot::new("body").with_child(ElementSnapshot::new("span"))),
            );
            let span = dom.find("0").unwrap();
            let controller: ScopeController<MockDom> =
                ScopeController::new(&dom, &span, PickerConfig::default());
            assert!(!controller.slider().is_visible());
            assert!(controller.shows_details_by_default());
        }

        #[test]
        fn test_preview_toggle() {
            let mut dom = ad_page("banner");
            let img = dom.find("0/0").unwrap();
            let head = dom.head().unwrap();
            let mut picker = session(&mut dom);
            let mut controller = ScopeController::new(&dom, &img, PickerConfig::default());
            controller.move_to(&mut dom, &mut picker, controller.slider().origin());

            assert!(controller.toggle_preview(&mut dom, &mut picker));
            assert!(controller.is_previewing());
            assert_eq!(picker.selection(), None);
            assert_eq!(
                dom.text_content(&dom.children(&head)[0]),
                "div#ad1 > img.banner {display: none !important;}"
            );

            controller.set_block_by_url(&mut dom, true);
            assert_eq!(
                dom.text_content(&dom.children(&head)[0]),
                "[src*=\"ads.example.net/x.gif\"] {display: none !important;}"
            );

            assert!(!controller.toggle_preview(&mut dom, &mut picker));
            assert!(dom.children(&head).is_empty());
            assert_eq!(picker.selection(), Some(&img));

            controller.toggle_preview(&mut dom, &mut picker);
            let rule = controller.finish(&mut dom);
            assert_eq!(rule, "||ads.example.net/x.gif$domain=example.com");
            assert!(dom.children(&head).is_empty());
            picker.close(&mut dom);
        }
    }

    mod property_tests {
        use super::*;
        use crate::mock::strategies::any_page;

        proptest! {
            #[test]
            fn prop_every_position_maps_to_one_node(page in any_page()) {
                let dom = MockDom::from_snapshot(&page);
                let body = dom.body().unwrap();
                for node in dom.descendants(&body) {
                    let mut slider = ScopeSlider::around(&dom, &node);
                    prop_assert_eq!(slider.node_at(slider.origin()), Some(&node));
                    let mut seen = Vec::new();
                    for position in ScopeSlider::<NodeId>::MIN..=slider.max() {
                        let scoped = *slider.set_position(position);
                        prop_assert!(!seen.contains(&scoped));
                        seen.push(scoped);
                    }
                    prop_assert_eq!(seen.len(), slider.len());
                }
            }
        }
    }
}
