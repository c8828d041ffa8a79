//! Visual outline for the hovered or selected element.
//!
//! The picker only talks to the [`Highlighter`] trait. [`BorderHighlighter`]
//! is the default: four absolutely positioned strips drawn around the
//! element's box, the bottom one taller and labelled with the element's
//! `"parentTag childTag"` path.

use std::fmt;

use crate::config::PickerConfig;
use crate::dom::{BoundingBox, DomMut};

/// Pluggable highlight presentation
pub trait Highlighter<D: DomMut>: fmt::Debug {
    /// Prepare any elements the highlighter draws with
    fn init(&mut self, dom: &mut D);

    /// Highlight `node`, replacing any previous highlight
    fn add(&mut self, dom: &mut D, node: &D::Node);

    /// Hide the highlight
    fn remove(&mut self, dom: &mut D);

    /// Remove everything the highlighter put in the document
    fn finalize(&mut self, dom: &mut D);

    /// Element whose highlight `node` belongs to, when `node` is one of the
    /// highlighter's own elements
    fn bordered_target(&self, _node: &D::Node) -> Option<D::Node> {
        None
    }

    /// Elements drawn by the highlighter that should accept selection clicks
    fn elements(&self) -> Vec<D::Node> {
        Vec::new()
    }
}

/// Geometry of the four border strips, relative to the body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderGeometry {
    /// Strip above the element
    pub top: BoundingBox,
    /// Labelled strip below the element
    pub bottom: BoundingBox,
    /// Strip left of the element
    pub left: BoundingBox,
    /// Strip right of the element
    pub right: BoundingBox,
}

/// Border dimensions and classes
#[derive(Debug, Clone, PartialEq)]
pub struct BorderStyle {
    /// Strip thickness
    pub width: f32,
    /// Gap between element and strip
    pub padding: f32,
    /// Extra height of the bottom strip
    pub label_height: f32,
    /// Class on every strip
    pub class: String,
    /// Picker-internal marker class
    pub ignore_class: String,
}

impl Default for BorderStyle {
    fn default() -> Self {
        Self::from_config(&PickerConfig::default())
    }
}

impl BorderStyle {
    /// Take dimensions and classes from a picker configuration
    #[must_use]
    pub fn from_config(config: &PickerConfig) -> Self {
        Self {
            width: config.border_width,
            padding: config.border_padding,
            label_height: config.label_height,
            class: config.border_class.clone(),
            ignore_class: config.ignore_class.clone(),
        }
    }

    /// Strip geometry around an element box
    #[must_use]
    pub fn geometry(&self, rect: &BoundingBox) -> BorderGeometry {
        let (b, p) = (self.width, self.padding);
        let outer_left = rect.x - p - b;
        BorderGeometry {
            top: BoundingBox::new(outer_left, rect.y - b - p, rect.width + 2.0 * p + 2.0 * b, b),
            bottom: BoundingBox::new(
                outer_left,
                rect.bottom() + p,
                rect.width + 2.0 * p + b,
                b + self.label_height,
            ),
            left: BoundingBox::new(outer_left, rect.y - p, b, rect.height + 2.0 * p),
            right: BoundingBox::new(rect.right() + p, rect.y - p, b, rect.height + 2.0 * p),
        }
    }
}

/// Default highlighter drawing four border strips
#[derive(Debug, Clone)]
pub struct BorderHighlighter<N> {
    style: BorderStyle,
    /// top, bottom, left, right
    strips: Option<[N; 4]>,
    target: Option<N>,
}

impl<N> Default for BorderHighlighter<N> {
    fn default() -> Self {
        Self::new(BorderStyle::default())
    }
}

impl<N> BorderHighlighter<N> {
    /// Create with explicit style
    #[must_use]
    pub const fn new(style: BorderStyle) -> Self {
        Self {
            style,
            strips: None,
            target: None,
        }
    }

    /// Create from a picker configuration
    #[must_use]
    pub fn from_config(config: &PickerConfig) -> Self {
        Self::new(BorderStyle::from_config(config))
    }

    /// Currently outlined element
    #[must_use]
    pub const fn target(&self) -> Option<&N> {
        self.target.as_ref()
    }

    /// Border style in use
    #[must_use]
    pub const fn style(&self) -> &BorderStyle {
        &self.style
    }
}

fn px(value: f32) -> String {
    format!("{value}px")
}

fn place<D: DomMut>(dom: &mut D, strip: &D::Node, rect: &BoundingBox) {
    dom.set_style(strip, "left", &px(rect.x));
    dom.set_style(strip, "top", &px(rect.y));
    dom.set_style(strip, "width", &px(rect.width));
    dom.set_style(strip, "height", &px(rect.height));
    dom.set_style(strip, "display", "block");
}

impl<D: DomMut> Highlighter<D> for BorderHighlighter<D::Node> {
    fn init(&mut self, dom: &mut D) {
        if self.strips.is_some() {
            return;
        }
        let Some(body) = dom.body() else {
            return;
        };
        let class = format!("{} {}", self.style.class, self.style.ignore_class);
        let strips = [(); 4].map(|()| {
            let strip = dom.create_element("div");
            dom.set_attribute(&strip, "class", &class);
            dom.set_style(&strip, "position", "absolute");
            dom.set_style(&strip, "display", "none");
            dom.append_child(&body, &strip);
            strip
        });
        self.strips = Some(strips);
    }

    fn add(&mut self, dom: &mut D, node: &D::Node) {
        self.init(dom);
        let Some(strips) = self.strips.clone() else {
            return;
        };
        let origin = dom
            .body()
            .map(|body| dom.bounding_box(&body))
            .unwrap_or_default();
        let rect = dom.bounding_box(node).relative_to(&origin);
        let geometry = self.style.geometry(&rect);
        let [top, bottom, left, right] = &strips;
        place(dom, top, &geometry.top);
        place(dom, bottom, &geometry.bottom);
        place(dom, left, &geometry.left);
        place(dom, right, &geometry.right);

        let tag = dom.tag_name(node);
        let label = match dom.parent(node) {
            Some(parent) => format!("{} {tag}", dom.tag_name(&parent)),
            None => tag,
        };
        dom.set_text(bottom, &label);
        self.target = Some(node.clone());
    }

    fn remove(&mut self, dom: &mut D) {
        if let Some(strips) = &self.strips {
            for strip in strips {
                dom.set_style(strip, "display", "none");
            }
        }
        self.target = None;
    }

    fn finalize(&mut self, dom: &mut D) {
        if let Some(strips) = self.strips.take() {
            for strip in &strips {
                dom.detach(strip);
            }
        }
        self.target = None;
    }

    fn bordered_target(&self, node: &D::Node) -> Option<D::Node> {
        let strips = self.strips.as_ref()?;
        if strips.contains(node) {
            self.target.clone()
        } else {
            None
        }
    }

    fn elements(&self) -> Vec<D::Node> {
        self.strips.as_ref().map(|s| s.to_vec()).unwrap_or_default()
    }
}
