//! Selector matching for the headless document.
//!
//! Covers the grammar rule construction emits: type, `#id`, `.class`,
//! attribute tests (`[a]`, `=`, `*=`, `^=`, `$=`), `:first-child`,
//! `:last-child`, `:nth-child(n)`, child and descendant combinators and
//! comma-separated lists. Identifiers may carry CSS escapes.

use super::{MockDom, NodeId};
use crate::dom::DomTree;
use crate::result::{PickError, PickResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Child,
    Descendant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Contains,
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pseudo {
    FirstChild,
    LastChild,
    NthChild(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp, String)>,
    pseudos: Vec<Pseudo>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudos.is_empty()
    }
}

/// Rightmost compound first, each paired with the combinator to its left
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    subject: Compound,
    ancestry: Vec<(Combinator, Compound)>,
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> PickError {
        PickError::selector(self.source, format!("{message} at offset {}", self.pos))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, want: char) -> PickResult<()> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            _ => Err(self.error(&format!("expected {want:?}"))),
        }
    }

    fn parse_list(&mut self) -> PickResult<Vec<Complex>> {
        let mut list = vec![self.parse_complex()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            list.push(self.parse_complex()?);
        }
        if self.peek().is_some() {
            return Err(self.error("unexpected character"));
        }
        Ok(list)
    }

    fn parse_complex(&mut self) -> PickResult<Complex> {
        self.skip_ws();
        let mut parts = vec![(Combinator::Descendant, self.parse_compound()?)];
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                None | Some(',') => break,
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.error("unexpected character")),
            };
            parts.push((combinator, self.parse_compound()?));
        }
        let (mut link, subject) = parts.pop().ok_or_else(|| self.error("empty selector"))?;
        let mut ancestry = Vec::with_capacity(parts.len());
        while let Some((combinator, compound)) = parts.pop() {
            ancestry.push((link, compound));
            link = combinator;
        }
        Ok(Complex { subject, ancestry })
    }

    fn parse_compound(&mut self) -> PickResult<Compound> {
        let mut compound = Compound::default();
        let mut universal = false;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                universal = true;
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.parse_ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(':') => {
                    self.pos += 1;
                    compound.pseudos.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }
        if compound.is_empty() && !universal {
            return Err(self.error("expected a simple selector"));
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> PickResult<String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                out.push(self.parse_escape()?);
            } else if is_ident_char(c) {
                self.pos += 1;
                out.push(c);
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.error("expected identifier"));
        }
        Ok(out)
    }

    fn parse_escape(&mut self) -> PickResult<char> {
        let mut hex = String::new();
        while hex.len() < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            hex.push(self.bump().unwrap_or_default());
        }
        if hex.is_empty() {
            return self.bump().ok_or_else(|| self.error("dangling escape"));
        }
        if self.peek() == Some(' ') {
            self.pos += 1;
        }
        let code = u32::from_str_radix(&hex, 16).map_err(|_| self.error("bad escape"))?;
        Ok(char::from_u32(code)
            .filter(|c| *c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn parse_attr(&mut self) -> PickResult<(String, AttrOp, String)> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.bump() {
            Some(']') => return Ok((name, AttrOp::Exists, String::new())),
            Some('=') => AttrOp::Equals,
            Some(c @ ('*' | '^' | '$')) => {
                self.expect('=')?;
                match c {
                    '*' => AttrOp::Contains,
                    '^' => AttrOp::Prefix,
                    _ => AttrOp::Suffix,
                }
            }
            _ => return Err(self.error("bad attribute operator")),
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some('\\') => value.push(self.parse_escape()?),
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                value
            }
            _ => self.parse_ident()?,
        };
        self.skip_ws();
        self.expect(']')?;
        Ok((name, op, value))
    }

    fn parse_pseudo(&mut self) -> PickResult<Pseudo> {
        let name = self.parse_ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(Pseudo::FirstChild),
            "last-child" => Ok(Pseudo::LastChild),
            "nth-child" => {
                self.expect('(')?;
                self.skip_ws();
                let mut digits = String::new();
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    digits.push(self.bump().unwrap_or_default());
                }
                self.skip_ws();
                self.expect(')')?;
                digits
                    .parse()
                    .map(Pseudo::NthChild)
                    .map_err(|_| self.error("nth-child needs a plain index"))
            }
            _ => Err(self.error("unsupported pseudo-class")),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

impl MockDom {
    /// All attached elements matching `selector`, in document order
    pub fn query_selector_all(&self, selector: &str) -> PickResult<Vec<NodeId>> {
        let list = Parser::new(selector).parse_list()?;
        let html = self.document_element();
        let mut scope = vec![html];
        scope.extend(self.descendants(&html));
        Ok(scope
            .into_iter()
            .filter(|node| list.iter().any(|complex| self.matches_complex(node, complex)))
            .collect())
    }

    /// Whether `node` matches `selector`
    pub fn matches(&self, node: &NodeId, selector: &str) -> PickResult<bool> {
        let list = Parser::new(selector).parse_list()?;
        Ok(list.iter().any(|complex| self.matches_complex(node, complex)))
    }

    fn matches_complex(&self, node: &NodeId, complex: &Complex) -> bool {
        self.matches_compound(node, &complex.subject)
            && self.matches_ancestry(node, &complex.ancestry)
    }

    fn matches_ancestry(&self, node: &NodeId, ancestry: &[(Combinator, Compound)]) -> bool {
        let Some(((combinator, compound), rest)) = ancestry.split_first() else {
            return true;
        };
        match combinator {
            Combinator::Child => self.parent(node).is_some_and(|parent| {
                self.matches_compound(&parent, compound) && self.matches_ancestry(&parent, rest)
            }),
            Combinator::Descendant => {
                let mut current = self.parent(node);
                while let Some(parent) = current {
                    if self.matches_compound(&parent, compound)
                        && self.matches_ancestry(&parent, rest)
                    {
                        return true;
                    }
                    current = self.parent(&parent);
                }
                false
            }
        }
    }

    fn matches_compound(&self, node: &NodeId, compound: &Compound) -> bool {
        if compound
            .tag
            .as_ref()
            .is_some_and(|tag| *tag != self.tag_name(node))
        {
            return false;
        }
        if compound
            .ids
            .iter()
            .any(|id| self.attribute(node, "id").as_ref() != Some(id))
        {
            return false;
        }
        if !compound.classes.iter().all(|c| self.has_class(node, c)) {
            return false;
        }
        let attrs_ok = compound.attrs.iter().all(|(name, op, want)| {
            self.attribute(node, name).is_some_and(|value| match op {
                AttrOp::Exists => true,
                AttrOp::Equals => value == *want,
                AttrOp::Contains => !want.is_empty() && value.contains(want.as_str()),
                AttrOp::Prefix => !want.is_empty() && value.starts_with(want.as_str()),
                AttrOp::Suffix => !want.is_empty() && value.ends_with(want.as_str()),
            })
        });
        if !attrs_ok {
            return false;
        }
        compound.pseudos.iter().all(|pseudo| {
            let siblings = self
                .parent(node)
                .map_or_else(|| vec![*node], |parent| self.children(&parent));
            let Some(index) = siblings.iter().position(|s| s == node) else {
                return false;
            };
            match pseudo {
                Pseudo::FirstChild => index == 0,
                Pseudo::LastChild => index + 1 == siblings.len(),
                Pseudo::NthChild(k) => index + 1 == *k,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ElementSnapshot, PageSnapshot};

    fn page() -> MockDom {
        MockDom::from_snapshot(
            &PageSnapshot::new("http://example.com/").with_body(
                ElementSnapshot::new("body")
                    .with_child(
                        ElementSnapshot::new("div")
                            .with_id("ad1")
                            .with_child(ElementSnapshot::new("img").with_class("banner"))
                            .with_child(
                                ElementSnapshot::new("img")
                                    .with_class("banner")
                                    .with_class("promo")
                                    .with_attr("src", "http://ads.example.net/x.gif"),
                            ),
                    )
                    .with_child(
                        ElementSnapshot::new("ul")
                            .with_child(ElementSnapshot::new("li"))
                            .with_child(ElementSnapshot::new("li").with_class("1st"))
                            .with_child(ElementSnapshot::new("li")),
                    ),
            ),
        )
    }

    fn count(dom: &MockDom, selector: &str) -> usize {
        dom.query_selector_all(selector).unwrap().len()
    }

    #[test]
    fn test_compound_and_child() {
        let dom = page();
        assert_eq!(count(&dom, "div#ad1 > img.banner"), 2);
        assert_eq!(count(&dom, "div#ad1 > img.banner:last-child"), 1);
        assert_eq!(count(&dom, "#ad1"), 1);
        assert_eq!(count(&dom, "body > div > img"), 2);
    }

    #[test]
    fn test_descendant() {
        let dom = page();
        assert_eq!(count(&dom, "html img"), 2);
        assert_eq!(count(&dom, "body li"), 3);
        assert_eq!(count(&dom, "html > img"), 0);
    }

    #[test]
    fn test_list_and_pseudo() {
        let dom = page();
        assert_eq!(count(&dom, ".banner, .promo"), 2);
        assert_eq!(count(&dom, "ul > li:nth-child(2)"), 1);
        assert_eq!(count(&dom, "li:first-child"), 1);
    }

    #[test]
    fn test_attribute_contains() {
        let dom = page();
        assert_eq!(count(&dom, r#"[src*="ads.example.net/x.gif"]"#), 1);
        assert_eq!(count(&dom, "[src]"), 1);
        assert_eq!(count(&dom, "[src^='http://ads']"), 1);
        assert_eq!(count(&dom, r#"[src$=".png"]"#), 0);
    }

    #[test]
    fn test_escaped_identifier() {
        let dom = page();
        assert_eq!(count(&dom, r"li.\31 st"), 1);
    }

    #[test]
    fn test_star() {
        let dom = page();
        assert_eq!(count(&dom, "ul > *"), 3);
    }

    #[test]
    fn test_unsupported() {
        let dom = page();
        for selector in ["", "div:hover", "div ~ p", "[src~=x]", "a >"] {
            assert!(
                matches!(
                    dom.query_selector_all(selector),
                    Err(PickError::UnsupportedSelector { .. })
                ),
                "{selector:?} should be rejected"
            );
        }
    }
}
