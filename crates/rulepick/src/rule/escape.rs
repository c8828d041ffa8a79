//! CSS identifier escaping (CSSOM `CSS.escape`).

use std::fmt::Write;

/// Escape `value` for use as a CSS identifier
///
/// ```rust
/// use rulepick::rule::css_escape;
///
/// assert_eq!(css_escape("1st"), "\\31 st");
/// assert_eq!(css_escape("a.b"), "a\\.b");
/// ```
#[must_use]
pub fn css_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let first = value.chars().next();
    let single = value.chars().nth(1).is_none();
    for (index, c) in value.chars().enumerate() {
        let code = c as u32;
        if c == '\0' {
            out.push(char::REPLACEMENT_CHARACTER);
        } else if (0x01..=0x1F).contains(&code)
            || code == 0x7F
            || (index == 0 && c.is_ascii_digit())
            || (index == 1 && c.is_ascii_digit() && first == Some('-'))
        {
            let _ = write!(out, "\\{code:x} ");
        } else if index == 0 && single && c == '-' {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifiers_unchanged() {
        assert_eq!(css_escape("banner"), "banner");
        assert_eq!(css_escape("x-1_b"), "x-1_b");
        assert_eq!(css_escape("реклама"), "реклама");
    }

    #[test]
    fn test_leading_digit() {
        assert_eq!(css_escape("1st"), "\\31 st");
        assert_eq!(css_escape("-2x"), "-\\32 x");
        assert_eq!(css_escape("a1"), "a1");
    }

    #[test]
    fn test_lone_dash() {
        assert_eq!(css_escape("-"), "\\-");
        assert_eq!(css_escape("--"), "--");
    }

    #[test]
    fn test_control_and_null() {
        assert_eq!(css_escape("a\u{0}b"), "a\u{FFFD}b");
        assert_eq!(css_escape("a\u{7f}"), "a\\7f ");
        assert_eq!(css_escape("\t"), "\\9 ");
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(css_escape("a:b"), "a\\:b");
        assert_eq!(css_escape("w-1/2"), "w-1\\/2");
        assert_eq!(css_escape("a b"), "a\\ b");
    }

    #[test]
    fn test_empty() {
        assert_eq!(css_escape(""), "");
    }
}
