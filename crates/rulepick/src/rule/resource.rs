//! Resource URLs, network patterns and domain cropping.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Generic URI split (RFC 3986, appendix B); group 4 is the authority
fn uri_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(([^:/?#]+):)?(//(([^:/?#]*)(?::([^/?#]*))?))?([^?#]*)(\?([^#]*))?(#(.*))?$")
            .expect("URI pattern is valid")
    })
}

fn port_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":\d+").expect("port pattern is valid"))
}

fn plain_http_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^http://(www\.)?").expect("http prefix pattern is valid"))
}

/// Host of `url` without a leading `www.` or a `:port` suffix
///
/// ```rust
/// use rulepick::rule::crop_domain;
///
/// assert_eq!(crop_domain("http://www.example.com:8080/ad.js"), "example.com");
/// ```
#[must_use]
pub fn crop_domain(url: &str) -> String {
    let host = uri_pattern()
        .captures(url)
        .and_then(|caps| caps.get(4))
        .map_or("", |m| m.as_str());
    let host = host.strip_prefix("www.").unwrap_or(host);
    port_pattern().replace(host, "").into_owned()
}

/// Resolve `value` against the page `base` the way a link element would
pub(crate) fn resolve(value: &str, base: &str) -> Option<Url> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match Url::parse(base) {
        Ok(base) => base.join(value).ok(),
        Err(_) => Url::parse(value).ok(),
    }
}

/// Whether `value` names a resource on some host
#[must_use]
pub fn is_resource_url(value: &str, base: &str) -> bool {
    resolve(value, base).is_some_and(|url| url.host_str().is_some_and(|h| !h.is_empty()))
}

/// Host name of the resource `value` points at, for placeholder labels
#[must_use]
pub fn resource_host(value: &str, base: &str) -> Option<String> {
    resolve(value, base)
        .and_then(|url| url.host_str().map(str::to_string))
        .filter(|h| !h.is_empty())
}

/// Network pattern for a resource URL: a plain `http://` (or `http://www.`)
/// prefix becomes the `||` anchor and a stray leading dot is trimmed
#[must_use]
pub fn url_pattern(resource: &str) -> String {
    let anchored = plain_http_prefix().replace(resource, "||");
    anchored
        .strip_prefix('.')
        .unwrap_or(&anchored[..])
        .to_string()
}

/// Whether a bare fragment such as `ads.example.net/x.gif` reads as a URL
pub(crate) fn is_url_fragment(fragment: &str) -> bool {
    let has_host = |url: Url| url.host_str().is_some_and(|h| !h.is_empty());
    if fragment.trim().is_empty() || fragment.chars().any(char::is_whitespace) {
        return false;
    }
    Url::parse(fragment).map_or(false, has_host)
        || Url::parse(&format!("http://{fragment}")).map_or(false, has_host)
}
