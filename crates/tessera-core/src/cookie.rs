//! Cookie jar parsing and `Set-Cookie` building.
//!
//! # Example
//!
//! ```rust
//! use tessera_core::cookie::{Cookies, SameSite, SetCookie};
//! use http::{header, HeaderMap, HeaderValue};
//!
//! let mut headers = HeaderMap::new();
//! headers.insert(
//!     header::COOKIE,
//!     HeaderValue::from_static("ct.client_id=abc; theme=dark"),
//! );
//!
//! let cookies = Cookies::from_headers(&headers);
//! assert_eq!(cookies.get("ct.client_id"), Some("abc"));
//!
//! let cookie = SetCookie::new("ct.client_id", "abc")
//!     .path("/")
//!     .secure(true)
//!     .same_site(SameSite::None)
//!     .max_age_secs(31_536_000);
//!
//! assert_eq!(
//!     cookie.to_header_value(),
//!     "ct.client_id=abc; Path=/; Max-Age=31536000; Secure; SameSite=None"
//! );
//! ```

use http::header::{self, HeaderMap, HeaderValue, InvalidHeaderValue};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::fmt;

/// Bytes written verbatim in a cookie value; everything else is
/// percent-encoded, so a value can never end the pair or add attributes.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Cookies sent with a request.
///
/// When the same name appears more than once, the first occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    cookies: HashMap<String, String>,
}

impl Cookies {
    /// Create an empty cookie jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every `Cookie` header in the map.
    ///
    /// Header values that are not valid UTF-8 are skipped.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut jar = Self::new();

        for value in headers.get_all(header::COOKIE) {
            if let Ok(value) = value.to_str() {
                jar.extend_from(value);
            }
        }

        jar
    }

    /// Parse cookies from a single `Cookie` header value.
    #[must_use]
    pub fn parse(header_value: &str) -> Self {
        let mut jar = Self::new();
        jar.extend_from(header_value);
        jar
    }

    fn extend_from(&mut self, header_value: &str) {
        for pair in header_value.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                // Remove surrounding quotes if present
                let value = value.trim().trim_matches('"');
                let value = percent_decode_str(value)
                    .decode_utf8()
                    .map_or_else(|_| value.to_string(), |decoded| decoded.into_owned());
                self.cookies.entry(name.to_string()).or_insert(value);
            }
        }
    }

    /// Get a cookie value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Check if a cookie exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// Get an iterator over all cookies.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Get the number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Check if there are no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    /// Cookie is sent with cross-site requests.
    None,
    /// Cookie is sent with same-site and cross-site top-level navigations.
    #[default]
    Lax,
    /// Cookie is only sent with same-site requests.
    Strict,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Lax => write!(f, "Lax"),
            Self::Strict => write!(f, "Strict"),
        }
    }
}

/// Builder for a `Set-Cookie` response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    domain: Option<String>,
    path: Option<String>,
    max_age: Option<u64>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    /// Create a new Set-Cookie builder.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// Create a cookie that will be removed (empty value, `Max-Age=0`).
    #[must_use]
    pub fn remove(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age_secs(0)
    }

    /// Set the Domain attribute.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the Domain attribute when one is given.
    #[must_use]
    pub fn maybe_domain(self, domain: Option<&str>) -> Self {
        match domain {
            Some(domain) => self.domain(domain),
            None => self,
        }
    }

    /// Set the Path attribute.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the Max-Age attribute in seconds.
    #[must_use]
    pub fn max_age_secs(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Set the Secure attribute.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set the `HttpOnly` attribute.
    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Set the `SameSite` attribute.
    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Get the cookie name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the Max-Age attribute.
    #[must_use]
    pub fn max_age(&self) -> Option<u64> {
        self.max_age
    }

    /// Get the Domain attribute.
    #[must_use]
    pub fn get_domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Returns `true` if the `HttpOnly` attribute is set.
    #[must_use]
    pub fn is_http_only(&self) -> bool {
        self.http_only
    }

    /// Convert to a Set-Cookie header value.
    ///
    /// The value is percent-encoded; [`Cookies`] decodes it on the way back.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let value = utf8_percent_encode(&self.value, COOKIE_VALUE);
        let mut parts = vec![format!("{}={value}", self.name)];

        if let Some(ref domain) = self.domain {
            parts.push(format!("Domain={domain}"));
        }

        if let Some(ref path) = self.path {
            parts.push(format!("Path={path}"));
        }

        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={max_age}"));
        }

        if self.secure {
            parts.push("Secure".to_string());
        }

        if self.http_only {
            parts.push("HttpOnly".to_string());
        }

        if let Some(same_site) = self.same_site {
            parts.push(format!("SameSite={same_site}"));
        }

        parts.join("; ")
    }

    /// Append this cookie as a `Set-Cookie` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or domain contains bytes that are not
    /// allowed in a header value.
    pub fn append_to(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        let value = HeaderValue::from_str(&self.to_header_value())?;
        headers.append(header::SET_COOKIE, value);
        Ok(())
    }
}

/// Parses a `Set-Cookie` header value back into its name, value and attributes.
///
/// Attribute names are returned lowercased. Meant for inspecting responses.
#[must_use]
pub fn parse_set_cookie(value: &str) -> Option<(String, String, HashMap<String, String>)> {
    let mut parts = value.split(';');
    let (name, cookie_value) = parts.next()?.trim().split_once('=')?;

    let attributes = parts
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) => (key.to_ascii_lowercase(), value.to_string()),
            None => (part.to_ascii_lowercase(), String::new()),
        })
        .collect();

    Some((name.to_string(), cookie_value.to_string(), attributes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_cookie() {
        let cookies = Cookies::parse("session=abc123");
        assert_eq!(cookies.get("session"), Some("abc123"));
        assert_eq!(cookies.len(), 1);
    }

    #[test]
    fn test_parse_multiple_cookies() {
        let cookies = Cookies::parse("a=1; b=2;c=3");
        assert_eq!(cookies.get("a"), Some("1"));
        assert_eq!(cookies.get("b"), Some("2"));
        assert_eq!(cookies.get("c"), Some("3"));
    }

    #[test]
    fn test_parse_quoted_value_and_equals_in_value() {
        let cookies = Cookies::parse("name=\"quoted\"; token=a.b=.c");
        assert_eq!(cookies.get("name"), Some("quoted"));
        assert_eq!(cookies.get("token"), Some("a.b=.c"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("id=first; x=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("id=second"));

        let cookies = Cookies::from_headers(&headers);
        assert_eq!(cookies.get("id"), Some("first"));
        assert_eq!(cookies.get("x"), Some("1"));
    }

    #[test]
    fn test_empty_and_invalid_pairs_are_skipped() {
        let cookies = Cookies::parse("; novalue; =orphan; ok=1");
        assert_eq!(cookies.len(), 1);
        assert!(cookies.contains("ok"));
        assert!(Cookies::from_headers(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn test_set_cookie_all_attributes() {
        let cookie = SetCookie::new("ct.user_token", "t")
            .domain("example.com")
            .path("/")
            .max_age_secs(604_800)
            .secure(true)
            .http_only(true)
            .same_site(SameSite::None);

        assert_eq!(
            cookie.to_header_value(),
            "ct.user_token=t; Domain=example.com; Path=/; Max-Age=604800; Secure; HttpOnly; SameSite=None"
        );
    }

    #[test]
    fn test_remove_cookie() {
        let cookie = SetCookie::remove("ct.preview_token");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(0));
        assert_eq!(cookie.to_header_value(), "ct.preview_token=; Max-Age=0");
    }

    #[test]
    fn test_maybe_domain() {
        assert_eq!(SetCookie::new("a", "b").maybe_domain(None).get_domain(), None);
        assert_eq!(
            SetCookie::new("a", "b").maybe_domain(Some("x.io")).get_domain(),
            Some("x.io")
        );
    }

    #[test]
    fn test_append_to_headers() {
        let mut headers = HeaderMap::new();
        SetCookie::new("a", "1").append_to(&mut headers).unwrap();
        SetCookie::new("b", "2").append_to(&mut headers).unwrap();

        assert_eq!(headers.get_all(header::SET_COOKIE).iter().count(), 2);
        assert!(SetCookie::new("a", "1")
            .domain("bad\nhost")
            .append_to(&mut headers)
            .is_err());
    }

    #[test]
    fn test_value_cannot_inject_attributes() {
        let cookie = SetCookie::new("ct.preview_token", "x; Domain=evil.example\r\nSet-Cookie: a=b")
            .path("/");

        let rendered = cookie.to_header_value();
        assert_eq!(
            rendered,
            "ct.preview_token=x%3B%20Domain%3Devil.example%0D%0ASet-Cookie%3A%20a%3Db; Path=/"
        );

        let mut headers = HeaderMap::new();
        cookie.append_to(&mut headers).unwrap();

        let (_, _, attributes) = parse_set_cookie(&rendered).unwrap();
        assert!(!attributes.contains_key("domain"));
        assert_eq!(attributes.len(), 1);
    }

    #[test]
    fn test_token_values_are_not_encoded() {
        let cookie = SetCookie::new("ct.user_token", "eyJhbGciOiJub25lIn0.eyJleHAiOjF9.");
        assert_eq!(
            cookie.to_header_value(),
            "ct.user_token=eyJhbGciOiJub25lIn0.eyJleHAiOjF9."
        );
        assert_eq!(
            SetCookie::new("ct.client_id", "0e4ea1b1-6a3e-4c2a-9f1e-9b2d8f7c6a51").to_header_value(),
            "ct.client_id=0e4ea1b1-6a3e-4c2a-9f1e-9b2d8f7c6a51"
        );
    }

    #[test]
    fn test_encoded_values_are_decoded() {
        let rendered = SetCookie::new("note", "a b;c").to_header_value();
        let cookies = Cookies::parse(&rendered);
        assert_eq!(cookies.get("note"), Some("a b;c"));

        // Invalid UTF-8 after decoding keeps the raw value.
        assert_eq!(Cookies::parse("raw=%FF").get("raw"), Some("%FF"));
    }

    #[test]
    fn test_parse_set_cookie() {
        let (name, value, attributes) =
            parse_set_cookie("ct.client_id=abc; Path=/; Max-Age=10; Secure").unwrap();

        assert_eq!(name, "ct.client_id");
        assert_eq!(value, "abc");
        assert_eq!(attributes.get("max-age").map(String::as_str), Some("10"));
        assert!(attributes.contains_key("secure"));
        assert!(parse_set_cookie("garbage").is_none());
    }
}
