//! Normalized request view used by matchers.

use http::header::{self, HeaderMap};
use http::Request;
use tessera_core::Cookies;

/// The parts of a request route criteria can inspect.
///
/// # Example
///
/// ```
/// use tessera_matcher::RequestInfo;
///
/// let request = http::Request::builder()
///     .uri("https://shop.example.com/cart?coupon=SAVE10")
///     .header("cookie", "ct.client_id=abc")
///     .body(())
///     .unwrap();
///
/// let info = RequestInfo::from_request(&request);
/// assert_eq!(info.path(), "/cart");
/// assert_eq!(info.host(), Some("shop.example.com"));
/// assert_eq!(info.query("coupon"), Some("SAVE10"));
/// assert_eq!(info.cookie("ct.client_id"), Some("abc"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    path: String,
    host: Option<String>,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    cookies: Cookies,
}

impl RequestInfo {
    /// Builds the view from a request.
    #[must_use]
    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::from_parts(request.uri(), request.headers())
    }

    /// Builds the view from a URI and headers.
    ///
    /// The host is taken from the URI authority, falling back to the `Host`
    /// header; any port is dropped.
    #[must_use]
    pub fn from_parts(uri: &http::Uri, headers: &HeaderMap) -> Self {
        let host = uri
            .host()
            .map(str::to_string)
            .or_else(|| {
                headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .map(strip_port)
            })
            .filter(|host| !host.is_empty());

        let query = uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .unwrap_or_default();

        Self {
            path: uri.path().to_string(),
            host,
            headers: headers.clone(),
            query,
            cookies: Cookies::from_headers(headers),
        }
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the host name, without port.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the first value of a header, if it is valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the first value of a query parameter.
    #[must_use]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a cookie value.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name)
    }

    /// Returns the parsed cookies.
    #[must_use]
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }
}

fn strip_port(host: &str) -> String {
    // Bracketed IPv6 literals keep their colons.
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest).to_string();
    }

    host.split(':').next().unwrap_or(host).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_from_header() {
        let request = Request::builder()
            .uri("/path")
            .header("host", "example.com:8080")
            .body(())
            .unwrap();

        let info = RequestInfo::from_request(&request);
        assert_eq!(info.host(), Some("example.com"));
        assert_eq!(info.path(), "/path");
    }

    #[test]
    fn test_ipv6_host_header() {
        assert_eq!(strip_port("[::1]:3000"), "::1");
        assert_eq!(strip_port("localhost"), "localhost");
    }

    #[test]
    fn test_missing_host() {
        let request = Request::builder().uri("/").body(()).unwrap();
        assert_eq!(RequestInfo::from_request(&request).host(), None);
    }

    #[test]
    fn test_query_decoding_and_first_value() {
        let request = Request::builder()
            .uri("/search?q=hello%20world&tag=a&tag=b")
            .body(())
            .unwrap();

        let info = RequestInfo::from_request(&request);
        assert_eq!(info.query("q"), Some("hello world"));
        assert_eq!(info.query("tag"), Some("a"));
        assert_eq!(info.query("missing"), None);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = Request::builder()
            .uri("/")
            .header("X-Experiment", "on")
            .body(())
            .unwrap();

        let info = RequestInfo::from_request(&request);
        assert_eq!(info.header("x-experiment"), Some("on"));
    }
}
