//! Absolute request URL forwarded to downstream handlers.

use http::header::HOST;

use super::preview::PREVIEW_QUERY_PARAMETER;
use crate::Request;

/// Header set by proxies with the original request scheme.
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Returns the absolute URL of the request without the preview parameter.
///
/// The scheme comes from the URI, then `x-forwarded-proto`, else `http`; the
/// host from the URI, then the `Host` header. Without any host the URL is
/// left relative. Other query parameters keep their order and encoding.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http_body_util::Full;
/// use tessera_middleware::resolver::request_uri;
///
/// let request = http::Request::builder()
///     .uri("/shop?croct-preview=exit&page=2")
///     .header("host", "example.com")
///     .header("x-forwarded-proto", "https")
///     .body(Full::new(Bytes::new()))
///     .unwrap();
///
/// assert_eq!(request_uri(&request), "https://example.com/shop?page=2");
/// ```
#[must_use]
pub fn request_uri(request: &Request) -> String {
    let uri = request.uri();
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    };

    let path = uri.path();
    let query = uri.query().map(strip_preview_parameter).unwrap_or_default();
    let query = if query.is_empty() {
        String::new()
    } else {
        format!("?{query}")
    };

    let host = uri
        .authority()
        .map(|authority| authority.as_str())
        .or_else(|| header(HOST.as_str()));

    let Some(host) = host else {
        return format!("{path}{query}");
    };

    let scheme = uri
        .scheme_str()
        .or_else(|| {
            header(FORWARDED_PROTO_HEADER)
                .and_then(|value| value.split(',').next())
                .map(str::trim)
        })
        .filter(|scheme| !scheme.is_empty())
        .unwrap_or("http");

    format!("{scheme}://{host}{path}{query}")
}

fn strip_preview_parameter(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_preview_parameter(pair))
        .collect::<Vec<_>>()
        .join("&")
}

fn is_preview_parameter(pair: &str) -> bool {
    serde_urlencoded::from_str::<Vec<(String, String)>>(pair)
        .ok()
        .and_then(|pairs| pairs.into_iter().next())
        .is_some_and(|(key, _)| key == PREVIEW_QUERY_PARAMETER)
}
