//! Identity request headers.

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;

use crate::{IdentityError, RequestContext};

/// Client ID forwarded to downstream handlers.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// User token forwarded to downstream handlers.
pub const USER_TOKEN_HEADER: &str = "x-user-token";

/// Absolute request URL without the preview parameter.
pub const REQUEST_URI_HEADER: &str = "x-request-uri";

/// Preferred locale, when one was resolved.
pub const PREFERRED_LOCALE_HEADER: &str = "x-preferred-locale";

/// Client IP, when it could be determined.
pub const CLIENT_IP_HEADER: &str = "x-client-ip";

/// Preview token, when preview mode is active.
pub const PREVIEW_TOKEN_HEADER: &str = "x-preview-token";

/// Every header the middleware owns.
pub const IDENTITY_HEADERS: [&str; 6] = [
    CLIENT_ID_HEADER,
    USER_TOKEN_HEADER,
    REQUEST_URI_HEADER,
    PREFERRED_LOCALE_HEADER,
    CLIENT_IP_HEADER,
    PREVIEW_TOKEN_HEADER,
];

/// Renders the identity headers of a resolved context.
///
/// The locale, client IP and preview token headers are only present when
/// the context has a value for them.
///
/// # Errors
///
/// Returns `IdentityError::InvalidHeader` if a value cannot be carried in a
/// header, such as a locale with control characters.
pub fn identity_headers(context: &RequestContext) -> Result<HeaderMap, IdentityError> {
    let mut headers = HeaderMap::with_capacity(IDENTITY_HEADERS.len());

    put(&mut headers, CLIENT_ID_HEADER, context.client_id.as_str())?;
    put(&mut headers, USER_TOKEN_HEADER, &context.user_token.to_string())?;
    put(&mut headers, REQUEST_URI_HEADER, &context.request_uri)?;

    if !context.locale.is_empty() {
        put(&mut headers, PREFERRED_LOCALE_HEADER, &context.locale)?;
    }

    if let Some(ip) = &context.client_ip {
        put(&mut headers, CLIENT_IP_HEADER, ip)?;
    }

    if context.preview.is_active() {
        put(&mut headers, PREVIEW_TOKEN_HEADER, context.preview.value())?;
    }

    Ok(headers)
}

/// Writes `injected` over `headers`.
///
/// Identity headers the client sent are dropped first, so a header the
/// middleware leaves out cannot be supplied from outside.
pub fn inject(headers: &mut HeaderMap, injected: &HeaderMap) {
    for name in IDENTITY_HEADERS {
        headers.remove(name);
    }

    for (name, value) in injected {
        headers.insert(name.clone(), value.clone());
    }
}

fn put(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), IdentityError> {
    let value = HeaderValue::from_str(value).map_err(|_| IdentityError::invalid_header(name))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::PreviewToken;
    use tessera_core::fixtures::{anonymous_token, NOW};
    use tessera_core::ClientId;

    fn context() -> RequestContext {
        RequestContext {
            client_id: ClientId::parse("12345678-1234-1234-1234-123456789abc").unwrap(),
            user_token: anonymous_token(NOW, 60),
            locale: String::new(),
            client_ip: None,
            preview: PreviewToken::Absent,
            request_uri: "https://example.com/".to_string(),
        }
    }

    #[test]
    fn test_required_headers_only() {
        let context = context();
        let headers = identity_headers(&context).unwrap();

        assert_eq!(headers.len(), 3);
        assert_eq!(headers[CLIENT_ID_HEADER], "12345678-1234-1234-1234-123456789abc");
        assert_eq!(
            headers[USER_TOKEN_HEADER],
            context.user_token.to_string().as_str()
        );
        assert_eq!(headers[REQUEST_URI_HEADER], "https://example.com/");
    }

    #[test]
    fn test_conditional_headers() {
        let context = RequestContext {
            locale: "pt-br".to_string(),
            client_ip: Some("203.0.113.7".to_string()),
            preview: PreviewToken::Active("preview.token.sig".to_string()),
            ..context()
        };

        let headers = identity_headers(&context).unwrap();

        assert_eq!(headers.len(), 6);
        assert_eq!(headers[PREFERRED_LOCALE_HEADER], "pt-br");
        assert_eq!(headers[CLIENT_IP_HEADER], "203.0.113.7");
        assert_eq!(headers[PREVIEW_TOKEN_HEADER], "preview.token.sig");
    }

    #[test]
    fn test_invalid_locale_is_rejected() {
        let context = RequestContext {
            locale: "en\nus".to_string(),
            ..context()
        };

        let error = identity_headers(&context).unwrap_err();
        assert!(error.to_string().contains(PREFERRED_LOCALE_HEADER));
    }

    #[test]
    fn test_inject_replaces_and_removes_stale_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_ID_HEADER, HeaderValue::from_static("spoofed"));
        headers.append(CLIENT_ID_HEADER, HeaderValue::from_static("spoofed-again"));
        headers.insert(PREVIEW_TOKEN_HEADER, HeaderValue::from_static("forged"));
        headers.insert("accept", HeaderValue::from_static("text/html"));

        inject(&mut headers, &identity_headers(&context()).unwrap());

        assert_eq!(headers.get_all(CLIENT_ID_HEADER).iter().count(), 1);
        assert_eq!(headers[CLIENT_ID_HEADER], "12345678-1234-1234-1234-123456789abc");
        assert!(!headers.contains_key(PREVIEW_TOKEN_HEADER));
        assert_eq!(headers["accept"], "text/html");
    }
}
