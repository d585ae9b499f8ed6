//! Handler outcomes and header durability.

use http::HeaderMap;

use crate::headers::inject;
use crate::Response;

/// Continue to the origin, optionally replacing the request headers.
#[derive(Debug, Clone, Default)]
pub struct Continue {
    /// Headers replacing those of the forwarded request.
    ///
    /// `None` forwards the request as the handler received it.
    pub request_headers: Option<HeaderMap>,

    /// Headers appended to the origin's response.
    pub response_headers: HeaderMap,
}

impl Continue {
    /// Continues with the request unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues with the given request headers.
    #[must_use]
    pub fn with_request_headers(mut self, headers: HeaderMap) -> Self {
        self.request_headers = Some(headers);
        self
    }
}

/// What happens to a request after the handler ran.
#[derive(Debug)]
pub enum Outcome {
    /// Forward the request to the origin.
    Continue(Continue),
    /// Answer the request directly.
    Respond(Response),
}

impl Outcome {
    /// Continues with the request unchanged.
    #[must_use]
    pub fn next() -> Self {
        Self::Continue(Continue::new())
    }

    /// Continues with the given request headers.
    #[must_use]
    pub fn next_with_headers(headers: HeaderMap) -> Self {
        Self::Continue(Continue::new().with_request_headers(headers))
    }

    /// Answers the request with `response`.
    #[must_use]
    pub fn respond(response: Response) -> Self {
        Self::Respond(response)
    }

    /// Returns `true` for continue outcomes.
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// Returns the headers that reach the client.
    ///
    /// For continue outcomes these are appended to the origin response.
    pub fn response_headers(&self) -> &HeaderMap {
        match self {
            Self::Continue(next) => &next.response_headers,
            Self::Respond(response) => response.headers(),
        }
    }

    /// Returns the headers that reach the client, mutably.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        match self {
            Self::Continue(next) => &mut next.response_headers,
            Self::Respond(response) => response.headers_mut(),
        }
    }

    /// Returns the explicit request headers of a continue outcome.
    #[must_use]
    pub fn request_headers(&self) -> Option<&HeaderMap> {
        match self {
            Self::Continue(next) => next.request_headers.as_ref(),
            Self::Respond(_) => None,
        }
    }
}

/// Re-applies the identity headers on top of a handler's outcome.
///
/// A continue outcome carrying its own request headers gets `injected`
/// written over them, so identity headers always win. Other outcomes are
/// returned unchanged: a plain continue forwards the already augmented
/// request, and a direct response never reaches the origin.
///
/// # Example
///
/// ```
/// use http::HeaderMap;
/// use tessera_middleware::{augment, Outcome};
///
/// let mut handler_headers = HeaderMap::new();
/// handler_headers.insert("x-client-id", "spoofed".parse().unwrap());
///
/// let mut injected = HeaderMap::new();
/// injected.insert("x-client-id", "12345678-1234-1234-1234-123456789abc".parse().unwrap());
///
/// let outcome = augment(Outcome::next_with_headers(handler_headers), &injected);
/// assert_eq!(
///     outcome.request_headers().unwrap()["x-client-id"],
///     "12345678-1234-1234-1234-123456789abc"
/// );
/// ```
#[must_use]
pub fn augment(outcome: Outcome, injected: &HeaderMap) -> Outcome {
    match outcome {
        Outcome::Continue(Continue {
            request_headers: Some(mut headers),
            response_headers,
        }) => {
            inject(&mut headers, injected);
            Outcome::Continue(Continue {
                request_headers: Some(headers),
                response_headers,
            })
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{CLIENT_ID_HEADER, PREFERRED_LOCALE_HEADER, USER_TOKEN_HEADER};
    use bytes::Bytes;
    use http::HeaderValue;
    use http_body_util::Full;

    fn injected() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_ID_HEADER, HeaderValue::from_static("cid"));
        headers.insert(USER_TOKEN_HEADER, HeaderValue::from_static("token"));
        headers
    }

    #[test]
    fn test_injected_headers_win() {
        let mut handler_headers = HeaderMap::new();
        handler_headers.insert(CLIENT_ID_HEADER, HeaderValue::from_static("spoofed"));
        handler_headers.insert(PREFERRED_LOCALE_HEADER, HeaderValue::from_static("xx"));
        handler_headers.insert("x-custom", HeaderValue::from_static("kept"));

        let outcome = augment(Outcome::next_with_headers(handler_headers), &injected());
        let headers = outcome.request_headers().unwrap();

        assert_eq!(headers[CLIENT_ID_HEADER], "cid");
        assert_eq!(headers[USER_TOKEN_HEADER], "token");
        assert_eq!(headers["x-custom"], "kept");
        assert!(!headers.contains_key(PREFERRED_LOCALE_HEADER));
    }

    #[test]
    fn test_plain_continue_is_unchanged() {
        let outcome = augment(Outcome::next(), &injected());
        assert!(outcome.is_continue());
        assert!(outcome.request_headers().is_none());
    }

    #[test]
    fn test_response_is_unchanged() {
        let response = http::Response::builder()
            .status(302)
            .header("location", "/login")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let outcome = augment(Outcome::respond(response), &injected());

        let Outcome::Respond(response) = outcome else {
            panic!("expected a response");
        };
        assert_eq!(response.status(), 302);
        assert!(!response.headers().contains_key(CLIENT_ID_HEADER));
    }

    #[test]
    fn test_response_headers_mut() {
        let mut outcome = Outcome::next();
        outcome
            .response_headers_mut()
            .append("set-cookie", HeaderValue::from_static("a=1"));

        assert_eq!(outcome.response_headers()["set-cookie"], "a=1");
    }
}
