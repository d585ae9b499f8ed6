//! Resolved identity of a request.

use http::HeaderMap;
use tessera_core::{ClientId, Token};

use crate::headers::{
    CLIENT_ID_HEADER, CLIENT_IP_HEADER, PREFERRED_LOCALE_HEADER, PREVIEW_TOKEN_HEADER,
    REQUEST_URI_HEADER, USER_TOKEN_HEADER,
};
use crate::resolver::PreviewToken;

/// The identity values resolved for one request.
///
/// The middleware computes it once, stores it in the forwarded request's
/// extensions and renders it into the identity headers:
///
/// ```rust,ignore
/// async fn origin(request: Request) -> Response {
///     let context = request.extensions().get::<RequestContext>();
///     // ...
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Client ID, persisted in the client ID cookie.
    pub client_id: ClientId,
    /// User token, persisted in the user token cookie.
    pub user_token: Token,
    /// Preferred locale; empty when none was resolved.
    pub locale: String,
    /// Client IP, when it could be determined.
    pub client_ip: Option<String>,
    /// Preview token.
    pub preview: PreviewToken,
    /// Absolute request URL without the preview parameter.
    pub request_uri: String,
}

impl RequestContext {
    /// Reads a context back from identity headers.
    ///
    /// For services behind the middleware that only see the forwarded
    /// headers. Returns `None` unless the client ID, user token and request
    /// URI headers are present and well-formed. A forwarded preview token is
    /// always active, since inactive ones are never forwarded.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

        Some(Self {
            client_id: ClientId::parse(header(CLIENT_ID_HEADER)?)?,
            user_token: Token::parse(header(USER_TOKEN_HEADER)?).ok()?,
            locale: header(PREFERRED_LOCALE_HEADER)
                .unwrap_or_default()
                .to_string(),
            client_ip: header(CLIENT_IP_HEADER).map(str::to_string),
            preview: header(PREVIEW_TOKEN_HEADER)
                .map_or(PreviewToken::Absent, |token| {
                    PreviewToken::Active(token.to_string())
                }),
            request_uri: header(REQUEST_URI_HEADER)?.to_string(),
        })
    }
}
