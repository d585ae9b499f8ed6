//! Identity cookies written on the outgoing response.

use http::header::SET_COOKIE;
use http::HeaderMap;
use tessera_core::{SameSite, SetCookie};

use crate::resolver::PreviewToken;
use crate::settings::CookieSpec;
use crate::{IdentityError, IdentitySettings, RequestContext};

/// Builds the cookies persisting a resolved context.
///
/// The client ID and user token are always (re)set, extending their expiry.
/// The preview cookie is set while preview mode is active, deleted when it
/// ends, and left alone when no preview token was supplied.
#[must_use]
pub fn identity_cookies(context: &RequestContext, settings: &IdentitySettings) -> Vec<SetCookie> {
    let mut cookies = vec![
        persistent(&settings.client_id_cookie, context.client_id.as_str()),
        persistent(&settings.user_token_cookie, &context.user_token.to_string()),
    ];

    let preview = &settings.preview_token_cookie;
    match &context.preview {
        PreviewToken::Active(token) => cookies.push(persistent(preview, token)),
        PreviewToken::Exit(_) => cookies.push(
            cross_site(SetCookie::remove(&preview.name), preview).http_only(true),
        ),
        PreviewToken::Absent => {}
    }

    cookies
}

/// Appends `cookies` as `Set-Cookie` headers.
///
/// # Errors
///
/// Returns `IdentityError::InvalidHeader` if a cookie does not render to a
/// valid header value.
pub fn emit(headers: &mut HeaderMap, cookies: &[SetCookie]) -> Result<(), IdentityError> {
    for cookie in cookies {
        cookie
            .append_to(headers)
            .map_err(|_| IdentityError::invalid_header(SET_COOKIE.as_str()))?;
    }
    Ok(())
}

fn persistent(spec: &CookieSpec, value: &str) -> SetCookie {
    let cookie = cross_site(SetCookie::new(&spec.name, value), spec);
    match spec.max_age_secs {
        Some(max_age) => cookie.max_age_secs(max_age),
        None => cookie,
    }
}

fn cross_site(cookie: SetCookie, spec: &CookieSpec) -> SetCookie {
    cookie
        .maybe_domain(spec.domain.as_deref())
        .path("/")
        .secure(true)
        .same_site(SameSite::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ExitReason;
    use tessera_core::cookie::parse_set_cookie;
    use tessera_core::fixtures::{anonymous_token, APP_ID, NOW};
    use tessera_core::{AppId, ClientId};

    fn settings() -> IdentitySettings {
        IdentitySettings::new(AppId::parse(APP_ID).unwrap())
    }

    fn context(preview: PreviewToken) -> RequestContext {
        RequestContext {
            client_id: ClientId::parse("12345678-1234-1234-1234-123456789abc").unwrap(),
            user_token: anonymous_token(NOW, 60),
            locale: String::new(),
            client_ip: None,
            preview,
            request_uri: "/".to_string(),
        }
    }

    #[test]
    fn test_client_id_and_user_token_cookies() {
        let context = context(PreviewToken::Absent);
        let cookies = identity_cookies(&context, &settings());

        assert_eq!(cookies.len(), 2);

        let header = cookies[0].to_header_value();
        assert_eq!(
            header,
            "ct.client_id=12345678-1234-1234-1234-123456789abc; Path=/; Max-Age=31536000; Secure; SameSite=None"
        );

        assert_eq!(cookies[1].name(), "ct.user_token");
        assert_eq!(cookies[1].value(), context.user_token.to_string());
        assert_eq!(cookies[1].max_age(), Some(604_800));
    }

    #[test]
    fn test_active_preview_is_a_session_cookie() {
        let cookies = identity_cookies(
            &context(PreviewToken::Active("a.b.c".to_string())),
            &settings(),
        );

        let preview = &cookies[2];
        assert_eq!(preview.name(), "ct.preview_token");
        assert_eq!(preview.value(), "a.b.c");
        assert_eq!(preview.max_age(), None);
        assert!(!preview.is_http_only());
    }

    #[test]
    fn test_exit_deletes_preview_cookie() {
        for reason in [ExitReason::Requested, ExitReason::Expired, ExitReason::Malformed] {
            let cookies = identity_cookies(&context(PreviewToken::Exit(reason)), &settings());
            let (name, value, attributes) = parse_set_cookie(&cookies[2].to_header_value()).unwrap();

            assert_eq!(name, "ct.preview_token");
            assert_eq!(value, "");
            assert_eq!(attributes.get("max-age").map(String::as_str), Some("0"));
            assert!(attributes.contains_key("httponly"));
        }
    }

    #[test]
    fn test_domain_is_applied() {
        let mut settings = settings();
        settings.client_id_cookie.domain = Some("example.com".to_string());

        let cookies = identity_cookies(&context(PreviewToken::Absent), &settings);
        assert_eq!(cookies[0].get_domain(), Some("example.com"));
        assert_eq!(cookies[1].get_domain(), None);
    }

    #[test]
    fn test_emit_appends_set_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, "session=1".parse().unwrap());

        let cookies = identity_cookies(&context(PreviewToken::Absent), &settings());
        emit(&mut headers, &cookies).unwrap();

        assert_eq!(headers.get_all(SET_COOKIE).iter().count(), 3);
    }
}
