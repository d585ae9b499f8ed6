//! The identity middleware.
//!
//! For every request that is not a static asset, the middleware:
//!
//! 1. Resolves the user token and locale concurrently, then the client ID,
//!    preview token, client IP and request URL
//! 2. Writes the identity headers onto the request and stores the
//!    [`RequestContext`] in its extensions
//! 3. Calls the handler if one is configured and the route matcher accepts
//!    the request
//! 4. Re-applies the identity headers over the handler's continue outcome
//! 5. Writes the identity cookies
//!
//! Static assets and framework internals skip steps 1, 2, 4 and 5.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use tessera_config::TesseraConfig;
use tessera_matcher::{Criterion, RequestInfo, RouteMatcher};
use tessera_telemetry::metrics::{
    record_client_id_assigned, record_preview_token, record_request_excluded,
};
use tracing::{debug, error, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::cookies::{emit, identity_cookies};
use crate::exclusion::is_excluded;
use crate::handler::{Handler, LocaleResolver, UserIdResolver};
use crate::headers::{identity_headers, inject};
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::outcome::{augment, Continue, Outcome};
use crate::resolver::preview::PREVIEW_QUERY_PARAMETER;
use crate::resolver::{
    request_uri, resolve_client_id, resolve_client_ip, resolve_locale, resolve_preview_token,
    resolve_user_token, PreviewToken,
};
use crate::types::{clone_request, ResponseExt};
use crate::{IdentityError, IdentitySettings, Request, RequestContext, Response};

/// Optional collaborators of the middleware.
///
/// # Example
///
/// ```rust,ignore
/// let options = IdentityOptions::default()
///     .handler(handler_fn(|request| async move { Ok(None) }))
///     .matcher(vec![Criterion::source("/shop/:path*")])
///     .user_id_resolver(user_id_resolver_fn(|request| async { Ok(SubjectReport::Anonymous) }));
/// ```
#[derive(Clone, Default)]
pub struct IdentityOptions {
    /// Handler called with the augmented request.
    pub handler: Option<Arc<dyn Handler>>,
    /// Routes the handler runs on; empty means every route.
    pub matcher: Vec<Criterion>,
    /// Reports the subject of each request.
    pub user_id_resolver: Option<Arc<dyn UserIdResolver>>,
    /// Chooses the locale of each request.
    pub locale_resolver: Option<Arc<dyn LocaleResolver>>,
}

impl IdentityOptions {
    /// Sets the handler.
    #[must_use]
    pub fn handler(mut self, handler: impl Handler) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Sets the route criteria gating the handler.
    #[must_use]
    pub fn matcher(mut self, criteria: Vec<Criterion>) -> Self {
        self.matcher = criteria;
        self
    }

    /// Sets the user-id resolver.
    #[must_use]
    pub fn user_id_resolver(mut self, resolver: impl UserIdResolver) -> Self {
        self.user_id_resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the locale resolver.
    #[must_use]
    pub fn locale_resolver(mut self, resolver: impl LocaleResolver) -> Self {
        self.locale_resolver = Some(Arc::new(resolver));
        self
    }
}

impl fmt::Debug for IdentityOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityOptions")
            .field("handler", &self.handler.is_some())
            .field("matcher", &self.matcher)
            .field("user_id_resolver", &self.user_id_resolver.is_some())
            .field("locale_resolver", &self.locale_resolver.is_some())
            .finish()
    }
}

/// Resolves and propagates visitor identity.
///
/// Cheap to clone; clones share settings, matcher and collaborators.
#[derive(Clone)]
pub struct IdentityMiddleware {
    settings: Arc<IdentitySettings>,
    matcher: Arc<RouteMatcher>,
    handler: Option<Arc<dyn Handler>>,
    user_id_resolver: Option<Arc<dyn UserIdResolver>>,
    locale_resolver: Option<Arc<dyn LocaleResolver>>,
    clock: Arc<dyn Clock>,
}

impl IdentityMiddleware {
    /// Creates a middleware that only injects identity.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if the settings are invalid.
    pub fn new(settings: IdentitySettings) -> Result<Self, IdentityError> {
        Self::with_options(settings, IdentityOptions::default())
    }

    /// Creates a middleware calling `handler` on every route.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if the settings are invalid.
    pub fn with_handler(
        settings: IdentitySettings,
        handler: impl Handler,
    ) -> Result<Self, IdentityError> {
        Self::with_options(settings, IdentityOptions::default().handler(handler))
    }

    /// Creates a middleware from settings and options.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MissingSigningKey` or `IdentityError::Config`
    /// for invalid settings, and `IdentityError::Matcher` naming the first
    /// criterion that fails to compile.
    pub fn with_options(
        settings: IdentitySettings,
        options: IdentityOptions,
    ) -> Result<Self, IdentityError> {
        settings.validate()?;

        let matcher = RouteMatcher::compile(&options.matcher, &settings.locales)?;

        debug!(
            criteria = matcher.len(),
            handler = options.handler.is_some(),
            enforce_signature = settings.enforce_signature,
            "Identity middleware configured"
        );

        Ok(Self {
            settings: Arc::new(settings),
            matcher: Arc::new(matcher),
            handler: options.handler,
            user_id_resolver: options.user_id_resolver,
            locale_resolver: options.locale_resolver,
            clock: Arc::new(SystemClock),
        })
    }

    /// Creates a middleware from a configuration.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Config` if the configuration is invalid, and
    /// the errors of [`IdentityMiddleware::with_options`].
    pub fn from_config(
        config: &TesseraConfig,
        options: IdentityOptions,
    ) -> Result<Self, IdentityError> {
        Self::with_options(IdentitySettings::from_config(config)?, options)
    }

    /// Replaces the clock used for token validity.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &IdentitySettings {
        &self.settings
    }

    /// Handles a request, returning what should happen next.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if a resolver or the handler fails, or if a
    /// token cannot be issued.
    pub async fn handle(&self, request: Request) -> Result<Outcome, IdentityError> {
        self.dispatch(request).await.map(|(outcome, _)| outcome)
    }

    /// Resolves the identity of a request without side effects on it.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if a resolver fails or a token cannot be
    /// issued.
    pub async fn resolve(&self, request: &Request) -> Result<RequestContext, IdentityError> {
        let settings = &*self.settings;
        let now = self.clock.now();

        let (user_token, locale) = tokio::try_join!(
            resolve_user_token(request, self.user_id_resolver.as_deref(), now, settings),
            resolve_locale(request, self.locale_resolver.as_deref(), settings),
        )?;

        let info = RequestInfo::from_request(request);

        let client_id_cookie = info.cookie(&settings.client_id_cookie.name);
        let client_id = resolve_client_id(client_id_cookie);
        if client_id_cookie != Some(client_id.as_str()) {
            debug!("Assigned new client ID");
            record_client_id_assigned();
        }

        let preview = resolve_preview_token(
            info.query(PREVIEW_QUERY_PARAMETER),
            info.cookie(&settings.preview_token_cookie.name),
            now,
        );
        match &preview {
            PreviewToken::Active(_) => record_preview_token(preview.state().as_str()),
            PreviewToken::Exit(reason) => {
                debug!(reason = reason.as_str(), "Preview mode ended");
                record_preview_token(preview.state().as_str());
            }
            PreviewToken::Absent => {}
        }

        Ok(RequestContext {
            client_id,
            user_token,
            locale,
            client_ip: resolve_client_ip(request),
            preview,
            request_uri: request_uri(request),
        })
    }

    /// Runs a request through the middleware.
    ///
    /// Returns the outcome and the request as it reaches the origin on a
    /// plain continue.
    async fn dispatch(&self, mut request: Request) -> Result<(Outcome, Request), IdentityError> {
        let info = RequestInfo::from_request(&request);

        if is_excluded(info.path()) {
            trace!(path = info.path(), "Skipping identity resolution");
            record_request_excluded();
            return self.invoke(request, &info).await;
        }

        let context = self.resolve(&request).await?;
        let injected = identity_headers(&context)?;
        let cookies = identity_cookies(&context, &self.settings);

        debug!(
            path = info.path(),
            locale = %context.locale,
            preview = context.preview.state().as_str(),
            "Resolved request identity"
        );

        inject(request.headers_mut(), &injected);
        request.extensions_mut().insert(context);

        let (outcome, forwarded) = self.invoke(request, &info).await?;
        let mut outcome = augment(outcome, &injected);
        emit(outcome.response_headers_mut(), &cookies)?;

        Ok((outcome, forwarded))
    }

    /// Calls the handler when configured and the route matches.
    async fn invoke(
        &self,
        request: Request,
        info: &RequestInfo,
    ) -> Result<(Outcome, Request), IdentityError> {
        let handler = match &self.handler {
            Some(handler) if self.matcher.matches(info) => handler,
            _ => return Ok((Outcome::next(), request)),
        };

        let forwarded = clone_request(&request);
        let outcome = handler.handle(request).await.map_err(|error| {
            warn!(error = %error, path = info.path(), "Handler failed");
            IdentityError::Handler(error)
        })?;

        Ok((outcome.unwrap_or_else(Outcome::next), forwarded))
    }
}

impl fmt::Debug for IdentityMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityMiddleware")
            .field("settings", &self.settings)
            .field("criteria", &self.matcher.len())
            .field("handler", &self.handler.is_some())
            .field("user_id_resolver", &self.user_id_resolver.is_some())
            .field("locale_resolver", &self.locale_resolver.is_some())
            .field("clock", &self.clock)
            .finish()
    }
}

impl Middleware for IdentityMiddleware {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.dispatch(request).await {
                Ok((Outcome::Respond(response), _)) => response,
                Ok((Outcome::Continue(outcome), mut forwarded)) => {
                    let Continue {
                        request_headers,
                        response_headers,
                    } = outcome;

                    if let Some(headers) = request_headers {
                        *forwarded.headers_mut() = headers;
                    }

                    let mut response = next.run(forwarded).await;
                    for (name, value) in &response_headers {
                        response.headers_mut().append(name.clone(), value.clone());
                    }
                    response
                }
                Err(err) => {
                    if err.is_configuration_error() {
                        error!(error = %err, "Identity middleware is misconfigured");
                    } else {
                        warn!(error = %err, "Identity resolution failed");
                    }

                    Response::json_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        err.code(),
                        "Identity resolution failed",
                    )
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrozenClock;
    use crate::handler::handler_fn;
    use crate::headers::{CLIENT_ID_HEADER, USER_TOKEN_HEADER};
    use bytes::Bytes;
    use http::header::SET_COOKIE;
    use http_body_util::Full;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tessera_core::fixtures::{APP_ID, NOW};
    use tessera_core::AppId;
    use tessera_matcher::MatcherError;

    fn settings() -> IdentitySettings {
        IdentitySettings::new(AppId::parse(APP_ID).unwrap())
    }

    fn request(uri: &str) -> Request {
        http::Request::builder()
            .uri(uri)
            .header("host", "example.com")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_pure_injection_continues_with_cookies() {
        let middleware = IdentityMiddleware::new(settings())
            .unwrap()
            .with_clock(FrozenClock(NOW));

        let outcome = middleware.handle(request("/")).await.unwrap();

        assert!(outcome.is_continue());
        assert!(outcome.request_headers().is_none());
        assert_eq!(
            outcome.response_headers().get_all(SET_COOKIE).iter().count(),
            2
        );
    }

    #[tokio::test]
    async fn test_handler_sees_identity() {
        let handler = handler_fn(|request: Request| async move {
            assert!(request.headers().contains_key(CLIENT_ID_HEADER));
            assert!(request.headers().contains_key(USER_TOKEN_HEADER));
            assert!(request.extensions().get::<RequestContext>().is_some());
            Ok(None)
        });

        let middleware = IdentityMiddleware::with_handler(settings(), handler).unwrap();
        assert!(middleware.handle(request("/")).await.unwrap().is_continue());
    }

    #[tokio::test]
    async fn test_excluded_path_is_untouched() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = handler_fn(move |request: Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            let untouched = !request.headers().contains_key(CLIENT_ID_HEADER);
            async move {
                assert!(untouched);
                Ok(None)
            }
        });

        let middleware = IdentityMiddleware::with_handler(settings(), handler).unwrap();
        let outcome = middleware
            .handle(request("/_next/static/chunks/app.js"))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(outcome.response_headers().is_empty());
    }

    #[tokio::test]
    async fn test_handler_errors_propagate() {
        let handler = handler_fn(|_: Request| async { Err("origin unavailable".into()) });
        let middleware = IdentityMiddleware::with_handler(settings(), handler).unwrap();

        let error = middleware.handle(request("/")).await.unwrap_err();
        assert!(matches!(error, IdentityError::Handler(_)));
        assert!(!error.is_configuration_error());
    }

    #[test]
    fn test_invalid_matcher_fails_construction() {
        let options = IdentityOptions::default().matcher(vec![Criterion::source("/broken/(")]);

        let error = IdentityMiddleware::with_options(settings(), options).unwrap_err();
        match error {
            IdentityError::Matcher(MatcherError::InvalidSource { ref pattern, .. }) => {
                assert_eq!(pattern, "/broken/(");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(error.is_configuration_error());
    }

    #[test]
    fn test_missing_signing_key_fails_construction() {
        let error =
            IdentityMiddleware::new(settings().with_signature_enforcement(true)).unwrap_err();
        assert!(matches!(error, IdentityError::MissingSigningKey));
    }

    #[test]
    fn test_middleware_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<IdentityMiddleware>();
    }
}
