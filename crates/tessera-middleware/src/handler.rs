//! Extension points: the downstream handler and the identity resolvers.
//!
//! Each trait has a function adapter so closures can be plugged in directly:
//!
//! ```rust
//! use tessera_core::SubjectReport;
//! use tessera_middleware::handler::{handler_fn, user_id_resolver_fn};
//! use tessera_middleware::{Outcome, Request};
//!
//! let handler = handler_fn(|_request: Request| async { Ok(Some(Outcome::next())) });
//!
//! let resolver = user_id_resolver_fn(|request: &Request| {
//!     let user = request
//!         .headers()
//!         .get("x-session-user")
//!         .and_then(|value| value.to_str().ok())
//!         .map(str::to_string);
//!     async move { Ok(SubjectReport::from_user_id(user)) }
//! });
//! ```

use std::future::Future;

use tessera_core::SubjectReport;

use crate::middleware::BoxFuture;
use crate::{BoxError, Outcome, Request};

/// The handler invoked with the identity-augmented request.
///
/// Returning `Ok(None)` continues to the origin with the augmented request.
pub trait Handler: Send + Sync + 'static {
    /// Handles the request.
    fn handle(&self, request: Request) -> BoxFuture<'_, Result<Option<Outcome>, BoxError>>;
}

/// Reports who the caller of a request is.
pub trait UserIdResolver: Send + Sync + 'static {
    /// Resolves the subject of the request.
    fn resolve<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<SubjectReport, BoxError>>;
}

/// Chooses the locale of a request.
///
/// `None` or an empty string defers to locale detection.
pub trait LocaleResolver: Send + Sync + 'static {
    /// Resolves the locale of the request.
    fn resolve<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Option<String>, BoxError>>;
}

/// A [`Handler`] backed by an async function.
pub struct FnHandler<F> {
    func: F,
}

/// Wraps an async function as a [`Handler`].
pub fn handler_fn<F, Fut>(func: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Outcome>, BoxError>> + Send + 'static,
{
    FnHandler { func }
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Outcome>, BoxError>> + Send + 'static,
{
    fn handle(&self, request: Request) -> BoxFuture<'_, Result<Option<Outcome>, BoxError>> {
        Box::pin((self.func)(request))
    }
}

/// A [`UserIdResolver`] backed by a function returning a future.
///
/// The function borrows the request only while building the future, so it
/// copies whatever the future needs.
pub struct FnUserIdResolver<F> {
    func: F,
}

/// Wraps a function as a [`UserIdResolver`].
pub fn user_id_resolver_fn<F, Fut>(func: F) -> FnUserIdResolver<F>
where
    F: Fn(&Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SubjectReport, BoxError>> + Send + 'static,
{
    FnUserIdResolver { func }
}

impl<F, Fut> UserIdResolver for FnUserIdResolver<F>
where
    F: Fn(&Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SubjectReport, BoxError>> + Send + 'static,
{
    fn resolve<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<SubjectReport, BoxError>> {
        Box::pin((self.func)(request))
    }
}

/// A [`LocaleResolver`] backed by a function returning a future.
pub struct FnLocaleResolver<F> {
    func: F,
}

/// Wraps a function as a [`LocaleResolver`].
pub fn locale_resolver_fn<F, Fut>(func: F) -> FnLocaleResolver<F>
where
    F: Fn(&Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<String>, BoxError>> + Send + 'static,
{
    FnLocaleResolver { func }
}

impl<F, Fut> LocaleResolver for FnLocaleResolver<F>
where
    F: Fn(&Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<String>, BoxError>> + Send + 'static,
{
    fn resolve<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Option<String>, BoxError>> {
        Box::pin((self.func)(request))
    }
}
