//! Middleware trait and chaining.
//!
//! Middleware receives the request and a [`Next`] continuation that runs the
//! rest of the chain and, at its end, the origin.
//!
//! # Example
//!
//! ```ignore
//! use tessera_middleware::{BoxFuture, Middleware, Next, Request, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let start = std::time::Instant::now();
//!             let response = next.run(request).await;
//!             tracing::debug!(elapsed = ?start.elapsed(), "Request finished");
//!             response
//!         })
//!     }
//! }
//! ```

use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A request-processing stage.
///
/// Middleware calls `next.run()` at most once; not calling it
/// short-circuits the chain with its own response.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this stage, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response>;
}

/// Continuation invoking the rest of the chain.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More middleware to run.
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain: the origin.
    Origin(Box<dyn FnOnce(Request) -> BoxFuture<'static, Response> + Send + 'a>),
}

impl<'a> Next<'a> {
    /// Creates a continuation that runs `middleware`, then `next`.
    pub fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal continuation that calls the origin.
    pub fn origin<F>(f: F) -> Self
    where
        F: FnOnce(Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Origin(Box::new(f)),
        }
    }

    /// Runs the rest of the chain.
    ///
    /// This consumes `self` so it can only be called once.
    pub async fn run(self, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(request, *next).await,
            NextInner::Origin(origin) => origin(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;

    struct Tagging {
        name: &'static str,
    }

    impl Middleware for Tagging {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(&'a self, mut request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                request
                    .headers_mut()
                    .append("x-visited", self.name.parse().unwrap());
                next.run(request).await
            })
        }
    }

    fn echo_visits() -> Next<'static> {
        Next::origin(|request: Request| {
            Box::pin(async move {
                let visits: Vec<_> = request
                    .headers()
                    .get_all("x-visited")
                    .iter()
                    .map(|v| v.to_str().unwrap().to_string())
                    .collect();

                HttpResponse::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::from(visits.join(","))))
                    .unwrap()
            })
        })
    }

    fn request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_origin() {
        let response = echo_visits().run(request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        use http_body_util::BodyExt;

        let first = Tagging { name: "first" };
        let second = Tagging { name: "second" };

        let next = Next::new(&first, Next::new(&second, echo_visits()));
        let response = next.run(request()).await;

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "first,second");
        assert_eq!(first.name(), "first");
    }
}
