//! Route handler contract.
//!
//! A [`RouteHandler`] produces a [`Response`] from a [`RequestContext`] —
//! the decoded request plus the route it matched, so path parameters can be
//! resolved. [`handler_fn`] lifts an async closure into a handler; captured
//! state replaces the global lookups a bare function pointer would need.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use lantern_http::protocol::{Request, Response};

use crate::router::Route;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The request being handled together with the route that matched it.
///
/// The route is absent for fallback handlers, which run when nothing
/// matched.
#[derive(Debug)]
pub struct RequestContext {
    request: Request,
    route: Option<Arc<Route>>,
}

impl RequestContext {
    pub fn new(request: Request, route: Option<Arc<Route>>) -> Self {
        Self { request, route }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_deref()
    }

    /// Value of a `{name}` placeholder in the matched route's pattern.
    pub fn path_param(&self, name: &str) -> Option<String> {
        self.route.as_ref().and_then(|route| route.path_param(self.request.path(), name))
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.request.query_param(name)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.request.session_id()
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.request.body()
    }
}

#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, ctx: &RequestContext) -> Result<Response, BoxError>;
}

pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(&RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, BoxError>> + Send,
{
    async fn handle(&self, ctx: &RequestContext) -> Result<Response, BoxError> {
        (self.f)(ctx).await
    }
}

/// Lifts an async closure into a [`RouteHandler`].
///
/// The closure receives the context by reference and must return an owned
/// future, so data it needs inside the future is extracted (or cloned)
/// before the `async move` block:
///
/// ```ignore
/// handler_fn(|ctx| {
///     let id = ctx.path_param("id");
///     async move { Ok(Response::text(id.unwrap_or_default())) }
/// })
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(&RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, BoxError>> + Send,
{
    FnHandler { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Route;
    use lantern_http::protocol::Method;

    #[tokio::test]
    async fn handler_fn_invokes_closure() {
        let handler = handler_fn(|ctx: &RequestContext| {
            let path = ctx.request().path().to_string();
            async move { Ok(Response::text(path)) }
        });

        let request = Request::builder().path("/ping").build();
        let ctx = RequestContext::new(request, None);
        let response = handler.handle(&ctx).await.unwrap();
        assert_eq!(response.body(), b"/ping");
    }

    #[tokio::test]
    async fn context_resolves_path_params() {
        let echo_id = handler_fn(|ctx: &RequestContext| {
            let id = ctx.path_param("id").unwrap_or_default();
            async move { Ok(Response::text(id)) }
        });

        let route = Arc::new(Route::new(Method::Get, "/users/{id}", echo_id, "user"));
        let request = Request::builder().path("/users/42").build();
        let ctx = RequestContext::new(request, Some(Arc::clone(&route)));

        assert_eq!(ctx.path_param("id"), Some("42".to_string()));
        let response = route.handler().handle(&ctx).await.unwrap();
        assert_eq!(response.body(), b"42");
    }

    #[test]
    fn fallback_context_has_no_route() {
        let request = Request::builder().path("/nowhere").build();
        let ctx = RequestContext::new(request, None);
        assert!(ctx.route().is_none());
        assert_eq!(ctx.path_param("id"), None);
    }
}
