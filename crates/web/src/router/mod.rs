//! Route table: ordered registration and first-match-wins lookup.
//!
//! Routes are kept in registration order and matching is a deterministic
//! two-pass scan: exact literal matches win over wildcard and parameterized
//! matches regardless of registration order; within each class the earliest
//! registration wins. Duplicate patterns are allowed — shadowing resolves at
//! match time, not at insert time.

pub mod pattern;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use lantern_http::protocol::Method;

use crate::handler::RouteHandler;

pub const DEFAULT_ROUTE_CAPACITY: usize = 256;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("route table is full (capacity {capacity})")]
    TableFull { capacity: usize },

    #[error("no route registered for {method} {pattern}")]
    NotFound { method: Method, pattern: String },
}

/// One registered route: a method, a path pattern and the handler invoked on
/// a match. The auth/origin fields are metadata for middleware; the matcher
/// does not consult them.
pub struct Route {
    method: Method,
    pattern: String,
    handler: Arc<dyn RouteHandler>,
    description: String,
    requires_auth: bool,
    allowed_origins: Option<String>,
}

impl Route {
    pub fn new(
        method: Method,
        pattern: impl Into<String>,
        handler: impl RouteHandler + 'static,
        description: impl Into<String>,
    ) -> Self {
        Self {
            method,
            pattern: pattern.into(),
            handler: Arc::new(handler),
            description: description.into(),
            requires_auth: false,
            allowed_origins: None,
        }
    }

    pub fn with_auth_required(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn with_allowed_origins(mut self, origins: impl Into<String>) -> Self {
        self.allowed_origins = Some(origins.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn allowed_origins(&self) -> Option<&str> {
        self.allowed_origins.as_deref()
    }

    pub fn handler(&self) -> &dyn RouteHandler {
        self.handler.as_ref()
    }

    /// True when the pattern contains a wildcard or parameter placeholder.
    pub fn is_pattern(&self) -> bool {
        pattern::is_pattern(&self.pattern)
    }

    /// Extracts a named `{param}` value from a path matched by this route.
    pub fn path_param(&self, path: &str, name: &str) -> Option<String> {
        pattern::path_param(&self.pattern, path, name)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("description", &self.description)
            .field("requires_auth", &self.requires_auth)
            .field("allowed_origins", &self.allowed_origins)
            .finish_non_exhaustive()
    }
}

/// Append-ordered route table with a fixed capacity.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    capacity: usize,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ROUTE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { routes: Vec::new(), capacity }
    }

    /// Appends a route. Duplicate patterns are accepted; capacity overflow
    /// is not.
    pub fn add(&mut self, route: Route) -> Result<(), RouterError> {
        if self.routes.len() >= self.capacity {
            return Err(RouterError::TableFull { capacity: self.capacity });
        }
        debug!(
            method = %route.method(),
            pattern = route.pattern(),
            description = route.description(),
            "route registered"
        );
        self.routes.push(Arc::new(route));
        Ok(())
    }

    /// Appends many routes, returning how many were accepted.
    pub fn add_all(&mut self, routes: Vec<Route>) -> usize {
        let mut added = 0;
        for route in routes {
            if self.add(route).is_ok() {
                added += 1;
            }
        }
        added
    }

    /// Removes the first route with this exact method and pattern string,
    /// preserving the relative order of the remainder.
    pub fn remove(&mut self, method: Method, pattern: &str) -> Result<(), RouterError> {
        let position = self
            .routes
            .iter()
            .position(|route| route.method() == method && route.pattern() == pattern);
        match position {
            Some(index) => {
                self.routes.remove(index);
                debug!(method = %method, pattern, "route removed");
                Ok(())
            }
            None => Err(RouterError::NotFound { method, pattern: pattern.to_string() }),
        }
    }

    /// Finds the route for a request path.
    ///
    /// Pass 1 takes the first registration whose pattern equals the path
    /// exactly; pass 2 takes the first wildcard/parameterized registration
    /// that matches. `None` means the caller answers 404.
    pub fn find(&self, method: Method, path: &str) -> Option<Arc<Route>> {
        self.routes
            .iter()
            .find(|route| route.method() == method && route.pattern() == path)
            .or_else(|| {
                self.routes.iter().find(|route| {
                    route.method() == method
                        && route.is_pattern()
                        && pattern::matches(route.pattern(), path)
                })
            })
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}
