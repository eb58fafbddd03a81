//! Route table and dispatch lookup.
//!
//! # Responsibilities
//! - Store compiled routes under unique names
//! - Resolve (path, method) to the first matching route
//! - Distinguish NotFound from MethodNotAllowed
//! - Reverse construction: (name, params) → path
//!
//! # Design Decisions
//! - Populated once at startup, shared behind an Arc afterwards (no locks)
//! - O(n) scan in registration order; first full match wins
//! - Explicit outcome enum rather than a silent default route

use std::collections::HashMap;
use std::fmt;

use axum::http::Method;

use super::matcher::PathTemplate;
use super::{Params, RoutingError};

/// A named, registered mapping from methods + path template to a handler.
pub struct Route<H> {
    name: String,
    template: PathTemplate,
    methods: Vec<Method>,
    handler: H,
}

impl<H> Route<H> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    fn allows(&self, method: &Method) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("template", &self.template.source())
            .field("methods", &self.methods)
            .finish()
    }
}

/// A successful lookup: the route plus its typed parameters.
pub struct MatchResult<'a, H> {
    pub route: &'a Route<H>,
    pub params: Params,
}

impl<H> MatchResult<'_, H> {
    pub fn name(&self) -> &str {
        self.route.name()
    }
}

impl<H> PartialEq for MatchResult<'_, H> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.route, other.route) && self.params == other.params
    }
}

impl<H> fmt::Debug for MatchResult<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchResult")
            .field("route", &self.route.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Outcome of [`RouteTable::match_route`].
pub enum RouteMatch<'a, H> {
    Matched(MatchResult<'a, H>),
    /// The path exists but not for this method; carries the allowed methods.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl<H> PartialEq for RouteMatch<'_, H> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RouteMatch::Matched(a), RouteMatch::Matched(b)) => a == b,
            (RouteMatch::MethodNotAllowed(a), RouteMatch::MethodNotAllowed(b)) => a == b,
            (RouteMatch::NotFound, RouteMatch::NotFound) => true,
            _ => false,
        }
    }
}

impl<H> fmt::Debug for RouteMatch<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMatch::Matched(m) => f.debug_tuple("Matched").field(m).finish(),
            RouteMatch::MethodNotAllowed(m) => f.debug_tuple("MethodNotAllowed").field(m).finish(),
            RouteMatch::NotFound => f.write_str("NotFound"),
        }
    }
}

/// Ordered, name-indexed collection of routes.
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
    by_name: HashMap<String, usize>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route.
    ///
    /// Fails when the template is malformed, the name is taken, no methods
    /// are given, or an earlier route already serves the same template for
    /// one of these methods.
    pub fn register(
        &mut self,
        name: &str,
        template: &str,
        methods: &[Method],
        handler: H,
    ) -> Result<(), RoutingError> {
        if self.by_name.contains_key(name) {
            return Err(RoutingError::ConfigurationError(format!(
                "route name '{}' already registered",
                name
            )));
        }
        if methods.is_empty() {
            return Err(RoutingError::ConfigurationError(format!(
                "route '{}' has no methods",
                name
            )));
        }

        let template = PathTemplate::compile(template)?;

        if let Some(clash) = self.routes.iter().find(|r| {
            r.template.segments() == template.segments() && methods.iter().any(|m| r.allows(m))
        }) {
            return Err(RoutingError::ConfigurationError(format!(
                "route '{}' collides with '{}' on {}",
                name,
                clash.name,
                template.source()
            )));
        }

        tracing::trace!(route = %name, template = %template.source(), "Route registered");

        self.by_name.insert(name.to_string(), self.routes.len());
        self.routes.push(Route {
            name: name.to_string(),
            template,
            methods: methods.to_vec(),
            handler,
        });
        Ok(())
    }

    /// Resolve a request path and method.
    pub fn match_route(&self, path: &str, method: &Method) -> RouteMatch<'_, H> {
        let mut allowed: Vec<Method> = Vec::new();

        for route in &self.routes {
            let Some(params) = route.template.matches(path) else {
                continue;
            };
            if route.allows(method) {
                return RouteMatch::Matched(MatchResult { route, params });
            }
            for m in &route.methods {
                if !allowed.contains(m) {
                    allowed.push(m.clone());
                }
            }
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed(allowed)
        }
    }

    /// Build the path for a named route.
    pub fn reverse(&self, name: &str, params: &Params) -> Result<String, RoutingError> {
        let route = self
            .route(name)
            .ok_or_else(|| RoutingError::RouteNotFound(name.to_string()))?;

        route
            .template
            .render(params)
            .map_err(|reason| RoutingError::ParameterMismatch {
                route: name.to_string(),
                reason,
            })
    }

    pub fn route(&self, name: &str) -> Option<&Route<H>> {
        self.by_name.get(name).map(|&i| &self.routes[i])
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<H> fmt::Debug for RouteTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}
