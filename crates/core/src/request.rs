//! Per-request state read by the classifier.
//!
//! A [`RequestContext`] is built once per request from a [`RequestSnapshot`]
//! and a [`RouteResolver`]. Route, controller and action names come from the
//! web framework's router, which is comparatively expensive to ask, so they
//! are resolved on first read and kept for the rest of the request.

use std::cell::OnceCell;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// The design area that renders the storefront.
pub const FRONTEND_AREA: &str = "frontend";

/// Base for root-relative request URLs; only path and query are read back.
const RELATIVE_BASE: &str = "http://localhost/";

/// Route, controller and action names of the dispatched request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteNames {
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub controller: String,
    #[serde(default)]
    pub action: String,
}

/// Source of route names for the current request.
pub trait RouteResolver {
    fn resolve(&self) -> RouteNames;
}

impl RouteResolver for RouteNames {
    fn resolve(&self) -> RouteNames {
        self.clone()
    }
}

/// Login state reported by a session collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub logged_in: bool,
}

/// Plain request facts gathered by the framework integration.
///
/// Collaborators that were not available for this request are `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestSnapshot {
    /// Active design area, `frontend` for storefront pages.
    #[serde(default)]
    pub design_area: Option<String>,
    /// Current URL as seen by the application.
    pub url: String,
    /// Response status code about to be sent.
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub customer_session: Option<SessionState>,
    #[serde(default)]
    pub admin_session: Option<SessionState>,
    /// Items in the shopping cart, `None` if there is no quote.
    #[serde(default)]
    pub cart_items: Option<u32>,
    #[serde(default)]
    pub compare_items: u32,
}

fn default_status() -> u16 {
    200
}

/// Immutable per-request snapshot with lazily resolved route names.
pub struct RequestContext<'a> {
    snapshot: RequestSnapshot,
    resolver: Box<dyn RouteResolver + 'a>,
    route: OnceCell<RouteNames>,
    parsed_url: OnceCell<Option<Url>>,
}

impl<'a> RequestContext<'a> {
    /// Build the context for one request.
    pub fn new(snapshot: RequestSnapshot, resolver: impl RouteResolver + 'a) -> Self {
        Self { snapshot, resolver: Box::new(resolver), route: OnceCell::new(), parsed_url: OnceCell::new() }
    }

    /// Build a context whose route names are already known.
    pub fn with_route(snapshot: RequestSnapshot, route: RouteNames) -> RequestContext<'static> {
        RequestContext { snapshot, resolver: Box::new(route), route: OnceCell::new(), parsed_url: OnceCell::new() }
    }

    fn names(&self) -> &RouteNames {
        self.route.get_or_init(|| self.resolver.resolve())
    }

    pub fn route_name(&self) -> &str {
        &self.names().route
    }

    pub fn controller_name(&self) -> &str {
        &self.names().controller
    }

    pub fn action_name(&self) -> &str {
        &self.names().action
    }

    pub fn snapshot(&self) -> &RequestSnapshot {
        &self.snapshot
    }

    pub fn url(&self) -> &str {
        &self.snapshot.url
    }

    fn parsed_url(&self) -> Option<&Url> {
        self.parsed_url.get_or_init(|| parse_request_url(&self.snapshot.url)).as_ref()
    }

    /// Path component of the current URL.
    ///
    /// Accepts both absolute URLs and root-relative `/path?query` forms. A URL
    /// that cannot be parsed at all is returned whole.
    pub fn path(&self) -> &str {
        self.parsed_url().map_or(self.snapshot.url.as_str(), Url::path)
    }

    /// Query string of the current URL, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.parsed_url().and_then(Url::query)
    }
}

fn parse_request_url(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(RELATIVE_BASE).ok()?;
            base.join(raw).ok()
        }
        Err(e) => {
            tracing::debug!(url = raw, error = %e, "request URL could not be parsed");
            None
        }
    }
}

impl fmt::Debug for RequestContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("snapshot", &self.snapshot)
            .field("route", &self.route.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingResolver<'c> {
        calls: &'c Cell<usize>,
    }

    impl RouteResolver for CountingResolver<'_> {
        fn resolve(&self) -> RouteNames {
            self.calls.set(self.calls.get() + 1);
            RouteNames { route: "catalog".into(), controller: "product".into(), action: "view".into() }
        }
    }

    fn snapshot(url: &str) -> RequestSnapshot {
        RequestSnapshot { url: url.to_string(), ..Default::default() }
    }

    #[test]
    fn test_route_resolved_once() {
        let calls = Cell::new(0);
        let ctx = RequestContext::new(snapshot("/"), CountingResolver { calls: &calls });
        assert_eq!(calls.get(), 0);

        assert_eq!(ctx.route_name(), "catalog");
        assert_eq!(ctx.controller_name(), "product");
        assert_eq!(ctx.action_name(), "view");
        assert_eq!(ctx.route_name(), "catalog");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_path_and_query_absolute_url() {
        let ctx = RequestContext::with_route(
            snapshot("https://shop.example/women/dresses.html?color=red&p=2#top"),
            RouteNames::default(),
        );
        assert_eq!(ctx.path(), "/women/dresses.html");
        assert_eq!(ctx.query(), Some("color=red&p=2"));
    }

    #[test]
    fn test_path_and_query_relative_url() {
        let ctx = RequestContext::with_route(snapshot("/checkout/cart/"), RouteNames::default());
        assert_eq!(ctx.path(), "/checkout/cart/");
        assert_eq!(ctx.query(), None);
    }

    #[test]
    fn test_path_of_bare_host() {
        let ctx = RequestContext::with_route(snapshot("https://shop.example?x=1"), RouteNames::default());
        assert_eq!(ctx.path(), "/");
        assert_eq!(ctx.query(), Some("x=1"));
    }

    #[test]
    fn test_relative_url_with_url_in_query() {
        let ctx = RequestContext::with_route(
            snapshot("/search?redirect=http://shop.example/x"),
            RouteNames::default(),
        );
        assert_eq!(ctx.path(), "/search");
        assert_eq!(ctx.query(), Some("redirect=http://shop.example/x"));
    }

    #[test]
    fn test_absolute_url_with_url_in_query() {
        let ctx = RequestContext::with_route(
            snapshot("https://shop.example/out?to=https://partner.example/a/b"),
            RouteNames::default(),
        );
        assert_eq!(ctx.path(), "/out");
        assert_eq!(ctx.query(), Some("to=https://partner.example/a/b"));
    }

    #[test]
    fn test_snapshot_deserialize_defaults() {
        let snapshot: RequestSnapshot = serde_json::from_str(r#"{"url": "/"}"#).unwrap();
        assert_eq!(snapshot.status, 200);
        assert!(snapshot.design_area.is_none());
        assert!(snapshot.customer_session.is_none());
        assert!(snapshot.cart_items.is_none());
        assert_eq!(snapshot.compare_items, 0);
    }
}
