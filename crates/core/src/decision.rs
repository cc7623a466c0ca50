//! Cacheability decision and cookie directives.
//!
//! Three independent flags are sent to the edge layer as cookies:
//! - `uncached_session`: a session with per-visitor state is running
//! - `uncached_once`: this response must not be cached, without starting a session
//! - `cache_me`: this response may be cached when neither of the above is set
//!
//! The edge layer caches a page only for `uncached_session=0`, `uncached_once=0`
//! and `cache_me=1`. Rules are applied in order and later rules override
//! earlier ones.

use serde::{Deserialize, Serialize};

use crate::classifier::{Classifier, ExclusionRules};
use crate::config::AppConfig;
use crate::error::Error;
use crate::request::RequestContext;

pub const UNCACHED_SESSION_COOKIE: &str = "uncached_session";
pub const UNCACHED_ONCE_COOKIE: &str = "uncached_once";
pub const CACHE_ME_COOKIE: &str = "cache_me";

/// Tri-state cookie flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Flag {
    #[default]
    Unset,
    Off,
    On,
}

impl Flag {
    fn is_on(self) -> bool {
        self == Flag::On
    }
}

impl From<bool> for Flag {
    fn from(on: bool) -> Self {
        if on { Flag::On } else { Flag::Off }
    }
}

/// Cookie flags under construction for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheDirective {
    pub uncached_session: Flag,
    pub uncached_once: Flag,
    pub cache_me: Flag,
}

impl CacheDirective {
    pub fn new() -> Self {
        Self::default()
    }

    /// All three flags explicitly off.
    pub fn cleared() -> Self {
        Self { uncached_session: Flag::Off, uncached_once: Flag::Off, cache_me: Flag::Off }
    }

    pub fn with_uncached_session(self, on: bool) -> Self {
        Self { uncached_session: on.into(), ..self }
    }

    pub fn with_uncached_once(self) -> Self {
        Self { uncached_once: Flag::On, ..self }
    }

    pub fn with_cache_me(self, on: bool) -> Self {
        Self { cache_me: on.into(), ..self }
    }

    /// Resolve every flag to 0 or 1. Unset flags are sent as 0.
    pub fn finalize(self) -> CacheCookies {
        CacheCookies {
            uncached_session: self.uncached_session.is_on(),
            uncached_once: self.uncached_once.is_on(),
            cache_me: self.cache_me.is_on(),
        }
    }
}

/// Final cookie values sent with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheCookies {
    pub uncached_session: bool,
    pub uncached_once: bool,
    pub cache_me: bool,
}

impl CacheCookies {
    /// Name/value pairs, always all three.
    pub fn pairs(&self) -> [(&'static str, &'static str); 3] {
        let v = |on: bool| if on { "1" } else { "0" };
        [
            (UNCACHED_SESSION_COOKIE, v(self.uncached_session)),
            (UNCACHED_ONCE_COOKIE, v(self.uncached_once)),
            (CACHE_ME_COOKIE, v(self.cache_me)),
        ]
    }

    /// `Set-Cookie` header values as session cookies on the site root.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.pairs()
            .iter()
            .map(|(name, value)| format!("{name}={value}; Path=/"))
            .collect()
    }

    /// Whether the edge layer will store this response.
    pub fn edge_cacheable(&self) -> bool {
        !self.uncached_session && !self.uncached_once && self.cache_me
    }
}

/// Compute the cookie flags for one request.
pub fn decide(ctx: &RequestContext<'_>, rules: &ExclusionRules) -> CacheCookies {
    let c = Classifier::new(ctx, rules);

    tracing::debug!(
        url = ctx.url(),
        code = ctx.snapshot().status,
        controller = ctx.controller_name(),
        route = ctx.route_name(),
        action = ctx.action_name(),
        excluded = c.is_excluded_page(),
        admin_logged_in = c.is_admin_logged_in(),
        customer_logged_in = c.is_customer_logged_in(),
        "classifying request"
    );

    let mut directive = CacheDirective::cleared();

    if !c.is_front_end() {
        directive = directive.with_uncached_once();
    }

    if c.is_login_action() {
        directive = directive.with_uncached_once();
    }

    directive = directive.with_uncached_session(c.has_session_state());

    if c.is_cacheable_page() {
        directive = directive.with_cache_me(true);
    }

    if c.is_excluded_page() || c.is_excluded_route() {
        directive = directive.with_uncached_once().with_cache_me(false);
    }

    let cookies = directive.finalize();
    tracing::info!(
        uncached_session = u8::from(cookies.uncached_session),
        uncached_once = u8::from(cookies.uncached_once),
        cache_me = u8::from(cookies.cache_me),
        "sending cache cookies"
    );
    cookies
}

/// Response-send hook: decides cookies when the edge cache is enabled.
#[derive(Debug, Clone)]
pub struct CacheabilityHook {
    enabled: bool,
    rules: ExclusionRules,
}

impl CacheabilityHook {
    pub fn new(enabled: bool, rules: ExclusionRules) -> Self {
        Self { enabled, rules }
    }

    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` if an exclusion pattern does not compile.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::new(config.enabled, ExclusionRules::from_config(config)?))
    }

    /// Cookies to attach to the outgoing response, `None` when disabled.
    pub fn on_response_send(&self, ctx: &RequestContext<'_>) -> Option<CacheCookies> {
        if !self.enabled {
            return None;
        }
        Some(decide(ctx, &self.rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{RequestSnapshot, RouteNames, SessionState};

    fn route(route: &str, controller: &str, action: &str) -> RouteNames {
        RouteNames { route: route.into(), controller: controller.into(), action: action.into() }
    }

    fn frontend(url: &str) -> RequestSnapshot {
        RequestSnapshot { design_area: Some("frontend".into()), url: url.into(), ..Default::default() }
    }

    fn rules(patterns: &str, routes: &str) -> ExclusionRules {
        let config =
            AppConfig { excluded_urls: patterns.to_string(), excluded_routes: routes.to_string(), ..Default::default() };
        ExclusionRules::from_config(&config).unwrap()
    }

    fn cookies(snapshot: RequestSnapshot, names: RouteNames, rules: &ExclusionRules) -> CacheCookies {
        let ctx = RequestContext::with_route(snapshot, names);
        decide(&ctx, rules)
    }

    #[test]
    fn test_finalize_unset_flags_are_zero() {
        let cookies = CacheDirective::new().finalize();
        assert_eq!(cookies.pairs(), [("uncached_session", "0"), ("uncached_once", "0"), ("cache_me", "0")]);
    }

    #[test]
    fn test_directive_builders() {
        let d = CacheDirective::cleared().with_uncached_session(true).with_uncached_once().with_cache_me(true);
        assert_eq!(d.uncached_session, Flag::On);
        assert_eq!(d.uncached_once, Flag::On);
        assert_eq!(d.cache_me, Flag::On);
        assert_eq!(d.with_uncached_session(false).uncached_session, Flag::Off);
    }

    #[test]
    fn test_set_cookie_headers() {
        let cookies = CacheCookies { uncached_session: false, uncached_once: true, cache_me: false };
        assert_eq!(
            cookies.set_cookie_headers(),
            vec!["uncached_session=0; Path=/", "uncached_once=1; Path=/", "cache_me=0; Path=/"]
        );
    }

    #[test]
    fn test_anonymous_product_page_is_cacheable() {
        let c = cookies(frontend("/shirt.html"), route("catalog", "product", "view"), &ExclusionRules::default());
        assert_eq!(c, CacheCookies { uncached_session: false, uncached_once: false, cache_me: true });
        assert!(c.edge_cacheable());
    }

    #[test]
    fn test_non_frontend_is_uncached_once() {
        let admin = RequestSnapshot { design_area: Some("adminhtml".into()), ..frontend("/admin/catalog") };
        let c = cookies(admin, route("catalog", "product", "view"), &ExclusionRules::default());
        assert!(c.uncached_once);
        assert!(!c.edge_cacheable());

        let unknown = RequestSnapshot { design_area: None, ..frontend("/") };
        let c = cookies(unknown, route("cms", "index", "index"), &ExclusionRules::default());
        assert!(c.uncached_once);
    }

    #[test]
    fn test_login_action_is_uncached_once() {
        let c = cookies(frontend("/customer/account/login"), route("customer", "account", "login"), &ExclusionRules::default());
        assert!(c.uncached_once);
        assert!(!c.uncached_session);
        assert!(!c.cache_me);
    }

    #[test]
    fn test_session_flag_tracks_current_state() {
        let rules = ExclusionRules::default();
        let names = route("catalog", "category", "view");
        let sessions = [
            (RequestSnapshot { customer_session: Some(SessionState { logged_in: true }), ..frontend("/") }, true),
            (RequestSnapshot { admin_session: Some(SessionState { logged_in: true }), ..frontend("/") }, true),
            (RequestSnapshot { cart_items: Some(3), ..frontend("/") }, true),
            (RequestSnapshot { compare_items: 2, ..frontend("/") }, true),
            (RequestSnapshot { cart_items: Some(0), ..frontend("/") }, false),
            (frontend("/"), false),
        ];
        for (snapshot, expected) in sessions {
            let c = cookies(snapshot, names.clone(), &rules);
            assert_eq!(c.uncached_session, expected);
            assert!(c.cache_me);
        }
    }

    #[test]
    fn test_exclusion_overrides_cacheable_page() {
        let rules = rules("^/sale/", "");
        let c = cookies(frontend("/sale/shirt.html"), route("catalog", "product", "view"), &rules);
        assert_eq!(c, CacheCookies { uncached_session: false, uncached_once: true, cache_me: false });
    }

    #[test]
    fn test_exclusion_checks_path_not_url_in_query() {
        let rules = rules("^/search", "");
        let c = cookies(frontend("/search?redirect=http://shop.example/x"), route("cms", "page", "view"), &rules);
        assert!(c.uncached_once);
        assert!(!c.cache_me);
    }

    #[test]
    fn test_excluded_route_overrides_cacheable_page() {
        let rules = rules("", "blog");
        let c = cookies(frontend("/blog/hello"), route("blog", "post", "view"), &rules);
        assert!(c.uncached_once);
        assert!(!c.cache_me);
        assert!(!c.uncached_session);
    }

    #[test]
    fn test_exclusion_does_not_start_session() {
        let rules = rules("nocache", "");
        let snapshot = RequestSnapshot { cart_items: Some(1), ..frontend("/?nocache=1") };
        let c = cookies(snapshot, route("cms", "index", "index"), &rules);
        assert!(c.uncached_session);
        assert!(c.uncached_once);
        assert!(!c.cache_me);
    }

    #[test]
    fn test_other_pages_not_marked_cacheable() {
        let c = cookies(frontend("/checkout/cart/"), route("checkout", "checkout_cart", "index"), &ExclusionRules::default());
        assert_eq!(c, CacheCookies { uncached_session: false, uncached_once: false, cache_me: false });
    }

    #[test]
    fn test_hook_disabled_sends_nothing() {
        let hook = CacheabilityHook::new(false, ExclusionRules::default());
        let ctx = RequestContext::with_route(frontend("/"), route("cms", "index", "index"));
        assert!(hook.on_response_send(&ctx).is_none());
    }

    #[test]
    fn test_hook_from_config() {
        let config = AppConfig { enabled: true, excluded_urls: "^/private".into(), ..Default::default() };
        let hook = CacheabilityHook::from_config(&config).unwrap();
        let ctx = RequestContext::with_route(frontend("/private/page"), route("cms", "page", "view"));
        let c = hook.on_response_send(&ctx).unwrap();
        assert!(!c.cache_me);
        assert!(c.uncached_once);
    }
}
