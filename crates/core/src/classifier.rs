//! Request classification.
//!
//! Boolean facts about the current request, derived from a [`RequestContext`].
//! Missing collaborators (no session, no quote) classify as `false`, which
//! biases the cookie decision towards not caching.

use std::cell::OnceCell;

use regex::Regex;

use crate::config::AppConfig;
use crate::error::Error;
use crate::request::{FRONTEND_AREA, RequestContext};

/// Exclusion patterns and routes, compiled once per configuration load.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    patterns: Vec<Regex>,
    routes: Vec<String>,
}

impl ExclusionRules {
    /// Compile the configured URL patterns and collect excluded routes.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` for the first pattern that does not compile.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let patterns = config
            .excluded_url_patterns()
            .into_iter()
            .map(|pattern| {
                Regex::new(&pattern).map_err(|e| Error::InvalidPattern { pattern, reason: e.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns, routes: config.excluded_route_names() })
    }

    /// First pattern found anywhere in `path` or `query`.
    pub fn matching_pattern(&self, path: &str, query: Option<&str>) -> Option<&Regex> {
        self.patterns
            .iter()
            .find(|re| re.is_match(path) || query.is_some_and(|q| re.is_match(q)))
    }

    /// Whether the route, `route/controller` or `route/controller/action` is listed.
    pub fn excludes_route(&self, route: &str, controller: &str, action: &str) -> bool {
        if self.routes.is_empty() {
            return false;
        }
        let with_controller = format!("{route}/{controller}");
        let full = format!("{with_controller}/{action}");
        self.routes
            .iter()
            .any(|r| r == route || *r == with_controller || *r == full)
    }
}

/// Predicates over one request.
pub struct Classifier<'c, 'r> {
    ctx: &'c RequestContext<'r>,
    rules: &'c ExclusionRules,
    excluded: OnceCell<bool>,
}

impl<'c, 'r> Classifier<'c, 'r> {
    pub fn new(ctx: &'c RequestContext<'r>, rules: &'c ExclusionRules) -> Self {
        Self { ctx, rules, excluded: OnceCell::new() }
    }

    /// True in the storefront design area, regardless of login state.
    pub fn is_front_end(&self) -> bool {
        self.ctx.snapshot().design_area.as_deref() == Some(FRONTEND_AREA)
    }

    pub fn is_checkout_page(&self) -> bool {
        self.ctx.controller_name() == "checkout_cart"
    }

    pub fn is_product_page(&self) -> bool {
        self.ctx.controller_name() == "product"
    }

    pub fn is_category_page(&self) -> bool {
        self.ctx.controller_name() == "category"
    }

    /// CMS pages, including the home page.
    pub fn is_cms_page(&self) -> bool {
        self.ctx.route_name() == "cms"
    }

    pub fn is_blog_page(&self) -> bool {
        self.ctx.route_name() == "blog"
    }

    pub fn is_login_action(&self) -> bool {
        self.ctx.action_name() == "login"
    }

    pub fn is_admin_area(&self) -> bool {
        self.ctx.route_name() == "adminhtml"
    }

    pub fn is_admin_logged_in(&self) -> bool {
        self.ctx.snapshot().admin_session.is_some_and(|s| s.logged_in)
    }

    pub fn is_customer_logged_in(&self) -> bool {
        self.ctx.snapshot().customer_session.is_some_and(|s| s.logged_in)
    }

    pub fn quote_has_items(&self) -> bool {
        self.ctx.snapshot().cart_items.is_some_and(|n| n > 0)
    }

    pub fn has_compare_items(&self) -> bool {
        self.ctx.snapshot().compare_items > 0
    }

    /// Whether the path or query string matches a configured exclusion pattern.
    pub fn is_excluded_page(&self) -> bool {
        *self.excluded.get_or_init(|| {
            match self.rules.matching_pattern(self.ctx.path(), self.ctx.query()) {
                Some(re) => {
                    tracing::debug!(url = self.ctx.url(), pattern = re.as_str(), "request matches exclusion pattern");
                    true
                }
                None => false,
            }
        })
    }

    pub fn is_excluded_route(&self) -> bool {
        self.rules
            .excludes_route(self.ctx.route_name(), self.ctx.controller_name(), self.ctx.action_name())
    }

    /// Whether any session-scoped state rules out shared caching.
    pub fn has_session_state(&self) -> bool {
        self.is_customer_logged_in() || self.is_admin_logged_in() || self.quote_has_items() || self.has_compare_items()
    }

    /// Pages the edge layer may cache when no session is running.
    pub fn is_cacheable_page(&self) -> bool {
        self.is_product_page() || self.is_category_page() || self.is_cms_page() || self.is_blog_page()
    }
}
