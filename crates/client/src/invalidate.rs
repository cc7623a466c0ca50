//! Invalidation orchestrator.
//!
//! Turns content-change notifications into purges. A notification without
//! tags purges every storefront; tagged notifications purge the URLs of the
//! named entities only. Nothing happens while the edge cache is disabled or
//! no edge nodes are configured.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use shopedge_core::catalog::Category;
use shopedge_core::{AppConfig, Catalog, ChangeTag, UrlResolver};

use crate::purge::{PurgeClient, PurgeConfig, PurgeError};

/// Message for the operator console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum AdminNotice {
    Success { message: String, lines: Vec<String> },
    Error { message: String, lines: Vec<String> },
}

impl AdminNotice {
    pub fn is_error(&self) -> bool {
        matches!(self, AdminNotice::Error { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            AdminNotice::Success { message, .. } | AdminNotice::Error { message, .. } => message,
        }
    }

    pub fn lines(&self) -> &[String] {
        match self {
            AdminNotice::Success { lines, .. } | AdminNotice::Error { lines, .. } => lines,
        }
    }
}

impl fmt::Display for AdminNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())?;
        for line in self.lines() {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

fn error_lines(errors: &[PurgeError]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}

/// Drop everything from the first `?`.
fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

/// Reacts to catalog changes by purging edge nodes.
pub struct Invalidator<C> {
    enabled: bool,
    catalog: C,
    client: PurgeClient,
}

impl<C: Catalog> Invalidator<C> {
    pub fn new(enabled: bool, catalog: C, client: PurgeClient) -> Self {
        Self { enabled, catalog, client }
    }

    pub fn from_config(config: &AppConfig, catalog: C) -> Self {
        Self::new(config.enabled, catalog, PurgeClient::new(PurgeConfig::from(config)))
    }

    fn active(&self) -> bool {
        if !self.enabled {
            tracing::debug!("edge cache disabled, skipping purge");
            return false;
        }
        if self.client.nodes().is_empty() {
            tracing::debug!("no edge nodes configured, skipping purge");
            return false;
        }
        true
    }

    /// Cache-clean notification. Empty `tags` purges everything.
    ///
    /// Returns `None` when nothing was dispatched.
    pub async fn on_clean_cache<S: AsRef<str>>(&self, tags: &[S]) -> Option<AdminNotice> {
        if !self.active() {
            return None;
        }

        if tags.is_empty() {
            return Some(self.global_purge().await);
        }

        let tags = ChangeTag::parse_all(tags);
        tracing::debug!(tags = ?tags.iter().map(ToString::to_string).collect::<Vec<_>>(), "resolving purge URLs");

        let urls = self.resolve_urls(&tags).await;
        if urls.is_empty() {
            return None;
        }

        let errors = self.client.purge(&urls).await;
        if errors.is_empty() {
            Some(AdminNotice::Success { message: "Purges have been submitted successfully:".into(), lines: urls })
        } else {
            Some(AdminNotice::Error { message: "Some edge cache purges failed:".into(), lines: error_lines(&errors) })
        }
    }

    /// Explicit purge-everything request from the operator.
    pub async fn purge_all(&self) -> Option<AdminNotice> {
        if !self.active() {
            return None;
        }
        Some(self.global_purge().await)
    }

    /// Whether saving this category calls for a full refresh.
    ///
    /// Menu categories render on every page, so no scoped purge covers them.
    /// The hint is given whether or not the edge cache is enabled.
    pub fn category_saved(&self, category: &Category) -> bool {
        let refresh = category.include_in_menu;
        if refresh {
            tracing::info!(category_id = category.id, "menu category saved, edge cache needs refresh");
        }
        refresh
    }

    /// Purge URLs for the given tags: merged, query strings stripped, deduplicated.
    pub async fn resolve_urls(&self, tags: &[ChangeTag]) -> Vec<String> {
        let resolver = UrlResolver::new(&self.catalog);

        let mut merged = Vec::new();
        for tag in tags {
            merged.extend(resolver.urls_for(*tag).await);
        }

        let mut seen = HashSet::new();
        merged
            .iter()
            .map(|url| strip_query(url))
            .filter(|url| seen.insert(*url))
            .map(str::to_string)
            .collect()
    }

    async fn global_purge(&self) -> AdminNotice {
        let targets = match UrlResolver::new(&self.catalog).store_wildcards().await {
            Ok(targets) if !targets.is_empty() => targets,
            Ok(_) => {
                tracing::warn!("catalog has no stores, nothing was purged");
                return AdminNotice::Error {
                    message: "Edge cache purge failed".into(),
                    lines: vec!["No storefronts found to purge".into()],
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load stores for global purge");
                return AdminNotice::Error { message: "Edge cache purge failed".into(), lines: vec![e.to_string()] };
            }
        };
        tracing::info!(targets = targets.len(), "purging all storefronts");

        let errors = self.client.purge(&targets).await;
        if errors.is_empty() {
            AdminNotice::Success { message: "The edge cache storage has been flushed.".into(), lines: Vec::new() }
        } else {
            AdminNotice::Error { message: "Edge cache purge failed".into(), lines: error_lines(&errors) }
        }
    }
}
