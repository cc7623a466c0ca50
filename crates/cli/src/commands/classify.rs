//! classify command implementation.
//!
//! Reads a request snapshot (JSON) and prints the cookies the storefront
//! would send with the response.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};
use shopedge_core::{AppConfig, CacheCookies, CacheabilityHook, Error, RequestContext, RequestSnapshot, RouteNames};

/// Arguments for the classify command.
#[derive(Debug, Clone, Args)]
pub struct ClassifyArgs {
    /// JSON file with the request snapshot and its route names.
    #[arg(long)]
    pub request: PathBuf,
}

/// Request snapshot as stored on disk.
#[derive(Debug, Clone, Deserialize)]
struct ClassifyInput {
    #[serde(flatten)]
    snapshot: RequestSnapshot,
    #[serde(default)]
    route: RouteNames,
}

/// Output from the classify command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyOutput {
    /// Whether the edge cache feature is enabled; no cookies are sent otherwise.
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<CacheCookies>,
    /// `Set-Cookie` header values.
    pub set_cookie: Vec<String>,
    /// Whether the edge layer will store the response.
    pub edge_cacheable: bool,
}

/// Implementation of the classify command.
pub async fn classify_impl(config: &AppConfig, args: ClassifyArgs) -> anyhow::Result<ClassifyOutput> {
    let raw = tokio::fs::read_to_string(&args.request)
        .await
        .with_context(|| format!("reading {}", args.request.display()))?;
    let input: ClassifyInput = serde_json::from_str(&raw).map_err(|e| Error::InvalidInput(e.to_string()))?;

    let hook = CacheabilityHook::from_config(config)?;
    let ctx = RequestContext::with_route(input.snapshot, input.route);
    let cookies = hook.on_response_send(&ctx);

    Ok(ClassifyOutput {
        enabled: config.enabled,
        set_cookie: cookies.map(|c| c.set_cookie_headers()).unwrap_or_default(),
        edge_cacheable: cookies.is_some_and(|c| c.edge_cacheable()),
        cookies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_request(dir: &tempfile::TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("request.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[tokio::test]
    async fn test_classify_cacheable_product() {
        let dir = tempfile::tempdir().unwrap();
        let request = write_request(
            &dir,
            r#"{
                "design_area": "frontend",
                "url": "https://shop.example/blue-shirt.html",
                "route": {"route": "catalog", "controller": "product", "action": "view"}
            }"#,
        );
        let config = AppConfig { enabled: true, ..Default::default() };

        let output = classify_impl(&config, ClassifyArgs { request }).await.unwrap();
        assert!(output.edge_cacheable);
        assert_eq!(output.set_cookie, vec!["uncached_session=0; Path=/", "uncached_once=0; Path=/", "cache_me=1; Path=/"]);
    }

    #[tokio::test]
    async fn test_classify_logged_in_customer() {
        let dir = tempfile::tempdir().unwrap();
        let request = write_request(
            &dir,
            r#"{
                "design_area": "frontend",
                "url": "/women.html",
                "customer_session": {"logged_in": true},
                "route": {"route": "catalog", "controller": "category", "action": "view"}
            }"#,
        );
        let config = AppConfig { enabled: true, ..Default::default() };

        let output = classify_impl(&config, ClassifyArgs { request }).await.unwrap();
        let cookies = output.cookies.unwrap();
        assert!(cookies.uncached_session);
        assert!(cookies.cache_me);
        assert!(!output.edge_cacheable);
    }

    #[tokio::test]
    async fn test_classify_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let request = write_request(&dir, r#"{"url": "/"}"#);

        let output = classify_impl(&AppConfig::default(), ClassifyArgs { request }).await.unwrap();
        assert!(!output.enabled);
        assert!(output.cookies.is_none());
        assert!(output.set_cookie.is_empty());
    }

    #[tokio::test]
    async fn test_classify_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let request = write_request(&dir, "{not json");
        let config = AppConfig { enabled: true, ..Default::default() };

        let result = classify_impl(&config, ClassifyArgs { request }).await;
        assert!(result.is_err());
    }
}
