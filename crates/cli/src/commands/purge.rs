//! purge and flush-origin command implementations.

use clap::Args;
use serde::{Deserialize, Serialize};
use shopedge_client::{PurgeClient, PurgeConfig};
use shopedge_core::AppConfig;

/// Arguments for the purge command.
#[derive(Debug, Clone, Args)]
pub struct PurgeArgs {
    /// Absolute URLs or root-relative paths to purge.
    #[arg(required = true)]
    pub urls: Vec<String>,
}

/// Output from the purge command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeOutput {
    /// Number of distinct URLs requested.
    pub urls: usize,
    /// Edge nodes the URLs were sent to.
    pub nodes: Vec<String>,
    /// One line per failed (node, URL) purge.
    pub errors: Vec<String>,
}

/// Implementation of the purge command.
pub async fn purge_impl(config: &AppConfig, args: PurgeArgs) -> PurgeOutput {
    let client = PurgeClient::new(PurgeConfig::from(config));

    let mut urls = args.urls;
    urls.sort();
    urls.dedup();

    let errors = client.purge(&urls).await;

    PurgeOutput {
        urls: urls.len(),
        nodes: client.nodes().to_vec(),
        errors: errors.iter().map(ToString::to_string).collect(),
    }
}

/// Arguments for the flush-origin command.
#[derive(Debug, Clone, Args)]
pub struct FlushOriginArgs {
    /// Storefront base URL, e.g. https://shop.example/
    pub base_url: String,
}

/// Output from the flush-origin command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushOriginOutput {
    pub base_url: String,
    pub flushed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Implementation of the flush-origin command.
pub async fn flush_origin_impl(config: &AppConfig, args: FlushOriginArgs) -> FlushOriginOutput {
    let client = PurgeClient::new(PurgeConfig::from(config));
    let result = client.flush_origin(&args.base_url).await;

    FlushOriginOutput { flushed: result.is_ok(), error: result.err().map(|e| e.to_string()), base_url: args.base_url }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[tokio::test]
    async fn test_purge_reports_failures() {
        let node = MockServer::start().await;
        Mock::given(method("PURGE"))
            .and(path("/ok.html"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&node)
            .await;
        Mock::given(method("PURGE"))
            .and(path("/bad.html"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&node)
            .await;

        let config = AppConfig { servers: node.address().to_string(), ..Default::default() };
        let args = PurgeArgs { urls: vec!["/ok.html".into(), "/bad.html".into(), "/ok.html".into()] };

        let output = purge_impl(&config, args).await;
        assert_eq!(output.urls, 2);
        assert_eq!(output.nodes, vec![node.address().to_string()]);
        assert_eq!(output.errors.len(), 1);
        assert!(output.errors[0].ends_with("/bad.html, http code: 500"));
    }

    #[tokio::test]
    async fn test_flush_origin_reports_status() {
        let origin = MockServer::start().await;
        Mock::given(method("PURGE"))
            .and(path("/.*"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&origin)
            .await;

        let args = FlushOriginArgs { base_url: format!("{}/", origin.uri()) };
        let output = flush_origin_impl(&AppConfig::default(), args).await;
        assert!(!output.flushed);
        assert!(output.error.unwrap().contains("http code: 403"));
    }
}
