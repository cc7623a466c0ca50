//! Purge dispatcher for edge nodes.
//!
//! ### Wire protocol
//! - Method `PURGE` to `http://<node><path>` for every (node, URL) pair
//! - `Host: <url host>` when the URL was absolute
//! - Redirects are not followed; certificate and hostname checks are off,
//!   since nodes are addressed by internal IP or hostname
//! - Status 200 or 404 is success (404: nothing cached there)
//!
//! ### Fanout
//! - URLs are deduplicated before dispatch
//! - Every request is started before any completion is awaited; the run
//!   returns once all have finished
//! - Failures are collected and returned, never raised; no retries

pub mod error;
pub mod target;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use futures::future::join_all;
use reqwest::{Client, Method, StatusCode, header};
use shopedge_core::{AppConfig, Error};

pub use error::PurgeError;
pub use target::{PurgeTarget, TargetError, WILDCARD_PATH};

/// Configuration for the purge client.
#[derive(Debug, Clone)]
pub struct PurgeConfig {
    /// Edge node hosts (`host` or `host:port`)
    pub nodes: Vec<String>,

    /// Connect timeout per request (default: 5s)
    pub connect_timeout: Duration,

    /// User agent string (default: "shopedge/0.1")
    pub user_agent: String,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self { nodes: Vec::new(), connect_timeout: Duration::from_secs(5), user_agent: "shopedge/0.1".to_string() }
    }
}

impl From<&AppConfig> for PurgeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            nodes: config.edge_nodes(),
            connect_timeout: config.connect_timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Issues `PURGE` requests against the configured edge nodes.
#[derive(Debug, Clone)]
pub struct PurgeClient {
    config: PurgeConfig,
}

impl PurgeClient {
    pub fn new(config: PurgeConfig) -> Self {
        Self { config }
    }

    pub fn nodes(&self) -> &[String] {
        &self.config.nodes
    }

    /// A fresh HTTP client for one purge run.
    fn http(&self) -> Result<(Client, Method), Error> {
        let method = Method::from_bytes(b"PURGE").map_err(|e| Error::HttpError(e.to_string()))?;
        let http = Client::builder()
            .user_agent(&self.config.user_agent)
            .connect_timeout(self.config.connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;
        Ok((http, method))
    }

    /// Purge every URL on every node, returning the failures.
    pub async fn purge<S: AsRef<str>>(&self, urls: &[S]) -> Vec<PurgeError> {
        if self.config.nodes.is_empty() {
            tracing::debug!("no edge nodes configured, skipping purge");
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut errors = Vec::new();
        let mut targets = Vec::new();
        for url in urls.iter().map(AsRef::as_ref).filter(|u| seen.insert(*u)) {
            match PurgeTarget::parse(url) {
                Ok(target) => targets.push(target),
                Err(e) => errors.push(PurgeError::InvalidTarget { url: url.to_string(), reason: e.to_string() }),
            }
        }

        if targets.is_empty() {
            return errors;
        }

        let (http, method) = match self.http() {
            Ok(pair) => pair,
            Err(e) => {
                errors.extend(self.pairs(&targets).map(|(node, target)| PurgeError::Transport {
                    url: target.node_url(node),
                    message: e.to_string(),
                }));
                return errors;
            }
        };

        let start = Instant::now();
        let requests = self
            .pairs(&targets)
            .map(|(node, target)| send_purge(&http, method.clone(), target.node_url(node), target.host.as_deref()));
        let results = join_all(requests).await;
        let sent = results.len();

        for result in results {
            if let Err(e) = result {
                tracing::warn!(url = e.url(), error = %e, "purge failed");
                errors.push(e);
            }
        }

        tracing::info!(
            nodes = self.config.nodes.len(),
            targets = targets.len(),
            requests = sent,
            failed = errors.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "purge run complete"
        );

        errors
    }

    /// Purge everything cached for a storefront by asking its own host.
    ///
    /// Sends a single `PURGE <scheme>://<host>/.*` to the storefront address
    /// rather than to the configured nodes.
    pub async fn flush_origin(&self, base_url: &str) -> Result<(), PurgeError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| PurgeError::InvalidTarget { url: base_url.to_string(), reason: e.to_string() })?;
        let Some(host) = parsed.host_str() else {
            return Err(PurgeError::InvalidTarget { url: base_url.to_string(), reason: "no host".into() });
        };
        let authority = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let request_url = format!("{}://{authority}{WILDCARD_PATH}", parsed.scheme());

        let (http, method) = self
            .http()
            .map_err(|e| PurgeError::Transport { url: request_url.clone(), message: e.to_string() })?;

        send_purge(&http, method, request_url, None).await
    }

    fn pairs<'a>(&'a self, targets: &'a [PurgeTarget]) -> impl Iterator<Item = (&'a str, &'a PurgeTarget)> + 'a {
        self.config
            .nodes
            .iter()
            .flat_map(move |node| targets.iter().map(move |target| (node.as_str(), target)))
    }
}

/// Whether a node's answer means the object is gone.
pub fn purge_succeeded(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::NOT_FOUND
}

async fn send_purge(http: &Client, method: Method, url: String, host: Option<&str>) -> Result<(), PurgeError> {
    tracing::debug!(url = %url, host, "sending PURGE");

    let mut request = http.request(method, &url);
    if let Some(host) = host {
        request = request.header(header::HOST, host);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return Err(PurgeError::Transport { url, message: e.to_string() }),
    };

    let status = response.status();
    if purge_succeeded(status) { Ok(()) } else { Err(PurgeError::Status { url, code: status.as_u16() }) }
}
