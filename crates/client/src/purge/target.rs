//! Purge target parsing.
//!
//! A purge is sent to `http://<node><path>`. When the original URL named a
//! host, that host travels in the `Host` header so the node can find the
//! cached object.

/// The purge-everything pattern, sent verbatim.
pub const WILDCARD_PATH: &str = "/.*";

/// Error type for purge target parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("empty URL")]
    Empty,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// A URL to purge, split into the path sent to each node and the `Host` override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeTarget {
    /// The URL as given.
    pub url: String,
    /// Path sent to the node, without query string.
    pub path: String,
    /// Host header override, present when the URL was absolute.
    pub host: Option<String>,
}

impl PurgeTarget {
    /// Parse an absolute URL or a root-relative path.
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(TargetError::Empty);
        }

        if trimmed == WILDCARD_PATH {
            return Ok(Self { url: trimmed.to_string(), path: WILDCARD_PATH.to_string(), host: None });
        }

        if trimmed.starts_with('/') {
            let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
            return Ok(Self { url: trimmed.to_string(), path: trimmed[..end].to_string(), host: None });
        }

        let parsed = url::Url::parse(trimmed).map_err(|e| TargetError::InvalidUrl(e.to_string()))?;
        let host = parsed.host_str().map(str::to_string);
        if host.is_none() {
            return Err(TargetError::InvalidUrl(format!("no host in {trimmed}")));
        }

        Ok(Self { url: trimmed.to_string(), path: parsed.path().to_string(), host })
    }

    /// Request URL on the given edge node.
    pub fn node_url(&self, node: &str) -> String {
        format!("http://{node}{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute_url() {
        let target = PurgeTarget::parse("https://shop.example/shirts/blue.html?color=red").unwrap();
        assert_eq!(target.path, "/shirts/blue.html");
        assert_eq!(target.host.as_deref(), Some("shop.example"));
        assert_eq!(target.node_url("10.0.0.5:6081"), "http://10.0.0.5:6081/shirts/blue.html");
    }

    #[test]
    fn test_parse_store_wildcard() {
        let target = PurgeTarget::parse("https://shop.example/.*").unwrap();
        assert_eq!(target.path, "/.*");
        assert_eq!(target.host.as_deref(), Some("shop.example"));
    }

    #[test]
    fn test_parse_bare_wildcard_verbatim() {
        let target = PurgeTarget::parse("/.*").unwrap();
        assert_eq!(target.path, "/.*");
        assert!(target.host.is_none());
        assert_eq!(target.node_url("varnish"), "http://varnish/.*");
    }

    #[test]
    fn test_parse_relative_path() {
        let target = PurgeTarget::parse("/about-us?x=1").unwrap();
        assert_eq!(target.path, "/about-us");
        assert!(target.host.is_none());
    }

    #[test]
    fn test_parse_host_drops_port() {
        let target = PurgeTarget::parse("http://shop.example:8080/a").unwrap();
        assert_eq!(target.host.as_deref(), Some("shop.example"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(PurgeTarget::parse("  "), Err(TargetError::Empty)));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(PurgeTarget::parse("not a url"), Err(TargetError::InvalidUrl(_))));
        assert!(matches!(PurgeTarget::parse("mailto:ops@shop.example"), Err(TargetError::InvalidUrl(_))));
    }
}
