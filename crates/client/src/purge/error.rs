//! Purge failure types.

/// One failed purge request, tagged with the URL that was requested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurgeError {
    /// Connection, TLS or protocol failure.
    #[error("Cannot purge url {url} due to error {message}")]
    Transport { url: String, message: String },

    /// Node answered with a status other than 200 or 404.
    #[error("Cannot purge url {url}, http code: {code}")]
    Status { url: String, code: u16 },

    /// The URL could not be turned into a purge request.
    #[error("Cannot purge url {url}: {reason}")]
    InvalidTarget { url: String, reason: String },
}

impl PurgeError {
    pub fn url(&self) -> &str {
        match self {
            PurgeError::Transport { url, .. } | PurgeError::Status { url, .. } | PurgeError::InvalidTarget { url, .. } => {
                url
            }
        }
    }
}
