//! Unified error types for shopedge.

/// Unified error types shared by the shopedge crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input (e.g., malformed request snapshot).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Exclusion pattern failed to compile.
    #[error("INVALID_PATTERN: {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Catalog snapshot could not be read or parsed.
    #[error("CATALOG_ERROR: {0}")]
    Catalog(String),

    /// HTTP client could not be built or a request could not be formed.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),
}
