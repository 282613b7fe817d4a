//! Tool error types

use thiserror::Error;

/// Errors that can occur inside a tool
///
/// These never leave a tool directly; they are folded into an error `ToolResult`.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("URL refused: domain '{domain}' is not on the trusted allow-list. Allowed: {allowed}")]
    DomainNotAllowed { domain: String, allowed: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("URL must use http or https, got '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("HTTP error {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Response too large (> {limit} bytes)")]
    ResponseTooLarge { limit: usize },

    #[error("Document index error: {0}")]
    Index(String),

    #[error("Search engine {engine} failed: {message}")]
    Search { engine: String, message: String },

    #[error("Tool not found: {name}")]
    UnknownTool { name: String },

    #[error("Tool {name} timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    #[error("Search refused: no domain restriction could be built from the allow-list")]
    UnrestrictedSearch,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
