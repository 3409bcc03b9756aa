//! Error types for pushkodi.
//!
//! This module defines all error types that can occur while bridging pushes to Kodi.

use crate::template::TemplateError;
use thiserror::Error;

/// Errors that can occur while handling a push.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Failed to show a notification.
    #[error("Failed to send notification: {0}")]
    SendFailed(String),

    /// Failed to parse or resolve configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A push could not be decoded or lacks a field its handler needs.
    #[error("Invalid push: {0}")]
    InvalidMessage(String),

    /// Command template could not be rendered.
    #[error("Template rendering error: {0}")]
    Template(#[from] TemplateError),

    /// Kodi answered a JSON-RPC request with an error object.
    #[error("JSON-RPC error: {0}")]
    Rpc(String),

    /// HTTP transport to Kodi failed.
    #[error("Network request failed: {0}")]
    Network(String),

    /// Icon decoding or writing failed.
    #[error("Image error: {0}")]
    Image(String),
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Formats an error together with its whole `source()` chain.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\n  caused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_includes_sources() {
        let err = BridgeError::Template(TemplateError::MissingPlaceholder("params[0]".to_string()));
        let chain = error_chain(&err);
        assert!(chain.starts_with("Template rendering error: "));
        assert!(chain.contains("\n  caused by: "));
    }

    #[test]
    fn test_template_error_converts() {
        let err: BridgeError = TemplateError::MissingPlaceholder("params[3]".to_string()).into();
        assert!(err.to_string().contains("params[3]"));
    }
}
