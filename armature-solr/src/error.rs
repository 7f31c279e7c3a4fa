//! Error types for Solr operations.

use thiserror::Error;

/// Solr client error type.
#[derive(Error, Debug)]
pub enum SolrError {
    /// Network or transport failure reported by a [`Transport`](crate::Transport).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Failure raised by the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a structured body of the wrong shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The query cannot be sent (missing `q`, unusable paging values).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Client configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A document cannot be expressed as an update message.
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// XML encoding or decoding error.
    #[error("XML error: {0}")]
    Xml(String),

    /// URL parsing error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl SolrError {
    /// Check if this error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http(_))
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}

/// Result type alias for Solr operations.
pub type Result<T> = std::result::Result<T, SolrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(SolrError::Transport("connection refused".into()).is_transport());
        assert!(!SolrError::malformed("missing responseHeader").is_transport());
        assert!(!SolrError::InvalidQuery("q".into()).is_timeout());
    }

    #[test]
    fn test_display() {
        let err = SolrError::malformed("odd-length facet list");
        assert_eq!(err.to_string(), "Malformed response: odd-length facet list");
    }
}
