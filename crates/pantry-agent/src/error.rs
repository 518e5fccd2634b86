use thiserror::Error;

/// Errors returned by the external collaborator clients.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Network or TLS failure, or a non-2xx status, from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream service answered but reported a failure.
    #[error("upstream API error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The client was built with an unusable base URL.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A required credential is missing from the configuration.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}
