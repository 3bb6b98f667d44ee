//! Bifrost error types

use std::time::Duration;

/// Bifrost error types
#[derive(Debug, thiserror::Error)]
pub enum BifrostError {
    // Resolution errors
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    #[error("provider configuration error: {0}")]
    ProviderConfiguration(String),

    /// The resolved provider does not declare the capability the requested
    /// operation needs. Raised by the dispatcher before any network call.
    #[error("provider '{provider}' does not support {operation}")]
    UnsupportedFeature {
        operation: &'static str,
        provider: String,
    },

    // Input errors
    #[error("validation error: {0}")]
    Validation(String),

    // Template errors
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("missing template variables: {}", names.join(", "))]
    MissingVariables { names: Vec<String> },

    #[error("template parse error: {0}")]
    TemplateParse(String),

    // Provider/transport errors, surfaced unmodified from the adapter
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    // Streaming errors
    #[error("stream error: {0}")]
    Stream(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache backend failure. Never escapes the dispatch path — the
    /// response cache treats it as a miss / no-op store.
    #[error("cache error: {0}")]
    Cache(String),
}

impl BifrostError {
    /// Stable machine-checkable code for this error.
    ///
    /// Codes are part of the public contract: callers match on them instead
    /// of parsing display strings.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProviderNotFound(_) => "provider_not_found",
            Self::ProviderConfiguration(_) => "provider_configuration",
            Self::UnsupportedFeature { .. } => "unsupported_feature",
            Self::Validation(_) => "validation",
            Self::TemplateNotFound(_) => "template_not_found",
            Self::MissingVariables { .. } => "missing_variables",
            Self::TemplateParse(_) => "template_parse",
            Self::Http(_) => "http",
            Self::Api { .. } => "api",
            Self::RateLimited { .. } => "rate_limited",
            Self::AuthenticationFailed => "authentication_failed",
            Self::Stream(_) => "stream",
            Self::Json(_) => "json",
            Self::Cache(_) => "cache",
        }
    }

    /// Whether the error is transient and a retry at the transport layer
    /// could plausibly succeed.
    ///
    /// The core never retries; the classification is carried through for
    /// transports and callers that run their own retry loops.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for bifrost operations
pub type Result<T> = std::result::Result<T, BifrostError>;
