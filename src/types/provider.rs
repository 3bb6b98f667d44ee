//! Stored provider records and adapter-type tags.

use serde::{Deserialize, Serialize};

use crate::{BifrostError, Result};

/// Adapter type tag — which wire dialect a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterType {
    OpenAi,
    Anthropic,
    Gemini,
    OpenRouter,
    Mistral,
    Groq,
    Ollama,
    AzureOpenAi,
    Custom,
}

impl AdapterType {
    /// Canonical tag string, as stored in provider records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
            Self::Mistral => "mistral",
            Self::Groq => "groq",
            Self::Ollama => "ollama",
            Self::AzureOpenAi => "azure_openai",
            Self::Custom => "custom",
        }
    }

    /// Default API endpoint for this adapter type.
    ///
    /// `None` for types that have no sensible default (Azure deployments and
    /// custom endpoints are always caller-supplied).
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::Anthropic => Some("https://api.anthropic.com/v1"),
            Self::Gemini => Some("https://generativelanguage.googleapis.com/v1beta"),
            Self::OpenRouter => Some("https://openrouter.ai/api/v1"),
            Self::Mistral => Some("https://api.mistral.ai/v1"),
            Self::Groq => Some("https://api.groq.com/openai/v1"),
            Self::Ollama => Some("http://localhost:11434"),
            Self::AzureOpenAi | Self::Custom => None,
        }
    }
}

impl std::str::FromStr for AdapterType {
    type Err = BifrostError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "gemini" => Ok(Self::Gemini),
            "openrouter" => Ok(Self::OpenRouter),
            "mistral" => Ok(Self::Mistral),
            "groq" => Ok(Self::Groq),
            "ollama" => Ok(Self::Ollama),
            "azure_openai" => Ok(Self::AzureOpenAi),
            "custom" => Ok(Self::Custom),
            other => Err(BifrostError::ProviderConfiguration(format!(
                "unknown adapter type tag '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for AdapterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored provider record — a configured API connection.
///
/// Owned by the external persistence layer; the core reads it by value and
/// never mutates or persists it. The `credential_ref` field is an opaque
/// reference resolved through a [`SecretStore`](crate::adapter::SecretStore)
/// at adapter construction time, never a raw secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRecord {
    /// Persisted numeric id. `None` for records that were never saved —
    /// their adapter instances are not cached.
    pub id: Option<i64>,
    /// Unique human-chosen identifier (e.g. "openai-main").
    pub identifier: String,
    pub adapter_type: AdapterType,
    /// Custom endpoint; falls back to the adapter type's default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Opaque credential reference for the secret store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Request timeout in seconds, ≥ 1.
    pub timeout_secs: u64,
    /// Max transport retries, passed through to the adapter.
    pub max_retries: u32,
    /// 0–100; higher wins ties in model selection.
    pub priority: u8,
    pub active: bool,
    /// Free-form options merged into the adapter configuration.
    #[serde(default)]
    pub options: serde_json::Value,
}

impl ProviderRecord {
    /// Create a record with defaults: 30s timeout, 3 retries, priority 50,
    /// active.
    pub fn new(identifier: impl Into<String>, adapter_type: AdapterType) -> Self {
        Self {
            id: None,
            identifier: identifier.into(),
            adapter_type,
            endpoint: None,
            credential_ref: None,
            organization: None,
            timeout_secs: 30,
            max_retries: 3,
            priority: 50,
            active: true,
            options: serde_json::Value::Null,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn credential_ref(mut self, reference: impl Into<String>) -> Self {
        self.credential_ref = Some(reference.into());
        self
    }

    pub fn organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority.min(100);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    /// Effective endpoint: the custom endpoint when set, otherwise the
    /// adapter type's default.
    ///
    /// Types without a default (Azure, custom) must carry an explicit
    /// endpoint.
    pub fn effective_endpoint(&self) -> Result<String> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }
        self.adapter_type
            .default_endpoint()
            .map(str::to_owned)
            .ok_or_else(|| {
                BifrostError::ProviderConfiguration(format!(
                    "provider '{}' has adapter type '{}' which requires an explicit endpoint",
                    self.identifier, self.adapter_type
                ))
            })
    }
}
