//! Response types returned by adapters.

use serde::{Deserialize, Serialize};

use super::tool::ToolCall;
use crate::{BifrostError, Result};

/// Non-streaming chat/completion response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub finish_reason: FinishReason,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason the model stopped generating
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    #[default]
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
}

/// A single embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Position in the request batch this vector corresponds to.
    pub index: usize,
}

impl Embedding {
    pub fn new(values: Vec<f32>, index: usize) -> Self {
        Self { values, index }
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    /// Cosine similarity with another embedding.
    ///
    /// Returns a value in [-1, 1]. Mismatched dimensions are a validation
    /// error; a zero-magnitude vector yields 0.0 rather than dividing by zero.
    pub fn cosine_similarity(&self, other: &Embedding) -> Result<f32> {
        if self.values.len() != other.values.len() {
            return Err(BifrostError::Validation(format!(
                "embedding dimensions do not match: {} vs {}",
                self.values.len(),
                other.values.len()
            )));
        }
        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += f64::from(*a) * f64::from(*b);
            norm_a += f64::from(*a) * f64::from(*a);
            norm_b += f64::from(*b) * f64::from(*b);
        }
        if norm_a == 0.0 || norm_b == 0.0 {
            return Ok(0.0);
        }
        Ok((dot / (norm_a.sqrt() * norm_b.sqrt())) as f32)
    }
}

/// Embedding response — one vector per input, in request order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embeddings: Vec<Embedding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Vision (image analysis) response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisionResponse {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Outcome of a provider connection probe.
///
/// Always a value, never an error — see
/// [`AdapterFactory::test_provider_connection`](crate::adapter::AdapterFactory::test_provider_connection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTest {
    pub success: bool,
    pub message: String,
    /// Model ids the provider reported, when the probe lists them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
}

impl ConnectionTest {
    /// A successful probe.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            models: None,
        }
    }

    /// A failed probe.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            models: None,
        }
    }

    /// Attach the model list the probe reported.
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = Some(models);
        self
    }
}
