//! Request options for dispatch operations.
//!
//! All option types validate eagerly: out-of-range generation parameters
//! are rejected before any network I/O happens.

use serde::{Deserialize, Serialize};

use super::tool::ToolChoice;
use crate::{BifrostError, Result};

/// Options for chat and completion requests (provider-agnostic)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Provider-side model id. `None` uses the adapter's configured default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Request structured JSON output where the model supports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_mode: Option<bool>,

    // Escape hatch for truly provider-specific options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl ChatOptions {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.top_p = Some(p);
        self
    }

    pub fn frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    pub fn presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn json_mode(mut self, on: bool) -> Self {
        self.json_mode = Some(on);
        self
    }

    /// Validate generation parameters.
    ///
    /// Called by the dispatcher before resolving a provider; a failure here
    /// means no network call was attempted.
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.temperature {
            validate_range("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range("top_p", p, 0.0, 1.0)?;
        }
        if let Some(p) = self.frequency_penalty {
            validate_range("frequency_penalty", p, -2.0, 2.0)?;
        }
        if let Some(p) = self.presence_penalty {
            validate_range("presence_penalty", p, -2.0, 2.0)?;
        }
        if self.max_tokens == Some(0) {
            return Err(BifrostError::Validation(
                "max_tokens must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Options for embedding requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Requested output dimensionality, for models that support truncation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl EmbeddingOptions {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn dimensions(mut self, dims: usize) -> Self {
        self.dimensions = Some(dims);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimensions == Some(0) {
            return Err(BifrostError::Validation(
                "dimensions must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Options for vision (image analysis) requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisionOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Prompt accompanying the image (e.g. "describe this diagram").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl VisionOptions {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == Some(0) {
            return Err(BifrostError::Validation(
                "max_tokens must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn validate_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(BifrostError::Validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}
