//! Stored configuration records: generation presets bound to a fixed model
//! or to declarative selection criteria.

use serde::{Deserialize, Serialize};

use super::capabilities::ModelCapability;
use super::model::ModelRecord;
use super::options::ChatOptions;
use super::provider::AdapterType;
use crate::Result;

/// Generation parameters stored on a configuration or template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
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
    pub system_prompt: Option<String>,
}

impl GenerationParams {
    /// Validate ranges eagerly; same rules as [`ChatOptions::validate`].
    pub fn validate(&self) -> Result<()> {
        self.to_chat_options().validate()
    }

    /// Lower into request options, for dispatch.
    pub fn to_chat_options(&self) -> ChatOptions {
        ChatOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            frequency_penalty: self.frequency_penalty,
            presence_penalty: self.presence_penalty,
            system_prompt: self.system_prompt.clone(),
            ..Default::default()
        }
    }
}

/// Declarative model-selection criteria.
///
/// All requirements are conjunctive: a model must satisfy every stated
/// criterion to be a candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCriteria {
    /// Capabilities the model must all declare (AND semantics).
    #[serde(default)]
    pub required_capabilities: Vec<ModelCapability>,
    /// Restrict candidates to these adapter types, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_adapter_types: Option<Vec<AdapterType>>,
    /// Minimum context window in tokens. Models with unknown (0) context
    /// are excluded when this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_context_length: Option<u32>,
    /// Maximum USD per million input tokens. Models with unknown (0) cost
    /// are never excluded on cost grounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_input_cost: Option<f64>,
    /// Prefer cheaper models among equal-priority candidates.
    #[serde(default)]
    pub prefer_lowest_cost: bool,
}

impl ModelCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, cap: ModelCapability) -> Self {
        if !self.required_capabilities.contains(&cap) {
            self.required_capabilities.push(cap);
        }
        self
    }

    pub fn allow_adapter_types(mut self, types: Vec<AdapterType>) -> Self {
        self.allowed_adapter_types = Some(types);
        self
    }

    pub fn min_context_length(mut self, tokens: u32) -> Self {
        self.min_context_length = Some(tokens);
        self
    }

    pub fn max_input_cost(mut self, usd_per_mtok: f64) -> Self {
        self.max_input_cost = Some(usd_per_mtok);
        self
    }

    pub fn prefer_lowest_cost(mut self, prefer: bool) -> Self {
        self.prefer_lowest_cost = prefer;
        self
    }
}

/// How a configuration picks its model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// A bound model reference, returned verbatim.
    Fixed(ModelRecord),
    /// Dynamic resolution over the active model set.
    Criteria(ModelCriteria),
}

/// A stored configuration record: a named preset binding generation
/// parameters to either a fixed model or selection criteria.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationRecord {
    pub name: String,
    pub mode: SelectionMode,
    pub params: GenerationParams,
}

impl ConfigurationRecord {
    /// Build a fixed-model configuration. Parameters are validated eagerly.
    pub fn fixed(
        name: impl Into<String>,
        model: ModelRecord,
        params: GenerationParams,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            mode: SelectionMode::Fixed(model),
            params,
        })
    }

    /// Build a criteria-driven configuration. Parameters are validated
    /// eagerly.
    pub fn criteria(
        name: impl Into<String>,
        criteria: ModelCriteria,
        params: GenerationParams,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            mode: SelectionMode::Criteria(criteria),
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BifrostError;
    use crate::types::provider::ProviderRecord;

    #[test]
    fn fixed_configuration_validates_params() {
        let model = ModelRecord::new(
            "m",
            ProviderRecord::new("p", AdapterType::OpenAi),
            "m-1",
        );
        let bad = GenerationParams {
            temperature: Some(9.0),
            ..Default::default()
        };
        let err = ConfigurationRecord::fixed("cfg", model, bad);
        assert!(matches!(err, Err(BifrostError::Validation(_))));
    }

    #[test]
    fn criteria_builder_dedupes_capabilities() {
        let criteria = ModelCriteria::new()
            .require(ModelCapability::Chat)
            .require(ModelCapability::Chat);
        assert_eq!(criteria.required_capabilities.len(), 1);
    }
}
