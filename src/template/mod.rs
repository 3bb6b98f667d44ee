//! Prompt template storage, rendering, versioning and usage statistics.
//!
//! Templates are stored records (external [`TemplateStore`]) whose prompt
//! bodies use the template language in [`parser`]. The service validates
//! that every required variable is supplied — reporting *all* missing names
//! at once — before any substitution happens, and merges per-call generation
//! parameters over the template's stored defaults.

mod parser;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tracing::instrument;

use crate::telemetry;
use crate::types::GenerationParams;
use crate::{BifrostError, Result};

/// A stored prompt template record.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PromptTemplate {
    pub identifier: String,
    /// Monotonically increasing per identifier lineage.
    pub version: u32,
    /// The version this one was cloned from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_version: Option<u32>,
    pub system_prompt: String,
    pub user_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(default)]
    pub default_params: GenerationParams,
    pub active: bool,
    #[serde(default)]
    pub stats: TemplateStats,
}

impl PromptTemplate {
    pub fn new(
        identifier: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            version: 1,
            parent_version: None,
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            default_model: None,
            default_params: GenerationParams::default(),
            active: true,
            stats: TemplateStats::default(),
        }
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn default_params(mut self, params: GenerationParams) -> Self {
        self.default_params = params;
        self
    }
}

/// Running aggregate statistics for a template.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemplateStats {
    pub usage_count: u64,
    pub avg_response_time_ms: f64,
    pub avg_tokens: f64,
    pub avg_quality: f64,
}

impl TemplateStats {
    /// Fold one observation into the running means.
    pub fn record(&mut self, response_time_ms: f64, tokens: f64, quality: f64) {
        let n = self.usage_count as f64;
        self.avg_response_time_ms = (self.avg_response_time_ms * n + response_time_ms) / (n + 1.0);
        self.avg_tokens = (self.avg_tokens * n + tokens) / (n + 1.0);
        self.avg_quality = (self.avg_quality * n + quality) / (n + 1.0);
        self.usage_count += 1;
    }
}

/// Named field overrides for [`PromptTemplateService::create_version`].
///
/// Unknown field names are rejected, not silently ignored — a typo in an
/// override map must surface, not produce an unchanged clone.
#[derive(Debug, Clone, Default)]
pub struct TemplateOverrides {
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub default_model: Option<String>,
    pub default_params: Option<GenerationParams>,
    pub active: Option<bool>,
}

impl TemplateOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn user_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.user_prompt = Some(prompt.into());
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn default_params(mut self, params: GenerationParams) -> Self {
        self.default_params = Some(params);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Build overrides from a by-name map (e.g. deserialized admin input).
    ///
    /// Unknown field names are a validation error.
    pub fn from_map(map: &serde_json::Map<String, Value>) -> Result<Self> {
        let mut overrides = Self::new();
        for (name, value) in map {
            match name.as_str() {
                "system_prompt" => {
                    overrides.system_prompt = Some(parse_field(name, value)?);
                }
                "user_prompt" => {
                    overrides.user_prompt = Some(parse_field(name, value)?);
                }
                "default_model" => {
                    overrides.default_model = Some(parse_field(name, value)?);
                }
                "default_params" => {
                    overrides.default_params = Some(parse_field(name, value)?);
                }
                "active" => {
                    overrides.active = Some(parse_field(name, value)?);
                }
                unknown => {
                    return Err(BifrostError::Validation(format!(
                        "unknown template field '{unknown}'"
                    )));
                }
            }
        }
        Ok(overrides)
    }

    fn apply(&self, template: &mut PromptTemplate) {
        if let Some(prompt) = &self.system_prompt {
            template.system_prompt = prompt.clone();
        }
        if let Some(prompt) = &self.user_prompt {
            template.user_prompt = prompt.clone();
        }
        if let Some(model) = &self.default_model {
            template.default_model = Some(model.clone());
        }
        if let Some(params) = &self.default_params {
            template.default_params = params.clone();
        }
        if let Some(active) = self.active {
            template.active = active;
        }
    }
}

fn parse_field<T: serde::de::DeserializeOwned>(name: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| BifrostError::Validation(format!("invalid value for '{name}': {e}")))
}

/// External template persistence.
///
/// Implemented by the storage layer; the service reads records as value
/// snapshots and writes back through [`TemplateStore::save`].
pub trait TemplateStore: Send + Sync {
    /// The active version for an identifier, if any.
    fn find_active(&self, identifier: &str) -> Option<PromptTemplate>;
    /// The highest version in the identifier's lineage, if any.
    fn find_latest(&self, identifier: &str) -> Option<PromptTemplate>;
    fn save(&self, template: &PromptTemplate) -> Result<()>;
}

/// Per-call generation parameter overrides for [`PromptTemplateService::render`].
///
/// Fields left unset fall back to the template's stored defaults.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

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
}

/// A rendered template: materialized prompts plus the effective generation
/// parameters after fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrompt {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// Template lookup, rendering, versioning and usage statistics.
pub struct PromptTemplateService {
    store: Arc<dyn TemplateStore>,
}

impl PromptTemplateService {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        Self { store }
    }

    /// Render the active template for `identifier`.
    ///
    /// Fails with [`BifrostError::TemplateNotFound`] when no active version
    /// exists, and with [`BifrostError::MissingVariables`] — listing every
    /// missing name — before any substitution happens.
    #[instrument(skip(self, variables, options))]
    pub fn render(
        &self,
        identifier: &str,
        variables: &HashMap<String, Value>,
        options: &RenderOptions,
    ) -> Result<RenderedPrompt> {
        let template = self
            .store
            .find_active(identifier)
            .ok_or_else(|| BifrostError::TemplateNotFound(identifier.to_owned()))?;

        let system_nodes = parser::parse(&template.system_prompt)?;
        let user_nodes = parser::parse(&template.user_prompt)?;

        let mut required = BTreeSet::new();
        parser::collect_variables(&system_nodes, &mut required);
        parser::collect_variables(&user_nodes, &mut required);

        let missing: Vec<String> = required
            .iter()
            .filter(|name| !variables.contains_key(*name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(BifrostError::MissingVariables { names: missing });
        }

        metrics::counter!(
            telemetry::TEMPLATE_RENDERS_TOTAL,
            "template" => identifier.to_owned()
        )
        .increment(1);

        Ok(RenderedPrompt {
            system_prompt: parser::render(&system_nodes, variables),
            user_prompt: parser::render(&user_nodes, variables),
            model: options.model.clone().or(template.default_model),
            temperature: options.temperature.or(template.default_params.temperature),
            max_tokens: options.max_tokens.or(template.default_params.max_tokens),
            top_p: options.top_p.or(template.default_params.top_p),
        })
    }

    /// The variable names a template's bodies require, sorted.
    pub fn required_variables(&self, template: &PromptTemplate) -> Result<Vec<String>> {
        let mut required = BTreeSet::new();
        parser::collect_variables(&parser::parse(&template.system_prompt)?, &mut required);
        parser::collect_variables(&parser::parse(&template.user_prompt)?, &mut required);
        Ok(required.into_iter().collect())
    }

    /// Create the next version in a template lineage.
    ///
    /// Copies every field from the latest version, increments the version
    /// counter, links the parent version, applies the overrides and persists
    /// the result.
    pub fn create_version(
        &self,
        identifier: &str,
        overrides: TemplateOverrides,
    ) -> Result<PromptTemplate> {
        let latest = self
            .store
            .find_latest(identifier)
            .ok_or_else(|| BifrostError::TemplateNotFound(identifier.to_owned()))?;

        let mut next = latest.clone();
        next.version = latest.version + 1;
        next.parent_version = Some(latest.version);
        overrides.apply(&mut next);

        self.store.save(&next)?;
        Ok(next)
    }

    /// Fold one usage observation into the active template's running means
    /// and persist the updated record.
    pub fn record_usage(
        &self,
        identifier: &str,
        response_time_ms: f64,
        tokens_used: u32,
        quality_score: f64,
    ) -> Result<()> {
        let mut template = self
            .store
            .find_active(identifier)
            .ok_or_else(|| BifrostError::TemplateNotFound(identifier.to_owned()))?;
        template
            .stats
            .record(response_time_ms, f64::from(tokens_used), quality_score);
        self.store.save(&template)
    }
}
