//! Stored model records.

use serde::{Deserialize, Serialize};

use super::capabilities::ModelCapability;
use super::provider::ProviderRecord;

/// A stored model record — a specific LLM offered by a provider, with
/// capabilities, limits and pricing.
///
/// Cost fields use 0.0 as "unknown". Unknown is never the same as free:
/// ranking remaps unknown combined cost to `f64::INFINITY` so unpriced
/// models are never preferred for appearing cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    pub identifier: String,
    /// Owning provider, as an immutable value snapshot.
    pub provider: ProviderRecord,
    /// Provider-side model id (e.g. "gpt-4o-mini").
    pub provider_model_id: String,
    pub capabilities: Vec<ModelCapability>,
    /// Context window in tokens; 0 = unknown.
    pub context_length: u32,
    /// Maximum output tokens; 0 = unknown.
    pub max_output_tokens: u32,
    /// USD per million input tokens; 0.0 = unknown.
    pub input_cost_per_mtok: f64,
    /// USD per million output tokens; 0.0 = unknown.
    pub output_cost_per_mtok: f64,
    /// At most one model per provider carries this flag (enforced by the
    /// persistence layer, consumed as a given here).
    pub is_default: bool,
    /// Explicit ordering within a provider's model list.
    pub sort_order: i32,
}

impl ModelRecord {
    pub fn new(
        identifier: impl Into<String>,
        provider: ProviderRecord,
        provider_model_id: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            provider,
            provider_model_id: provider_model_id.into(),
            capabilities: Vec::new(),
            context_length: 0,
            max_output_tokens: 0,
            input_cost_per_mtok: 0.0,
            output_cost_per_mtok: 0.0,
            is_default: false,
            sort_order: 0,
        }
    }

    pub fn with_capability(mut self, cap: ModelCapability) -> Self {
        if !self.capabilities.contains(&cap) {
            self.capabilities.push(cap);
        }
        self
    }

    pub fn with_capabilities(mut self, caps: impl IntoIterator<Item = ModelCapability>) -> Self {
        for cap in caps {
            self = self.with_capability(cap);
        }
        self
    }

    pub fn context_length(mut self, tokens: u32) -> Self {
        self.context_length = tokens;
        self
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn cost_per_mtok(mut self, input: f64, output: f64) -> Self {
        self.input_cost_per_mtok = input;
        self.output_cost_per_mtok = output;
        self
    }

    pub fn is_default(mut self, default: bool) -> Self {
        self.is_default = default;
        self
    }

    pub fn sort_order(mut self, order: i32) -> Self {
        self.sort_order = order;
        self
    }

    pub fn has_capability(&self, cap: ModelCapability) -> bool {
        self.capabilities.contains(&cap)
    }

    /// Combined input+output cost per million tokens, for ranking.
    ///
    /// Returns `f64::INFINITY` if either side is unknown (0.0), so models
    /// with missing pricing data sort last among equals.
    pub fn combined_cost(&self) -> f64 {
        if self.input_cost_per_mtok == 0.0 || self.output_cost_per_mtok == 0.0 {
            return f64::INFINITY;
        }
        self.input_cost_per_mtok + self.output_cost_per_mtok
    }
}
