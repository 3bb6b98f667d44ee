//! Dynamic model selection over stored model records.
//!
//! [`ModelSelectionService`] resolves a
//! [`ConfigurationRecord`](crate::types::ConfigurationRecord) to a concrete
//! model: fixed mode returns the bound model verbatim, criteria mode filters
//! and ranks the active model set supplied by an external [`ModelSource`].
//!
//! # Ranking
//!
//! Surviving candidates are ordered by one stable sort with tie-break keys:
//!
//! 1. provider priority, descending
//! 2. combined input+output cost, ascending — only when
//!    `prefer_lowest_cost` is set, with unknown cost remapped to
//!    `f64::INFINITY` so unpriced models never win for looking free
//! 3. the provider-default flag, true first
//! 4. the explicit sort-order field, ascending
//!
//! The sort is stable, so an unchanged candidate list always ranks
//! identically. An empty candidate set resolves to `None`, never an error.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::types::{ConfigurationRecord, ModelCriteria, ModelRecord, SelectionMode};

/// External supplier of active model records.
///
/// Implemented by the persistence layer; records are consumed as immutable
/// value snapshots.
pub trait ModelSource: Send + Sync {
    /// All models currently eligible for selection (active providers only).
    fn active_models(&self) -> Vec<ModelRecord>;
}

/// Criteria evaluation and ranking over a supplied model set.
pub struct ModelSelectionService {
    source: Arc<dyn ModelSource>,
}

impl ModelSelectionService {
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self { source }
    }

    /// Resolve the model a configuration should use.
    ///
    /// Fixed mode returns the bound model and never consults criteria.
    pub fn resolve_model(&self, configuration: &ConfigurationRecord) -> Option<ModelRecord> {
        match &configuration.mode {
            SelectionMode::Fixed(model) => Some(model.clone()),
            SelectionMode::Criteria(criteria) => self.find_matching_model(criteria),
        }
    }

    /// Best-matching active model for the criteria, or `None`.
    pub fn find_matching_model(&self, criteria: &ModelCriteria) -> Option<ModelRecord> {
        self.find_matching_models(criteria).into_iter().next()
    }

    /// All matching active models, best first.
    pub fn find_matching_models(&self, criteria: &ModelCriteria) -> Vec<ModelRecord> {
        let mut candidates: Vec<ModelRecord> = self
            .source
            .active_models()
            .into_iter()
            .filter(|model| Self::model_matches_criteria(model, criteria))
            .collect();

        debug!(candidates = candidates.len(), "model criteria evaluated");

        candidates.sort_by(|a, b| Self::rank(a, b, criteria.prefer_lowest_cost));
        candidates
    }

    /// Whether a model satisfies every stated criterion.
    ///
    /// Exclusion rules:
    /// - missing any required capability (AND semantics)
    /// - provider adapter type outside the allowed list, when one is given
    /// - context length unknown (0) or below the minimum, when one is given
    /// - known input cost above the maximum, when one is given — unknown
    ///   cost (0) is never excluded on cost grounds
    pub fn model_matches_criteria(model: &ModelRecord, criteria: &ModelCriteria) -> bool {
        for cap in &criteria.required_capabilities {
            if !model.has_capability(*cap) {
                return false;
            }
        }

        if let Some(allowed) = &criteria.allowed_adapter_types
            && !allowed.contains(&model.provider.adapter_type)
        {
            return false;
        }

        if let Some(min_context) = criteria.min_context_length
            && (model.context_length == 0 || model.context_length < min_context)
        {
            return false;
        }

        if let Some(max_cost) = criteria.max_input_cost
            && model.input_cost_per_mtok > 0.0
            && model.input_cost_per_mtok > max_cost
        {
            return false;
        }

        true
    }

    /// Tie-break comparator for the ranking sort.
    fn rank(a: &ModelRecord, b: &ModelRecord, prefer_lowest_cost: bool) -> Ordering {
        b.provider
            .priority
            .cmp(&a.provider.priority)
            .then_with(|| {
                if prefer_lowest_cost {
                    a.combined_cost().total_cmp(&b.combined_cost())
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| b.is_default.cmp(&a.is_default))
            .then_with(|| a.sort_order.cmp(&b.sort_order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdapterType, ModelCapability, ProviderRecord};

    fn model(id: &str, priority: u8) -> ModelRecord {
        let provider = ProviderRecord::new(format!("provider-{id}"), AdapterType::OpenAi)
            .priority(priority);
        ModelRecord::new(id, provider, format!("{id}-v1"))
            .with_capability(ModelCapability::Chat)
    }

    struct FixedSource(Vec<ModelRecord>);

    impl ModelSource for FixedSource {
        fn active_models(&self) -> Vec<ModelRecord> {
            self.0.clone()
        }
    }

    #[test]
    fn priority_wins_over_everything() {
        let service = ModelSelectionService::new(Arc::new(FixedSource(vec![
            model("low", 10).cost_per_mtok(0.1, 0.1),
            model("high", 90).cost_per_mtok(50.0, 50.0),
        ])));
        let criteria = ModelCriteria::new()
            .require(ModelCapability::Chat)
            .prefer_lowest_cost(true);
        let selected = service.find_matching_model(&criteria).unwrap();
        assert_eq!(selected.identifier, "high");
    }

    #[test]
    fn cost_only_consulted_when_preferred() {
        let expensive = model("expensive", 50).cost_per_mtok(10.0, 5.0).sort_order(0);
        let cheap = model("cheap", 50).cost_per_mtok(5.0, 5.0).sort_order(1);

        // prefer_lowest_cost off: cost ignored, sort_order decides
        let service = ModelSelectionService::new(Arc::new(FixedSource(vec![
            cheap.clone(),
            expensive.clone(),
        ])));
        let criteria = ModelCriteria::new().require(ModelCapability::Chat);
        assert_eq!(
            service.find_matching_model(&criteria).unwrap().identifier,
            "expensive"
        );

        // prefer_lowest_cost on: cheap wins
        let criteria = criteria.prefer_lowest_cost(true);
        assert_eq!(
            service.find_matching_model(&criteria).unwrap().identifier,
            "cheap"
        );
    }

    #[test]
    fn unpriced_model_never_wins_on_cost() {
        let unpriced = model("unpriced", 50);
        let priced = model("priced", 50).cost_per_mtok(30.0, 60.0);
        let service = ModelSelectionService::new(Arc::new(FixedSource(vec![
            unpriced, priced,
        ])));
        let criteria = ModelCriteria::new()
            .require(ModelCapability::Chat)
            .prefer_lowest_cost(true);
        assert_eq!(
            service.find_matching_model(&criteria).unwrap().identifier,
            "priced"
        );
    }

    #[test]
    fn default_flag_breaks_remaining_ties() {
        let plain = model("plain", 50);
        let default = model("default", 50).is_default(true);
        let service =
            ModelSelectionService::new(Arc::new(FixedSource(vec![plain, default])));
        let criteria = ModelCriteria::new().require(ModelCapability::Chat);
        assert_eq!(
            service.find_matching_model(&criteria).unwrap().identifier,
            "default"
        );
    }
}
