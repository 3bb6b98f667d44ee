//! Tests for model selection: criteria matching, ranking tie-breaks and
//! fixed-mode resolution.

use std::sync::Arc;

use bifrost::{
    AdapterType, ConfigurationRecord, GenerationParams, ModelCapability, ModelCriteria,
    ModelRecord, ModelSelectionService, ModelSource, ProviderRecord, SelectionMode,
};

// ============================================================================
// Fixtures
// ============================================================================

struct StaticModels(Vec<ModelRecord>);

impl ModelSource for StaticModels {
    fn active_models(&self) -> Vec<ModelRecord> {
        self.0.clone()
    }
}

fn service(models: Vec<ModelRecord>) -> ModelSelectionService {
    ModelSelectionService::new(Arc::new(StaticModels(models)))
}

fn provider(identifier: &str, adapter_type: AdapterType, priority: u8) -> ProviderRecord {
    ProviderRecord::new(identifier, adapter_type).priority(priority)
}

fn chat_model(identifier: &str, priority: u8) -> ModelRecord {
    ModelRecord::new(
        identifier,
        provider(&format!("prov-{identifier}"), AdapterType::OpenAi, priority),
        format!("{identifier}-v1"),
    )
    .with_capability(ModelCapability::Chat)
}

// ============================================================================
// Fixed mode
// ============================================================================

#[test]
fn fixed_mode_returns_bound_model_verbatim() {
    // the source has no models at all — fixed mode must not care
    let selection = service(vec![]);
    let bound = chat_model("pinned", 10);
    let config = ConfigurationRecord::fixed("cfg", bound, GenerationParams::default()).unwrap();

    let resolved = selection.resolve_model(&config).unwrap();
    assert_eq!(resolved.identifier, "pinned");
}

#[test]
fn criteria_mode_consults_the_source() {
    let selection = service(vec![chat_model("active", 50)]);
    let config = ConfigurationRecord::criteria(
        "cfg",
        ModelCriteria::new().require(ModelCapability::Chat),
        GenerationParams::default(),
    )
    .unwrap();

    let resolved = selection.resolve_model(&config).unwrap();
    assert_eq!(resolved.identifier, "active");
}

#[test]
fn criteria_mode_with_no_match_is_none() {
    let selection = service(vec![chat_model("chat-only", 50)]);
    let config = ConfigurationRecord::criteria(
        "cfg",
        ModelCriteria::new().require(ModelCapability::Audio),
        GenerationParams::default(),
    )
    .unwrap();

    assert!(selection.resolve_model(&config).is_none());
    assert!(matches!(config.mode, SelectionMode::Criteria(_)));
}

// ============================================================================
// Criteria filters
// ============================================================================

#[test]
fn capability_filter_uses_and_semantics() {
    let chat = chat_model("just-chat", 50);
    let multimodal = chat_model("multimodal", 50)
        .with_capability(ModelCapability::Vision)
        .with_capability(ModelCapability::Tools);
    let selection = service(vec![chat, multimodal]);

    let criteria = ModelCriteria::new()
        .require(ModelCapability::Chat)
        .require(ModelCapability::Vision);
    let matches = selection.find_matching_models(&criteria);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "multimodal");
}

#[test]
fn adapter_type_filter() {
    let openai = chat_model("on-openai", 50);
    let local = ModelRecord::new(
        "on-ollama",
        provider("local", AdapterType::Ollama, 50),
        "llama3",
    )
    .with_capability(ModelCapability::Chat);
    let selection = service(vec![openai, local]);

    let criteria = ModelCriteria::new()
        .require(ModelCapability::Chat)
        .allow_adapter_types(vec![AdapterType::Ollama]);
    let matches = selection.find_matching_models(&criteria);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "on-ollama");
}

#[test]
fn unknown_context_is_excluded_when_minimum_given() {
    let unknown = chat_model("unknown-ctx", 50); // context_length = 0
    let small = chat_model("small-ctx", 50).context_length(8_000);
    let big = chat_model("big-ctx", 50).context_length(200_000);
    let selection = service(vec![unknown, small, big]);

    let criteria = ModelCriteria::new()
        .require(ModelCapability::Chat)
        .min_context_length(32_000);
    let matches = selection.find_matching_models(&criteria);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "big-ctx");
}

#[test]
fn known_cost_above_maximum_is_excluded() {
    let pricey = chat_model("pricey", 50).cost_per_mtok(30.0, 60.0);
    let cheap = chat_model("cheap", 50).cost_per_mtok(0.5, 1.5);
    let selection = service(vec![pricey, cheap]);

    let criteria = ModelCriteria::new()
        .require(ModelCapability::Chat)
        .max_input_cost(1.0);
    let matches = selection.find_matching_models(&criteria);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].identifier, "cheap");
}

#[test]
fn unknown_cost_is_never_excluded_on_cost_grounds() {
    let unpriced = chat_model("unpriced", 50); // input cost 0 = unknown
    let selection = service(vec![unpriced]);

    let criteria = ModelCriteria::new()
        .require(ModelCapability::Chat)
        .max_input_cost(0.25);
    assert_eq!(selection.find_matching_models(&criteria).len(), 1);
}

// ============================================================================
// Ranking
// ============================================================================

#[test]
fn cost_tie_break_between_equal_priority_models() {
    // model A: priority 80, cost 10 + 5 = 15; model B: priority 80, cost 5 + 5 = 10
    let a = chat_model("model-a", 80).cost_per_mtok(10.0, 5.0).sort_order(0);
    let b = chat_model("model-b", 80).cost_per_mtok(5.0, 5.0).sort_order(1);

    // prefer_lowest_cost = true: B wins
    let selection = service(vec![a.clone(), b.clone()]);
    let criteria = ModelCriteria::new()
        .require(ModelCapability::Chat)
        .prefer_lowest_cost(true);
    assert_eq!(
        selection.find_matching_model(&criteria).unwrap().identifier,
        "model-b"
    );

    // prefer_lowest_cost = false: cost is ignored, sort order decides
    let criteria = ModelCriteria::new().require(ModelCapability::Chat);
    assert_eq!(
        selection.find_matching_model(&criteria).unwrap().identifier,
        "model-a"
    );
}

#[test]
fn priority_outranks_cost() {
    let premium = chat_model("premium", 90).cost_per_mtok(30.0, 60.0);
    let budget = chat_model("budget", 40).cost_per_mtok(0.1, 0.2);
    let selection = service(vec![budget, premium]);

    let criteria = ModelCriteria::new()
        .require(ModelCapability::Chat)
        .prefer_lowest_cost(true);
    assert_eq!(
        selection.find_matching_model(&criteria).unwrap().identifier,
        "premium"
    );
}

#[test]
fn unpriced_model_sorts_after_priced_when_cost_preferred() {
    let unpriced = chat_model("unpriced", 50).sort_order(0);
    let priced = chat_model("priced", 50).cost_per_mtok(30.0, 60.0).sort_order(1);
    let selection = service(vec![unpriced, priced]);

    let criteria = ModelCriteria::new()
        .require(ModelCapability::Chat)
        .prefer_lowest_cost(true);
    let ranked = selection.find_matching_models(&criteria);
    assert_eq!(ranked[0].identifier, "priced");
    assert_eq!(ranked[1].identifier, "unpriced");
}

#[test]
fn default_flag_then_sort_order_decide_final_ties() {
    let third = chat_model("third", 50).sort_order(9);
    let second = chat_model("second", 50).sort_order(2);
    let first = chat_model("first", 50).sort_order(5).is_default(true);
    let selection = service(vec![third, second, first]);

    let criteria = ModelCriteria::new().require(ModelCapability::Chat);
    let ranked = selection.find_matching_models(&criteria);
    let ids: Vec<&str> = ranked.iter().map(|m| m.identifier.as_str()).collect();
    assert_eq!(ids, ["first", "second", "third"]);
}

#[test]
fn ranking_is_deterministic() {
    let models = vec![
        chat_model("a", 50).cost_per_mtok(1.0, 1.0),
        chat_model("b", 50).cost_per_mtok(1.0, 1.0),
        chat_model("c", 80),
        chat_model("d", 50).is_default(true),
    ];
    let selection = service(models);
    let criteria = ModelCriteria::new()
        .require(ModelCapability::Chat)
        .prefer_lowest_cost(true);

    let first_run: Vec<String> = selection
        .find_matching_models(&criteria)
        .into_iter()
        .map(|m| m.identifier)
        .collect();
    let second_run: Vec<String> = selection
        .find_matching_models(&criteria)
        .into_iter()
        .map(|m| m.identifier)
        .collect();

    assert_eq!(first_run, second_run);
}

#[test]
fn equal_on_all_keys_preserves_source_order() {
    // stable sort: two fully tied models keep their relative order
    let x = chat_model("x", 50);
    let y = chat_model("y", 50);
    let selection = service(vec![x, y]);

    let criteria = ModelCriteria::new().require(ModelCapability::Chat);
    let ranked = selection.find_matching_models(&criteria);
    assert_eq!(ranked[0].identifier, "x");
    assert_eq!(ranked[1].identifier, "y");
}
