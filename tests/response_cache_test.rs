//! Tests for the response cache: keyed storage, tag invalidation and TTL
//! behaviour.

use std::time::Duration;

use serde_json::json;

use bifrost::cache::{DEFAULT_COMPLETION_TTL, DEFAULT_EMBEDDING_TTL, GROUP_TAG, ResponseCache};
use bifrost::Operation;

fn key_for(provider: &str, operation: Operation) -> String {
    ResponseCache::generate_cache_key(provider, operation, &json!({"input": "hello"}))
}

// ============================================================================
// Keyed storage
// ============================================================================

#[tokio::test]
async fn miss_returns_none() {
    let cache = ResponseCache::in_memory();
    assert!(cache.get(Operation::Chat, "no-such-key").await.is_none());
}

#[tokio::test]
async fn set_then_get() {
    let cache = ResponseCache::in_memory();
    let key = key_for("p1", Operation::Chat);
    cache
        .set("p1", Operation::Chat, None, key.clone(), json!({"content": "hi"}), None)
        .await;

    let value = cache.get(Operation::Chat, &key).await.unwrap();
    assert_eq!(value["content"], "hi");
}

#[tokio::test]
async fn has_and_remove() {
    let cache = ResponseCache::in_memory();
    let key = key_for("p1", Operation::Completion);
    cache
        .set("p1", Operation::Completion, None, key.clone(), json!(1), None)
        .await;

    assert!(cache.has(&key).await);
    cache.remove(&key).await;
    assert!(!cache.has(&key).await);
}

#[tokio::test]
async fn overwrite_replaces_value() {
    let cache = ResponseCache::in_memory();
    let key = key_for("p1", Operation::Chat);
    cache
        .set("p1", Operation::Chat, None, key.clone(), json!(1), None)
        .await;
    cache
        .set("p1", Operation::Chat, None, key.clone(), json!(2), None)
        .await;

    assert_eq!(cache.get(Operation::Chat, &key).await.unwrap(), json!(2));
}

// ============================================================================
// Tag invalidation
// ============================================================================

#[tokio::test]
async fn flush_by_provider_only_hits_that_provider() {
    let cache = ResponseCache::in_memory();
    let key_a = key_for("provider-a", Operation::Chat);
    let key_b = key_for("provider-b", Operation::Chat);
    cache
        .set("provider-a", Operation::Chat, None, key_a.clone(), json!("a"), None)
        .await;
    cache
        .set("provider-b", Operation::Chat, None, key_b.clone(), json!("b"), None)
        .await;

    cache.flush_by_provider("provider-a").await;

    assert!(!cache.has(&key_a).await);
    assert!(cache.has(&key_b).await);
}

#[tokio::test]
async fn flush_by_operation_tag() {
    let cache = ResponseCache::in_memory();
    let chat_key = key_for("p", Operation::Chat);
    let embed_key = key_for("p", Operation::Embeddings);
    cache
        .set("p", Operation::Chat, None, chat_key.clone(), json!("c"), None)
        .await;
    cache
        .set("p", Operation::Embeddings, None, embed_key.clone(), json!("e"), None)
        .await;

    cache.flush_by_tag("op:embeddings").await;

    assert!(cache.has(&chat_key).await);
    assert!(!cache.has(&embed_key).await);
}

#[tokio::test]
async fn flush_by_model_tag() {
    let cache = ResponseCache::in_memory();
    let with_model = key_for("p", Operation::Completion);
    let without_model = key_for("p", Operation::Chat);
    cache
        .set(
            "p",
            Operation::Completion,
            Some("gpt-4o-mini"),
            with_model.clone(),
            json!(1),
            None,
        )
        .await;
    cache
        .set("p", Operation::Chat, None, without_model.clone(), json!(2), None)
        .await;

    cache.flush_by_tag("model:gpt-4o-mini").await;

    assert!(!cache.has(&with_model).await);
    assert!(cache.has(&without_model).await);
}

#[tokio::test]
async fn group_tag_covers_everything() {
    let cache = ResponseCache::in_memory();
    let key_a = key_for("a", Operation::Chat);
    let key_b = key_for("b", Operation::Embeddings);
    cache
        .set("a", Operation::Chat, None, key_a.clone(), json!(1), None)
        .await;
    cache
        .set("b", Operation::Embeddings, None, key_b.clone(), json!(2), None)
        .await;

    cache.flush_by_tag(GROUP_TAG).await;

    assert!(!cache.has(&key_a).await);
    assert!(!cache.has(&key_b).await);
}

#[tokio::test]
async fn flush_unknown_tag_is_a_noop() {
    let cache = ResponseCache::in_memory();
    let key = key_for("p", Operation::Chat);
    cache
        .set("p", Operation::Chat, None, key.clone(), json!(1), None)
        .await;

    cache.flush_by_tag("provider:never-registered").await;
    assert!(cache.has(&key).await);
}

#[tokio::test]
async fn flush_all_empties_the_cache() {
    let cache = ResponseCache::in_memory();
    let key = key_for("p", Operation::Chat);
    cache
        .set("p", Operation::Chat, None, key.clone(), json!(1), None)
        .await;

    cache.flush_all().await;
    assert!(!cache.has(&key).await);
}

// ============================================================================
// TTL behaviour
// ============================================================================

#[test]
fn default_ttls_per_operation() {
    let cache = ResponseCache::in_memory();
    assert_eq!(
        cache.default_ttl(Operation::Embeddings),
        DEFAULT_EMBEDDING_TTL
    );
    assert_eq!(cache.default_ttl(Operation::Chat), DEFAULT_COMPLETION_TTL);
    assert_eq!(
        cache.default_ttl(Operation::Completion),
        DEFAULT_COMPLETION_TTL
    );
    assert_eq!(DEFAULT_EMBEDDING_TTL, Duration::from_secs(24 * 60 * 60));
    assert_eq!(DEFAULT_COMPLETION_TTL, Duration::from_secs(60 * 60));
}

#[tokio::test]
async fn entries_expire_after_their_ttl() {
    let cache = ResponseCache::in_memory()
        .with_ttls(Duration::from_millis(50), Duration::from_millis(50));
    let key = key_for("p", Operation::Chat);
    cache
        .set("p", Operation::Chat, None, key.clone(), json!(1), None)
        .await;

    assert!(cache.has(&key).await);
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(!cache.has(&key).await);
}

#[tokio::test]
async fn explicit_ttl_overrides_default() {
    let cache = ResponseCache::in_memory();
    let key = key_for("p", Operation::Chat);
    cache
        .set(
            "p",
            Operation::Chat,
            None,
            key.clone(),
            json!(1),
            Some(Duration::from_millis(50)),
        )
        .await;

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(!cache.has(&key).await);
}

// ============================================================================
// Key derivation (integration-level)
// ============================================================================

#[test]
fn key_commutativity_over_nested_permutations() {
    let a = ResponseCache::generate_cache_key(
        "p",
        Operation::Chat,
        &json!({
            "options": {"temperature": 0.7, "max_tokens": 100},
            "messages": [{"role": "user", "content": "hi"}]
        }),
    );
    let b = ResponseCache::generate_cache_key(
        "p",
        Operation::Chat,
        &json!({
            "messages": [{"content": "hi", "role": "user"}],
            "options": {"max_tokens": 100, "temperature": 0.7}
        }),
    );
    assert_eq!(a, b);
}

#[test]
fn stream_and_user_fields_do_not_affect_the_key() {
    let bare = ResponseCache::generate_cache_key("p", Operation::Chat, &json!({"q": 1}));
    let noisy = ResponseCache::generate_cache_key(
        "p",
        Operation::Chat,
        &json!({"q": 1, "stream": true, "user": "abc"}),
    );
    assert_eq!(bare, noisy);
}

#[test]
fn provider_and_operation_always_change_the_key() {
    let params = json!({"q": 1});
    let base = ResponseCache::generate_cache_key("p1", Operation::Chat, &params);
    assert_ne!(
        base,
        ResponseCache::generate_cache_key("p2", Operation::Chat, &params)
    );
    assert_ne!(
        base,
        ResponseCache::generate_cache_key("p1", Operation::Completion, &params)
    );
}
