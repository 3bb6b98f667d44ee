//! Deterministic, tag-invalidatable response cache.
//!
//! [`ResponseCache`] sits in the dispatcher above the adapter call: chat,
//! completion and embedding responses are stored under a key that is a pure
//! function of (provider id, operation, normalized parameters). Key
//! derivation recursively sorts every nested object's keys and strips the
//! operation-irrelevant `stream` and `user` fields, so two semantically
//! identical requests always collapse to one entry regardless of map
//! insertion order.
//!
//! # Tags
//!
//! Every entry carries at least the generic group tag and an operation tag,
//! plus a provider tag, plus a model tag when the caller supplied one.
//! [`ResponseCache::flush_by_tag`] removes every entry sharing a label
//! without knowing individual keys; flushing a provider is sugar for its
//! provider tag.
//!
//! # TTL defaults
//!
//! Embeddings default to 24 hours — embedding identical input is
//! deterministic. Completions default to 1 hour.
//!
//! # Degradation
//!
//! Caching is strictly best-effort. A failing [`CacheStore`] degrades to a
//! miss on read and a no-op on write; the primary request path never fails
//! or waits on the cache. Concurrent `set` and `flush_by_tag` on
//! overlapping tags may interleave so that a flush misses an in-flight set
//! — accepted eventual-consistency looseness.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::telemetry;
use crate::types::Operation;

/// Generic group tag attached to every cached response.
pub const GROUP_TAG: &str = "ai-response";

/// Default TTL for completion-family responses (1 hour).
pub const DEFAULT_COMPLETION_TTL: Duration = Duration::from_secs(60 * 60);

/// Default TTL for embedding responses (24 hours).
pub const DEFAULT_EMBEDDING_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default maximum number of entries in the in-memory store.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Operation-scoped tag (e.g. `op:embeddings`).
pub fn operation_tag(operation: Operation) -> String {
    format!("op:{operation}")
}

/// Provider-scoped tag (e.g. `provider:openai-main`).
pub fn provider_tag(provider_id: &str) -> String {
    format!("provider:{provider_id}")
}

/// Model-scoped tag (e.g. `model:gpt-4o-mini`).
pub fn model_tag(model: &str) -> String {
    format!("model:{model}")
}

/// A cached response with its tag set and lifetime.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub tags: Vec<String>,
    pub ttl: Duration,
}

/// Storage backend for the response cache.
///
/// The default is the in-memory [`MemoryStore`]; shared backends (redis
/// etc.) implement the same trait and are injected via
/// [`ResponseCache::new`]. Errors from a backend are contained by
/// [`ResponseCache`] — see module docs.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;
    async fn insert(&self, key: String, entry: CacheEntry) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    /// Remove every entry carrying the tag.
    async fn invalidate_tag(&self, tag: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Per-entry TTL policy for the moka cache.
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory [`CacheStore`] on moka, with a tag index for invalidation.
///
/// The tag index may retain keys whose entries already expired; invalidating
/// an absent key is a no-op, so stale index entries are harmless and get
/// cleaned up on the next tag flush.
pub struct MemoryStore {
    entries: moka::future::Cache<String, CacheEntry>,
    tags: Mutex<HashMap<String, HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max: u64) -> Self {
        Self {
            entries: moka::future::Cache::builder()
                .max_capacity(max)
                .expire_after(EntryExpiry)
                .build(),
            tags: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.get(key).await)
    }

    async fn insert(&self, key: String, entry: CacheEntry) -> Result<()> {
        {
            let mut tags = self.tags.lock().expect("tag index poisoned");
            for tag in &entry.tags {
                tags.entry(tag.clone()).or_default().insert(key.clone());
            }
        }
        self.entries.insert(key, entry).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.invalidate(key).await;
        Ok(())
    }

    async fn invalidate_tag(&self, tag: &str) -> Result<()> {
        let keys = {
            let mut tags = self.tags.lock().expect("tag index poisoned");
            tags.remove(tag).unwrap_or_default()
        };
        for key in keys {
            self.entries.invalidate(&key).await;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.invalidate_all();
        self.tags.lock().expect("tag index poisoned").clear();
        Ok(())
    }
}

/// Tag-indexed, best-effort response cache with deterministic keys.
pub struct ResponseCache {
    store: Box<dyn CacheStore>,
    completion_ttl: Duration,
    embedding_ttl: Duration,
}

impl ResponseCache {
    /// Cache over a custom storage backend.
    pub fn new(store: Box<dyn CacheStore>) -> Self {
        Self {
            store,
            completion_ttl: DEFAULT_COMPLETION_TTL,
            embedding_ttl: DEFAULT_EMBEDDING_TTL,
        }
    }

    /// Cache over the default in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Override the default TTLs.
    pub fn with_ttls(mut self, completion: Duration, embedding: Duration) -> Self {
        self.completion_ttl = completion;
        self.embedding_ttl = embedding;
        self
    }

    /// Default TTL applied when `set` receives no explicit TTL.
    pub fn default_ttl(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Embeddings => self.embedding_ttl,
            _ => self.completion_ttl,
        }
    }

    /// Derive the cache key for a request.
    ///
    /// Pure function of (provider id, operation, normalized params): nested
    /// object keys are sorted recursively and the `stream`/`user` fields are
    /// stripped before hashing, so insertion order never affects the key.
    /// Changing the provider or operation always changes the key.
    pub fn generate_cache_key(provider_id: &str, operation: Operation, params: &Value) -> String {
        let canonical = canonical_params(params);
        let mut hasher = DefaultHasher::new();
        provider_id.hash(&mut hasher);
        operation.as_str().hash(&mut hasher);
        canonical.hash(&mut hasher);
        format!("{provider_id}:{operation}:{:016x}", hasher.finish())
    }

    /// Look up a cached response. Backend failure is a miss.
    pub async fn get(&self, operation: Operation, key: &str) -> Option<Value> {
        match self.store.get(key).await {
            Ok(Some(entry)) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "operation" => operation.as_str())
                    .increment(1);
                Some(entry.value)
            }
            Ok(None) => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => operation.as_str())
                    .increment(1);
                None
            }
            Err(e) => {
                debug!(error = %e, "cache read failed, treating as miss");
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => operation.as_str())
                    .increment(1);
                None
            }
        }
    }

    /// Store a response. Backend failure is a no-op.
    ///
    /// Attaches the group tag, an operation tag and a provider tag, plus a
    /// model tag when `model` is given. `ttl: None` applies the operation's
    /// default.
    pub async fn set(
        &self,
        provider_id: &str,
        operation: Operation,
        model: Option<&str>,
        key: String,
        value: Value,
        ttl: Option<Duration>,
    ) {
        let mut tags = vec![
            GROUP_TAG.to_owned(),
            operation_tag(operation),
            provider_tag(provider_id),
        ];
        if let Some(model) = model {
            tags.push(model_tag(model));
        }
        let entry = CacheEntry {
            value,
            tags,
            ttl: ttl.unwrap_or_else(|| self.default_ttl(operation)),
        };
        if let Err(e) = self.store.insert(key, entry).await {
            debug!(error = %e, "cache write failed, response not stored");
        }
    }

    /// Whether a key currently resolves to an entry.
    pub async fn has(&self, key: &str) -> bool {
        matches!(self.store.get(key).await, Ok(Some(_)))
    }

    /// Remove one entry by key.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            debug!(error = %e, "cache remove failed");
        }
    }

    /// Remove every entry carrying the tag.
    pub async fn flush_by_tag(&self, tag: &str) {
        if let Err(e) = self.store.invalidate_tag(tag).await {
            debug!(error = %e, tag, "cache tag flush failed");
        }
    }

    /// Remove every entry cached for a provider.
    pub async fn flush_by_provider(&self, provider_id: &str) {
        self.flush_by_tag(&provider_tag(provider_id)).await;
    }

    /// Remove everything.
    pub async fn flush_all(&self) {
        if let Err(e) = self.store.clear().await {
            debug!(error = %e, "cache clear failed");
        }
    }
}

/// Canonical serialization of request parameters.
///
/// Object keys are emitted sorted at every nesting level; array order is
/// preserved (it is semantic). The top-level `stream` and `user` fields are
/// stripped — they do not affect the response content.
fn canonical_params(params: &Value) -> String {
    const STRIPPED: [&str; 2] = ["stream", "user"];
    let mut out = String::new();
    match params {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map
                .keys()
                .filter(|k| !STRIPPED.contains(&k.as_str()))
                .collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], &mut out);
            }
            out.push('}');
        }
        other => write_canonical(other, &mut out),
    }
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_sorts_nested_keys() {
        let a = canonical_params(&json!({"b": {"y": 1, "x": 2}, "a": 3}));
        let b = canonical_params(&json!({"a": 3, "b": {"x": 2, "y": 1}}));
        assert_eq!(a, b);
        assert_eq!(a, r#"{"a":3,"b":{"x":2,"y":1}}"#);
    }

    #[test]
    fn canonical_preserves_array_order() {
        let a = canonical_params(&json!({"items": [1, 2]}));
        let b = canonical_params(&json!({"items": [2, 1]}));
        assert_ne!(a, b);
    }

    #[test]
    fn canonical_strips_stream_and_user() {
        let a = canonical_params(&json!({"prompt": "hi", "stream": true, "user": "u-1"}));
        let b = canonical_params(&json!({"prompt": "hi"}));
        assert_eq!(a, b);
    }

    #[test]
    fn key_is_insertion_order_invariant() {
        let a = ResponseCache::generate_cache_key(
            "p1",
            Operation::Chat,
            &json!({"temperature": 0.7, "messages": [{"role": "user", "content": "hi"}]}),
        );
        let b = ResponseCache::generate_cache_key(
            "p1",
            Operation::Chat,
            &json!({"messages": [{"content": "hi", "role": "user"}], "temperature": 0.7}),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn key_changes_with_provider_and_operation() {
        let params = json!({"prompt": "hi"});
        let base = ResponseCache::generate_cache_key("p1", Operation::Completion, &params);
        assert_ne!(
            base,
            ResponseCache::generate_cache_key("p2", Operation::Completion, &params)
        );
        assert_ne!(
            base,
            ResponseCache::generate_cache_key("p1", Operation::Chat, &params)
        );
    }
}
