//! Capability-checked dispatch of logical operations to registered
//! providers.
//!
//! The dispatcher holds the live provider registry. Every operation follows
//! the same path: validate options eagerly (no I/O yet), resolve the
//! provider (named or default), check the operation's required capability
//! against the adapter's declared flag set, then delegate — with
//! read-through response caching around the chat, completion and embedding
//! calls. A missing capability fails with
//! [`BifrostError::UnsupportedFeature`] before any network call.
//!
//! # Caching
//!
//! Cache interaction is strictly best-effort: a hit short-circuits the
//! adapter call; a backend failure (or an undeserializable entry) is a miss
//! and the request proceeds. Vision, streaming and tool calls are never
//! cached.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde_json::json;
use tracing::{instrument, warn};

use super::backpressure::{DEFAULT_STREAM_BUFFER, bounded_chunk_stream};
use crate::adapter::{AdapterConfig, ChunkStream, ProviderAdapter};
use crate::cache::ResponseCache;
use crate::telemetry;
use crate::types::{
    Capabilities, ChatOptions, CompletionResponse, EmbeddingOptions, EmbeddingResponse,
    ImageSource, Message, Operation, ProviderRecord, ToolDefinition, Usage, VisionOptions,
    VisionResponse,
};
use crate::{BifrostError, Result};

/// A registered provider: its stored record plus the live adapter.
#[derive(Clone)]
struct Registered {
    record: ProviderRecord,
    adapter: Arc<dyn ProviderAdapter>,
}

/// Top-level orchestrator routing operations to registered providers.
pub struct Dispatcher {
    providers: RwLock<HashMap<String, Registered>>,
    provider_configs: RwLock<HashMap<String, AdapterConfig>>,
    default_provider: RwLock<Option<String>>,
    cache: Option<ResponseCache>,
    stream_buffer_size: usize,
}

impl Dispatcher {
    /// A dispatcher with no response cache and default stream buffering.
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            provider_configs: RwLock::new(HashMap::new()),
            default_provider: RwLock::new(None),
            cache: None,
            stream_buffer_size: DEFAULT_STREAM_BUFFER,
        }
    }

    /// Builder for configuring cache and streaming behaviour.
    pub fn builder() -> super::DispatcherBuilder {
        super::DispatcherBuilder::new()
    }

    pub(super) fn with_parts(cache: Option<ResponseCache>, stream_buffer_size: usize) -> Self {
        Self {
            cache,
            stream_buffer_size,
            ..Self::new()
        }
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Register (or overwrite) a provider, keyed by its record identifier.
    ///
    /// Any configuration previously stored for the identifier via
    /// [`set_provider_config`](Self::set_provider_config) is applied to the
    /// adapter immediately.
    pub fn register_provider(
        &self,
        record: ProviderRecord,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> Result<()> {
        let identifier = record.identifier.clone();
        if !record.active {
            warn!(provider = %identifier, "registering inactive provider record");
        }
        let stored = self
            .provider_configs
            .read()
            .expect("provider config map poisoned")
            .get(&identifier)
            .cloned();
        if let Some(config) = stored {
            adapter.configure(config)?;
        }
        self.providers
            .write()
            .expect("provider registry poisoned")
            .insert(identifier, Registered { record, adapter });
        Ok(())
    }

    /// Remove a provider from the registry.
    pub fn unregister_provider(&self, identifier: &str) {
        self.providers
            .write()
            .expect("provider registry poisoned")
            .remove(identifier);
    }

    /// Store per-identifier configuration, applying it right away when the
    /// provider is already registered.
    pub fn set_provider_config(&self, identifier: &str, config: AdapterConfig) -> Result<()> {
        let registered = self
            .providers
            .read()
            .expect("provider registry poisoned")
            .get(identifier)
            .cloned();
        if let Some(entry) = registered {
            entry.adapter.configure(config.clone())?;
        }
        self.provider_configs
            .write()
            .expect("provider config map poisoned")
            .insert(identifier.to_owned(), config);
        Ok(())
    }

    /// Set the provider used when operations name none.
    pub fn set_default_provider(&self, identifier: impl Into<String>) {
        *self
            .default_provider
            .write()
            .expect("default provider poisoned") = Some(identifier.into());
    }

    /// Registered provider identifiers.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .read()
            .expect("provider registry poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub fn has_provider(&self, identifier: &str) -> bool {
        self.providers
            .read()
            .expect("provider registry poisoned")
            .contains_key(identifier)
    }

    /// The stored record a provider was registered with.
    pub fn provider_record(&self, identifier: &str) -> Option<ProviderRecord> {
        self.providers
            .read()
            .expect("provider registry poisoned")
            .get(identifier)
            .map(|entry| entry.record.clone())
    }

    /// Resolve a provider's adapter by identifier, or the configured
    /// default when `None`.
    pub fn resolve(&self, identifier: Option<&str>) -> Result<Arc<dyn ProviderAdapter>> {
        self.resolve_entry(identifier)
            .map(|(_, entry)| entry.adapter)
    }

    /// Declared capabilities of a provider (or the default one).
    pub fn capabilities(&self, identifier: Option<&str>) -> Result<Capabilities> {
        let (_, entry) = self.resolve_entry(identifier)?;
        Ok(entry.adapter.capabilities())
    }

    /// The response cache, when one is configured — exposed so callers can
    /// flush by tag or provider.
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    fn resolve_entry(&self, identifier: Option<&str>) -> Result<(String, Registered)> {
        let identifier = match identifier {
            Some(id) => id.to_owned(),
            None => self
                .default_provider
                .read()
                .expect("default provider poisoned")
                .clone()
                .ok_or_else(|| {
                    BifrostError::ProviderNotFound(
                        "no provider named and no default configured".into(),
                    )
                })?,
        };
        let entry = self
            .providers
            .read()
            .expect("provider registry poisoned")
            .get(&identifier)
            .cloned()
            .ok_or_else(|| BifrostError::ProviderNotFound(identifier.clone()))?;
        Ok((identifier, entry))
    }

    fn ensure_capability(
        identifier: &str,
        adapter: &dyn ProviderAdapter,
        operation: Operation,
    ) -> Result<()> {
        if adapter.supports_feature(operation.required_capability()) {
            Ok(())
        } else {
            Err(BifrostError::UnsupportedFeature {
                operation: operation.as_str(),
                provider: identifier.to_owned(),
            })
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Non-streaming chat completion.
    #[instrument(skip(self, messages, options), fields(operation = "chat"))]
    pub async fn chat(
        &self,
        provider: Option<&str>,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<CompletionResponse> {
        options.validate()?;
        let (identifier, entry) = self.resolve_entry(provider)?;
        Self::ensure_capability(&identifier, entry.adapter.as_ref(), Operation::Chat)?;

        let params = json!({"messages": messages, "options": options});
        self.cached_completion(Operation::Chat, &identifier, options, params, || {
            let adapter = entry.adapter.clone();
            async move { adapter.chat_completion(messages, options).await }
        })
        .await
    }

    /// Single-prompt completion, lowered onto the chat call.
    #[instrument(skip(self, prompt, options), fields(operation = "completion"))]
    pub async fn complete(
        &self,
        provider: Option<&str>,
        prompt: &str,
        options: &ChatOptions,
    ) -> Result<CompletionResponse> {
        options.validate()?;
        let (identifier, entry) = self.resolve_entry(provider)?;
        Self::ensure_capability(&identifier, entry.adapter.as_ref(), Operation::Completion)?;

        let messages = vec![Message::user(prompt)];
        let params = json!({"prompt": prompt, "options": options});
        self.cached_completion(Operation::Completion, &identifier, options, params, || {
            let adapter = entry.adapter.clone();
            let messages = messages.clone();
            async move { adapter.chat_completion(&messages, options).await }
        })
        .await
    }

    /// Generate embeddings, one vector per input.
    #[instrument(skip(self, input, options), fields(operation = "embeddings", batch_size = input.len()))]
    pub async fn embed(
        &self,
        provider: Option<&str>,
        input: &[String],
        options: &EmbeddingOptions,
    ) -> Result<EmbeddingResponse> {
        options.validate()?;
        let (identifier, entry) = self.resolve_entry(provider)?;
        Self::ensure_capability(&identifier, entry.adapter.as_ref(), Operation::Embeddings)?;

        let params = json!({"input": input, "options": options});
        let key = ResponseCache::generate_cache_key(&identifier, Operation::Embeddings, &params);
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(Operation::Embeddings, &key).await
            && let Ok(response) = serde_json::from_value::<EmbeddingResponse>(hit)
        {
            return Ok(response);
        }

        let start = Instant::now();
        match entry.adapter.embeddings(input, options).await {
            Ok(response) => {
                Self::record_request(Operation::Embeddings, &identifier, start, true);
                if let Some(cache) = &self.cache
                    && let Ok(value) = serde_json::to_value(&response)
                {
                    cache
                        .set(&identifier, Operation::Embeddings, None, key, value, None)
                        .await;
                }
                Ok(response)
            }
            Err(e) => {
                Self::record_request(Operation::Embeddings, &identifier, start, false);
                Err(e)
            }
        }
    }

    /// Analyze an image. Never cached.
    #[instrument(skip(self, source, options), fields(operation = "vision"))]
    pub async fn analyze_image(
        &self,
        provider: Option<&str>,
        source: &ImageSource,
        options: &VisionOptions,
    ) -> Result<VisionResponse> {
        options.validate()?;
        let (identifier, entry) = self.resolve_entry(provider)?;
        Self::ensure_capability(&identifier, entry.adapter.as_ref(), Operation::Vision)?;

        let start = Instant::now();
        match entry.adapter.analyze_image(source, options).await {
            Ok(response) => {
                Self::record_request(Operation::Vision, &identifier, start, true);
                if let Some(usage) = &response.usage {
                    Self::record_token_usage(&identifier, usage);
                }
                Ok(response)
            }
            Err(e) => {
                Self::record_request(Operation::Vision, &identifier, start, false);
                Err(e)
            }
        }
    }

    /// Streaming chat completion.
    ///
    /// Returns a lazy, single-pass, forward-only sequence of text chunks,
    /// wrapped in a bounded channel for backpressure. Dropping the stream
    /// cancels production and releases the adapter's connection.
    #[instrument(skip(self, messages, options), fields(operation = "stream_chat"))]
    pub async fn stream_chat(
        &self,
        provider: Option<&str>,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChunkStream> {
        options.validate()?;
        let (identifier, entry) = self.resolve_entry(provider)?;
        Self::ensure_capability(&identifier, entry.adapter.as_ref(), Operation::StreamChat)?;

        let start = Instant::now();
        match entry.adapter.stream_chat_completion(messages, options).await {
            Ok(stream) => {
                Self::record_request(Operation::StreamChat, &identifier, start, true);
                Ok(bounded_chunk_stream(stream, self.stream_buffer_size))
            }
            Err(e) => {
                Self::record_request(Operation::StreamChat, &identifier, start, false);
                Err(e)
            }
        }
    }

    /// Chat completion with tool definitions. Never cached.
    #[instrument(skip(self, messages, tools, options), fields(operation = "chat_with_tools"))]
    pub async fn chat_with_tools(
        &self,
        provider: Option<&str>,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &ChatOptions,
    ) -> Result<CompletionResponse> {
        options.validate()?;
        let (identifier, entry) = self.resolve_entry(provider)?;
        Self::ensure_capability(&identifier, entry.adapter.as_ref(), Operation::ChatWithTools)?;

        let start = Instant::now();
        match entry
            .adapter
            .chat_completion_with_tools(messages, tools, options)
            .await
        {
            Ok(response) => {
                Self::record_request(Operation::ChatWithTools, &identifier, start, true);
                if let Some(usage) = &response.usage {
                    Self::record_token_usage(&identifier, usage);
                }
                Ok(response)
            }
            Err(e) => {
                Self::record_request(Operation::ChatWithTools, &identifier, start, false);
                Err(e)
            }
        }
    }

    // ========================================================================
    // Shared read-through path for the completion family
    // ========================================================================

    async fn cached_completion<F, Fut>(
        &self,
        operation: Operation,
        identifier: &str,
        options: &ChatOptions,
        params: serde_json::Value,
        call: F,
    ) -> Result<CompletionResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CompletionResponse>>,
    {
        let key = ResponseCache::generate_cache_key(identifier, operation, &params);
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(operation, &key).await
            && let Ok(response) = serde_json::from_value::<CompletionResponse>(hit)
        {
            return Ok(response);
        }

        let start = Instant::now();
        match call().await {
            Ok(response) => {
                Self::record_request(operation, identifier, start, true);
                if let Some(usage) = &response.usage {
                    Self::record_token_usage(identifier, usage);
                }
                if let Some(cache) = &self.cache
                    && let Ok(value) = serde_json::to_value(&response)
                {
                    cache
                        .set(
                            identifier,
                            operation,
                            options.model.as_deref(),
                            key,
                            value,
                            None,
                        )
                        .await;
                }
                Ok(response)
            }
            Err(e) => {
                Self::record_request(operation, identifier, start, false);
                Err(e)
            }
        }
    }

    // ========================================================================
    // Metrics recording
    // ========================================================================

    fn record_request(operation: Operation, provider: &str, start: Instant, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        let elapsed = start.elapsed().as_secs_f64();
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => provider.to_owned(),
            "operation" => operation.as_str(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => provider.to_owned(),
            "operation" => operation.as_str(),
        )
        .record(elapsed);
    }

    fn record_token_usage(provider: &str, usage: &Usage) {
        metrics::counter!(telemetry::TOKENS_TOTAL,
            "provider" => provider.to_owned(),
            "direction" => "prompt",
        )
        .increment(u64::from(usage.prompt_tokens));
        metrics::counter!(telemetry::TOKENS_TOTAL,
            "provider" => provider.to_owned(),
            "direction" => "completion",
        )
        .increment(u64::from(usage.completion_tokens));
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
