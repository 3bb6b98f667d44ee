//! Adapter contract and collaborator traits.
//!
//! Concrete wire adapters live outside this crate — one per vendor dialect,
//! translating the uniform [`ProviderAdapter`] call contract into a
//! provider-specific HTTP exchange. The core only ever talks to the trait.
//!
//! Two further seams are injected into the factory:
//! - [`SecretStore`] exchanges an opaque credential reference for a real
//!   secret at adapter-construction time. The resolved value is wrapped in
//!   [`SecretString`] so it can never be logged through `Debug`.
//! - [`AdapterConstructor`] turns an [`AdapterClass`] plus an
//!   [`AdapterConfig`] into a live adapter instance. This is where the
//!   embedder plugs in its HTTP transport.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;
use secrecy::SecretString;

use crate::Result;
use crate::types::{
    Capabilities, ChatOptions, CompletionResponse, ConnectionTest, EmbeddingOptions,
    EmbeddingResponse, ImageSource, Message, ToolDefinition, VisionOptions, VisionResponse,
};

/// A lazy, single-pass, forward-only sequence of response text chunks.
///
/// Production is driven by the transport delivering bytes; the sequence ends
/// when the server terminates its stream. Dropping the stream releases the
/// underlying connection — there is no separate cancellation token.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// The uniform call contract every vendor adapter implements.
///
/// Retries and timeouts are wholly the adapter's concern, driven by the
/// values in its [`AdapterConfig`]; the dispatch core carries them through
/// and never retries itself.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Adapter name for logging/debugging.
    fn name(&self) -> &str;

    /// Capability flags this adapter declares. The dispatcher gates every
    /// operation on this set before delegating.
    fn capabilities(&self) -> Capabilities;

    /// Feature-flag query by canonical capability name.
    fn supports_feature(&self, feature: &str) -> bool {
        self.capabilities().supports(feature)
    }

    /// Whether the adapter is configured well enough to attempt requests
    /// (credential present, endpoint known). No network round-trip.
    fn is_available(&self) -> bool {
        true
    }

    /// Re-apply configuration to a live instance.
    ///
    /// Implementations use interior mutability; instances are shared as
    /// `Arc<dyn ProviderAdapter>`.
    fn configure(&self, config: AdapterConfig) -> Result<()>;

    /// Non-streaming chat completion.
    async fn chat_completion(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<CompletionResponse>;

    /// Generate embeddings, one vector per input in request order.
    async fn embeddings(
        &self,
        input: &[String],
        options: &EmbeddingOptions,
    ) -> Result<EmbeddingResponse>;

    /// Analyze an image.
    async fn analyze_image(
        &self,
        source: &ImageSource,
        options: &VisionOptions,
    ) -> Result<VisionResponse>;

    /// Streaming chat completion.
    async fn stream_chat_completion(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChunkStream>;

    /// Chat completion with tool definitions the model may call.
    async fn chat_completion_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: &ChatOptions,
    ) -> Result<CompletionResponse>;

    /// Connection probe — a real network round-trip.
    ///
    /// May return `Err`; the factory's
    /// [`test_provider_connection`](super::AdapterFactory::test_provider_connection)
    /// normalizes any error into a failed [`ConnectionTest`].
    async fn test_connection(&self) -> Result<ConnectionTest>;
}

/// Configuration handed to an adapter at construction (and re-applied via
/// [`ProviderAdapter::configure`]).
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Resolved API key. Absent for providers that need none (e.g. local
    /// Ollama).
    pub api_key: Option<SecretString>,
    /// Effective endpoint: the record's custom endpoint, else the adapter
    /// type's default.
    pub endpoint: String,
    /// Provider-side model id to use when a request names none. Set to the
    /// model's specific id when the adapter was built for a model.
    pub model: Option<String>,
    /// Request timeout in seconds (≥ 1).
    pub timeout_secs: u64,
    /// Max transport retries (0 = single attempt).
    pub max_retries: u32,
    /// Organization/project id, for vendors that scope keys.
    pub organization: Option<String>,
    /// Free-form provider options merged from the record.
    pub options: serde_json::Value,
}

/// The built-in adapter implementations the factory can ask a constructor
/// for.
///
/// Most OpenAI-dialect vendors (OpenRouter, Mistral, Groq, Azure, custom
/// endpoints) share the `OpenAiCompatible` implementation and differ only
/// in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterClass {
    OpenAi,
    OpenAiCompatible,
    Anthropic,
    Gemini,
    Ollama,
}

/// Opaque secret resolution — exchanges a stored credential reference for
/// the real secret.
///
/// The resolved value must not be cached or logged beyond the construction
/// call that consumed it; `SecretString` redacts it from `Debug` output.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn retrieve(&self, reference: &str) -> Result<Option<SecretString>>;
}

/// Transport-construction collaborator: builds a live adapter for a class
/// and configuration.
pub trait AdapterConstructor: Send + Sync {
    fn construct(
        &self,
        class: AdapterClass,
        config: AdapterConfig,
    ) -> Result<Arc<dyn ProviderAdapter>>;
}
