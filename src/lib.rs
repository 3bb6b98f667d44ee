//! Bifrost — provider resolution and dispatch for interchangeable AI
//! backends.
//!
//! This crate routes chat, completion, embedding and vision requests
//! through any of several interchangeable backend providers via one uniform
//! call surface. Which backend and model to use is resolved from stored
//! configuration records rather than caller-supplied literals, and
//! responses are cached to avoid redundant network calls.
//!
//! The pieces compose like this:
//!
//! - [`Dispatcher`] holds the live provider registry, resolves a provider
//!   by identifier (or the configured default), verifies the requested
//!   operation's capability and delegates to the adapter — with
//!   read-through caching around chat, completion and embedding calls.
//! - [`AdapterFactory`](adapter::AdapterFactory) turns stored
//!   [`ProviderRecord`]s into live, configured
//!   [`ProviderAdapter`](adapter::ProviderAdapter) instances with
//!   instance-level reuse.
//! - [`ModelSelectionService`] picks the best-matching model from
//!   declarative criteria over the active model set.
//! - [`ResponseCache`] derives deterministic keys and supports
//!   tag-based invalidation.
//! - [`PromptTemplateService`](template::PromptTemplateService)
//!   materializes prompts from versioned templates with variable
//!   substitution, conditionals and loops.
//!
//! Persistence of the records, the concrete vendor wire adapters and
//! secret storage are external collaborators behind trait seams.
//!
//! # Model selection example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bifrost::{
//!     AdapterType, ModelCapability, ModelCriteria, ModelRecord, ModelSelectionService,
//!     ModelSource, ProviderRecord,
//! };
//!
//! struct StaticModels(Vec<ModelRecord>);
//!
//! impl ModelSource for StaticModels {
//!     fn active_models(&self) -> Vec<ModelRecord> {
//!         self.0.clone()
//!     }
//! }
//!
//! let provider = ProviderRecord::new("openai-main", AdapterType::OpenAi).priority(80);
//! let model = ModelRecord::new("gpt-4o-mini", provider, "gpt-4o-mini")
//!     .with_capability(ModelCapability::Chat)
//!     .context_length(128_000)
//!     .cost_per_mtok(0.15, 0.60);
//!
//! let selection = ModelSelectionService::new(Arc::new(StaticModels(vec![model])));
//! let criteria = ModelCriteria::new()
//!     .require(ModelCapability::Chat)
//!     .prefer_lowest_cost(true);
//! assert_eq!(
//!     selection.find_matching_model(&criteria).unwrap().identifier,
//!     "gpt-4o-mini"
//! );
//! ```
//!
//! # Dispatch example
//!
//! ```rust,ignore
//! use bifrost::{ChatOptions, Dispatcher, Message, ResponseCache};
//!
//! let dispatcher = Dispatcher::builder()
//!     .response_cache(ResponseCache::in_memory())
//!     .default_provider("openai-main")
//!     .build();
//! dispatcher.register_provider(record, adapter)?;
//!
//! let response = dispatcher
//!     .chat(
//!         None,
//!         &[Message::user("What is the capital of France?")],
//!         &ChatOptions::default().temperature(0.2),
//!     )
//!     .await?;
//! println!("{}", response.content);
//! ```

pub mod adapter;
pub mod cache;
pub mod error;
pub mod gateway;
pub mod selection;
pub mod telemetry;
pub mod template;
pub mod types;

// Re-export main types at crate root
pub use adapter::{
    AdapterCache, AdapterClass, AdapterConfig, AdapterConstructor, AdapterFactory, ChunkStream,
    ProviderAdapter, SecretStore,
};
pub use cache::{CacheStore, MemoryStore, ResponseCache};
pub use error::{BifrostError, Result};
pub use gateway::{DEFAULT_STREAM_BUFFER, Dispatcher, DispatcherBuilder};
pub use selection::{ModelSelectionService, ModelSource};
pub use template::{
    PromptTemplate, PromptTemplateService, RenderOptions, RenderedPrompt, TemplateOverrides,
    TemplateStats, TemplateStore,
};

// Re-export all types
pub use types::{
    AdapterType, Capabilities, ChatOptions, CompletionResponse, ConfigurationRecord,
    ConnectionTest, ContentPart, Embedding, EmbeddingOptions, EmbeddingResponse, FinishReason,
    GenerationParams, ImageSource, Message, MessageContent, ModelCapability, ModelCriteria,
    ModelRecord, Operation, ProviderRecord, Role, SelectionMode, ToolCall, ToolChoice,
    ToolDefinition, Usage, VisionOptions, VisionResponse,
};
