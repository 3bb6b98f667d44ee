//! Adapter factory: stored provider records → live, configured adapters.
//!
//! The factory owns three decisions:
//!
//! 1. **Which implementation** serves an adapter-type tag: a
//!    caller-extensible override registry is consulted first, then the fixed
//!    built-in map. Tags with no dedicated implementation fall back to the
//!    OpenAI-compatible adapter — logged as a warning, never an error, so
//!    custom and Azure endpoints work without bespoke code.
//! 2. **What configuration** the instance gets: credential resolved through
//!    the injected [`SecretStore`], effective endpoint (custom or type
//!    default), timeout/retries/organization, merged free-form options.
//! 3. **Instance reuse**: instances are cached in an explicit, injected
//!    [`AdapterCache`] keyed by `(provider id, model id)`. A model-specific
//!    adapter is its own entry — it never mutates the provider-generic
//!    cached instance, so concurrent callers requesting different models on
//!    one provider cannot observe each other's model override.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::traits::{
    AdapterClass, AdapterConfig, AdapterConstructor, ProviderAdapter, SecretStore,
};
use crate::types::{AdapterType, ConnectionTest, ModelRecord, ProviderRecord};
use crate::{BifrostError, Result};

/// Cache key: persisted provider id plus the model-specific id the instance
/// was configured for (`None` = provider-generic instance).
type CacheKey = (i64, Option<String>);

/// Explicit, injectable adapter instance cache.
///
/// Never ambient static state — tests construct a fresh cache per run.
/// Concurrent first-population for the same key is benign: construction is
/// idempotent, last writer wins, the earlier instance is simply dropped.
#[derive(Default)]
pub struct AdapterCache {
    inner: Mutex<HashMap<CacheKey, Arc<dyn ProviderAdapter>>>,
}

impl AdapterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, provider_id: i64, model: Option<&str>) -> Option<Arc<dyn ProviderAdapter>> {
        let key = (provider_id, model.map(str::to_owned));
        self.inner.lock().expect("adapter cache poisoned").get(&key).cloned()
    }

    pub fn insert(
        &self,
        provider_id: i64,
        model: Option<&str>,
        adapter: Arc<dyn ProviderAdapter>,
    ) {
        let key = (provider_id, model.map(str::to_owned));
        self.inner
            .lock()
            .expect("adapter cache poisoned")
            .insert(key, adapter);
    }

    /// Drop every cached instance for a provider (all model variants).
    pub fn remove_provider(&self, provider_id: i64) {
        self.inner
            .lock()
            .expect("adapter cache poisoned")
            .retain(|(id, _), _| *id != provider_id);
    }

    /// Drop all cached instances.
    pub fn clear(&self) {
        self.inner.lock().expect("adapter cache poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("adapter cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Factory turning stored [`ProviderRecord`]s into live adapter instances.
pub struct AdapterFactory {
    secrets: Arc<dyn SecretStore>,
    constructor: Arc<dyn AdapterConstructor>,
    overrides: Mutex<HashMap<String, Arc<dyn AdapterConstructor>>>,
    cache: Arc<AdapterCache>,
}

impl AdapterFactory {
    pub fn new(
        secrets: Arc<dyn SecretStore>,
        constructor: Arc<dyn AdapterConstructor>,
        cache: Arc<AdapterCache>,
    ) -> Self {
        Self {
            secrets,
            constructor,
            overrides: Mutex::new(HashMap::new()),
            cache,
        }
    }

    /// The instance cache this factory populates.
    pub fn cache(&self) -> &Arc<AdapterCache> {
        &self.cache
    }

    /// Register a custom constructor for an adapter-type tag.
    ///
    /// Overrides are consulted before the built-in map, so a registration
    /// may also shadow a built-in type.
    pub fn register_override(
        &self,
        tag: impl Into<String>,
        constructor: Arc<dyn AdapterConstructor>,
    ) -> Result<()> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(BifrostError::ProviderConfiguration(
                "adapter override tag must not be empty".into(),
            ));
        }
        self.overrides
            .lock()
            .expect("override registry poisoned")
            .insert(tag, constructor);
        Ok(())
    }

    /// Resolve the built-in implementation class for an adapter type.
    ///
    /// Types without a dedicated implementation use the OpenAI-compatible
    /// adapter; for `custom` without a registered override this is the
    /// documented fallback policy and is logged, never an error.
    pub fn adapter_class(adapter_type: AdapterType) -> AdapterClass {
        if adapter_type == AdapterType::Custom {
            warn!(
                adapter_type = AdapterType::Custom.as_str(),
                "no dedicated adapter implementation, falling back to OpenAI-compatible"
            );
        }
        Self::builtin_class(adapter_type)
    }

    /// The fixed built-in map, with no fallback logging.
    fn builtin_class(adapter_type: AdapterType) -> AdapterClass {
        match adapter_type {
            AdapterType::OpenAi => AdapterClass::OpenAi,
            AdapterType::Anthropic => AdapterClass::Anthropic,
            AdapterType::Gemini => AdapterClass::Gemini,
            AdapterType::Ollama => AdapterClass::Ollama,
            AdapterType::OpenRouter
            | AdapterType::Mistral
            | AdapterType::Groq
            | AdapterType::AzureOpenAi
            | AdapterType::Custom => AdapterClass::OpenAiCompatible,
        }
    }

    /// Create (or reuse) the adapter for a provider record.
    ///
    /// With `use_cache` and a persisted record id, the instance is stored
    /// under `(id, None)` and reused on subsequent calls. Records without a
    /// persisted id always get a fresh instance.
    pub async fn create_adapter_from_provider(
        &self,
        record: &ProviderRecord,
        use_cache: bool,
    ) -> Result<Arc<dyn ProviderAdapter>> {
        if use_cache
            && let Some(id) = record.id
            && let Some(adapter) = self.cache.get(id, None)
        {
            debug!(provider = %record.identifier, "adapter cache hit");
            return Ok(adapter);
        }

        let config = self.build_config(record, None).await?;
        let adapter = self.construct(record, config)?;

        if use_cache && let Some(id) = record.id {
            self.cache.insert(id, None, adapter.clone());
        }
        Ok(adapter)
    }

    /// Create (or reuse) an adapter configured for a specific model.
    ///
    /// Resolves the model's owning provider and builds an instance whose
    /// configuration carries the model's provider-side id in place of the
    /// provider's generic default. Cached under `(provider id, model id)`.
    pub async fn create_adapter_from_model(
        &self,
        model: &ModelRecord,
    ) -> Result<Arc<dyn ProviderAdapter>> {
        let record = &model.provider;
        let model_id = model.provider_model_id.as_str();

        if let Some(id) = record.id
            && let Some(adapter) = self.cache.get(id, Some(model_id))
        {
            debug!(provider = %record.identifier, model = model_id, "adapter cache hit");
            return Ok(adapter);
        }

        let config = self.build_config(record, Some(model_id)).await?;
        let adapter = self.construct(record, config)?;

        if let Some(id) = record.id {
            self.cache.insert(id, Some(model_id), adapter.clone());
        }
        Ok(adapter)
    }

    /// Probe a provider's connectivity.
    ///
    /// Always bypasses the instance cache so the probe exercises a freshly
    /// configured adapter, and never returns an error: construction
    /// failures and probe failures alike are normalized into a failed
    /// [`ConnectionTest`]. Health-check loops must not crash on one bad
    /// provider.
    pub async fn test_provider_connection(&self, record: &ProviderRecord) -> ConnectionTest {
        let adapter = match self.create_adapter_from_provider(record, false).await {
            Ok(adapter) => adapter,
            Err(e) => return ConnectionTest::failed(e.to_string()),
        };
        match adapter.test_connection().await {
            Ok(outcome) => outcome,
            Err(e) => ConnectionTest::failed(e.to_string()),
        }
    }

    /// Build the configuration an adapter is constructed with.
    async fn build_config(
        &self,
        record: &ProviderRecord,
        model_override: Option<&str>,
    ) -> Result<AdapterConfig> {
        let endpoint = record.effective_endpoint()?;
        let api_key = match &record.credential_ref {
            Some(reference) => self.secrets.retrieve(reference).await?,
            None => None,
        };
        Ok(AdapterConfig {
            api_key,
            endpoint,
            model: model_override.map(str::to_owned),
            timeout_secs: record.timeout_secs.max(1),
            max_retries: record.max_retries,
            organization: record.organization.clone(),
            options: record.options.clone(),
        })
    }

    /// Instantiate through the override registry, else the built-in map.
    fn construct(
        &self,
        record: &ProviderRecord,
        config: AdapterConfig,
    ) -> Result<Arc<dyn ProviderAdapter>> {
        let custom = self
            .overrides
            .lock()
            .expect("override registry poisoned")
            .get(record.adapter_type.as_str())
            .cloned();
        match custom {
            // an override brings its own implementation; the class is a hint
            Some(constructor) => {
                constructor.construct(Self::builtin_class(record.adapter_type), config)
            }
            None => self
                .constructor
                .construct(Self::adapter_class(record.adapter_type), config),
        }
    }
}
