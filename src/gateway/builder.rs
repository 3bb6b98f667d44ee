//! Builder for configuring dispatcher instances.

use super::Dispatcher;
use super::backpressure::DEFAULT_STREAM_BUFFER;
use crate::cache::ResponseCache;

/// Builder for [`Dispatcher`] instances.
///
/// ```rust
/// use bifrost::{Dispatcher, ResponseCache};
///
/// let dispatcher = Dispatcher::builder()
///     .response_cache(ResponseCache::in_memory())
///     .stream_buffer_size(32)
///     .build();
/// assert!(dispatcher.cache().is_some());
/// ```
pub struct DispatcherBuilder {
    cache: Option<ResponseCache>,
    stream_buffer_size: usize,
    default_provider: Option<String>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            cache: None,
            stream_buffer_size: DEFAULT_STREAM_BUFFER,
            default_provider: None,
        }
    }

    /// Enable read-through response caching.
    ///
    /// Without this, no cache is allocated and every request reaches the
    /// adapter.
    pub fn response_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the bounded buffer size applied to streaming responses.
    pub fn stream_buffer_size(mut self, size: usize) -> Self {
        self.stream_buffer_size = size.max(1);
        self
    }

    /// Name the provider used when operations name none.
    pub fn default_provider(mut self, identifier: impl Into<String>) -> Self {
        self.default_provider = Some(identifier.into());
        self
    }

    pub fn build(self) -> Dispatcher {
        let dispatcher = Dispatcher::with_parts(self.cache, self.stream_buffer_size);
        if let Some(identifier) = self.default_provider {
            dispatcher.set_default_provider(identifier);
        }
        dispatcher
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
