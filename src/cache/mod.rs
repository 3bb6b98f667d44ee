//! Caching subsystem.
//!
//! [`response::ResponseCache`] is the tag-invalidatable response cache the
//! dispatcher wraps around chat, completion and embedding calls. Its
//! storage backend is the [`response::CacheStore`] trait; the default is an
//! in-memory moka store, and shared backends (e.g. redis for multiple
//! processes) implement the same trait.

pub mod response;

pub use response::{
    CacheEntry, CacheStore, DEFAULT_COMPLETION_TTL, DEFAULT_EMBEDDING_TTL, GROUP_TAG, MemoryStore,
    ResponseCache,
};
