//! Adapter contract, configuration and factory.
//!
//! [`ProviderAdapter`] is the uniform call contract concrete vendor
//! adapters implement out-of-crate. [`AdapterFactory`] turns stored
//! [`ProviderRecord`](crate::types::ProviderRecord)s into live, configured
//! instances, reusing them through an explicit [`AdapterCache`].

mod factory;
mod traits;

pub use factory::{AdapterCache, AdapterFactory};
pub use traits::{
    AdapterClass, AdapterConfig, AdapterConstructor, ChunkStream, ProviderAdapter, SecretStore,
};
