//! Dispatcher and its supporting pieces.

mod backpressure;
mod builder;
mod dispatcher;

pub use backpressure::DEFAULT_STREAM_BUFFER;
pub use builder::DispatcherBuilder;
pub use dispatcher::Dispatcher;
