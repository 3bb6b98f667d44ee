//! Public types for the bifrost API.

mod capabilities;
mod config;
mod message;
mod model;
mod operation;
mod options;
mod provider;
mod response;
mod tool;

pub use capabilities::{Capabilities, ModelCapability};
pub use config::{ConfigurationRecord, GenerationParams, ModelCriteria, SelectionMode};
pub use message::{ContentPart, ImageSource, Message, MessageContent, Role};
pub use model::ModelRecord;
pub use operation::Operation;
pub use options::{ChatOptions, EmbeddingOptions, VisionOptions};
pub use provider::{AdapterType, ProviderRecord};
pub use response::{
    CompletionResponse, ConnectionTest, Embedding, EmbeddingResponse, FinishReason, Usage,
    VisionResponse,
};
pub use tool::{ToolCall, ToolChoice, ToolDefinition};
