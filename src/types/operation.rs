//! Logical operations the dispatcher can route.

use serde::{Deserialize, Serialize};

/// A logical operation, used for capability gating, cache scoping and
/// metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Chat,
    Completion,
    Embeddings,
    Vision,
    StreamChat,
    ChatWithTools,
}

impl Operation {
    /// Stable label used in cache tags and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Completion => "completion",
            Self::Embeddings => "embeddings",
            Self::Vision => "vision",
            Self::StreamChat => "stream_chat",
            Self::ChatWithTools => "chat_with_tools",
        }
    }

    /// The capability flag an adapter must declare for this operation.
    ///
    /// `Completion` rides on the chat capability — the dispatcher lowers a
    /// prompt into a single-message chat call.
    pub fn required_capability(&self) -> &'static str {
        match self {
            Self::Chat | Self::Completion => "chat",
            Self::Embeddings => "embeddings",
            Self::Vision => "vision",
            Self::StreamChat => "streaming",
            Self::ChatWithTools => "tools",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
