//! Provider and model capability reporting.

use serde::{Deserialize, Serialize};

/// A capability a model may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCapability {
    /// Multi-turn chat conversations.
    Chat,
    /// Single-prompt text completion.
    Completion,
    /// Text embeddings.
    Embeddings,
    /// Image understanding.
    Vision,
    /// Streaming responses.
    Streaming,
    /// Tool/function calling.
    Tools,
    /// Structured JSON output mode.
    JsonMode,
    /// Audio input/output.
    Audio,
}

impl ModelCapability {
    /// Canonical feature-flag name, as used by
    /// [`Capabilities::supports`] and capability checks in the dispatcher.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Completion => "completion",
            Self::Embeddings => "embeddings",
            Self::Vision => "vision",
            Self::Streaming => "streaming",
            Self::Tools => "tools",
            Self::JsonMode => "json_mode",
            Self::Audio => "audio",
        }
    }
}

/// What capabilities an adapter declares.
///
/// The dispatcher gates every operation on a plain membership test against
/// this set — no runtime type inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Multi-turn chat conversations.
    pub chat: bool,
    /// Single-prompt text completion.
    pub completion: bool,
    /// Text embeddings.
    pub embeddings: bool,
    /// Image understanding.
    pub vision: bool,
    /// Streaming responses.
    pub streaming: bool,
    /// Tool/function calling.
    pub tools: bool,
    /// Structured JSON output mode.
    pub json_mode: bool,
    /// Audio input/output.
    pub audio: bool,
}

impl Capabilities {
    /// Chat-only capabilities (chat + completion + streaming).
    pub fn chat_only() -> Self {
        Self {
            chat: true,
            completion: true,
            streaming: true,
            ..Default::default()
        }
    }

    /// Full capabilities (all features).
    pub fn full() -> Self {
        Self {
            chat: true,
            completion: true,
            embeddings: true,
            vision: true,
            streaming: true,
            tools: true,
            json_mode: true,
            audio: true,
        }
    }

    /// Feature-flag query by canonical name.
    ///
    /// Unknown names are simply unsupported, never an error.
    pub fn supports(&self, feature: &str) -> bool {
        match feature {
            "chat" => self.chat,
            "completion" => self.completion,
            "embeddings" => self.embeddings,
            "vision" => self.vision,
            "streaming" => self.streaming,
            "tools" => self.tools,
            "json_mode" => self.json_mode,
            "audio" => self.audio,
            _ => false,
        }
    }

    /// Merge capabilities using OR logic (combines two capability sets).
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            chat: self.chat || other.chat,
            completion: self.completion || other.completion,
            embeddings: self.embeddings || other.embeddings,
            vision: self.vision || other.vision,
            streaming: self.streaming || other.streaming,
            tools: self.tools || other.tools,
            json_mode: self.json_mode || other.json_mode,
            audio: self.audio || other.audio,
        }
    }
}

impl From<&[ModelCapability]> for Capabilities {
    fn from(list: &[ModelCapability]) -> Self {
        let mut caps = Self::default();
        for cap in list {
            match cap {
                ModelCapability::Chat => caps.chat = true,
                ModelCapability::Completion => caps.completion = true,
                ModelCapability::Embeddings => caps.embeddings = true,
                ModelCapability::Vision => caps.vision = true,
                ModelCapability::Streaming => caps.streaming = true,
                ModelCapability::Tools => caps.tools = true,
                ModelCapability::JsonMode => caps.json_mode = true,
                ModelCapability::Audio => caps.audio = true,
            }
        }
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_by_name() {
        let caps = Capabilities::chat_only();
        assert!(caps.supports("chat"));
        assert!(caps.supports("streaming"));
        assert!(!caps.supports("vision"));
        assert!(!caps.supports("no-such-feature"));
    }

    #[test]
    fn merge_is_union() {
        let chat = Capabilities::chat_only();
        let vision = Capabilities {
            vision: true,
            ..Default::default()
        };
        let merged = chat.merge(&vision);
        assert!(merged.chat);
        assert!(merged.vision);
        assert!(!merged.embeddings);
    }

    #[test]
    fn from_capability_list() {
        let caps = Capabilities::from(
            [ModelCapability::Chat, ModelCapability::Tools].as_slice(),
        );
        assert!(caps.chat);
        assert!(caps.tools);
        assert!(!caps.embeddings);
    }
}
