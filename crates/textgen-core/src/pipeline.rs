//! Pipeline vocabulary shared by the loaders, the inference backend, and tests.
//!
//! These types are the parameters of the two capabilities in
//! [`crate::interfaces`]: what to build (`PipelineSpec`) and what to run
//! (`GenerationRequest` + `GenerationOptions`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pipeline task. Only text generation exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    #[serde(rename = "text-generation")]
    TextGeneration,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextGeneration => "text-generation",
        }
    }
}

/// Opaque model identifier, e.g. `google/gemma-3-4b-it`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the identifier (`gemma-3-4b-it` for `google/gemma-3-4b-it`).
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Where the model weights should live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSpec {
    /// Device index: `-1` is the CPU, `n >= 0` is accelerator `n`.
    Index(i32),
    /// Placement strategy string, e.g. `"auto"`.
    Map(String),
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "device={i}"),
            Self::Map(m) => write!(f, "device_map={m}"),
        }
    }
}

/// Numeric precision requested for the model weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    BFloat16,
    Float16,
    Float32,
    Auto,
}

impl Precision {
    /// Short tag as it appears in model file names. `None` for `Auto`.
    pub fn file_tag(&self) -> Option<&'static str> {
        match self {
            Self::BFloat16 => Some("bf16"),
            Self::Float16 => Some("f16"),
            Self::Float32 => Some("f32"),
            Self::Auto => None,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_tag().unwrap_or("auto"))
    }
}

/// Everything a loader hands to [`crate::PipelineFactory::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    pub task: Task,
    pub model: ModelId,
    pub device: DeviceSpec,
    pub precision: Precision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Input to a generation call: plain text or a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationRequest {
    Text(String),
    Chat(Vec<ChatMessage>),
}

impl From<&str> for GenerationRequest {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    pub max_new_tokens: u32,
    /// Include the prompt (or input conversation) in the returned text.
    pub return_full_text: bool,
}

impl GenerationOptions {
    pub fn max_new_tokens(max_new_tokens: u32) -> Self {
        Self {
            max_new_tokens,
            ..Self::default()
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 256,
            return_full_text: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedText {
    Text(String),
    Conversation(Vec<ChatMessage>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSequence {
    pub generated_text: GeneratedText,
}

/// Result of a generation call. Printed as JSON through `Display`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationOutput(pub Vec<GeneratedSequence>);

impl GenerationOutput {
    pub fn single(generated_text: GeneratedText) -> Self {
        Self(vec![GeneratedSequence { generated_text }])
    }

    pub fn sequences(&self) -> &[GeneratedSequence] {
        &self.0
    }
}

impl fmt::Display for GenerationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
