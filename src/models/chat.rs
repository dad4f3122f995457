use chrono::Utc;
use serde::{ Serialize, Deserialize };
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

fn default_timestamp() -> i64 {
    Utc::now().timestamp()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default = "default_timestamp")]
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Requested response style. Roadmap requests are also recognized from the
/// message text itself, independent of the mode the client asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationMode {
    Code,
    Chat,
    Explain,
    Roadmap,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid generation mode: '{0}'")]
pub struct InvalidMode(pub String);

impl FromStr for GenerationMode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "code" => Ok(GenerationMode::Code),
            "chat" => Ok(GenerationMode::Chat),
            "explain" => Ok(GenerationMode::Explain),
            "roadmap" => Ok(GenerationMode::Roadmap),
            other => Err(InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationMode::Code => "code",
            GenerationMode::Chat => "chat",
            GenerationMode::Explain => "explain",
            GenerationMode::Roadmap => "roadmap",
        };
        write!(f, "{}", name)
    }
}

/// A validated chat request as the orchestrator consumes it. The HTTP layer
/// is responsible for bounds-checking the message and parsing the mode.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatMessage>,
    pub language: String,
    pub mode: GenerationMode,
    /// Per-call API key override, threaded through the call chain rather
    /// than applied to shared client state.
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResult {
    pub message: String,
    pub has_code: bool,
    /// Set only when `has_code` is true, or "json" for roadmap documents.
    pub language: Option<String>,
    pub code_blocks: Vec<CodeBlock>,
}
