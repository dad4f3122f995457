//! Request and response bodies for the HTTP API.

use serde::{ Serialize, Deserialize };

use super::chat::{ ChatMessage, CodeBlock };

fn default_language() -> String {
    "python".to_string()
}

fn default_mode() -> String {
    "code".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
    #[serde(default = "default_language")]
    pub language: String,
    /// Parsed into a GenerationMode by the handler so that an unknown mode
    /// is reported as a client error rather than a deserialization failure.
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub message: String,
    pub role: &'static str,
    pub timestamp: i64,
    pub language: Option<String>,
    pub has_code: bool,
    pub code_blocks: Vec<CodeBlock>,
}

#[derive(Debug, Deserialize)]
pub struct CodeGenerationRequest {
    pub prompt: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub include_comments: bool,
    #[serde(default)]
    pub include_tests: bool,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CodeGenerationResponse {
    pub code: String,
    pub language: String,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct StreamChunkBody {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessage>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}
