pub mod gemini;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

use self::gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("upstream returned status {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("upstream response contained no candidates")]
    EmptyResponse,
}

/// Role of a prior turn as submitted upstream. The provider only knows the
/// user/model pair; assistant and system history entries are both mapped to
/// `Model` before reaching this layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

#[derive(Clone, Copy, Debug)]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, UpstreamError>> + Send>>;

/// Capability contract over the upstream generative-model provider.
///
/// `api_key_override`, when present, is used for that call only. It is a
/// parameter rather than client state so concurrent requests can never
/// observe each other's credentials.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        config: &GenerationConfig,
        api_key_override: Option<&str>
    ) -> Result<String, UpstreamError>;

    async fn complete_stream(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        config: &GenerationConfig,
        api_key_override: Option<&str>
    ) -> Result<ChunkStream, UpstreamError>;
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

pub fn new_client(config: &LlmConfig) -> Arc<dyn ModelClient> {
    Arc::new(GeminiClient::new(config.clone()))
}
