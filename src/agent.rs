use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::codeblocks::extract_code_blocks;
use crate::config::prompt;
use crate::history::window_for_upstream;
use crate::llm::{ GenerationConfig, ModelClient, UpstreamError };
use crate::models::chat::{ ChatRequest, ChatResult, GenerationMode };
use crate::roadmap::{ self, RoadmapGenerator };
use crate::stream::{ self, BridgedStream };

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("upstream model error: {0}")]
    Upstream(#[from] UpstreamError),
}

/// Top-level orchestrator: builds the prompt for the requested mode, runs
/// the upstream call, and assembles the structured result. Roadmap requests
/// are detected from the message text and handed to the roadmap generator,
/// whatever mode the client asked for.
pub struct ChatAgent {
    chat_client: Arc<dyn ModelClient>,
    roadmap_generator: RoadmapGenerator,
    generation: GenerationConfig,
}

impl ChatAgent {
    pub fn new(chat_client: Arc<dyn ModelClient>, generation: GenerationConfig) -> Self {
        let roadmap_generator = RoadmapGenerator::new(Arc::clone(&chat_client), generation);
        Self {
            chat_client,
            roadmap_generator,
            generation,
        }
    }

    pub async fn generate_chat_response(
        &self,
        request: &ChatRequest
    ) -> Result<ChatResult, AgentError> {
        if request.mode == GenerationMode::Roadmap || roadmap::is_roadmap_request(&request.message) {
            info!("Roadmap request detected, mode={}", request.mode);
            return Ok(
                self.roadmap_generator.generate(
                    &request.message,
                    request.api_key.as_deref()
                ).await
            );
        }

        let system_prompt = prompt::system_prompt(request.mode, &request.language);
        let turns = window_for_upstream(&request.history);
        let full_prompt = format!("{}\n\nUser: {}", system_prompt, request.message);

        let reply = self.chat_client.complete(
            &full_prompt,
            &turns,
            &self.generation,
            request.api_key.as_deref()
        ).await?;

        let code_blocks = extract_code_blocks(&reply);
        let has_code = !code_blocks.is_empty();
        Ok(ChatResult {
            message: reply,
            has_code,
            language: if has_code { Some(request.language.clone()) } else { None },
            code_blocks,
        })
    }

    /// One-shot code generation without conversation context.
    pub async fn generate_code(
        &self,
        prompt_text: &str,
        language: &str,
        include_comments: bool,
        include_tests: bool,
        api_key_override: Option<&str>
    ) -> Result<String, AgentError> {
        let system_prompt = prompt::code_generation_prompt(language, include_comments, include_tests);
        let full_prompt = format!("{}\n\n{}", system_prompt, prompt_text);
        let code = self.chat_client.complete(
            &full_prompt,
            &[],
            &self.generation,
            api_key_override
        ).await?;
        Ok(code)
    }

    /// Streaming variant of the chat path. The returned stream yields chunks
    /// in upstream order; the result is not reassembled into a ChatResult.
    pub async fn stream_chat_response(
        &self,
        request: &ChatRequest
    ) -> Result<BridgedStream, AgentError> {
        let system_prompt = prompt::system_prompt(request.mode, &request.language);
        let turns = window_for_upstream(&request.history);
        let full_prompt = format!("{}\n\nUser: {}", system_prompt, request.message);

        let upstream = self.chat_client.complete_stream(
            &full_prompt,
            &turns,
            &self.generation,
            request.api_key.as_deref()
        ).await?;
        Ok(stream::bridge(upstream))
    }
}
