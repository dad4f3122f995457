use async_trait::async_trait;
use futures::StreamExt;
use log::{ info, warn };
use serde::{ Serialize, Deserialize };
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ ChatTurn, ChunkStream, GenerationConfig, LlmConfig, ModelClient, UpstreamError };

const STREAM_CHANNEL_CAPACITY: usize = 32;

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: WireGenerationConfig,
}

#[derive(Serialize)]
struct WireGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        if content.parts.is_empty() {
            return None;
        }
        Some(
            content.parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("")
        )
    }
}

/// One `data: {json}` line of the streamed response, parsed into the chunk
/// text it carries. Blank lines and unparseable fragments yield None.
fn parse_sse_line(line: &str) -> Option<String> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    serde_json
        ::from_str::<GenerateResponse>(payload)
        .ok()
        .and_then(|chunk| chunk.text())
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key,
            model: config.model,
            base_url: config.base_url,
        }
    }

    fn endpoint(&self, method: &str, api_key_override: Option<&str>) -> String {
        let key = api_key_override.unwrap_or(&self.api_key);
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            method,
            key
        )
    }

    fn build_request(
        prompt: &str,
        history: &[ChatTurn],
        config: &GenerationConfig
    ) -> GenerateRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content {
                role: turn.role.as_str().to_string(),
                parts: vec![Part { text: turn.text.clone() }],
            })
            .collect();
        contents.push(Content {
            role: "user".to_string(),
            parts: vec![Part { text: prompt.to_string() }],
        });

        GenerateRequest {
            contents,
            generation_config: WireGenerationConfig {
                max_output_tokens: config.max_output_tokens,
                temperature: config.temperature,
            },
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn complete(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        config: &GenerationConfig,
        api_key_override: Option<&str>
    ) -> Result<String, UpstreamError> {
        info!(
            "GeminiClient::complete() → model={} history_turns={}",
            self.model,
            history.len()
        );
        let url = self.endpoint("generateContent", api_key_override);
        let body = Self::build_request(prompt, history, config);

        let resp = self.http.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        parsed.text().ok_or(UpstreamError::EmptyResponse)
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        config: &GenerationConfig,
        api_key_override: Option<&str>
    ) -> Result<ChunkStream, UpstreamError> {
        info!(
            "GeminiClient::complete_stream() → model={} history_turns={}",
            self.model,
            history.len()
        );
        let url = self.endpoint("streamGenerateContent", api_key_override);
        let url = format!("{}&alt=sse", url);
        let body = Self::build_request(prompt, history, config);
        let http = self.http.clone();

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let resp = match http.post(&url).json(&body).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    let _ = tx.send(Err(UpstreamError::Transport(e))).await;
                    return;
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let _ = tx.send(
                    Err(UpstreamError::Status {
                        status: status.as_u16(),
                        body,
                    })
                ).await;
                return;
            }

            // SSE lines may be split across network frames; carry the
            // remainder between reads.
            let mut pending = String::new();
            let mut bytes = resp.bytes_stream();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(buf) => {
                        match std::str::from_utf8(&buf) {
                            Ok(text) => pending.push_str(text),
                            Err(e) => {
                                warn!("Skipping non-UTF8 stream frame: {}", e);
                                continue;
                            }
                        }
                        while let Some(newline) = pending.find('\n') {
                            let line = pending[..newline].to_string();
                            pending.drain(..=newline);
                            if let Some(token) = parse_sse_line(&line) {
                                if tx.send(Ok(token)).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(UpstreamError::Transport(e))).await;
                        return;
                    }
                }
            }
            if let Some(token) = parse_sse_line(&pending) {
                let _ = tx.send(Ok(token)).await;
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
