//! End-to-end orchestrator tests against a scripted model client.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use std::sync::Mutex;

use codementor::agent::ChatAgent;
use codementor::llm::{ ChatTurn, ChunkStream, GenerationConfig, ModelClient, UpstreamError };
use codementor::models::chat::{ ChatMessage, ChatRequest, GenerationMode, Role };
use codementor::models::roadmap::{ Difficulty, Roadmap };

enum Scripted {
    Reply(String),
    Fail(String),
}

struct ScriptedClient {
    completions: Mutex<Vec<Scripted>>,
    chunks: Vec<Result<String, String>>,
    prompts_seen: Mutex<Vec<String>>,
    histories_seen: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedClient {
    fn replying(replies: Vec<&str>) -> Self {
        Self {
            completions: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| Scripted::Reply(r.to_string()))
                    .collect()
            ),
            chunks: Vec::new(),
            prompts_seen: Mutex::new(Vec::new()),
            histories_seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str, times: usize) -> Self {
        Self {
            completions: Mutex::new(
                (0..times).map(|_| Scripted::Fail(message.to_string())).collect()
            ),
            chunks: Vec::new(),
            prompts_seen: Mutex::new(Vec::new()),
            histories_seen: Mutex::new(Vec::new()),
        }
    }

    fn streaming(chunks: Vec<Result<String, String>>) -> Self {
        Self {
            completions: Mutex::new(Vec::new()),
            chunks,
            prompts_seen: Mutex::new(Vec::new()),
            histories_seen: Mutex::new(Vec::new()),
        }
    }

    fn last_prompt(&self) -> String {
        self.prompts_seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        _config: &GenerationConfig,
        _api_key_override: Option<&str>
    ) -> Result<String, UpstreamError> {
        self.prompts_seen.lock().unwrap().push(prompt.to_string());
        self.histories_seen.lock().unwrap().push(history.to_vec());
        match self.completions.lock().unwrap().remove(0) {
            Scripted::Reply(text) => Ok(text),
            Scripted::Fail(body) => Err(UpstreamError::Status { status: 503, body }),
        }
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        _history: &[ChatTurn],
        _config: &GenerationConfig,
        _api_key_override: Option<&str>
    ) -> Result<ChunkStream, UpstreamError> {
        self.prompts_seen.lock().unwrap().push(prompt.to_string());
        let items: Vec<Result<String, UpstreamError>> = self.chunks
            .iter()
            .map(|item| {
                match item {
                    Ok(text) => Ok(text.clone()),
                    Err(body) =>
                        Err(UpstreamError::Status { status: 503, body: body.clone() }),
                }
            })
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

fn agent_with(client: ScriptedClient) -> (Arc<ScriptedClient>, ChatAgent) {
    let client = Arc::new(client);
    let generation = GenerationConfig { max_output_tokens: 2048, temperature: 0.7 };
    let agent = ChatAgent::new(client.clone(), generation);
    (client, agent)
}

fn request(message: &str, language: &str, mode: GenerationMode) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        history: Vec::new(),
        language: language.to_string(),
        mode,
        api_key: None,
    }
}

fn roadmap_payload(result_message: &str) -> Roadmap {
    let inner = result_message
        .trim_start_matches("```json")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(inner).expect("fenced payload should be valid JSON")
}

fn valid_roadmap_json(title: &str, modules: usize) -> String {
    let rendered: Vec<String> = (1..=modules)
        .map(|i| {
            format!(
                r#"{{"id": {id}, "title": "Module {id}", "description": "Step {id}",
                    "topics": ["a", "b", "c"], "duration": "2 weeks",
                    "difficulty": "Intermediate", "prerequisites": []}}"#,
                id = i
            )
        })
        .collect();
    format!(
        r#"{{"title": "{}", "description": "desc", "modules": [{}]}}"#,
        title,
        rendered.join(",")
    )
}

#[tokio::test]
async fn code_mode_extracts_single_go_block() {
    let reply = "Here is the function:\n```go\nfunc Reverse(s string) string {\n\treturn s\n}\n```\n";
    let (_, agent) = agent_with(ScriptedClient::replying(vec![reply]));

    let result = agent
        .generate_chat_response(
            &request("write a function that reverses a string", "go", GenerationMode::Code)
        ).await
        .unwrap();

    assert!(result.has_code);
    assert_eq!(result.language.as_deref(), Some("go"));
    assert_eq!(result.code_blocks.len(), 1);
    assert_eq!(result.code_blocks[0].language, "go");
}

#[tokio::test]
async fn prose_reply_has_no_code() {
    let (_, agent) = agent_with(ScriptedClient::replying(vec!["Recursion is a function calling itself."]));

    let result = agent
        .generate_chat_response(&request("what is recursion?", "python", GenerationMode::Explain))
        .await
        .unwrap();

    assert!(!result.has_code);
    assert_eq!(result.language, None);
    assert!(result.code_blocks.is_empty());
}

#[tokio::test]
async fn roadmap_keyword_routes_regardless_of_mode() {
    let json = valid_roadmap_json("Complete Python Learning Path", 6);
    let (client, agent) = agent_with(ScriptedClient::replying(vec![json.as_str()]));

    // Mode is chat, but the keyword in the message wins.
    let result = agent
        .generate_chat_response(
            &request("Create a roadmap to learn Python", "python", GenerationMode::Chat)
        ).await
        .unwrap();

    assert!(!result.has_code);
    assert_eq!(result.language.as_deref(), Some("json"));
    // The strict roadmap prompt was used, not the chat template.
    assert!(client.last_prompt().contains("Return pure JSON only."));

    let roadmap = roadmap_payload(&result.message);
    assert!(roadmap.title.to_lowercase().contains("python"));
    assert!((5..=8).contains(&roadmap.modules.len()));
}

#[tokio::test]
async fn roadmap_exhaustion_interpolates_topic_into_primary_fallback() {
    let (_, agent) = agent_with(
        ScriptedClient::replying(vec!["nope", "still nope", "не json"])
    );

    let result = agent
        .generate_chat_response(
            &request("roadmap for kubernetes", "python", GenerationMode::Chat)
        ).await
        .unwrap();

    let fallback = roadmap_payload(&result.message);
    assert_eq!(fallback.title, "Learning Path for Kubernetes");
    assert_eq!(fallback.modules.len(), 3);
    assert!(!fallback.title.is_empty());
    for module in &fallback.modules {
        assert!(
            matches!(
                module.difficulty,
                Difficulty::Beginner | Difficulty::Intermediate | Difficulty::Advanced
            )
        );
    }
}

#[tokio::test]
async fn roadmap_upstream_failure_yields_two_module_fallback() {
    let (_, agent) = agent_with(ScriptedClient::failing("unavailable", 1));

    let result = agent
        .generate_chat_response(&request("study plan for sql", "python", GenerationMode::Code))
        .await
        .unwrap();

    let fallback = roadmap_payload(&result.message);
    assert_eq!(fallback.modules.len(), 2);
}

#[tokio::test]
async fn generic_upstream_failure_is_surfaced() {
    let (_, agent) = agent_with(ScriptedClient::failing("boom", 1));

    let err = agent
        .generate_chat_response(&request("hello there", "python", GenerationMode::Chat))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn generate_code_passes_flags_into_prompt() {
    let (client, agent) = agent_with(
        ScriptedClient::replying(vec!["```python\nprint('ok')\n```"])
    );

    let code = agent
        .generate_code("a hello world script", "python", true, true, None).await
        .unwrap();
    assert!(code.contains("print"));

    let prompt = client.last_prompt();
    assert!(prompt.contains("Include unit tests"));
    assert!(prompt.contains("a hello world script"));
}

#[tokio::test]
async fn stream_path_delivers_chunks_in_order() {
    let (_, agent) = agent_with(
        ScriptedClient::streaming(vec![Ok("Hello".to_string()), Ok(" world".to_string())])
    );

    let stream = agent
        .stream_chat_response(&request("say hello", "python", GenerationMode::Chat)).await
        .unwrap();
    let collected: Vec<_> = stream.collect().await;

    assert_eq!(collected.len(), 2);
    assert_eq!(collected[0].as_deref(), Ok("Hello"));
    assert_eq!(collected[1].as_deref(), Ok(" world"));
}

#[tokio::test]
async fn stream_failure_arrives_after_delivered_chunks() {
    let (_, agent) = agent_with(
        ScriptedClient::streaming(
            vec![Ok("partial".to_string()), Err("connection reset".to_string())]
        )
    );

    let stream = agent
        .stream_chat_response(&request("say hello", "python", GenerationMode::Chat)).await
        .unwrap();
    let collected: Vec<_> = stream.collect().await;

    assert_eq!(collected.len(), 2);
    assert_eq!(collected[0].as_deref(), Ok("partial"));
    assert!(collected[1].is_err());
}

#[tokio::test]
async fn history_is_windowed_before_submission() {
    let (client, agent) = agent_with(ScriptedClient::replying(vec!["fine"]));

    let history: Vec<ChatMessage> = (0..15)
        .map(|i| {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            ChatMessage::new(role, format!("msg-{}", i))
        })
        .collect();
    let mut req = request("continue", "python", GenerationMode::Chat);
    req.history = history;

    let result = agent.generate_chat_response(&req).await.unwrap();
    assert_eq!(result.message, "fine");

    let histories = client.histories_seen.lock().unwrap();
    let submitted = &histories[0];
    assert_eq!(submitted.len(), 10);
    assert_eq!(submitted[0].text, "msg-5");
    assert_eq!(submitted[9].text, "msg-14");
}
