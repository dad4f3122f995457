//! Strict-JSON roadmap generation with bounded retry and deterministic
//! fallback documents.

use log::{ info, warn };
use std::sync::Arc;

use crate::config::prompt::{ self, title_case };
use crate::llm::{ GenerationConfig, ModelClient, UpstreamError };
use crate::models::chat::ChatResult;
use crate::models::roadmap::{ Difficulty, Roadmap, RoadmapModule };

const MAX_ATTEMPTS: u32 = 3;

const ROADMAP_KEYWORDS: &[&str] = &[
    "roadmap",
    "learning path",
    "course outline",
    "study plan",
    "curriculum",
    "learning roadmap",
    "learning plan",
    "study roadmap",
];

/// Ordered longest-phrase-first so "roadmap for python" strips the whole
/// leading phrase, not just "roadmap".
const TOPIC_PREFIXES: &[&str] = &[
    "roadmap for",
    "learning path for",
    "study plan for",
    "roadmap to learn",
    "roadmap",
    "learning path",
];

pub fn is_roadmap_request(message: &str) -> bool {
    let lower = message.to_lowercase();
    ROADMAP_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

pub fn extract_topic(message: &str) -> String {
    let mut topic = message.to_lowercase();
    for keyword in TOPIC_PREFIXES {
        if let Some(pos) = topic.find(keyword) {
            topic = topic[pos + keyword.len()..].to_string();
            break;
        }
    }
    let topic = topic.replace('?', "").replace('.', "").trim().to_string();
    if topic.is_empty() { "programming".to_string() } else { topic }
}

/// Result of one generation attempt after the response text has come back.
enum AttemptOutcome {
    Accepted(Roadmap),
    Invalid(String),
}

enum GenerationFailure {
    /// Every attempt produced unparsable or structurally invalid output.
    Exhausted,
    /// An upstream error escaped the attempt loop.
    Upstream(UpstreamError),
}

pub struct RoadmapGenerator {
    client: Arc<dyn ModelClient>,
    generation: GenerationConfig,
}

impl RoadmapGenerator {
    pub fn new(client: Arc<dyn ModelClient>, generation: GenerationConfig) -> Self {
        Self { client, generation }
    }

    /// Always produces a roadmap document: a validated upstream one, or a
    /// fallback tier when generation or validation cannot succeed.
    pub async fn generate(&self, message: &str, api_key_override: Option<&str>) -> ChatResult {
        let topic = extract_topic(message);
        info!("Generating roadmap for topic: '{}'", topic);

        let roadmap = match self.attempt_loop(&topic, api_key_override).await {
            Ok(roadmap) => roadmap,
            Err(GenerationFailure::Exhausted) => {
                warn!("Roadmap validation exhausted after {} attempts, emitting fallback", MAX_ATTEMPTS);
                primary_fallback(&topic)
            }
            Err(GenerationFailure::Upstream(e)) => {
                warn!("Roadmap generation failed upstream ({}), emitting fallback", e);
                secondary_fallback(&topic)
            }
        };
        render(&roadmap)
    }

    async fn attempt_loop(
        &self,
        topic: &str,
        api_key_override: Option<&str>
    ) -> Result<Roadmap, GenerationFailure> {
        let generation_prompt = prompt::roadmap_prompt(topic);

        for attempt in 1..=MAX_ATTEMPTS {
            let raw = self.client
                .complete(&generation_prompt, &[], &self.generation, api_key_override).await
                .map_err(GenerationFailure::Upstream)?;

            match parse_and_validate(&raw) {
                AttemptOutcome::Accepted(roadmap) => {
                    info!("Roadmap accepted on attempt {}/{}", attempt, MAX_ATTEMPTS);
                    return Ok(roadmap);
                }
                AttemptOutcome::Invalid(reason) => {
                    warn!("Roadmap attempt {}/{} rejected: {}", attempt, MAX_ATTEMPTS, reason);
                }
            }
        }
        Err(GenerationFailure::Exhausted)
    }
}

fn parse_and_validate(raw: &str) -> AttemptOutcome {
    let cleaned = strip_code_fence(raw);
    let roadmap: Roadmap = match serde_json::from_str(&cleaned) {
        Ok(parsed) => parsed,
        Err(e) => {
            return AttemptOutcome::Invalid(format!("not valid JSON: {}", e));
        }
    };
    if roadmap.title.trim().is_empty() {
        return AttemptOutcome::Invalid("missing title".to_string());
    }
    if roadmap.modules.is_empty() {
        return AttemptOutcome::Invalid("empty modules list".to_string());
    }
    AttemptOutcome::Accepted(roadmap)
}

/// The model sometimes wraps its answer in a fence despite the prompt; accept
/// both a `json`-tagged and an untagged wrapper.
fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + "```json".len()..];
        let end = rest.find("```").unwrap_or(rest.len());
        return rest[..end].trim().to_string();
    }
    if let Some(start) = trimmed.find("```") {
        let rest = &trimmed[start + "```".len()..];
        let end = rest.find("```").unwrap_or(rest.len());
        return rest[..end].trim().to_string();
    }
    trimmed.to_string()
}

/// Canonical rendering: stable key order, 2-space indentation, wrapped in a
/// single json-tagged fence for the frontend renderer.
fn render(roadmap: &Roadmap) -> ChatResult {
    let formatted = serde_json::to_string_pretty(roadmap).unwrap();
    ChatResult {
        message: format!("```json\n{}\n```", formatted),
        has_code: false,
        language: Some("json".to_string()),
        code_blocks: Vec::new(),
    }
}

/// Emitted when every attempt produced invalid output.
fn primary_fallback(topic: &str) -> Roadmap {
    Roadmap {
        title: format!("Learning Path for {}", title_case(topic)),
        description: "An error occurred generating the roadmap. Here's a basic structure.".to_string(),
        modules: vec![
            RoadmapModule {
                id: 1,
                title: "Introduction".to_string(),
                description: format!("Getting started with {}", topic),
                topics: vec![
                    "Fundamentals".to_string(),
                    "Core concepts".to_string(),
                    "Basic setup".to_string()
                ],
                duration: "2 weeks".to_string(),
                difficulty: Difficulty::Beginner,
                prerequisites: vec![],
            },
            RoadmapModule {
                id: 2,
                title: "Intermediate Skills".to_string(),
                description: format!("Building your {} knowledge", topic),
                topics: vec![
                    "Advanced features".to_string(),
                    "Best practices".to_string(),
                    "Real-world applications".to_string()
                ],
                duration: "3 weeks".to_string(),
                difficulty: Difficulty::Intermediate,
                prerequisites: vec![1],
            },
            RoadmapModule {
                id: 3,
                title: "Advanced Topics".to_string(),
                description: format!("Mastering {}", topic),
                topics: vec![
                    "Expert techniques".to_string(),
                    "Optimization".to_string(),
                    "Production deployment".to_string()
                ],
                duration: "4 weeks".to_string(),
                difficulty: Difficulty::Advanced,
                prerequisites: vec![2],
            }
        ],
    }
}

/// Emitted when generation itself failed (upstream error out of the loop).
fn secondary_fallback(topic: &str) -> Roadmap {
    Roadmap {
        title: format!("Learning Path for {}", title_case(topic)),
        description: "A structured approach to learning".to_string(),
        modules: vec![
            RoadmapModule {
                id: 1,
                title: "Fundamentals".to_string(),
                description: "Core concepts and basics".to_string(),
                topics: vec![
                    "Getting started".to_string(),
                    "Basic concepts".to_string(),
                    "Essential tools".to_string()
                ],
                duration: "2 weeks".to_string(),
                difficulty: Difficulty::Beginner,
                prerequisites: vec![],
            },
            RoadmapModule {
                id: 2,
                title: "Intermediate Concepts".to_string(),
                description: "Building on the fundamentals".to_string(),
                topics: vec![
                    "Advanced features".to_string(),
                    "Best practices".to_string(),
                    "Common patterns".to_string()
                ],
                duration: "3 weeks".to_string(),
                difficulty: Difficulty::Intermediate,
                prerequisites: vec![1],
            }
        ],
    }
}
