use std::convert::Infallible;
use std::error::Error;
use std::sync::Arc;

use axum::{
    Router,
    extract::{ Query, State },
    http::{ HeaderMap, StatusCode, header },
    response::{ IntoResponse, Response },
    response::sse::{ Event, KeepAlive, Sse },
    routing::{ get, post },
    Json,
};
use chrono::Utc;
use futures::StreamExt;
use log::{ error, info, warn };
use tower_http::cors::{ Any, CorsLayer };

use crate::agent::ChatAgent;
use crate::cli::Args;
use crate::history::HistoryStore;
use crate::models::api::{
    ChatHistoryResponse,
    ChatRequestBody,
    ChatResponseBody,
    CodeGenerationRequest,
    CodeGenerationResponse,
    ErrorBody,
    HistoryQuery,
    LanguageInfo,
    StreamChunkBody,
};
use crate::models::chat::{ ChatRequest, GenerationMode, Role };

const MAX_MESSAGE_LEN: usize = 10_000;
const MAX_CODE_PROMPT_LEN: usize = 5_000;

const SUPPORTED_LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo { id: "python", name: "Python", icon: "🐍" },
    LanguageInfo { id: "javascript", name: "JavaScript", icon: "📜" },
    LanguageInfo { id: "typescript", name: "TypeScript", icon: "📘" },
    LanguageInfo { id: "java", name: "Java", icon: "☕" },
    LanguageInfo { id: "csharp", name: "C#", icon: "#️⃣" },
    LanguageInfo { id: "cpp", name: "C++", icon: "⚡" },
    LanguageInfo { id: "go", name: "Go", icon: "🔷" },
    LanguageInfo { id: "rust", name: "Rust", icon: "🦀" },
    LanguageInfo { id: "ruby", name: "Ruby", icon: "💎" },
    LanguageInfo { id: "php", name: "PHP", icon: "🐘" },
    LanguageInfo { id: "swift", name: "Swift", icon: "🕊️" },
    LanguageInfo { id: "kotlin", name: "Kotlin", icon: "🟣" },
    LanguageInfo { id: "sql", name: "SQL", icon: "🗄️" },
    LanguageInfo { id: "html", name: "HTML", icon: "🌐" },
    LanguageInfo { id: "css", name: "CSS", icon: "🎨" },
];

#[derive(Clone)]
struct AppState {
    agent: Arc<ChatAgent>,
    history: Arc<dyn HistoryStore>,
    server_api_key: Option<String>,
    history_limit: usize,
}

pub async fn serve(
    addr: &str,
    agent: Arc<ChatAgent>,
    history: Arc<dyn HistoryStore>,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let state = AppState {
        agent,
        history,
        server_api_key: args.server_api_key.clone(),
        history_limit: args.history_limit,
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", post(chat_stream_handler))
        .route("/api/generate-code", post(generate_code_handler))
        .route("/api/languages", get(languages_handler))
        .route("/api/chat/history", get(get_history_handler).delete(delete_history_handler))
        .layer(cors)
        .with_state(state);

    info!("Starting HTTP API server on: http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

/// Bearer check against the configured server key, when one is set.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let Some(required) = &state.server_api_key else {
        return Ok(());
    };
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if provided == Some(required.as_str()) {
        Ok(())
    } else {
        Err(error_response(StatusCode::UNAUTHORIZED, "Invalid or missing API key"))
    }
}

/// Opaque caller identity; identity-token verification happens upstream of
/// this service.
fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .filter(|id| !id.is_empty())
}

fn parse_chat_request(body: ChatRequestBody) -> Result<ChatRequest, Response> {
    let message = body.message.trim().to_string();
    if message.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "Message must not be empty"));
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Message exceeds maximum length of {} characters", MAX_MESSAGE_LEN)
            )
        );
    }
    let mode: GenerationMode = body.mode
        .parse()
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("{}", e)))?;

    Ok(ChatRequest {
        message,
        history: body.conversation_history,
        language: body.language,
        mode,
        api_key: body.api_key,
    })
}

async fn root_handler() -> impl IntoResponse {
    Json(
        serde_json::json!({
        "message": "Codementor API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "chat": "/api/chat",
            "code": "/api/generate-code",
            "stream": "/api/chat/stream",
            "languages": "/api/languages",
            "history": "/api/chat/history"
        }
    })
    )
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy", "service": "codementor" }))
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequestBody>
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let request = match parse_chat_request(body) {
        Ok(request) => request,
        Err(resp) => {
            return resp;
        }
    };
    info!(
        "Chat request: mode={}, language={}, history_len={}",
        request.mode,
        request.language,
        request.history.len()
    );

    match state.agent.generate_chat_response(&request).await {
        Ok(result) => {
            if let Some(uid) = user_id(&headers) {
                if let Err(e) = state.history.add_message(&uid, Role::User, &request.message).await {
                    warn!("History write (user) failed: {}", e);
                }
                if
                    let Err(e) = state.history.add_message(
                        &uid,
                        Role::Assistant,
                        &result.message
                    ).await
                {
                    warn!("History write (assistant) failed: {}", e);
                }
            }
            let response = ChatResponseBody {
                message: result.message,
                role: "assistant",
                timestamp: Utc::now().timestamp(),
                language: result.language,
                has_code: result.has_code,
                code_blocks: result.code_blocks,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Chat error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing chat request: {}", e)
            )
        }
    }
}

async fn chat_stream_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequestBody>
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let request = match parse_chat_request(body) {
        Ok(request) => request,
        Err(resp) => {
            return resp;
        }
    };

    match state.agent.stream_chat_response(&request).await {
        Ok(chunks) => {
            let events = chunks.map(|item| {
                let event = match item {
                    Ok(content) => {
                        let payload = serde_json
                            ::to_string(&(StreamChunkBody { content }))
                            .unwrap();
                        Event::default().data(payload)
                    }
                    Err(e) => {
                        // Delivered after every chunk produced before the
                        // failure; clients treat it as a terminal error.
                        let payload = serde_json
                            ::to_string(&(ErrorBody { error: e.to_string() }))
                            .unwrap();
                        Event::default().event("error").data(payload)
                    }
                };
                Ok::<Event, Infallible>(event)
            });
            Sse::new(events).keep_alive(KeepAlive::default()).into_response()
        }
        Err(e) => {
            error!("Stream error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error streaming response: {}", e)
            )
        }
    }
}

async fn generate_code_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CodeGenerationRequest>
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let prompt = body.prompt.trim();
    if prompt.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Prompt must not be empty");
    }
    if prompt.len() > MAX_CODE_PROMPT_LEN {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Prompt exceeds maximum length of {} characters", MAX_CODE_PROMPT_LEN)
        );
    }

    match
        state.agent.generate_code(
            prompt,
            &body.language,
            body.include_comments,
            body.include_tests,
            body.api_key.as_deref()
        ).await
    {
        Ok(code) => {
            let response = CodeGenerationResponse {
                code,
                language: body.language,
                success: true,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Code generation error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Error generating code: {}", e))
        }
    }
}

async fn languages_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "languages": SUPPORTED_LANGUAGES }))
}

async fn get_history_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let Some(uid) = user_id(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, "Not authenticated");
    };
    let limit = query.limit.unwrap_or(state.history_limit);

    match state.history.get_history(&uid, limit).await {
        Ok(messages) => {
            let total = messages.len();
            (StatusCode::OK, Json(ChatHistoryResponse { messages, total })).into_response()
        }
        Err(e) => {
            error!("History read failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error getting chat history: {}", e)
            )
        }
    }
}

async fn delete_history_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let Some(uid) = user_id(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, "Not authenticated");
    };

    match state.history.clear_history(&uid).await {
        Ok(()) => {
            (
                StatusCode::OK,
                Json(serde_json::json!({ "message": "Chat history deleted successfully" })),
            ).into_response()
        }
        Err(e) => {
            error!("History delete failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error deleting chat history: {}", e)
            )
        }
    }
}
