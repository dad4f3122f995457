mod memory;
mod redis;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;

use crate::cli::Args;
use crate::llm::{ ChatTurn, TurnRole };
use crate::models::chat::{ ChatMessage, Role };

/// Number of trailing history entries forwarded to the upstream provider.
pub const HISTORY_WINDOW: usize = 10;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn add_message(
        &self,
        user_id: &str,
        role: Role,
        content: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Stored messages for the user in chronological order, at most `limit`.
    async fn get_history(
        &self,
        user_id: &str,
        limit: usize
    ) -> Result<Vec<ChatMessage>, Box<dyn Error + Send + Sync>>;

    async fn clear_history(&self, user_id: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

pub fn create_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(memory::MemoryHistoryStore::new())),
        "redis" => {
            let store = redis::RedisHistoryStore::new(args.clone())?;
            Ok(Arc::new(store))
        }
        other => Err(format!("Unsupported history store type: {}", other).into()),
    }
}

pub fn initialize_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    info!("Chat history will be stored in: {}", args.history_type);
    create_history_store(args)
}

/// Trims the conversation to its most recent `HISTORY_WINDOW` entries and
/// collapses roles to the two-value scheme the provider understands:
/// user-authored entries stay `user`, everything else becomes `model`.
/// Order is preserved.
pub fn window_for_upstream(history: &[ChatMessage]) -> Vec<ChatTurn> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .map(|msg| ChatTurn {
            role: match msg.role {
                Role::User => TurnRole::User,
                Role::Assistant | Role::System => TurnRole::Model,
            },
            text: msg.content.clone(),
        })
        .collect()
}
