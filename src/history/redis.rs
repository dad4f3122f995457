use async_trait::async_trait;
use log::error;
use redis::{ AsyncCommands, Client };
use serde::{ Serialize, Deserialize };
use std::error::Error;

use crate::cli::Args;
use crate::history::HistoryStore;
use crate::models::chat::{ ChatMessage, Role };

#[derive(Serialize, Deserialize)]
struct StoredMessage {
    role: Role,
    content: String,
    timestamp: i64,
}

pub struct RedisHistoryStore {
    client: Client,
    key_prefix: String,
}

impl RedisHistoryStore {
    pub fn new(args: Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            client: Client::open(args.history_host.as_str())?,
            key_prefix: args.history_redis_prefix,
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn key(&self, user_id: &str) -> String {
        format!("{}{}", self.key_prefix, user_id)
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn add_message(
        &self,
        user_id: &str,
        role: Role,
        content: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let message = ChatMessage::new(role, content);
        let stored = StoredMessage {
            role: message.role,
            content: message.content,
            timestamp: message.timestamp,
        };

        let json_msg = serde_json::to_string(&stored)?;
        let _: i64 = conn.lpush(self.key(user_id), &json_msg).await?;
        Ok(())
    }

    async fn get_history(
        &self,
        user_id: &str,
        limit: usize
    ) -> Result<Vec<ChatMessage>, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let json_entries: Vec<String> = conn
            .lrange(self.key(user_id), 0, (limit as isize) - 1).await?;
        let mut messages = Vec::new();

        for json_entry in &json_entries {
            match serde_json::from_str::<StoredMessage>(json_entry) {
                Ok(stored) => {
                    messages.push(ChatMessage {
                        role: stored.role,
                        content: stored.content,
                        timestamp: stored.timestamp,
                    });
                }
                Err(e) => {
                    error!("Error parsing history entry: {}", e);
                }
            }
        }
        // LPUSH stores newest first; callers expect chronological order.
        messages.reverse();

        Ok(messages)
    }

    async fn clear_history(&self, user_id: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let _: i64 = conn.del(self.key(user_id)).await?;
        Ok(())
    }
}
