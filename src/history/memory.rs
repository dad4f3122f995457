use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use tokio::sync::RwLock;

use crate::history::HistoryStore;
use crate::models::chat::{ ChatMessage, Role };

/// Process-local history store. The default backend; contents are lost on
/// restart.
pub struct MemoryHistoryStore {
    conversations: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn add_message(
        &self,
        user_id: &str,
        role: Role,
        content: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut guard = self.conversations.write().await;
        guard
            .entry(user_id.to_string())
            .or_default()
            .push(ChatMessage::new(role, content));
        Ok(())
    }

    async fn get_history(
        &self,
        user_id: &str,
        limit: usize
    ) -> Result<Vec<ChatMessage>, Box<dyn Error + Send + Sync>> {
        let guard = self.conversations.read().await;
        let messages = guard.get(user_id).map(|m| m.as_slice()).unwrap_or(&[]);
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn clear_history(&self, user_id: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut guard = self.conversations.write().await;
        guard.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_get_and_clear_round_trip() {
        let store = MemoryHistoryStore::new();
        store.add_message("alice", Role::User, "hello").await.unwrap();
        store.add_message("alice", Role::Assistant, "hi there").await.unwrap();

        let history = store.get_history("alice", 50).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].content, "hi there");

        store.clear_history("alice").await.unwrap();
        assert!(store.get_history("alice", 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn limit_returns_most_recent() {
        let store = MemoryHistoryStore::new();
        for i in 0..5 {
            store.add_message("bob", Role::User, &format!("m{}", i)).await.unwrap();
        }
        let history = store.get_history("bob", 2).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "m3");
        assert_eq!(history[1].content, "m4");
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = MemoryHistoryStore::new();
        store.add_message("alice", Role::User, "mine").await.unwrap();
        assert!(store.get_history("bob", 10).await.unwrap().is_empty());
    }
}
