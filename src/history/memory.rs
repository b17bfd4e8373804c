use async_trait::async_trait;
use chrono::Utc;
use crate::conversation::Speaker;
use crate::history::HistoryStore;
use crate::models::chat::{ ChatMessage, Conversation };
use crate::models::site::SiteRecord;
use std::collections::HashMap;
use std::error::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryHistoryStore {
    conversations: RwLock<HashMap<String, Vec<ChatMessage>>>,
    sites: RwLock<HashMap<Uuid, SiteRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn add_message(
        &self,
        conversation_id: &str,
        role: Speaker,
        content: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conversations = self.conversations.write().await;
        conversations.entry(conversation_id.to_string()).or_default().push(ChatMessage {
            role,
            content: content.to_string(),
            timestamp: Utc::now().timestamp(),
        });
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        let conversations = self.conversations.read().await;
        let messages = conversations
            .get(conversation_id)
            .map(|all| {
                let start = all.len().saturating_sub(limit);
                all[start..].to_vec()
            })
            .unwrap_or_default();

        Ok(Conversation {
            id: conversation_id.to_string(),
            messages,
        })
    }

    async fn clear_conversation(
        &self,
        conversation_id: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.conversations.write().await.remove(conversation_id);
        Ok(())
    }

    async fn save_site(&self, record: &SiteRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.sites.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_site(&self, id: Uuid) -> Result<Option<SiteRecord>, Box<dyn Error + Send + Sync>> {
        Ok(self.sites.read().await.get(&id).cloned())
    }
}
