use async_trait::async_trait;
use crate::conversation::Speaker;
use crate::models::chat::{ ChatMessage, Conversation };
use crate::models::site::SiteRecord;
use crate::history::HistoryStore;
use std::error::Error;
use chrono::Utc;
use log::error;
use redis::{ Client, AsyncCommands };
use uuid::Uuid;

pub struct RedisHistoryStore {
    client: Client,
    key_prefix: String,
}

impl RedisHistoryStore {
    pub fn new(host: &str, key_prefix: String) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            client: Client::open(host)?,
            key_prefix,
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn conversation_key(&self, conversation_id: &str) -> String {
        format!("{}chat:{}", self.key_prefix, conversation_id)
    }

    fn site_key(&self, id: Uuid) -> String {
        format!("{}site:{}", self.key_prefix, id)
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn add_message(
        &self,
        conversation_id: &str,
        role: Speaker,
        content: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let key = self.conversation_key(conversation_id);

        let message = ChatMessage {
            role,
            content: content.to_string(),
            timestamp: Utc::now().timestamp(),
        };

        let json_msg = serde_json::to_string(&message)?;
        let _: i64 = conn.lpush(&key, &json_msg).await?;
        Ok(())
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        // LRANGE 0 -1 would return the whole list.
        if limit == 0 {
            return Ok(Conversation {
                id: conversation_id.to_string(),
                messages: Vec::new(),
            });
        }
        let mut conn = self.get_connection().await?;
        let key = self.conversation_key(conversation_id);
        let json_entries: Vec<String> = conn.lrange(&key, 0, (limit as isize) - 1).await?;
        let mut messages = Vec::new();

        for json_entry in &json_entries {
            match serde_json::from_str::<ChatMessage>(json_entry) {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    error!("Error parsing history entry: {}", e);
                }
            }
        }
        messages.reverse();

        Ok(Conversation {
            id: conversation_id.to_string(),
            messages,
        })
    }

    async fn clear_conversation(
        &self,
        conversation_id: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let _: i64 = conn.del(self.conversation_key(conversation_id)).await?;
        Ok(())
    }

    async fn save_site(&self, record: &SiteRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(record)?;
        conn.set::<_, _, ()>(self.site_key(record.id), json).await?;
        Ok(())
    }

    async fn get_site(&self, id: Uuid) -> Result<Option<SiteRecord>, Box<dyn Error + Send + Sync>> {
        let mut conn = self.get_connection().await?;
        let json: Option<String> = conn.get(self.site_key(id)).await?;
        match json {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_limit_is_empty_without_a_server() {
        // Nothing listens on this port; a zero limit must not connect.
        let store = RedisHistoryStore::new("redis://127.0.0.1:1", "test:".into()).unwrap();
        let conv = store.get_conversation("c1", 0).await.unwrap();
        assert_eq!(conv.id, "c1");
        assert!(conv.messages.is_empty());
    }

    #[test]
    fn keys_use_prefix() {
        let store = RedisHistoryStore::new("redis://127.0.0.1:6379", "site-agent:".into()).unwrap();
        assert_eq!(store.conversation_key("abc"), "site-agent:chat:abc");
        let id = Uuid::nil();
        assert_eq!(store.site_key(id), format!("site-agent:site:{}", id));
    }
}
