mod memory;
mod redis;

pub use memory::MemoryHistoryStore;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use crate::cli::Args;
use crate::conversation::Speaker;
use std::sync::Arc;
use crate::models::chat::Conversation;
use crate::models::site::SiteRecord;
use uuid::Uuid;

/// Persistence for chat turns and generated sites.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn add_message(
        &self,
        conversation_id: &str,
        role: Speaker,
        content: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// The most recent `limit` messages, oldest first.
    async fn get_conversation(
        &self,
        conversation_id: &str,
        limit: usize
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>>;

    async fn clear_conversation(
        &self,
        conversation_id: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn save_site(&self, record: &SiteRecord) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn get_site(&self, id: Uuid) -> Result<Option<SiteRecord>, Box<dyn Error + Send + Sync>>;
}

pub fn create_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryHistoryStore::new())),
        "redis" => {
            let store = redis::RedisHistoryStore::new(
                &args.history_host,
                args.history_redis_prefix.clone()
            )?;
            Ok(Arc::new(store))
        }
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported history store type: {}", args.history_type)
                    )
                )
            ),
    }
}

pub fn initialize_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    info!("Chat history will be stored in: {} at {}", args.history_type, args.history_host);
    create_history_store(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn selects_backend_by_type() {
        let args = Args::try_parse_from(["website-agent", "--history-type", "MEMORY"]).unwrap();
        assert!(create_history_store(&args).is_ok());

        let args = Args::try_parse_from(["website-agent", "--history-type", "qdrant"]).unwrap();
        let err = create_history_store(&args).err().unwrap();
        assert!(err.to_string().contains("qdrant"));
    }
}
