use crate::conversation::Speaker;
use serde::{ Serialize, Deserialize };

/// One persisted chat turn, role and content as shown to the user.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Speaker,
    pub content: String,
    pub timestamp: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<ChatMessage>,
}
