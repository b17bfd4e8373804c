use serde::{ Serialize, Deserialize };
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "answer")] Answer {
        content: String,
    },
    #[serde(rename = "image")] Image {
        url: String,
    },
    #[serde(rename = "reset")]
    Reset,
    #[serde(rename = "generate")] Generate {
        #[serde(default)]
        variant: Option<i64>,
        #[serde(default)]
        business_type: Option<String>,
    },
    #[serde(rename = "cancel")]
    Cancel,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "question")] Question {
        content: String,
        index: usize,
        total: usize,
    },
    #[serde(rename = "complete")]
    Complete,
    #[serde(rename = "image_added")] ImageAdded {
        count: usize,
    },
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "site")] Site {
        html: String,
        recommendation: String,
        site_id: Uuid,
        variant: u8,
        timestamp: i64,
    },
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "error")] Error {
        message: String,
    },
}
