use crate::conversation::Transcript;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct AnswerRequest {
    pub text: String,
}

#[derive(Deserialize, Debug)]
pub struct ImageRequest {
    pub url: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct SessionGenerateRequest {
    pub variant: Option<i64>,
    pub business_type: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct GenerateRequest {
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub business_type: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct VariantRequest {
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub variant: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub question: Option<String>,
    pub complete: bool,
    pub progress: Progress,
}

#[derive(Serialize, Debug)]
pub struct SessionDetailResponse {
    pub session_id: Uuid,
    pub transcript: Transcript,
    pub question: Option<String>,
    pub complete: bool,
    pub images: Vec<String>,
    pub progress: Progress,
    pub last_site_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ImageResponse {
    pub count: usize,
}

/// Full generation surface. `css` and `structure` stay empty: styling is
/// inlined into `html`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GenerationResponse {
    pub html: String,
    pub css: String,
    pub structure: serde_json::Value,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VariantResponse {
    pub html: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
}
