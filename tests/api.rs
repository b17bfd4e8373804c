use async_trait::async_trait;
use axum::body::{ to_bytes, Body };
use axum::http::{ Request, StatusCode };
use axum::Router;
use serde_json::{ json, Value };
use std::error::Error;
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tower::ServiceExt;
use website_agent::agent::SiteAgent;
use website_agent::config::script::QuestionScript;
use website_agent::history::MemoryHistoryStore;
use website_agent::llm::chat::{ ChatClient, CompletionResponse };
use website_agent::server::api::router;

const SITE_HTML: &str = "<!DOCTYPE html><html><body>Generated</body></html>";

const ANSWERS: [&str; 11] = [
    "We sell pontoon boat rentals",
    "Port Orange, FL",
    "Sunset Pontoon Rentals",
    "Half-day and full-day pontoon rentals with captains",
    "Families and vacationers",
    "Laid back and fun",
    "Coastal and bright",
    "(386) 555-0199",
    "hello@sunsetpontoons.com",
    "42 Riverside Dr",
    "Book a boat online",
];

struct RecordingClient {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatClient for RecordingClient {
    async fn complete(
        &self,
        prompt: &str
    ) -> Result<CompletionResponse, Box<dyn Error + Send + Sync>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(text) => Ok(CompletionResponse { response: format!("```html\n{}\n```", text) }),
            None => Err("oracle unavailable".into()),
        }
    }

    fn get_model(&self) -> String {
        "recording".into()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

fn agent_with(reply: Option<&str>) -> (SiteAgent, Arc<RecordingClient>) {
    let client = Arc::new(RecordingClient {
        reply: reply.map(str::to_string),
        prompts: Mutex::new(Vec::new()),
    });
    let agent = SiteAgent::with_parts(
        client.clone(),
        Arc::new(MemoryHistoryStore::new()),
        Arc::new(QuestionScript::default()),
        10
    );
    (agent, client)
}

fn app_with(reply: Option<&str>, api_key: Option<&str>) -> (Router, Arc<RecordingClient>) {
    let (agent, client) = agent_with(reply);
    (router(Arc::new(agent), api_key.map(str::to_string)), client)
}

fn app() -> (Router, Arc<RecordingClient>) {
    app_with(Some(SITE_HTML), None)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) =>
            builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = call(app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn new_session_starts_with_greeting() {
    let (app, _) = app();
    let (status, body) = call(&app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"], json!(QuestionScript::default().greeting));
    assert_eq!(body["progress"], json!({"answered": 0, "total": 11}));
    assert_eq!(body["complete"], json!(false));
}

#[tokio::test]
async fn full_conversation_builds_prompt_with_profile_and_images() {
    let (app, client) = app();
    let id = new_session(&app).await;

    for (i, answer) in ANSWERS.iter().enumerate() {
        let uri = format!("/api/sessions/{}/answers", id);
        let (status, body) = call(&app, "POST", &uri, Some(json!({"text": answer}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"]["answered"], json!(i + 1));
    }

    let (_, detail) = call(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(detail["complete"], json!(true));
    assert_eq!(detail["question"], Value::Null);

    let urls = ["/uploads/dock.jpg", "/uploads/boat.jpg", "/uploads/sunset.jpg"];
    for (i, url) in urls.iter().enumerate() {
        let uri = format!("/api/sessions/{}/images", id);
        let (status, body) = call(&app, "POST", &uri, Some(json!({"url": url}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], json!(i + 1));
    }

    let uri = format!("/api/sessions/{}/generate", id);
    let (status, body) = call(&app, "POST", &uri, Some(json!({"variant": 2}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["html"], json!(SITE_HTML));
    assert_eq!(body["css"], json!(""));
    assert_eq!(body["structure"], json!({}));

    let prompts = client.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("Sunset Pontoon Rentals"));
    assert!(prompt.contains("Port Orange, FL"));
    assert!(prompt.contains("PREMIUM LUXURY"));
    for url in urls {
        assert!(prompt.contains(url), "prompt is missing {}", url);
    }

    let site_id = body["site_id"].as_str().unwrap();
    let (status, record) = call(&app, "GET", &format!("/api/sites/{}", site_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["name"], json!("Sunset Pontoon Rentals"));
    assert_eq!(record["variant"], json!(2));
    assert_eq!(record["images"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn answer_errors_map_to_status_codes() {
    let (app, _) = app();
    let id = new_session(&app).await;
    let uri = format!("/api/sessions/{}/answers", id);

    let (status, body) = call(&app, "POST", &uri, Some(json!({"text": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    for answer in ANSWERS {
        call(&app, "POST", &uri, Some(json!({"text": answer}))).await;
    }
    let (status, _) = call(&app, "POST", &uri, Some(json!({"text": "one more"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_session_is_404() {
    let (app, _) = app();
    let missing = uuid::Uuid::new_v4();
    let (status, _) = call(&app, "GET", &format!("/api/sessions/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/sessions/{}/answers", missing);
    let (status, _) = call(&app, "POST", &uri, Some(json!({"text": "hi"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, "GET", &format!("/api/sites/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_session_is_gone() {
    let (app, _) = app();
    let id = new_session(&app).await;
    let uri = format!("/api/sessions/{}", id);

    let (status, body) = call(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn idle_sessions_expire() {
    let (agent, _) = agent_with(Some(SITE_HTML));
    let agent = agent.with_session_idle_timeout(Duration::from_millis(20));
    let app = router(Arc::new(agent), None);

    let stale = new_session(&app).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    let fresh = new_session(&app).await;

    let (status, _) = call(&app, "GET", &format!("/api/sessions/{}", stale), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "GET", &format!("/api/sessions/{}", fresh), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn blank_image_is_rejected() {
    let (app, _) = app();
    let id = new_session(&app).await;
    let uri = format!("/api/sessions/{}/images", id);
    let (status, _) = call(&app, "POST", &uri, Some(json!({"url": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_returns_to_greeting() {
    let (app, _) = app();
    let id = new_session(&app).await;
    call(&app, "POST", &format!("/api/sessions/{}/answers", id), Some(json!({"text": "We sell boats"}))).await;
    call(&app, "POST", &format!("/api/sessions/{}/images", id), Some(json!({"url": "/a.jpg"}))).await;

    let (status, body) = call(&app, "POST", &format!("/api/sessions/{}/reset", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"]["answered"], json!(0));

    let (_, detail) = call(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(detail["images"], json!([]));
    assert_eq!(detail["transcript"]["entries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn oracle_failure_falls_back_to_template() {
    let (app, _) = app_with(None, None);
    let (status, body) = call(
        &app,
        "POST",
        "/api/generate",
        Some(json!({"description": "Blue Fern Studio | Handmade pottery classes", "images": []}))
    ).await;
    assert_eq!(status, StatusCode::OK);
    let html = body["html"].as_str().unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Blue Fern Studio"));
    assert!(body["recommendation"].as_str().unwrap().contains("variant"));
}

#[tokio::test]
async fn variant_surface_returns_html_only() {
    let (app, client) = app();
    let (status, body) = call(
        &app,
        "POST",
        "/api/generate/variant",
        Some(json!({"description": "Acme Anvils | We sell anvils", "variant": 4}))
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"html": SITE_HTML}));
    assert!(client.prompts.lock().unwrap()[0].contains("MODERN PROFESSIONAL"));
}

#[tokio::test]
async fn api_key_is_enforced_when_configured() {
    let (app, _) = app_with(Some(SITE_HTML), Some("secret"));
    let (status, _) = call(&app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/api/sessions")
        .header("X-API-Key", "secret")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
