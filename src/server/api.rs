use crate::agent::{ GenerateOptions, SiteAgent, SiteOutcome };
use crate::cli::Args;
use crate::conversation::ConversationError;
use crate::models::api::{
    AnswerRequest,
    ErrorResponse,
    GenerateRequest,
    GenerationResponse,
    ImageRequest,
    ImageResponse,
    Progress,
    ReloadResponse,
    SessionDetailResponse,
    SessionGenerateRequest,
    SessionResponse,
    VariantRequest,
    VariantResponse,
};
use crate::session::{ SessionError, SessionSnapshot };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Json,
    Router,
    extract::{ Path, Request, State },
    middleware::{ self, Next },
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error, warn };
use uuid::Uuid;

#[derive(Clone)]
struct AppState {
    agent: Arc<SiteAgent>,
    api_key: Option<String>,
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match &err {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Conversation(ConversationError::EmptyAnswer) => StatusCode::BAD_REQUEST,
            SessionError::EmptyImage => StatusCode::BAD_REQUEST,
            SessionError::Conversation(ConversationError::AlreadyComplete) => StatusCode::CONFLICT,
            SessionError::TooManyImages(_) => StatusCode::CONFLICT,
            SessionError::GenerationInFlight => StatusCode::CONFLICT,
            SessionError::Superseded(_) => StatusCode::CONFLICT,
            SessionError::GenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

fn session_response(snapshot: SessionSnapshot) -> SessionResponse {
    SessionResponse {
        session_id: snapshot.session_id,
        question: snapshot.question,
        complete: snapshot.complete,
        progress: Progress { answered: snapshot.answered, total: snapshot.total },
    }
}

fn generation_response(outcome: SiteOutcome) -> GenerationResponse {
    GenerationResponse {
        html: outcome.site.html,
        css: String::new(),
        structure: serde_json::json!({}),
        recommendation: outcome.recommendation,
        site_id: Some(outcome.site_id),
    }
}

/// Builds the HTTP API. When `api_key` is set every route requires it in the
/// `X-API-Key` header.
pub fn router(agent: Arc<SiteAgent>, api_key: Option<String>) -> Router {
    let state = AppState {
        agent,
        api_key: api_key.filter(|k| !k.trim().is_empty()),
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/answers", post(post_answer))
        .route("/api/sessions/{id}/images", post(post_image))
        .route("/api/sessions/{id}/reset", post(reset_session))
        .route("/api/sessions/{id}/generate", post(generate_for_session))
        .route("/api/generate", post(generate))
        .route("/api/generate/variant", post(generate_variant))
        .route("/api/sites/{id}", get(get_site))
        .route("/api/reload-script", get(reload_script))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    agent: Arc<SiteAgent>,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(agent, args.server_api_key.clone());

    if let Some((cert_path, key_path)) = args.tls_paths() {
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Starting HTTPS API server on: https://{}", addr);
        tokio::spawn(async move {
            let result = axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await;

            if let Err(e) = result {
                error!("HTTPS server error: {}", e);
            }
        });
    } else {
        info!("Starting HTTP API server on: http://{}", addr);
        tokio::spawn(async move {
            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => {
                    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                        error!("HTTP server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                }
            }
        });
    }

    Ok(())
}

async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(required) = state.api_key.as_deref() {
        let provided = req
            .headers()
            .get("X-API-Key")
            .and_then(|v| v.to_str().ok());
        if provided != Some(required) {
            warn!("Rejected {} {}: bad or missing API key", req.method(), req.uri().path());
            return ApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    }
    next.run(req).await
}

async fn create_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(session_response(state.agent.create_session().await))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let snapshot = state.agent.session(id).await?;
    Ok(
        Json(SessionDetailResponse {
            session_id: snapshot.session_id,
            transcript: snapshot.transcript,
            question: snapshot.question,
            complete: snapshot.complete,
            images: snapshot.images,
            progress: Progress { answered: snapshot.answered, total: snapshot.total },
            last_site_id: snapshot.last_site_id,
        })
    )
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>
) -> Result<StatusCode, ApiError> {
    state.agent.remove_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn post_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>
) -> Result<Json<SessionResponse>, ApiError> {
    let (_, snapshot) = state.agent.answer(id, &req.text).await?;
    Ok(Json(session_response(snapshot)))
}

async fn post_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ImageRequest>
) -> Result<Json<ImageResponse>, ApiError> {
    let count = state.agent.add_image(id, &req.url).await?;
    Ok(Json(ImageResponse { count }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>
) -> Result<Json<SessionResponse>, ApiError> {
    let snapshot = state.agent.reset(id).await?;
    Ok(Json(session_response(snapshot)))
}

async fn generate_for_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SessionGenerateRequest>
) -> Result<Json<GenerationResponse>, ApiError> {
    let options = GenerateOptions { variant: req.variant, business_type: req.business_type };
    let outcome = state.agent.generate_for_session(id, options).await?;
    Ok(Json(generation_response(outcome)))
}

async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>
) -> Result<Json<GenerationResponse>, ApiError> {
    if req.description.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "description must not be empty"));
    }
    let outcome = state.agent.generate_from_description(
        &req.description,
        req.images,
        req.business_type
    ).await;
    Ok(Json(generation_response(outcome)))
}

async fn generate_variant(
    State(state): State<AppState>,
    Json(req): Json<VariantRequest>
) -> Result<Json<VariantResponse>, ApiError> {
    if req.description.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "description must not be empty"));
    }
    let site = state.agent.generate_variant(&req.description, req.images, req.variant).await;
    Ok(Json(VariantResponse { html: site.html }))
}

async fn get_site(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.agent.get_site(id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => ApiError::new(StatusCode::NOT_FOUND, format!("site {} not found", id)).into_response(),
        Err(e) => {
            error!("Failed to load site {}: {}", id, e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load site").into_response()
        }
    }
}

async fn reload_script(State(state): State<AppState>) -> impl IntoResponse {
    match state.agent.reload_script_if_changed().await {
        Ok(true) =>
            (
                StatusCode::OK,
                Json(ReloadResponse { success: true, message: "Question script reloaded".into() }),
            ),
        Ok(false) =>
            (
                StatusCode::OK,
                Json(ReloadResponse { success: true, message: "Question script unchanged".into() }),
            ),
        Err(e) =>
            (
                StatusCode::BAD_REQUEST,
                Json(ReloadResponse { success: false, message: format!("Reload error: {}", e) }),
            ),
    }
}
