//! Axum REST handlers for the local campaign backend.

use crate::auth::AuthUser;
use crate::store::{CampaignStore, StoreError};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use campaign_core::types::{
    CampaignId, CampaignPayload, CampaignRecord, CreatedCampaign, ErrorDetail, LoginRequest,
    Segment, Template, TokenResponse, UserInfo,
};
use campaign_preview::render_preview;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CampaignStore>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<CampaignStore>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorDetail>);

pub fn detail(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorDetail {
            detail: message.into(),
        }),
    )
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => detail(StatusCode::NOT_FOUND, e.to_string()),
            StoreError::Invalid(msg) => detail(StatusCode::BAD_REQUEST, msg),
        }
    }
}

// ─── Auth ──────────────────────────────────────────────────────────────────

pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    match state.store.authenticate(&req.email, &req.password) {
        Some(access_token) => {
            info!(email = %req.email, "Login succeeded");
            Ok(Json(TokenResponse {
                access_token,
                token_type: "bearer".to_string(),
            }))
        }
        None => {
            warn!(email = %req.email, "Login rejected");
            Err(detail(StatusCode::UNAUTHORIZED, "Incorrect email or password"))
        }
    }
}

pub async fn current_user(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<UserInfo> {
    Json(user)
}

// ─── Reference data ────────────────────────────────────────────────────────

pub async fn list_templates(State(state): State<AppState>) -> Json<Vec<Template>> {
    Json(state.store.list_templates())
}

pub async fn list_segments(State(state): State<AppState>) -> Json<Vec<Segment>> {
    Json(state.store.list_segments())
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<AppState>) -> Json<Vec<CampaignRecord>> {
    Json(state.store.list_campaigns())
}

pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<CampaignId>,
) -> Result<Json<CampaignRecord>, ApiError> {
    state
        .store
        .get_campaign(id)
        .map(Json)
        .ok_or_else(|| StoreError::NotFound.into())
}

pub async fn create_campaign(
    State(state): State<AppState>,
    Json(payload): Json<CampaignPayload>,
) -> Result<Json<CreatedCampaign>, ApiError> {
    let record = state.store.create_campaign(&payload)?;
    metrics::counter!("api.campaigns.created").increment(1);
    Ok(Json(CreatedCampaign { id: record.id }))
}

pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<CampaignId>,
    Json(payload): Json<CampaignPayload>,
) -> Result<Json<CampaignRecord>, ApiError> {
    let record = state.store.update_campaign(id, &payload)?;
    metrics::counter!("api.campaigns.updated").increment(1);
    Ok(Json(record))
}

// ─── Preview ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub html: String,
}

/// POST /v1/preview
pub async fn handle_preview(Json(req): Json<PreviewRequest>) -> Json<PreviewResponse> {
    Json(PreviewResponse {
        html: render_preview(&req.content),
    })
}

// ─── Operational ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
