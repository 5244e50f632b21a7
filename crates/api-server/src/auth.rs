//! Bearer token middleware.
//!
//! Tokens are issued by `POST /auth/login` and resolved against the store.
//! Login, health and the preview renderer are reachable without one.

use crate::handlers::{detail, AppState};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use campaign_core::types::UserInfo;
use tracing::debug;

/// The authenticated caller, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserInfo);

fn is_public(path: &str) -> bool {
    path == "/auth/login" || path.starts_with("/health") || path == "/v1/preview"
}

pub async fn require_bearer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if is_public(&path) {
        return next.run(req).await;
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        debug!(path = %path, "Request without bearer token");
        return detail(StatusCode::UNAUTHORIZED, "Not authenticated").into_response();
    };

    match state.store.user_for_token(token) {
        Some(user) => {
            req.extensions_mut().insert(AuthUser(user));
            next.run(req).await
        }
        None => {
            metrics::counter!("api.auth_rejections").increment(1);
            debug!(path = %path, "Unknown bearer token");
            detail(StatusCode::UNAUTHORIZED, "Could not validate credentials").into_response()
        }
    }
}
