//! API server: REST routes plus the Prometheus exporter.

use crate::auth;
use crate::handlers::{self, AppState};
use crate::store::CampaignStore;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use campaign_core::config::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the full router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/auth/login", post(handlers::handle_login))
        .route("/auth/me", get(handlers::current_user))
        // Reference data
        .route("/templates", get(handlers::list_templates))
        .route("/segments", get(handlers::list_segments))
        // Campaigns
        .route(
            "/campaigns",
            get(handlers::list_campaigns).post(handlers::create_campaign),
        )
        .route(
            "/campaigns/:id",
            get(handlers::get_campaign).put(handlers::update_campaign),
        )
        // Preview
        .route("/v1/preview", post(handlers::handle_preview))
        // Operational
        .route("/health", get(handlers::health_check))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Local development backend.
pub struct ApiServer {
    config: AppConfig,
    store: Arc<CampaignStore>,
}

impl ApiServer {
    pub fn new(config: AppConfig, store: Arc<CampaignStore>) -> Self {
        Self { config, store }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = router(AppState::new(self.store.clone()));

        let addr = SocketAddr::new(self.config.server.host.parse()?, self.config.server.http_port);
        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let addr = SocketAddr::new(
            self.config.server.host.parse()?,
            self.config.server.metrics_port,
        );
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;

        info!(port = self.config.server.metrics_port, "Metrics exporter started");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DEV_EMAIL, DEV_PASSWORD};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(Arc::new(CampaignStore::new())))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn login(app: &Router) -> String {
        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/auth/login",
                None,
                json!({"email": DEV_EMAIL, "password": DEV_PASSWORD}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        body["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (status, body) = send(&app(), get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let app = app();
        let (status, body) = send(&app, get("/templates", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Not authenticated");

        let (status, _) = send(&app, get("/segments", Some("cs_dev_forged"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_credentials_rejected() {
        let (status, body) = send(
            &app(),
            json_request(
                "POST",
                "/auth/login",
                None,
                json!({"email": DEV_EMAIL, "password": "nope"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Incorrect email or password");
    }

    #[tokio::test]
    async fn test_login_then_me_and_templates() {
        let app = app();
        let token = login(&app).await;

        let (status, me) = send(&app, get("/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], DEV_EMAIL);
        assert_eq!(me["is_active"], true);

        let (status, templates) = send(&app, get("/templates", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(templates.as_array().unwrap().len(), 3);
        assert!(templates[0]["mjml"].as_str().unwrap().starts_with("<mjml>"));
    }

    #[tokio::test]
    async fn test_campaign_create_get_update() {
        let app = app();
        let token = login(&app).await;

        let (status, created) = send(
            &app,
            json_request(
                "POST",
                "/campaigns",
                Some(&token),
                json!({
                    "name": "Launch",
                    "template_id": 1,
                    "segment_id": 2,
                    "send_at": null,
                    "custom_content": "<mjml></mjml>"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["id"].as_i64().unwrap();

        let (status, record) = send(&app, get(&format!("/campaigns/{}", id), Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["name"], "Launch");
        assert_eq!(record["status"], "draft");
        assert_eq!(record["custom_content"], "<mjml></mjml>");

        let (status, updated) = send(
            &app,
            json_request(
                "PUT",
                &format!("/campaigns/{}", id),
                Some(&token),
                json!({
                    "name": "Launch v2",
                    "template_id": 1,
                    "segment_id": 2,
                    "send_at": "2025-06-01T08:00:00Z",
                    "custom_content": null
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "scheduled");
        assert_eq!(updated["custom_content"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_campaign_is_404_with_detail() {
        let app = app();
        let token = login(&app).await;
        let (status, body) = send(&app, get("/campaigns/999", Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Not Found");
    }

    #[tokio::test]
    async fn test_create_with_unknown_segment_is_400() {
        let app = app();
        let token = login(&app).await;
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/campaigns",
                Some(&token),
                json!({
                    "name": "Orphan",
                    "template_id": 1,
                    "segment_id": 77,
                    "send_at": null,
                    "custom_content": null
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Segment 77 does not exist");
    }

    #[tokio::test]
    async fn test_preview_renders_without_token() {
        let (status, body) = send(
            &app(),
            json_request(
                "POST",
                "/v1/preview",
                None,
                json!({"content": "<mj-text>Hi</mj-text>"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["html"],
            r#"<div style="line-height: 1.6; color: #333;">Hi</div>"#
        );
    }
}
