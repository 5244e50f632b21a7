use async_trait::async_trait;
use campaign_core::config::ApiConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::types::{
    CampaignId, CampaignPayload, CampaignRecord, CreatedCampaign, ErrorDetail, ListResponse,
    LoginRequest, Segment, Template, TokenResponse, UserInfo,
};
use campaign_core::{CampaignApi, Session};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// `reqwest`-backed client for the campaign backend. Carries the session
/// explicitly and attaches its bearer token to every request.
pub struct HttpCampaignApi {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl HttpCampaignApi {
    pub fn new(config: &ApiConfig, session: Session) -> CampaignResult<Self> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| CampaignError::Config(format!("invalid api.base_url {:?}: {}", base, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CampaignError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_session(&mut self, session: Session) {
        self.session = session;
    }

    /// `POST /auth/login`. Returns the new session; the caller decides
    /// whether to persist it.
    pub async fn login(&self, email: &str, password: &str) -> CampaignResult<Session> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .send(self.request(Method::POST, "auth/login")?.json(&body), "Account")
            .await?;
        let token: TokenResponse = decode(response).await?;
        Ok(Session::authenticated(token.access_token, email.to_string()))
    }

    /// `GET /auth/me`
    pub async fn current_user(&self) -> CampaignResult<UserInfo> {
        let response = self.send(self.request(Method::GET, "auth/me")?, "User").await?;
        decode(response).await
    }

    fn request(&self, method: Method, path: &str) -> CampaignResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| CampaignError::Config(format!("invalid request path {:?}: {}", path, e)))?;

        let mut builder = self.client.request(method, url);
        if let Some(token) = self.session.bearer() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Send and map non-2xx statuses onto the error taxonomy. `what` names
    /// the resource for not-found messages.
    async fn send(&self, builder: RequestBuilder, what: &str) -> CampaignResult<Response> {
        let request = builder
            .build()
            .map_err(|e| CampaignError::Transport(e.to_string()))?;
        let method = request.method().to_string();
        let path = request.url().path().to_string();

        metrics::counter!("api.requests", "method" => method.clone()).increment(1);
        debug!(method = %method, path = %path, "API request");

        let response = self.client.execute(request).await.map_err(|e| {
            warn!(method = %method, path = %path, error = %e, "API request failed");
            CampaignError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorDetail>(&body)
            .map(|d| d.detail)
            .unwrap_or(body);
        warn!(method = %method, path = %path, status = status.as_u16(), detail = %detail, "API error response");

        Err(match status {
            StatusCode::NOT_FOUND => CampaignError::NotFound {
                what: what.to_string(),
                detail: Some(detail).filter(|d| !d.trim().is_empty()),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CampaignError::Unauthorized(detail),
            _ => CampaignError::Status {
                status: status.as_u16(),
                detail,
            },
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> CampaignResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| CampaignError::Transport(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl CampaignApi for HttpCampaignApi {
    async fn list_templates(&self) -> CampaignResult<Vec<Template>> {
        let response = self.send(self.request(Method::GET, "templates")?, "Templates").await?;
        Ok(decode::<ListResponse<Template>>(response).await?.into_vec())
    }

    async fn list_segments(&self) -> CampaignResult<Vec<Segment>> {
        let response = self.send(self.request(Method::GET, "segments")?, "Segments").await?;
        Ok(decode::<ListResponse<Segment>>(response).await?.into_vec())
    }

    async fn get_campaign(&self, id: CampaignId) -> CampaignResult<CampaignRecord> {
        let what = format!("Campaign {}", id);
        let response = self
            .send(self.request(Method::GET, &format!("campaigns/{}", id))?, &what)
            .await?;
        // A 200 with a `null` body still means there is nothing to edit.
        decode::<Option<CampaignRecord>>(response)
            .await?
            .ok_or_else(|| CampaignError::not_found(what))
    }

    async fn create_campaign(&self, payload: &CampaignPayload) -> CampaignResult<CreatedCampaign> {
        let response = self
            .send(self.request(Method::POST, "campaigns")?.json(payload), "Campaign")
            .await?;
        decode(response).await
    }

    async fn update_campaign(&self, id: CampaignId, payload: &CampaignPayload) -> CampaignResult<()> {
        let what = format!("Campaign {}", id);
        self.send(
            self.request(Method::PUT, &format!("campaigns/{}", id))?.json(payload),
            &what,
        )
        .await?;
        Ok(())
    }
}
