//! The REST collaborator consumed by the wizard.
//!
//! The wizard only ever talks to this trait; `campaign-api-client` provides
//! the HTTP implementation and tests substitute in-memory fakes.

use crate::error::CampaignResult;
use crate::types::{
    CampaignId, CampaignPayload, CampaignRecord, CreatedCampaign, Segment, Template,
};
use async_trait::async_trait;

#[async_trait]
pub trait CampaignApi: Send + Sync {
    /// `GET /templates`
    async fn list_templates(&self) -> CampaignResult<Vec<Template>>;

    /// `GET /segments`
    async fn list_segments(&self) -> CampaignResult<Vec<Segment>>;

    /// `GET /campaigns/{id}`. A missing campaign is `CampaignError::NotFound`.
    async fn get_campaign(&self, id: CampaignId) -> CampaignResult<CampaignRecord>;

    /// `POST /campaigns`
    async fn create_campaign(&self, payload: &CampaignPayload) -> CampaignResult<CreatedCampaign>;

    /// `PUT /campaigns/{id}`
    async fn update_campaign(&self, id: CampaignId, payload: &CampaignPayload)
        -> CampaignResult<()>;
}
