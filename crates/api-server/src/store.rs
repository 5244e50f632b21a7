//! In-memory campaign store backed by DashMap.
//!
//! Development backend only: nothing survives a restart. Seeded with a few
//! templates, segments and one user so the CLI has something to talk to.

use campaign_core::types::{
    CampaignId, CampaignPayload, CampaignRecord, Segment, SegmentId, Template, TemplateId,
    UserInfo,
};
use chrono::SecondsFormat;
use dashmap::DashMap;
use rand::Rng;
use std::sync::atomic::{AtomicI64, Ordering};
use thiserror::Error;
use tracing::info;

/// Issued bearer tokens carry this prefix.
pub const DEV_TOKEN_PREFIX: &str = "cs_dev_";

pub const DEV_EMAIL: &str = "admin@example.com";
pub const DEV_PASSWORD: &str = "campaign2024";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
struct StoredUser {
    id: i64,
    email: String,
    password: String,
    is_active: bool,
}

/// Thread-safe in-memory store for templates, segments, campaigns and users.
pub struct CampaignStore {
    templates: DashMap<TemplateId, Template>,
    segments: DashMap<SegmentId, Segment>,
    campaigns: DashMap<CampaignId, CampaignRecord>,
    users: DashMap<String, StoredUser>,
    tokens: DashMap<String, String>,
    next_campaign_id: AtomicI64,
}

impl CampaignStore {
    pub fn new() -> Self {
        info!("Campaign store initialized (in-memory, development mode)");
        let store = Self::empty();
        store.seed_demo_data();
        store
    }

    /// A store with no seeded data.
    pub fn empty() -> Self {
        Self {
            templates: DashMap::new(),
            segments: DashMap::new(),
            campaigns: DashMap::new(),
            users: DashMap::new(),
            tokens: DashMap::new(),
            next_campaign_id: AtomicI64::new(1),
        }
    }

    // ─── Reference data ────────────────────────────────────────────────────

    pub fn list_templates(&self) -> Vec<Template> {
        let mut templates: Vec<Template> = self.templates.iter().map(|r| r.value().clone()).collect();
        templates.sort_by_key(|t| t.id);
        templates
    }

    pub fn list_segments(&self) -> Vec<Segment> {
        let mut segments: Vec<Segment> = self.segments.iter().map(|r| r.value().clone()).collect();
        segments.sort_by_key(|s| s.id);
        segments
    }

    pub fn insert_template(&self, template: Template) {
        self.templates.insert(template.id, template);
    }

    pub fn insert_segment(&self, segment: Segment) {
        self.segments.insert(segment.id, segment);
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    pub fn list_campaigns(&self) -> Vec<CampaignRecord> {
        let mut campaigns: Vec<CampaignRecord> =
            self.campaigns.iter().map(|r| r.value().clone()).collect();
        campaigns.sort_by(|a, b| b.id.cmp(&a.id));
        campaigns
    }

    pub fn get_campaign(&self, id: CampaignId) -> Option<CampaignRecord> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    pub fn create_campaign(&self, payload: &CampaignPayload) -> Result<CampaignRecord, StoreError> {
        self.validate(payload)?;
        let id = self.next_campaign_id.fetch_add(1, Ordering::SeqCst);
        let record = to_record(id, payload);
        self.campaigns.insert(id, record.clone());
        info!(campaign_id = id, name = %record.name, status = %record.status, "Campaign created");
        Ok(record)
    }

    pub fn update_campaign(
        &self,
        id: CampaignId,
        payload: &CampaignPayload,
    ) -> Result<CampaignRecord, StoreError> {
        if !self.campaigns.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        self.validate(payload)?;
        let record = to_record(id, payload);
        self.campaigns.insert(id, record.clone());
        info!(campaign_id = id, name = %record.name, "Campaign updated");
        Ok(record)
    }

    fn validate(&self, payload: &CampaignPayload) -> Result<(), StoreError> {
        if payload.name.trim().is_empty() {
            return Err(StoreError::Invalid("Campaign name is required".to_string()));
        }
        if !self.templates.contains_key(&payload.template_id) {
            return Err(StoreError::Invalid(format!(
                "Template {} does not exist",
                payload.template_id
            )));
        }
        if !self.segments.contains_key(&payload.segment_id) {
            return Err(StoreError::Invalid(format!(
                "Segment {} does not exist",
                payload.segment_id
            )));
        }
        Ok(())
    }

    // ─── Users & tokens ────────────────────────────────────────────────────

    pub fn add_user(&self, email: &str, password: &str) -> i64 {
        let id = self.users.len() as i64 + 1;
        self.users.insert(
            email.to_lowercase(),
            StoredUser {
                id,
                email: email.to_string(),
                password: password.to_string(),
                is_active: true,
            },
        );
        id
    }

    /// Check credentials and issue a fresh bearer token.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<String> {
        let user = self.users.get(&email.to_lowercase())?;
        if !user.is_active || user.password != password {
            return None;
        }
        let token = generate_token();
        self.tokens.insert(token.clone(), user.email.to_lowercase());
        Some(token)
    }

    pub fn user_for_token(&self, token: &str) -> Option<UserInfo> {
        let key = self.tokens.get(token)?.value().clone();
        self.users.get(&key).map(|u| UserInfo {
            id: u.id,
            email: u.email.clone(),
            is_active: u.is_active,
        })
    }

    fn seed_demo_data(&self) {
        let templates = [
            (
                1,
                "Welcome",
                "<mjml><mj-body><mj-section><mj-column><mj-text>Welcome aboard!</mj-text><mj-button href=\"https://example.com/start\">Get started</mj-button></mj-column></mj-section></mj-body></mjml>",
            ),
            (
                2,
                "Monthly Newsletter",
                "<mjml><mj-body><mj-section><mj-column><mj-text>This month at a glance</mj-text><mj-divider /><mj-text>Read the highlights below.</mj-text></mj-column></mj-section></mj-body></mjml>",
            ),
            (
                3,
                "Flash Sale",
                "<mjml><mj-body><mj-section><mj-column><mj-text>48 hours only</mj-text><mj-spacer /><mj-button href=\"https://example.com/sale\">Shop now</mj-button></mj-column></mj-section></mj-body></mjml>",
            ),
        ];
        for (id, name, markup) in templates {
            self.insert_template(Template {
                id,
                name: name.to_string(),
                markup: markup.to_string(),
            });
        }

        for (id, name) in [(1, "All Subscribers"), (2, "VIP Customers"), (3, "Lapsed 90 Days")] {
            self.insert_segment(Segment {
                id,
                name: name.to_string(),
            });
        }

        self.add_user(DEV_EMAIL, DEV_PASSWORD);
        info!(
            templates = self.templates.len(),
            segments = self.segments.len(),
            "Demo data seeded"
        );
    }
}

impl Default for CampaignStore {
    fn default() -> Self {
        Self::new()
    }
}

fn to_record(id: CampaignId, payload: &CampaignPayload) -> CampaignRecord {
    CampaignRecord {
        id,
        name: payload.name.trim().to_string(),
        template_id: payload.template_id,
        segment_id: payload.segment_id,
        send_at: payload
            .send_at
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        status: if payload.send_at.is_some() { "scheduled" } else { "draft" }.to_string(),
        custom_content: payload.custom_content.clone(),
    }
}

fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    format!("{}{}", DEV_TOKEN_PREFIX, hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn payload(name: &str, template_id: i64, segment_id: i64) -> CampaignPayload {
        CampaignPayload {
            name: name.to_string(),
            template_id,
            segment_id,
            send_at: None,
            custom_content: None,
        }
    }

    #[test]
    fn test_seeded_reference_data_sorted() {
        let store = CampaignStore::new();
        let ids: Vec<i64> = store.list_templates().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.list_segments().len(), 3);
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let store = CampaignStore::new();
        let a = store.create_campaign(&payload("A", 1, 1)).unwrap();
        let b = store.create_campaign(&payload("B", 2, 2)).unwrap();
        assert_eq!(a.id + 1, b.id);
        assert_eq!(a.status, "draft");
        assert_eq!(store.list_campaigns()[0].id, b.id);
    }

    #[test]
    fn test_scheduled_campaign_status() {
        let store = CampaignStore::new();
        let mut p = payload("Later", 1, 1);
        p.send_at = Some(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());
        let record = store.create_campaign(&p).unwrap();
        assert_eq!(record.status, "scheduled");
        assert_eq!(record.send_at.as_deref(), Some("2025-06-01T08:00:00Z"));
    }

    #[test]
    fn test_create_rejects_unknown_references() {
        let store = CampaignStore::new();
        assert_eq!(
            store.create_campaign(&payload("X", 99, 1)),
            Err(StoreError::Invalid("Template 99 does not exist".to_string()))
        );
        assert!(matches!(
            store.create_campaign(&payload("  ", 1, 1)),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let store = CampaignStore::new();
        assert_eq!(
            store.update_campaign(42, &payload("X", 1, 1)),
            Err(StoreError::NotFound)
        );
    }

    #[test]
    fn test_authenticate_issues_resolvable_token() {
        let store = CampaignStore::new();
        assert!(store.authenticate(DEV_EMAIL, "wrong").is_none());

        let token = store.authenticate("Admin@Example.com", DEV_PASSWORD).unwrap();
        assert!(token.starts_with(DEV_TOKEN_PREFIX));
        assert_eq!(token.len(), DEV_TOKEN_PREFIX.len() + 64);

        let user = store.user_for_token(&token).unwrap();
        assert_eq!(user.email, DEV_EMAIL);
        assert!(store.user_for_token("cs_dev_bogus").is_none());
    }
}
