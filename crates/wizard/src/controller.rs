//! Wizard controller: owns the step, the draft and the reference data for one
//! create or edit session.
//!
//! All mutation goes through `&mut self`, so a response can only be applied
//! while the controller is alive. Dropping the controller drops any in-flight
//! call with it.

use crate::draft::CampaignDraft;
use crate::notify::Notification;
use crate::step::WizardStep;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::types::{CampaignId, CampaignPayload, CampaignRecord, Segment, SegmentId, Template, TemplateId};
use campaign_core::CampaignApi;
use campaign_preview::{render_preview, Debouncer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const DEFAULT_PREVIEW_QUIET: Duration = Duration::from_millis(500);

/// Whether submission creates a new campaign or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    Create,
    Edit(CampaignId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(CampaignId),
    Updated(CampaignId),
}

/// What the review step shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub name: String,
    pub template_name: Option<String>,
    pub segment_name: Option<String>,
    /// RFC 3339 timestamp, or "Save as draft".
    pub schedule: String,
    pub has_custom_content: bool,
}

pub struct WizardController {
    mode: WizardMode,
    step: WizardStep,
    draft: CampaignDraft,
    templates: Vec<Template>,
    segments: Vec<Segment>,
    preview: Debouncer<String>,
    preview_html: String,
    notifications: Vec<Notification>,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    /// Start a create session with an empty draft.
    pub fn new() -> Self {
        Self::with_draft(WizardMode::Create, CampaignDraft::default())
    }

    /// Start an edit session from a stored campaign.
    pub fn for_campaign(record: CampaignRecord) -> Self {
        Self::with_draft(WizardMode::Edit(record.id), CampaignDraft::from_record(&record))
    }

    fn with_draft(mode: WizardMode, draft: CampaignDraft) -> Self {
        Self {
            mode,
            step: WizardStep::Details,
            draft,
            templates: Vec::new(),
            segments: Vec::new(),
            preview: Debouncer::new(DEFAULT_PREVIEW_QUIET),
            preview_html: String::new(),
            notifications: Vec::new(),
        }
    }

    pub fn with_preview_quiet(mut self, quiet: Duration) -> Self {
        self.preview = Debouncer::new(quiet);
        self
    }

    /// Open an edit session: the campaign and both reference lists are
    /// fetched together. Failing to load the campaign ends the session.
    pub async fn open_for_edit<A>(api: &A, id: CampaignId) -> CampaignResult<Self>
    where
        A: CampaignApi + ?Sized,
    {
        let (record, templates, segments) =
            tokio::join!(api.get_campaign(id), api.list_templates(), api.list_segments());

        let record = record.map_err(|e| {
            warn!(campaign_id = id, error = %e, "Failed to load campaign for editing");
            e
        })?;

        let mut wizard = Self::for_campaign(record);
        wizard.apply_templates(templates);
        wizard.apply_segments(segments);
        Ok(wizard)
    }

    /// Fetch templates and segments. Each failure is reported on its own and
    /// leaves that list empty.
    pub async fn load_reference_data<A>(&mut self, api: &A)
    where
        A: CampaignApi + ?Sized,
    {
        let (templates, segments) = tokio::join!(api.list_templates(), api.list_segments());
        self.apply_templates(templates);
        self.apply_segments(segments);
    }

    fn apply_templates(&mut self, result: CampaignResult<Vec<Template>>) {
        match result {
            Ok(templates) => {
                debug!(count = templates.len(), "Templates loaded");
                self.templates = templates;
                self.seed_content_from_template();
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch templates");
                self.templates.clear();
                self.notify(Notification::error("Failed to load templates"));
            }
        }
    }

    fn apply_segments(&mut self, result: CampaignResult<Vec<Segment>>) {
        match result {
            Ok(segments) => {
                debug!(count = segments.len(), "Segments loaded");
                self.segments = segments;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch segments");
                self.segments.clear();
                self.notify(Notification::error("Failed to load segments"));
            }
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn mode(&self) -> WizardMode {
        self.mode
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &CampaignDraft {
        &self.draft
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn selected_template(&self) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == self.draft.template_ref)
    }

    pub fn selected_segment(&self) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == self.draft.segment_ref)
    }

    pub fn step_title(&self) -> &'static str {
        self.step.title()
    }

    pub fn step_description(&self) -> &'static str {
        self.step.description()
    }

    // ─── Draft edits ────────────────────────────────────────────────────────

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    /// Select a template. Seeds the content override from the template's
    /// markup if no override exists yet or it is blank; existing content is
    /// never replaced here (see [`WizardController::reset_to_template`]).
    pub fn set_template(&mut self, id: TemplateId) {
        self.draft.template_ref = id;
        self.seed_content_from_template();
    }

    pub fn set_segment(&mut self, id: SegmentId) {
        self.draft.segment_ref = id;
    }

    pub fn set_schedule(&mut self, at: DateTime<Utc>) {
        self.draft.scheduled_at = Some(at);
    }

    pub fn clear_schedule(&mut self) {
        self.draft.scheduled_at = None;
    }

    /// A blank override counts as unset, so content is never left empty
    /// while a known template is selected.
    fn seed_content_from_template(&mut self) {
        let has_content = self
            .draft
            .content_override
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if has_content {
            return;
        }
        if let Some(markup) = self.selected_template().map(|t| t.markup.clone()) {
            debug!(template_id = self.draft.template_ref, "Seeding content from template");
            self.draft.content_override = Some(markup);
        }
    }

    // ─── Navigation ─────────────────────────────────────────────────────────

    pub fn can_proceed_to_content(&self) -> bool {
        self.draft.is_complete()
    }

    /// Move forward one step. From details this is a no-op while the guard
    /// fails; from content it saves the current override. Returns whether the
    /// step changed.
    pub fn advance(&mut self) -> bool {
        match self.step {
            WizardStep::Details => {
                if !self.can_proceed_to_content() {
                    debug!("Details incomplete, staying on details");
                    return false;
                }
                self.enter_content();
                true
            }
            WizardStep::Content => {
                let content = self.draft.content_override.clone().unwrap_or_default();
                self.save_content(content)
            }
            WizardStep::Review => false,
        }
    }

    /// Move back one step. Never touches the draft.
    pub fn back(&mut self) -> bool {
        match self.step.prev() {
            Some(prev) => self.edit_step(prev),
            None => false,
        }
    }

    /// Jump back to an earlier step (the review page's edit links). Forward
    /// jumps are refused.
    pub fn edit_step(&mut self, target: WizardStep) -> bool {
        if target >= self.step {
            return false;
        }
        debug!(from = %self.step, to = %target, "Navigating back");
        self.step = target;
        if target == WizardStep::Content {
            self.refresh_preview();
        }
        true
    }

    fn enter_content(&mut self) {
        self.seed_content_from_template();
        self.step = WizardStep::Content;
        self.refresh_preview();
    }

    // ─── Content step ───────────────────────────────────────────────────────

    /// Record an edit from the content editor and schedule a preview render.
    /// Ignored outside the content step.
    pub fn edit_content(&mut self, content: impl Into<String>, now: Instant) -> bool {
        if self.step != WizardStep::Content {
            return false;
        }
        let content = content.into();
        self.draft.content_override = Some(content.clone());
        self.preview.push(content, now);
        true
    }

    /// Render the pending edit if its quiet window has elapsed.
    pub fn poll_preview(&mut self, now: Instant) -> Option<&str> {
        let content = self.preview.poll(now)?;
        self.preview_html = render_preview(&content);
        Some(&self.preview_html)
    }

    /// Last rendered preview; read-only alongside the editable source.
    pub fn preview_html(&self) -> &str {
        &self.preview_html
    }

    fn refresh_preview(&mut self) {
        self.preview.cancel();
        let content = self.draft.content_override.as_deref().unwrap_or_default();
        self.preview_html = render_preview(content);
    }

    /// Accept the content and move to review. Blank content is rejected with
    /// an error notification and the step does not change.
    pub fn save_content(&mut self, content: impl Into<String>) -> bool {
        if self.step != WizardStep::Content {
            return false;
        }
        let content = content.into();
        if content.trim().is_empty() {
            self.notify(Notification::error("Email content cannot be empty"));
            return false;
        }
        self.draft.content_override = Some(content);
        self.preview.cancel();
        self.notify(Notification::success("Email content saved!"));
        self.step = WizardStep::Review;
        true
    }

    pub fn can_reset_to_template(&self) -> bool {
        match self.selected_template() {
            Some(t) => self.draft.content_override.as_deref() != Some(t.markup.as_str()),
            None => false,
        }
    }

    /// Replace the override with the selected template's markup.
    pub fn reset_to_template(&mut self) -> bool {
        let Some(markup) = self.selected_template().map(|t| t.markup.clone()) else {
            return false;
        };
        self.draft.content_override = Some(markup);
        self.refresh_preview();
        self.notify(Notification::success("Content reset to template"));
        true
    }

    // ─── Review & submit ────────────────────────────────────────────────────

    pub fn review_summary(&self) -> ReviewSummary {
        ReviewSummary {
            name: self.draft.name.clone(),
            template_name: self.selected_template().map(|t| t.name.clone()),
            segment_name: self.selected_segment().map(|s| s.name.clone()),
            schedule: self
                .draft
                .scheduled_at
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "Save as draft".to_string()),
            has_custom_content: self
                .draft
                .content_override
                .as_deref()
                .is_some_and(|c| !c.is_empty()),
        }
    }

    pub fn payload(&self) -> CampaignPayload {
        self.draft.to_payload()
    }

    /// Create or update the campaign. Only allowed from review. On failure
    /// the error is reported as a notification and the wizard stays on review
    /// with the draft intact so the user can retry.
    pub async fn submit<A>(&mut self, api: &A) -> CampaignResult<SubmitOutcome>
    where
        A: CampaignApi + ?Sized,
    {
        if self.step != WizardStep::Review {
            return Err(CampaignError::Validation(format!(
                "cannot submit from the {} step",
                self.step
            )));
        }
        if !self.draft.is_complete() {
            return Err(CampaignError::Validation(
                "name, template and segment are required".to_string(),
            ));
        }

        let payload = self.payload();
        let result = match self.mode {
            WizardMode::Create => api
                .create_campaign(&payload)
                .await
                .map(|created| SubmitOutcome::Created(created.id)),
            WizardMode::Edit(id) => api
                .update_campaign(id, &payload)
                .await
                .map(|_| SubmitOutcome::Updated(id)),
        };

        match result {
            Ok(outcome) => {
                let message = match outcome {
                    SubmitOutcome::Created(id) => {
                        info!(campaign_id = id, name = %payload.name, "Campaign created");
                        "Campaign created successfully!"
                    }
                    SubmitOutcome::Updated(id) => {
                        info!(campaign_id = id, name = %payload.name, "Campaign updated");
                        "Campaign updated successfully!"
                    }
                };
                metrics::counter!("wizard.submissions", "outcome" => "success").increment(1);
                self.notify(Notification::success(message));
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, mode = ?self.mode, "Campaign submission failed");
                metrics::counter!("wizard.submissions", "outcome" => "failure").increment(1);
                let fallback = match self.mode {
                    WizardMode::Create => "Failed to create campaign",
                    WizardMode::Edit(_) => "Failed to update campaign",
                };
                let message = e.backend_detail().unwrap_or(fallback).to_string();
                self.notify(Notification::error(message));
                Err(e)
            }
        }
    }

    // ─── Notifications ──────────────────────────────────────────────────────

    fn notify(&mut self, notification: Notification) {
        debug!(level = ?notification.level, message = %notification.message, "Notification");
        self.notifications.push(notification);
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}
