use campaign_core::types::{parse_schedule, CampaignPayload, CampaignRecord, SegmentId, TemplateId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The in-progress campaign held by one wizard session.
///
/// `0` in `template_ref` / `segment_ref` means "not selected".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignDraft {
    pub name: String,
    pub template_ref: TemplateId,
    pub segment_ref: SegmentId,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub content_override: Option<String>,
}

impl CampaignDraft {
    /// Populate a draft from a stored campaign. Blank stored content counts
    /// as no override so the template markup can seed it.
    pub fn from_record(record: &CampaignRecord) -> Self {
        Self {
            name: record.name.clone(),
            template_ref: record.template_id,
            segment_ref: record.segment_id,
            scheduled_at: record.send_at.as_deref().and_then(parse_schedule),
            content_override: record
                .custom_content
                .clone()
                .filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && self.template_ref > 0 && self.segment_ref > 0
    }

    /// Request body for create/update. An empty override is sent as `null`.
    pub fn to_payload(&self) -> CampaignPayload {
        CampaignPayload {
            name: self.name.clone(),
            template_id: self.template_ref,
            segment_id: self.segment_ref,
            send_at: self.scheduled_at,
            custom_content: self
                .content_override
                .clone()
                .filter(|c| !c.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completeness_requires_every_field() {
        let complete = CampaignDraft {
            name: "Launch".to_string(),
            template_ref: 3,
            segment_ref: 7,
            ..Default::default()
        };
        assert!(complete.is_complete());

        let mut blank_name = complete.clone();
        blank_name.name = "   ".to_string();
        assert!(!blank_name.is_complete());

        let mut no_template = complete.clone();
        no_template.template_ref = 0;
        assert!(!no_template.is_complete());

        let mut no_segment = complete.clone();
        no_segment.segment_ref = -1;
        assert!(!no_segment.is_complete());
    }

    #[test]
    fn test_from_record_treats_blank_content_as_unset() {
        let record = CampaignRecord {
            id: 11,
            name: "Winback".to_string(),
            template_id: 2,
            segment_id: 5,
            send_at: Some("2025-06-01T08:00".to_string()),
            status: "draft".to_string(),
            custom_content: Some("  ".to_string()),
        };
        let draft = CampaignDraft::from_record(&record);
        assert_eq!(draft.name, "Winback");
        assert!(draft.scheduled_at.is_some());
        assert!(draft.content_override.is_none());
    }

    #[test]
    fn test_payload_drops_empty_override() {
        let draft = CampaignDraft {
            name: "Launch".to_string(),
            template_ref: 3,
            segment_ref: 7,
            scheduled_at: None,
            content_override: Some(String::new()),
        };
        assert_eq!(draft.to_payload().custom_content, None);
    }
}
