use thiserror::Error;

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request failed with status {status}: {detail}")]
    Status { status: u16, detail: String },

    /// `what` names the missing resource; `detail` is the backend's own text.
    #[error("Not found: {what}")]
    NotFound { what: String, detail: Option<String> },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CampaignError {
    pub fn not_found(what: impl Into<String>) -> Self {
        CampaignError::NotFound {
            what: what.into(),
            detail: None,
        }
    }

    /// The backend's `{"detail": ...}` text, when the response carried one.
    pub fn backend_detail(&self) -> Option<&str> {
        let detail = match self {
            CampaignError::Status { detail, .. } => Some(detail.as_str()),
            CampaignError::Unauthorized(detail) => Some(detail.as_str()),
            CampaignError::NotFound { detail, .. } => detail.as_deref(),
            _ => None,
        };
        detail.map(str::trim).filter(|d| !d.is_empty())
    }

    /// Message suitable for a user-facing notification. Backend `detail`
    /// text is preferred over the generic variant prefix, except for a
    /// missing resource, which is named.
    pub fn user_message(&self) -> String {
        match self {
            CampaignError::NotFound { what, .. } => format!("{} not found", what),
            other => other
                .backend_detail()
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        }
    }
}

impl From<config::ConfigError> for CampaignError {
    fn from(e: config::ConfigError) -> Self {
        CampaignError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_backend_detail() {
        let err = CampaignError::Status {
            status: 400,
            detail: "segment missing".to_string(),
        };
        assert_eq!(err.user_message(), "segment missing");

        let err = CampaignError::Status {
            status: 502,
            detail: String::new(),
        };
        assert!(err.user_message().contains("502"));
    }

    #[test]
    fn test_not_found_message() {
        let err = CampaignError::not_found("Campaign 9");
        assert_eq!(err.user_message(), "Campaign 9 not found");
        assert_eq!(err.backend_detail(), None);

        let err = CampaignError::NotFound {
            what: "Campaign 9".to_string(),
            detail: Some("Campaign was archived".to_string()),
        };
        assert_eq!(err.backend_detail(), Some("Campaign was archived"));
        assert_eq!(err.user_message(), "Campaign 9 not found");
    }

    #[test]
    fn test_unauthorized_detail_is_surfaced() {
        let err = CampaignError::Unauthorized("Could not validate credentials".to_string());
        assert_eq!(err.backend_detail(), Some("Could not validate credentials"));
        assert_eq!(err.user_message(), "Could not validate credentials");

        let err = CampaignError::Unauthorized("  ".to_string());
        assert_eq!(err.backend_detail(), None);
    }
}
