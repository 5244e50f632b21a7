//! Authenticated session context.
//!
//! The session is hydrated from disk once at startup and handed explicitly to
//! whatever needs it (the HTTP client, the CLI). Logging out clears both the
//! in-memory value and the persisted file.

use crate::error::{CampaignError, CampaignResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub email: Option<String>,
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn authenticated(token: String, email: String) -> Self {
        Self {
            token: Some(token),
            email: Some(email),
            logged_in_at: Some(Utc::now()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// JSON file persistence for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted session. A missing or unreadable file yields an
    /// anonymous session rather than an error.
    pub fn hydrate(&self) -> Session {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No persisted session");
                return Session::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return Session::default();
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                debug!(
                    path = %self.path.display(),
                    authenticated = session.is_authenticated(),
                    "Session hydrated"
                );
                session
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt session file");
                Session::default()
            }
        }
    }

    pub fn save(&self, session: &Session) -> CampaignResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)?;
        info!(path = %self.path.display(), email = ?session.email, "Session saved");
        Ok(())
    }

    /// Remove the persisted session. Clearing an absent session is not an error.
    pub fn clear(&self) -> CampaignResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CampaignError::Session(format!(
                "failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
