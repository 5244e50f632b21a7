//! Campaign creation wizard — step machine, draft, guards and submission.

pub mod controller;
pub mod draft;
pub mod notify;
pub mod step;

pub use controller::{ReviewSummary, SubmitOutcome, WizardController, WizardMode};
pub use draft::CampaignDraft;
pub use notify::{Notification, NotificationLevel};
pub use step::WizardStep;
