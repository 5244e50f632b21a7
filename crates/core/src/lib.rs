pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use api::CampaignApi;
pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use session::{Session, SessionStore};
