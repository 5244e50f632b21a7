#![warn(clippy::unwrap_used)]

pub mod auth;
pub mod handlers;
pub mod server;
pub mod store;

pub use handlers::AppState;
pub use server::{router, ApiServer};
pub use store::CampaignStore;
