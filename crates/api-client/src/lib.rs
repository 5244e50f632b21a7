//! HTTP implementation of the campaign REST collaborator.

pub mod http;

pub use http::HttpCampaignApi;
