pub mod rest;
pub mod server;
pub mod state;

pub use server::ApiServer;
pub use state::{AppState, CampaignRecord, CreativeRecord, OpsStore, PeriodRow};
