pub mod handlers;
pub mod models;
pub mod service;

pub use models::{GameStatsSummary, PlayerStats};
pub use service::StatsService;
