// Library crate for the liar card game server
// This file exposes the public API for integration tests

pub mod catalog;
pub mod config;
pub mod event;
pub mod projector;
pub mod round;
pub mod routes;
pub mod session;
pub mod shared;
pub mod stats;
pub mod store;
pub mod tally;

// Re-export commonly used types for easier access in tests
pub use catalog::{StaticWordCatalog, WordCatalog};
pub use config::GameConfig;
pub use event::{EventBus, StoreChange};
pub use projector::{GameSnapshot, GameWatcher, ViewProjector};
pub use round::{Resolution, RoundOrchestrator};
pub use session::SessionManager;
pub use shared::{AppError, AppState};
pub use stats::StatsService;
pub use store::{GamePhase, InMemorySessionStore, SessionStore, Winner};
