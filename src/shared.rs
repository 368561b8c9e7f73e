use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::catalog::{StaticWordCatalog, WordCatalog};
use crate::config::GameConfig;
use crate::event::EventBus;
use crate::projector::ViewProjector;
use crate::round::RoundOrchestrator;
use crate::session::SessionManager;
use crate::stats::StatsService;
use crate::store::{InMemorySessionStore, SessionStore};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GameConfig>,
    pub store: Arc<dyn SessionStore>,
    pub event_bus: EventBus,
    pub sessions: SessionManager,
    pub rounds: RoundOrchestrator,
    pub projector: ViewProjector,
    pub stats: StatsService,
}

impl AppState {
    pub fn new(
        config: GameConfig,
        store: Arc<dyn SessionStore>,
        event_bus: EventBus,
        catalog: Arc<dyn WordCatalog>,
    ) -> Self {
        let config = Arc::new(config);
        let stats = StatsService::new(store.clone());
        let rounds = RoundOrchestrator::new(config.clone(), store.clone(), catalog, stats.clone());
        let sessions = SessionManager::new(config.clone(), store.clone(), rounds.clone());
        let projector = ViewProjector::new(store.clone());

        Self {
            config,
            store,
            event_bus,
            sessions,
            rounds,
            projector,
            stats,
        }
    }

    /// Wires everything against a fresh in-memory store and the built-in catalog
    pub fn in_memory(config: GameConfig) -> Self {
        let event_bus = EventBus::new();
        let store = Arc::new(InMemorySessionStore::new(event_bus.clone()));
        Self::new(
            config,
            store,
            event_bus,
            Arc::new(StaticWordCatalog::default()),
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Game has already started")]
    GameAlreadyStarted,

    #[error("Game is full ({max} players)")]
    GameFull { max: usize },

    #[error("Not enough players: {actual} present, {required} required")]
    InsufficientPlayers { required: usize, actual: usize },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Store write failed: {0}")]
    StoreWriteError(String),

    #[error("Invalid player order: {0}")]
    InvalidOrder(String),

    #[error("Invalid phase: expected {expected}, found {actual}")]
    InvalidPhase { expected: String, actual: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn game_not_found(game_id: &str) -> Self {
        AppError::NotFound(format!("Game not found: {}", game_id))
    }

    pub fn player_not_found(player_id: &str) -> Self {
        AppError::NotFound(format!("Player not found: {}", player_id))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::GameAlreadyStarted
            | AppError::GameFull { .. }
            | AppError::InvalidPhase { .. }
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InsufficientPlayers { .. } | AppError::InvalidOrder(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::StoreWriteError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
