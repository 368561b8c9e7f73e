use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::shared::AppState;
use crate::{projector, round, session, stats};

/// Every HTTP endpoint of the game server
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/games", post(session::handlers::create_game))
        .route("/games/join", post(session::handlers::join_game))
        .route("/games/:id", get(projector::handlers::get_game))
        .route("/games/:id/stats", get(stats::handlers::get_stats))
        .route("/games/:id/leave", post(session::handlers::leave_game))
        .route("/games/:id/cancel", post(session::handlers::cancel_game))
        .route("/games/:id/reorder", post(session::handlers::reorder_players))
        .route("/games/:id/reset", post(session::handlers::reset_to_lobby))
        .route("/games/:id/rounds", post(round::handlers::start_round))
        .route("/games/:id/word", post(round::handlers::select_word))
        .route("/games/:id/category", post(round::handlers::select_category))
        .route("/games/:id/voting", post(round::handlers::start_voting))
        .route("/games/:id/votes", post(round::handlers::cast_vote))
        .route("/games/:id/tie-break", post(round::handlers::cast_tie_breaker_vote))
        .route("/games/:id/play-again", post(round::handlers::play_again))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
