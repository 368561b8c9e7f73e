use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::instrument;

use super::models::GameSnapshot;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub viewer: Option<String>,
}

/// HTTP handler for reading a game
///
/// GET /games/:id?viewer=<player id>
/// Without a viewer the spectator view is returned
#[instrument(name = "get_game", skip(state))]
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<GameSnapshot>, AppError> {
    let snapshot = match query.viewer.as_deref() {
        Some(viewer) => state.projector.view_for(&game_id, viewer).await?,
        None => state.projector.spectator_view(&game_id).await?,
    };
    Ok(Json(snapshot))
}
