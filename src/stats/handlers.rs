use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use super::models::GameStatsSummary;
use crate::shared::{AppError, AppState};

/// GET /games/:id/stats
#[instrument(name = "get_stats", skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameStatsSummary>, AppError> {
    Ok(Json(state.stats.summary(&game_id).await?))
}
