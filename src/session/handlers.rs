use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use super::types::{
    CreateGameRequest, CreateGameResponse, JoinGameRequest, JoinGameResponse, LeaveGameRequest,
    PlayerOrderEntry, ReorderPlayersRequest, ResetResponse,
};
use crate::round::types::ActorRequest;
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new game
///
/// POST /games
/// Returns the game id, its join code and the admin's player id
#[instrument(name = "create_game", skip(state))]
pub async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, AppError> {
    let created = state.sessions.create_game(&request.admin_name).await?;
    info!(game_id = %created.game_id, "Game created via HTTP");
    Ok(Json(created))
}

/// POST /games/join
#[instrument(name = "join_game", skip(state))]
pub async fn join_game(
    State(state): State<AppState>,
    Json(request): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, AppError> {
    let joined = state
        .sessions
        .join_game(&request.code, &request.name)
        .await?;
    Ok(Json(joined))
}

/// POST /games/:id/leave
#[instrument(name = "leave_game", skip(state))]
pub async fn leave_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<LeaveGameRequest>,
) -> Result<StatusCode, AppError> {
    let player = state
        .store
        .get_player(&request.player_id)
        .await?
        .filter(|p| p.game_id == game_id)
        .ok_or_else(|| AppError::player_not_found(&request.player_id))?;

    state.sessions.leave_game(&player.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /games/:id/cancel
#[instrument(name = "cancel_game", skip(state))]
pub async fn cancel_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .cancel_game(&game_id, &request.player_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /games/:id/reorder
#[instrument(name = "reorder_players", skip(state))]
pub async fn reorder_players(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<ReorderPlayersRequest>,
) -> Result<Json<Vec<PlayerOrderEntry>>, AppError> {
    let players = state
        .sessions
        .reorder_players(&game_id, &request.player_id, &request.ordered_player_ids)
        .await?;

    Ok(Json(
        players
            .into_iter()
            .map(|p| PlayerOrderEntry {
                player_id: p.id,
                name: p.name,
                player_order: p.player_order,
            })
            .collect(),
    ))
}

/// POST /games/:id/reset
#[instrument(name = "reset_to_lobby", skip(state))]
pub async fn reset_to_lobby(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<ResetResponse>, AppError> {
    let game = state
        .sessions
        .reset_to_lobby(&game_id, &request.player_id)
        .await?;

    Ok(Json(ResetResponse {
        game_id: game.id,
        code: game.code,
        phase: game.phase.to_string(),
    }))
}
