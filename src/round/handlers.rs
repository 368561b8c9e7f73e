use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::types::{
    ActorRequest, RoundStateResponse, SelectCategoryRequest, SelectWordRequest, VoteRequest,
    VoteResponse,
};
use crate::shared::{AppError, AppState};

/// POST /games/:id/rounds
#[instrument(name = "start_round", skip(state))]
pub async fn start_round(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<RoundStateResponse>, AppError> {
    let game = state
        .rounds
        .start_round(&game_id, &request.player_id)
        .await?;
    Ok(Json(RoundStateResponse::from(&game)))
}

/// POST /games/:id/word
#[instrument(name = "select_word", skip(state))]
pub async fn select_word(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<SelectWordRequest>,
) -> Result<Json<RoundStateResponse>, AppError> {
    let game = state
        .rounds
        .select_word(&game_id, &request.player_id, &request.word)
        .await?;
    Ok(Json(RoundStateResponse::from(&game)))
}

/// POST /games/:id/category
#[instrument(name = "select_category", skip(state))]
pub async fn select_category(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<SelectCategoryRequest>,
) -> Result<Json<RoundStateResponse>, AppError> {
    let game = state
        .rounds
        .select_category(&game_id, &request.player_id, &request.category)
        .await?;
    Ok(Json(RoundStateResponse::from(&game)))
}

/// POST /games/:id/voting
#[instrument(name = "start_voting", skip(state))]
pub async fn start_voting(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<RoundStateResponse>, AppError> {
    let game = state
        .rounds
        .start_voting(&game_id, &request.player_id)
        .await?;
    Ok(Json(RoundStateResponse::from(&game)))
}

/// POST /games/:id/votes
///
/// Returns the resolution when this vote completed the quorum
#[instrument(name = "cast_vote", skip(state))]
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, AppError> {
    let resolution = state
        .rounds
        .cast_vote(&game_id, &request.player_id, &request.target_id)
        .await?;

    if let Some(resolution) = &resolution {
        info!(?resolution, "Vote closed the window");
    }

    Ok(Json(VoteResponse {
        accepted: true,
        resolution,
    }))
}

/// POST /games/:id/tie-break
#[instrument(name = "cast_tie_breaker_vote", skip(state))]
pub async fn cast_tie_breaker_vote(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, AppError> {
    let resolution = state
        .rounds
        .cast_tie_breaker_vote(&game_id, &request.player_id, &request.target_id)
        .await?;

    Ok(Json(VoteResponse {
        accepted: true,
        resolution: Some(resolution),
    }))
}

/// POST /games/:id/play-again
#[instrument(name = "play_again", skip(state))]
pub async fn play_again(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Result<Json<RoundStateResponse>, AppError> {
    let game = state
        .rounds
        .play_again(&game_id, &request.player_id)
        .await?;
    Ok(Json(RoundStateResponse::from(&game)))
}
