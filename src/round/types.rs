use serde::{Deserialize, Serialize};

use crate::store::{GameRecord, Winner};

/// How a closed voting or tie-breaker window ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Resolution {
    RoundOver {
        round_number: u32,
        eliminated_id: String,
        winner: Winner,
    },
    TieBreaker {
        tie_breaker_id: String,
        candidates: Vec<String>,
    },
}

/// Body of every round action; identifies the acting player
#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectWordRequest {
    pub player_id: String,
    pub word: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectCategoryRequest {
    pub player_id: String,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub player_id: String,
    pub target_id: String,
}

/// Phase summary returned by round actions. Secrets stay in the projector.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoundStateResponse {
    pub game_id: String,
    pub phase: String,
    pub round_number: u32,
    pub time_left: u32,
    pub starting_player_id: Option<String>,
}

impl From<&GameRecord> for RoundStateResponse {
    fn from(game: &GameRecord) -> Self {
        Self {
            game_id: game.id.clone(),
            phase: game.phase.to_string(),
            round_number: game.round_number,
            time_left: game.time_left,
            starting_player_id: game.starting_player_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub accepted: bool,
    pub resolution: Option<Resolution>,
}
