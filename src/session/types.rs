use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub admin_name: String,
}

/// Returned to the admin; `player_id` identifies them in later requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateGameResponse {
    pub game_id: String,
    pub code: String,
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinGameRequest {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinGameResponse {
    pub game_id: String,
    pub code: String,
    pub player_id: String,
    pub player_order: u32,
}

#[derive(Debug, Deserialize)]
pub struct LeaveGameRequest {
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReorderPlayersRequest {
    pub player_id: String,
    pub ordered_player_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PlayerOrderEntry {
    pub player_id: String,
    pub name: String,
    pub player_order: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub game_id: String,
    pub code: String,
    pub phase: String,
}
