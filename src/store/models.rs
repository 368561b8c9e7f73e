use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::catalog::WordOption;

/// Persisted game phase. The strings are the wire values clients switch on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GamePhase {
    AdminLobby,
    WaitingRoom,
    CategorySelection,
    CardReveal,
    Voting,
    TieBreaker,
    Results,
}

impl GamePhase {
    /// Phases in which new players may still join
    pub fn accepts_joins(&self) -> bool {
        matches!(self, GamePhase::AdminLobby | GamePhase::WaitingRoom)
    }

    /// Phases between the role draw and the results screen
    pub fn is_round_active(&self) -> bool {
        matches!(
            self,
            GamePhase::CategorySelection
                | GamePhase::CardReveal
                | GamePhase::Voting
                | GamePhase::TieBreaker
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Winner {
    Players,
    Liar,
}

impl Winner {
    /// Players win iff the eliminated player is the liar
    pub fn decide(eliminated_id: &str, liar_id: &str) -> Self {
        if eliminated_id == liar_id {
            Winner::Players
        } else {
            Winner::Liar
        }
    }
}

/// What a player holds during a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Card {
    /// The secret word
    Word(String),
    /// The liar marker; the liar only learns the category
    Liar,
}

impl Card {
    pub fn is_liar(&self) -> bool {
        matches!(self, Card::Liar)
    }
}

/// One per session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    /// 8-character uppercase join code, unique across live games
    pub code: String,
    pub phase: GamePhase,
    pub current_word: Option<String>,
    pub word_category: Option<String>,
    pub liar_id: Option<String>,
    pub starting_player_id: Option<String>,
    /// Index (in player order) of the last starting player, -1 before the first round
    pub last_starting_index: i32,
    /// Authoritative countdown, in ticks
    pub time_left: u32,
    pub tie_breaker_id: Option<String>,
    /// Tied candidates in tie order, only during a tie-breaker
    pub tie_candidates: Vec<String>,
    pub winner: Option<Winner>,
    pub round_number: u32,
    /// Only during category selection
    pub category_options: Vec<String>,
    pub word_options: Vec<WordOption>,
    /// Bumped by the store on every update; used for compare-and-swap
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameRecord {
    pub fn new(code: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            code,
            phase: GamePhase::AdminLobby,
            current_word: None,
            word_category: None,
            liar_id: None,
            starting_player_id: None,
            last_starting_index: -1,
            time_left: 0,
            tie_breaker_id: None,
            tie_candidates: Vec::new(),
            winner: None,
            round_number: 0,
            category_options: Vec::new(),
            word_options: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Clears every per-round field. Keeps code, rotation index and round counter.
    pub fn clear_round(&mut self) {
        self.current_word = None;
        self.word_category = None;
        self.liar_id = None;
        self.starting_player_id = None;
        self.time_left = 0;
        self.tie_breaker_id = None;
        self.tie_candidates.clear();
        self.winner = None;
        self.category_options.clear();
        self.word_options.clear();
    }
}

/// A member of exactly one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: String,
    pub game_id: String,
    pub name: String,
    pub is_admin: bool,
    pub card: Option<Card>,
    pub player_order: u32,
    pub joined_at: DateTime<Utc>,
}

impl PlayerRecord {
    pub fn new(game_id: &str, name: &str, is_admin: bool, player_order: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            game_id: game_id.to_string(),
            name: name.to_string(),
            is_admin,
            card: None,
            player_order,
            joined_at: Utc::now(),
        }
    }
}

/// Upsert-keyed by (game_id, voter_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub game_id: String,
    pub voter_id: String,
    pub target_id: String,
    pub cast_at: DateTime<Utc>,
}

impl VoteRecord {
    pub fn new(game_id: &str, voter_id: &str, target_id: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            voter_id: voter_id.to_string(),
            target_id: target_id.to_string(),
            cast_at: Utc::now(),
        }
    }
}

/// Append-only record of a resolved round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStatRecord {
    pub id: String,
    pub game_id: String,
    pub round_number: u32,
    pub liar_player_id: String,
    pub liar_player_name: String,
    pub eliminated_player_id: String,
    pub eliminated_player_name: String,
    pub liar_won: bool,
    pub word: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}
