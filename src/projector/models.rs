use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::WordOption;
use crate::store::{Card, GamePhase, GameRecord, PlayerRecord, RoundStatRecord, Winner};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub is_admin: bool,
    pub player_order: u32,
    pub card: Option<Card>,
}

impl From<&PlayerRecord> for PlayerView {
    fn from(player: &PlayerRecord) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            is_admin: player.is_admin,
            player_order: player.player_order,
            card: player.card.clone(),
        }
    }
}

/// Everything a client renders, rebuilt from the store on every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game_id: String,
    pub code: String,
    pub phase: GamePhase,
    pub current_word: Option<String>,
    pub word_category: Option<String>,
    pub liar_id: Option<String>,
    pub starting_player_id: Option<String>,
    pub time_left: u32,
    pub tie_breaker_id: Option<String>,
    pub tie_candidates: Vec<String>,
    pub winner: Option<Winner>,
    pub round_number: u32,
    pub category_options: Vec<String>,
    pub word_options: Vec<WordOption>,
    /// In turn order
    pub players: Vec<PlayerView>,
    /// voter id -> target id
    pub votes: BTreeMap<String, String>,
    /// Ascending round number
    pub round_stats: Vec<RoundStatRecord>,
}

impl GameSnapshot {
    pub fn assemble(
        game: &GameRecord,
        players: &[PlayerRecord],
        votes: BTreeMap<String, String>,
        round_stats: Vec<RoundStatRecord>,
    ) -> Self {
        Self {
            game_id: game.id.clone(),
            code: game.code.clone(),
            phase: game.phase,
            current_word: game.current_word.clone(),
            word_category: game.word_category.clone(),
            liar_id: game.liar_id.clone(),
            starting_player_id: game.starting_player_id.clone(),
            time_left: game.time_left,
            tie_breaker_id: game.tie_breaker_id.clone(),
            tie_candidates: game.tie_candidates.clone(),
            winner: game.winner,
            round_number: game.round_number,
            category_options: game.category_options.clone(),
            word_options: game.word_options.clone(),
            players: players.iter().map(PlayerView::from).collect(),
            votes,
            round_stats,
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// What `viewer_id` may see; `None` is a spectator.
    ///
    /// Other players' cards are always hidden. Until results the liar's
    /// identity and the word are hidden from everyone except an admin who
    /// is not the liar; the liar only ever sees the category. Word options
    /// go to the starting player when they are not the liar.
    pub fn redacted_for(mut self, viewer_id: Option<&str>) -> Self {
        let viewer = viewer_id.and_then(|id| self.player(id)).cloned();
        let is_liar = match (&viewer, &self.liar_id) {
            (Some(v), Some(liar)) => &v.id == liar,
            _ => false,
        };
        let privileged = viewer.as_ref().map(|v| v.is_admin).unwrap_or(false) && !is_liar;

        for player in &mut self.players {
            if viewer.as_ref().map(|v| v.id != player.id).unwrap_or(true) {
                player.card = None;
            }
        }

        if self.phase != GamePhase::Results && !privileged {
            self.liar_id = None;
            self.current_word = None;
        }
        if is_liar {
            self.current_word = None;
        }

        let is_starter = viewer
            .as_ref()
            .map(|v| self.starting_player_id.as_deref() == Some(v.id.as_str()))
            .unwrap_or(false);
        if !privileged && !(is_starter && !is_liar) {
            self.word_options.clear();
        }
        if !privileged && !is_starter {
            self.category_options.clear();
        }

        self
    }
}
