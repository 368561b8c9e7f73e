use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::models::{GameStatsSummary, UNKNOWN_PLAYER_NAME};
use crate::shared::AppError;
use crate::store::{GameRecord, PlayerRecord, RoundStatRecord, SessionStore, Winner};

/// Appends and aggregates the per-round history of a game
#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn SessionStore>,
}

impl StatsService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Appends the stat row for the round `game` is currently resolving.
    ///
    /// The row is numbered `game.round_number + 1`. Names of players who are
    /// no longer in `players` are recorded as "Unknown".
    #[instrument(skip(self, game, players), fields(game_id = %game.id))]
    pub async fn record_round(
        &self,
        game: &GameRecord,
        players: &[PlayerRecord],
        eliminated_id: &str,
        winner: Winner,
    ) -> Result<RoundStatRecord, AppError> {
        let liar_id = game.liar_id.clone().unwrap_or_default();
        let name_of = |id: &str| {
            players
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| UNKNOWN_PLAYER_NAME.to_string())
        };

        let stat = RoundStatRecord {
            id: Uuid::new_v4().to_string(),
            game_id: game.id.clone(),
            round_number: game.round_number + 1,
            liar_player_name: name_of(&liar_id),
            liar_player_id: liar_id,
            eliminated_player_id: eliminated_id.to_string(),
            eliminated_player_name: name_of(eliminated_id),
            liar_won: winner == Winner::Liar,
            word: game.current_word.clone().unwrap_or_default(),
            category: game.word_category.clone().unwrap_or_default(),
            created_at: Utc::now(),
        };

        self.store.insert_round_stat(&stat).await?;
        info!(
            round = stat.round_number,
            liar_won = stat.liar_won,
            "Round recorded"
        );
        Ok(stat)
    }

    pub async fn list(&self, game_id: &str) -> Result<Vec<RoundStatRecord>, AppError> {
        self.store.list_round_stats(game_id).await
    }

    pub async fn summary(&self, game_id: &str) -> Result<GameStatsSummary, AppError> {
        if self.store.get_game(game_id).await?.is_none() {
            return Err(AppError::game_not_found(game_id));
        }
        let rounds = self.store.list_round_stats(game_id).await?;
        Ok(GameStatsSummary::from_rounds(game_id, &rounds))
    }
}
