use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use super::models::GameSnapshot;
use super::watcher::GameWatcher;
use crate::shared::AppError;
use crate::store::SessionStore;

/// Read model rebuilt from the store. Never writes.
#[derive(Clone)]
pub struct ViewProjector {
    store: Arc<dyn SessionStore>,
}

impl ViewProjector {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Full snapshot of a game. A game with no players or no admin is
    /// abandoned and reported as `NotFound`.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, game_id: &str) -> Result<GameSnapshot, AppError> {
        let game = self
            .store
            .get_game(game_id)
            .await?
            .ok_or_else(|| AppError::game_not_found(game_id))?;
        let players = self.store.list_players(game_id).await?;
        if !players.iter().any(|p| p.is_admin) {
            debug!(player_count = players.len(), "Abandoned game");
            return Err(AppError::game_not_found(game_id));
        }

        let votes: BTreeMap<String, String> = self
            .store
            .list_votes(game_id)
            .await?
            .into_iter()
            .map(|v| (v.voter_id, v.target_id))
            .collect();
        let round_stats = self.store.list_round_stats(game_id).await?;

        Ok(GameSnapshot::assemble(&game, &players, votes, round_stats))
    }

    /// Snapshot as seen by one member of the game
    pub async fn view_for(&self, game_id: &str, viewer_id: &str) -> Result<GameSnapshot, AppError> {
        let snapshot = self.snapshot(game_id).await?;
        if snapshot.player(viewer_id).is_none() {
            return Err(AppError::player_not_found(viewer_id));
        }
        Ok(snapshot.redacted_for(Some(viewer_id)))
    }

    /// Snapshot with every secret hidden
    pub async fn spectator_view(&self, game_id: &str) -> Result<GameSnapshot, AppError> {
        Ok(self.snapshot(game_id).await?.redacted_for(None))
    }

    /// Keeps a deduplicated snapshot of the game current from change
    /// notifications and a fallback poll
    pub async fn watch(&self, game_id: &str, poll_interval: Duration) -> Result<GameWatcher, AppError> {
        GameWatcher::spawn(self.clone(), self.store.clone(), game_id, poll_interval).await
    }
}
