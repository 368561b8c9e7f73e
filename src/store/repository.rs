use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

use super::models::{GameRecord, PlayerRecord, RoundStatRecord, VoteRecord};
use crate::event::{ChangeKind, EventBus, StoreChange, Table};
use crate::shared::AppError;

/// Durable keyed records of every session plus a per-game change feed
///
/// Every successful mutation publishes a `StoreChange` to subscribers of the
/// affected game. Deleting a game deletes everything it owns.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fails with `StoreWriteError` if another live game already uses the code
    async fn insert_game(&self, game: &GameRecord) -> Result<GameRecord, AppError>;
    async fn get_game(&self, game_id: &str) -> Result<Option<GameRecord>, AppError>;
    /// Case-insensitive lookup
    async fn find_game_by_code(&self, code: &str) -> Result<Option<GameRecord>, AppError>;
    /// Compare-and-swap on `game.version`: fails with `Conflict` if the stored
    /// record moved on since `game` was read. Returns the stored record.
    async fn update_game(&self, game: &GameRecord) -> Result<GameRecord, AppError>;
    async fn delete_game(&self, game_id: &str) -> Result<(), AppError>;

    async fn insert_player(&self, player: &PlayerRecord) -> Result<PlayerRecord, AppError>;
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerRecord>, AppError>;
    /// Ordered by `player_order`
    async fn list_players(&self, game_id: &str) -> Result<Vec<PlayerRecord>, AppError>;
    async fn update_player(&self, player: &PlayerRecord) -> Result<(), AppError>;
    async fn delete_player(&self, player_id: &str) -> Result<(), AppError>;
    async fn delete_non_admin_players(&self, game_id: &str) -> Result<usize, AppError>;
    async fn clear_cards(&self, game_id: &str) -> Result<(), AppError>;

    async fn upsert_vote(&self, vote: &VoteRecord) -> Result<(), AppError>;
    /// Ordered by last write
    async fn list_votes(&self, game_id: &str) -> Result<Vec<VoteRecord>, AppError>;
    async fn delete_votes(&self, game_id: &str) -> Result<usize, AppError>;
    /// Removes votes cast by or for the player
    async fn delete_votes_involving(&self, game_id: &str, player_id: &str)
        -> Result<usize, AppError>;

    async fn insert_round_stat(&self, stat: &RoundStatRecord) -> Result<(), AppError>;
    /// Ordered by ascending `round_number`
    async fn list_round_stats(&self, game_id: &str) -> Result<Vec<RoundStatRecord>, AppError>;

    async fn subscribe(&self, game_id: &str) -> broadcast::Receiver<StoreChange>;
}

#[derive(Debug, Default)]
struct Tables {
    games: HashMap<String, GameRecord>,
    players: HashMap<String, PlayerRecord>,
    /// game_id -> votes in order of last write
    votes: HashMap<String, Vec<VoteRecord>>,
    round_stats: HashMap<String, Vec<RoundStatRecord>>,
}

/// In-memory implementation of SessionStore for development and testing
///
/// All tables sit behind one mutex so cascades are atomic. Notifications
/// are published after the lock is released.
pub struct InMemorySessionStore {
    tables: Mutex<Tables>,
    event_bus: EventBus,
}

impl InMemorySessionStore {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            event_bus,
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::StoreWriteError("Store lock poisoned".to_string()))
    }

    async fn publish(&self, changes: Vec<StoreChange>) {
        for change in changes {
            self.event_bus.emit(change).await;
        }
    }

    /// Number of games currently stored
    pub fn game_count(&self) -> usize {
        self.tables().map(|t| t.games.len()).unwrap_or(0)
    }

    /// Number of players across all games
    pub fn player_count(&self) -> usize {
        self.tables().map(|t| t.players.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    #[instrument(skip(self, game), fields(game_id = %game.id))]
    async fn insert_game(&self, game: &GameRecord) -> Result<GameRecord, AppError> {
        let stored = {
            let mut tables = self.tables()?;
            if tables.games.contains_key(&game.id) {
                warn!("Game id already exists");
                return Err(AppError::StoreWriteError("Game already exists".to_string()));
            }
            if tables
                .games
                .values()
                .any(|g| g.code.eq_ignore_ascii_case(&game.code))
            {
                debug!(code = %game.code, "Join code collision");
                return Err(AppError::StoreWriteError(format!(
                    "Game code already in use: {}",
                    game.code
                )));
            }
            let mut stored = game.clone();
            stored.code = stored.code.to_ascii_uppercase();
            tables.games.insert(stored.id.clone(), stored.clone());
            stored
        };

        debug!(code = %stored.code, "Game inserted");
        self.publish(vec![StoreChange::new(
            &stored.id,
            Table::Games,
            ChangeKind::Insert,
            &stored.id,
        )])
        .await;
        Ok(stored)
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<GameRecord>, AppError> {
        Ok(self.tables()?.games.get(game_id).cloned())
    }

    async fn find_game_by_code(&self, code: &str) -> Result<Option<GameRecord>, AppError> {
        let tables = self.tables()?;
        Ok(tables
            .games
            .values()
            .find(|g| g.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    #[instrument(skip(self, game), fields(game_id = %game.id, version = game.version))]
    async fn update_game(&self, game: &GameRecord) -> Result<GameRecord, AppError> {
        let stored = {
            let mut tables = self.tables()?;
            if let Some(other) = tables
                .games
                .values()
                .find(|g| g.id != game.id && g.code.eq_ignore_ascii_case(&game.code))
            {
                return Err(AppError::StoreWriteError(format!(
                    "Game code already in use: {}",
                    other.code
                )));
            }

            let current = tables
                .games
                .get_mut(&game.id)
                .ok_or_else(|| AppError::game_not_found(&game.id))?;

            if current.version != game.version {
                debug!(
                    stored_version = current.version,
                    "Stale game write rejected"
                );
                return Err(AppError::Conflict(format!(
                    "Game {} changed concurrently (expected version {}, found {})",
                    game.id, game.version, current.version
                )));
            }

            let mut updated = game.clone();
            updated.code = updated.code.to_ascii_uppercase();
            updated.version = current.version + 1;
            updated.updated_at = Utc::now();
            *current = updated.clone();
            updated
        };

        debug!(phase = %stored.phase, new_version = stored.version, "Game updated");
        self.publish(vec![StoreChange::new(
            &stored.id,
            Table::Games,
            ChangeKind::Update,
            &stored.id,
        )])
        .await;
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn delete_game(&self, game_id: &str) -> Result<(), AppError> {
        let changes = {
            let mut tables = self.tables()?;
            if tables.games.remove(game_id).is_none() {
                return Err(AppError::game_not_found(game_id));
            }

            let player_ids: Vec<String> = tables
                .players
                .values()
                .filter(|p| p.game_id == game_id)
                .map(|p| p.id.clone())
                .collect();
            for id in &player_ids {
                tables.players.remove(id);
            }
            let votes = tables.votes.remove(game_id).unwrap_or_default();
            tables.round_stats.remove(game_id);

            let mut changes: Vec<StoreChange> = votes
                .iter()
                .map(|v| StoreChange::new(game_id, Table::Votes, ChangeKind::Delete, &v.voter_id))
                .collect();
            changes.extend(
                player_ids
                    .iter()
                    .map(|id| StoreChange::new(game_id, Table::Players, ChangeKind::Delete, id)),
            );
            changes.push(StoreChange::new(
                game_id,
                Table::Games,
                ChangeKind::Delete,
                game_id,
            ));
            changes
        };

        debug!(change_count = changes.len(), "Game deleted with cascade");
        self.publish(changes).await;
        self.event_bus.close(game_id).await;
        Ok(())
    }

    #[instrument(skip(self, player), fields(game_id = %player.game_id, player_id = %player.id))]
    async fn insert_player(&self, player: &PlayerRecord) -> Result<PlayerRecord, AppError> {
        {
            let mut tables = self.tables()?;
            if !tables.games.contains_key(&player.game_id) {
                return Err(AppError::game_not_found(&player.game_id));
            }
            if tables.players.contains_key(&player.id) {
                return Err(AppError::StoreWriteError(
                    "Player already exists".to_string(),
                ));
            }
            tables.players.insert(player.id.clone(), player.clone());
        }

        debug!(name = %player.name, order = player.player_order, "Player inserted");
        self.publish(vec![StoreChange::new(
            &player.game_id,
            Table::Players,
            ChangeKind::Insert,
            &player.id,
        )])
        .await;
        Ok(player.clone())
    }

    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerRecord>, AppError> {
        Ok(self.tables()?.players.get(player_id).cloned())
    }

    async fn list_players(&self, game_id: &str) -> Result<Vec<PlayerRecord>, AppError> {
        let tables = self.tables()?;
        let mut players: Vec<PlayerRecord> = tables
            .players
            .values()
            .filter(|p| p.game_id == game_id)
            .cloned()
            .collect();
        players.sort_by(|a, b| {
            a.player_order
                .cmp(&b.player_order)
                .then(a.joined_at.cmp(&b.joined_at))
        });
        Ok(players)
    }

    async fn update_player(&self, player: &PlayerRecord) -> Result<(), AppError> {
        {
            let mut tables = self.tables()?;
            let current = tables
                .players
                .get_mut(&player.id)
                .ok_or_else(|| AppError::player_not_found(&player.id))?;
            *current = player.clone();
        }

        self.publish(vec![StoreChange::new(
            &player.game_id,
            Table::Players,
            ChangeKind::Update,
            &player.id,
        )])
        .await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_player(&self, player_id: &str) -> Result<(), AppError> {
        let removed = {
            let mut tables = self.tables()?;
            tables
                .players
                .remove(player_id)
                .ok_or_else(|| AppError::player_not_found(player_id))?
        };

        debug!(game_id = %removed.game_id, "Player deleted");
        self.publish(vec![StoreChange::new(
            &removed.game_id,
            Table::Players,
            ChangeKind::Delete,
            player_id,
        )])
        .await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_non_admin_players(&self, game_id: &str) -> Result<usize, AppError> {
        let removed: Vec<String> = {
            let mut tables = self.tables()?;
            let ids: Vec<String> = tables
                .players
                .values()
                .filter(|p| p.game_id == game_id && !p.is_admin)
                .map(|p| p.id.clone())
                .collect();
            for id in &ids {
                tables.players.remove(id);
            }
            ids
        };

        debug!(removed = removed.len(), "Non-admin players deleted");
        let count = removed.len();
        self.publish(
            removed
                .iter()
                .map(|id| StoreChange::new(game_id, Table::Players, ChangeKind::Delete, id))
                .collect(),
        )
        .await;
        Ok(count)
    }

    async fn clear_cards(&self, game_id: &str) -> Result<(), AppError> {
        let cleared: Vec<String> = {
            let mut tables = self.tables()?;
            tables
                .players
                .values_mut()
                .filter(|p| p.game_id == game_id && p.card.is_some())
                .map(|p| {
                    p.card = None;
                    p.id.clone()
                })
                .collect()
        };

        self.publish(
            cleared
                .iter()
                .map(|id| StoreChange::new(game_id, Table::Players, ChangeKind::Update, id))
                .collect(),
        )
        .await;
        Ok(())
    }

    #[instrument(skip(self, vote), fields(game_id = %vote.game_id, voter_id = %vote.voter_id))]
    async fn upsert_vote(&self, vote: &VoteRecord) -> Result<(), AppError> {
        let kind = {
            let mut tables = self.tables()?;
            if !tables.games.contains_key(&vote.game_id) {
                return Err(AppError::game_not_found(&vote.game_id));
            }
            let votes = tables.votes.entry(vote.game_id.clone()).or_default();
            let existed = votes.iter().any(|v| v.voter_id == vote.voter_id);
            votes.retain(|v| v.voter_id != vote.voter_id);
            votes.push(vote.clone());
            if existed {
                ChangeKind::Update
            } else {
                ChangeKind::Insert
            }
        };

        debug!(target_id = %vote.target_id, kind = %kind, "Vote stored");
        self.publish(vec![StoreChange::new(
            &vote.game_id,
            Table::Votes,
            kind,
            &vote.voter_id,
        )])
        .await;
        Ok(())
    }

    async fn list_votes(&self, game_id: &str) -> Result<Vec<VoteRecord>, AppError> {
        Ok(self
            .tables()?
            .votes
            .get(game_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_votes(&self, game_id: &str) -> Result<usize, AppError> {
        let removed = {
            let mut tables = self.tables()?;
            tables.votes.remove(game_id).unwrap_or_default()
        };

        self.publish(
            removed
                .iter()
                .map(|v| StoreChange::new(game_id, Table::Votes, ChangeKind::Delete, &v.voter_id))
                .collect(),
        )
        .await;
        Ok(removed.len())
    }

    async fn delete_votes_involving(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> Result<usize, AppError> {
        let removed: Vec<VoteRecord> = {
            let mut tables = self.tables()?;
            match tables.votes.get_mut(game_id) {
                Some(votes) => {
                    let (gone, kept): (Vec<VoteRecord>, Vec<VoteRecord>) = votes
                        .drain(..)
                        .partition(|v| v.voter_id == player_id || v.target_id == player_id);
                    *votes = kept;
                    gone
                }
                None => Vec::new(),
            }
        };

        self.publish(
            removed
                .iter()
                .map(|v| StoreChange::new(game_id, Table::Votes, ChangeKind::Delete, &v.voter_id))
                .collect(),
        )
        .await;
        Ok(removed.len())
    }

    #[instrument(skip(self, stat), fields(game_id = %stat.game_id, round = stat.round_number))]
    async fn insert_round_stat(&self, stat: &RoundStatRecord) -> Result<(), AppError> {
        {
            let mut tables = self.tables()?;
            if !tables.games.contains_key(&stat.game_id) {
                return Err(AppError::game_not_found(&stat.game_id));
            }
            tables
                .round_stats
                .entry(stat.game_id.clone())
                .or_default()
                .push(stat.clone());
        }

        debug!("Round stat appended");
        self.publish(vec![StoreChange::new(
            &stat.game_id,
            Table::RoundStats,
            ChangeKind::Insert,
            &stat.id,
        )])
        .await;
        Ok(())
    }

    async fn list_round_stats(&self, game_id: &str) -> Result<Vec<RoundStatRecord>, AppError> {
        let mut stats = self
            .tables()?
            .round_stats
            .get(game_id)
            .cloned()
            .unwrap_or_default();
        stats.sort_by_key(|s| s.round_number);
        Ok(stats)
    }

    async fn subscribe(&self, game_id: &str) -> broadcast::Receiver<StoreChange> {
        self.event_bus.subscribe(game_id).await
    }
}
