//! Store wrapper with injectable write failures
#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use liarcard::{
    event::StoreChange,
    store::{GameRecord, PlayerRecord, RoundStatRecord, VoteRecord},
    AppError, InMemorySessionStore, SessionStore,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Delegates to an in-memory store, failing chosen operations on demand
pub struct FailingStore {
    inner: Arc<InMemorySessionStore>,
    /// operation -> successes still allowed before it starts failing
    rules: Mutex<HashMap<&'static str, usize>>,
}

impl FailingStore {
    pub fn new(inner: Arc<InMemorySessionStore>) -> Self {
        Self {
            inner,
            rules: Mutex::new(HashMap::new()),
        }
    }

    /// Every call to `operation` fails from now on
    pub fn fail(&self, operation: &'static str) {
        self.fail_after(operation, 0);
    }

    /// `operation` succeeds `successes` more times, then fails
    pub fn fail_after(&self, operation: &'static str, successes: usize) {
        self.rules.lock().unwrap().insert(operation, successes);
    }

    pub fn heal(&self, operation: &'static str) {
        self.rules.lock().unwrap().remove(operation);
    }

    fn check(&self, operation: &'static str) -> Result<(), AppError> {
        let mut rules = self.rules.lock().unwrap();
        match rules.get_mut(operation) {
            Some(0) => Err(AppError::StoreWriteError(format!(
                "injected failure: {}",
                operation
            ))),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn insert_game(&self, game: &GameRecord) -> Result<GameRecord, AppError> {
        self.check("insert_game")?;
        self.inner.insert_game(game).await
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<GameRecord>, AppError> {
        self.inner.get_game(game_id).await
    }

    async fn find_game_by_code(&self, code: &str) -> Result<Option<GameRecord>, AppError> {
        self.inner.find_game_by_code(code).await
    }

    async fn update_game(&self, game: &GameRecord) -> Result<GameRecord, AppError> {
        self.check("update_game")?;
        self.inner.update_game(game).await
    }

    async fn delete_game(&self, game_id: &str) -> Result<(), AppError> {
        self.check("delete_game")?;
        self.inner.delete_game(game_id).await
    }

    async fn insert_player(&self, player: &PlayerRecord) -> Result<PlayerRecord, AppError> {
        self.check("insert_player")?;
        self.inner.insert_player(player).await
    }

    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerRecord>, AppError> {
        self.inner.get_player(player_id).await
    }

    async fn list_players(&self, game_id: &str) -> Result<Vec<PlayerRecord>, AppError> {
        self.inner.list_players(game_id).await
    }

    async fn update_player(&self, player: &PlayerRecord) -> Result<(), AppError> {
        self.check("update_player")?;
        self.inner.update_player(player).await
    }

    async fn delete_player(&self, player_id: &str) -> Result<(), AppError> {
        self.check("delete_player")?;
        self.inner.delete_player(player_id).await
    }

    async fn delete_non_admin_players(&self, game_id: &str) -> Result<usize, AppError> {
        self.check("delete_non_admin_players")?;
        self.inner.delete_non_admin_players(game_id).await
    }

    async fn clear_cards(&self, game_id: &str) -> Result<(), AppError> {
        self.check("clear_cards")?;
        self.inner.clear_cards(game_id).await
    }

    async fn upsert_vote(&self, vote: &VoteRecord) -> Result<(), AppError> {
        self.check("upsert_vote")?;
        self.inner.upsert_vote(vote).await
    }

    async fn list_votes(&self, game_id: &str) -> Result<Vec<VoteRecord>, AppError> {
        self.inner.list_votes(game_id).await
    }

    async fn delete_votes(&self, game_id: &str) -> Result<usize, AppError> {
        self.check("delete_votes")?;
        self.inner.delete_votes(game_id).await
    }

    async fn delete_votes_involving(
        &self,
        game_id: &str,
        player_id: &str,
    ) -> Result<usize, AppError> {
        self.check("delete_votes_involving")?;
        self.inner.delete_votes_involving(game_id, player_id).await
    }

    async fn insert_round_stat(&self, stat: &RoundStatRecord) -> Result<(), AppError> {
        self.check("insert_round_stat")?;
        self.inner.insert_round_stat(stat).await
    }

    async fn list_round_stats(&self, game_id: &str) -> Result<Vec<RoundStatRecord>, AppError> {
        self.inner.list_round_stats(game_id).await
    }

    async fn subscribe(&self, game_id: &str) -> broadcast::Receiver<StoreChange> {
        self.inner.subscribe(game_id).await
    }
}
