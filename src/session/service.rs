use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::generators::{normalize_code, CodeGenerator, RandomCodeGenerator};
use super::types::{CreateGameResponse, JoinGameResponse};
use crate::config::GameConfig;
use crate::round::service::require_admin;
use crate::round::RoundOrchestrator;
use crate::shared::AppError;
use crate::store::{GamePhase, GameRecord, PlayerRecord, SessionStore};

/// Session lifecycle and membership: create, join, leave, cancel,
/// reorder and reset.
#[derive(Clone)]
pub struct SessionManager {
    config: Arc<GameConfig>,
    store: Arc<dyn SessionStore>,
    rounds: RoundOrchestrator,
    codes: Arc<dyn CodeGenerator>,
}

impl SessionManager {
    pub fn new(
        config: Arc<GameConfig>,
        store: Arc<dyn SessionStore>,
        rounds: RoundOrchestrator,
    ) -> Self {
        Self {
            config,
            store,
            rounds,
            codes: Arc::new(RandomCodeGenerator::new()),
        }
    }

    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    /// Creates a game in admin-lobby with its admin at order 0
    #[instrument(skip(self))]
    pub async fn create_game(&self, admin_name: &str) -> Result<CreateGameResponse, AppError> {
        let admin_name = validate_name(admin_name)?;

        let mut attempt = 0;
        let game = loop {
            attempt += 1;
            let code = self.codes.generate().await;
            match self.store.insert_game(&GameRecord::new(code)).await {
                Ok(game) => break game,
                Err(AppError::StoreWriteError(reason)) if attempt < self.config.code_attempts => {
                    debug!(attempt, %reason, "Retrying game creation with a new code");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Game creation failed");
                    return Err(e);
                }
            }
        };

        let admin = PlayerRecord::new(&game.id, &admin_name, true, 0);
        if let Err(e) = self.store.insert_player(&admin).await {
            // The game is unusable without its admin
            warn!(game_id = %game.id, error = %e, "Admin insert failed");
            if let Err(cleanup) = self.store.delete_game(&game.id).await {
                warn!(game_id = %game.id, error = %cleanup, "Abandoned game left behind");
            }
            return Err(e);
        }

        info!(game_id = %game.id, code = %game.code, "Game created");
        Ok(CreateGameResponse {
            game_id: game.id,
            code: game.code,
            player_id: admin.id,
        })
    }

    /// Joins by code (case-insensitive) while the game is in a lobby phase
    #[instrument(skip(self))]
    pub async fn join_game(&self, code: &str, name: &str) -> Result<JoinGameResponse, AppError> {
        let name = validate_name(name)?;
        let code =
            normalize_code(code).ok_or_else(|| AppError::NotFound(format!("Game code: {}", code)))?;
        let found = self
            .store
            .find_game_by_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Game code: {}", code)))?;

        let lock = self.rounds.game_lock(&found.id).await;
        let _guard = lock.lock().await;

        let mut game = self
            .store
            .get_game(&found.id)
            .await?
            .ok_or_else(|| AppError::game_not_found(&found.id))?;
        if !game.phase.accepts_joins() {
            return Err(AppError::GameAlreadyStarted);
        }

        let players = self.store.list_players(&game.id).await?;
        if !players.iter().any(|p| p.is_admin) {
            return Err(AppError::game_not_found(&game.id));
        }
        if players.len() >= self.config.max_players {
            return Err(AppError::GameFull {
                max: self.config.max_players,
            });
        }

        let order = players
            .iter()
            .map(|p| p.player_order)
            .max()
            .map_or(0, |max| max + 1);
        let player = self
            .store
            .insert_player(&PlayerRecord::new(&game.id, &name, false, order))
            .await?;

        if game.phase == GamePhase::AdminLobby {
            game.phase = GamePhase::WaitingRoom;
            game = self.store.update_game(&game).await?;
        }

        info!(
            game_id = %game.id,
            player_id = %player.id,
            player_order = order,
            "Player joined"
        );
        Ok(JoinGameResponse {
            game_id: game.id,
            code: game.code,
            player_id: player.id,
            player_order: order,
        })
    }

    /// Removes a player. The admin leaving ends the session for everyone.
    #[instrument(skip(self))]
    pub async fn leave_game(&self, player_id: &str) -> Result<(), AppError> {
        let player = self
            .store
            .get_player(player_id)
            .await?
            .ok_or_else(|| AppError::player_not_found(player_id))?;

        if player.is_admin {
            info!(game_id = %player.game_id, "Admin left, ending session");
            return self.end_session(&player.game_id).await;
        }

        self.rounds.remove_player(&player.game_id, &player).await?;
        info!(game_id = %player.game_id, "Player left");
        Ok(())
    }

    /// Admin-only equivalent of the admin leaving
    #[instrument(skip(self))]
    pub async fn cancel_game(&self, game_id: &str, actor_id: &str) -> Result<(), AppError> {
        let players = self.store.list_players(game_id).await?;
        if self.store.get_game(game_id).await?.is_none() {
            return Err(AppError::game_not_found(game_id));
        }
        require_admin(&players, actor_id)?;

        info!("Game cancelled by admin");
        self.end_session(game_id).await
    }

    async fn end_session(&self, game_id: &str) -> Result<(), AppError> {
        self.rounds.cancel_timers(game_id);
        {
            let lock = self.rounds.game_lock(game_id).await;
            let _guard = lock.lock().await;
            self.store.delete_game(game_id).await?;
        }
        self.rounds.forget_game(game_id).await;
        Ok(())
    }

    /// Rewrites `player_order` to 0..N-1 following `ordered_ids`, which must
    /// name every member exactly once.
    #[instrument(skip(self))]
    pub async fn reorder_players(
        &self,
        game_id: &str,
        actor_id: &str,
        ordered_ids: &[String],
    ) -> Result<Vec<PlayerRecord>, AppError> {
        let lock = self.rounds.game_lock(game_id).await;
        let _guard = lock.lock().await;

        if self.store.get_game(game_id).await?.is_none() {
            return Err(AppError::game_not_found(game_id));
        }
        let players = self.store.list_players(game_id).await?;
        require_admin(&players, actor_id)?;

        let requested: HashSet<&str> = ordered_ids.iter().map(String::as_str).collect();
        let members: HashSet<&str> = players.iter().map(|p| p.id.as_str()).collect();
        if requested.len() != ordered_ids.len() {
            return Err(AppError::InvalidOrder("Duplicate player ids".to_string()));
        }
        if requested != members {
            return Err(AppError::InvalidOrder(format!(
                "Expected the {} current members, got {} ids",
                members.len(),
                ordered_ids.len()
            )));
        }

        let updates = ordered_ids.iter().enumerate().filter_map(|(index, id)| {
            let mut player = players.iter().find(|p| &p.id == id)?.clone();
            player.player_order = index as u32;
            Some(player)
        });
        let store = &self.store;
        try_join_all(updates.map(|player| async move {
            store.update_player(&player).await?;
            Ok::<PlayerRecord, AppError>(player)
        }))
        .await?;

        info!(player_count = ordered_ids.len(), "Players reordered");
        self.store.list_players(game_id).await
    }

    /// "New game, same room": fresh code, only the admin stays, round
    /// history is kept.
    ///
    /// The new code and cleared round are persisted before anything is
    /// deleted, so a failed reset leaves the game and its players as they were.
    #[instrument(skip(self))]
    pub async fn reset_to_lobby(&self, game_id: &str, actor_id: &str) -> Result<GameRecord, AppError> {
        {
            let lock = self.rounds.game_lock(game_id).await;
            let _guard = lock.lock().await;

            let mut game = self
                .store
                .get_game(game_id)
                .await?
                .ok_or_else(|| AppError::game_not_found(game_id))?;
            let players = self.store.list_players(game_id).await?;
            require_admin(&players, actor_id)?;

            let previous_code = game.code.clone();
            game.clear_round();
            game.phase = GamePhase::AdminLobby;
            let updated = self.persist_with_new_code(game, &previous_code).await?;
            info!(old_code = %previous_code, new_code = %updated.code, "Game reset to lobby");

            self.rounds.end_window(game_id).await;
            self.store.delete_votes(game_id).await?;
            let removed = self.store.delete_non_admin_players(game_id).await?;
            self.store.clear_cards(game_id).await?;
            debug!(removed, "Non-admin players removed");
        }

        // Readers may lag behind the reset writes
        tokio::time::sleep(self.config.reset_settle_delay).await;

        self.store
            .get_game(game_id)
            .await?
            .ok_or_else(|| AppError::game_not_found(game_id))
    }

    /// Writes `game` under a freshly generated code distinct from `previous_code`
    async fn persist_with_new_code(
        &self,
        mut game: GameRecord,
        previous_code: &str,
    ) -> Result<GameRecord, AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let code = self.codes.generate().await;
            if code.eq_ignore_ascii_case(previous_code) {
                if attempt >= self.config.code_attempts {
                    return Err(AppError::StoreWriteError(
                        "Could not allocate a new game code".to_string(),
                    ));
                }
                continue;
            }
            game.code = code;
            match self.store.update_game(&game).await {
                Ok(updated) => return Ok(updated),
                Err(AppError::StoreWriteError(reason)) if attempt < self.config.code_attempts => {
                    debug!(attempt, %reason, "Retrying reset with a new code");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }
    Ok(name.to_string())
}
