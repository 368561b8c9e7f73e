use futures::future::try_join_all;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use super::latch::ResolutionLatch;
use super::timer::{CountdownWindow, TimerRegistry};
use super::types::Resolution;
use crate::catalog::{draw_options, WordCatalog, WordOption};
use crate::config::GameConfig;
use crate::shared::AppError;
use crate::stats::StatsService;
use crate::store::{
    Card, GamePhase, GameRecord, PlayerRecord, SessionStore, VoteRecord, Winner,
};
use crate::tally::{pick_tie_breaker, tally, tie_timeout_target, TallyOutcome};

/// Outcome of one countdown tick
#[derive(Debug, PartialEq, Eq)]
enum Tick {
    Running(u32),
    Expired,
    Stale,
}

struct Inner {
    config: Arc<GameConfig>,
    store: Arc<dyn SessionStore>,
    catalog: Arc<dyn WordCatalog>,
    stats: StatsService,
    timers: TimerRegistry,
    latches: RwLock<HashMap<String, Arc<ResolutionLatch>>>,
    game_locks: RwLock<HashMap<String, Arc<AsyncMutex<()>>>>,
    rng: Mutex<StdRng>,
}

/// Drives the per-round state machine of every game.
///
/// Read-modify-write of a game happens under that game's async lock; the
/// store's version check catches writers outside this process. Every
/// voting and tie-breaker window is closed through a `ResolutionLatch`,
/// whichever trigger (quorum, tie-breaker vote, countdown) gets there first.
#[derive(Clone)]
pub struct RoundOrchestrator {
    inner: Arc<Inner>,
}

impl RoundOrchestrator {
    pub fn new(
        config: Arc<GameConfig>,
        store: Arc<dyn SessionStore>,
        catalog: Arc<dyn WordCatalog>,
        stats: StatsService,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            inner: Arc::new(Inner {
                config,
                store,
                catalog,
                stats,
                timers: TimerRegistry::new(),
                latches: RwLock::new(HashMap::new()),
                game_locks: RwLock::new(HashMap::new()),
                rng: Mutex::new(rng),
            }),
        }
    }

    /// Admin starts a round from the lobby: rotates the starting player,
    /// draws the liar and offers categories.
    #[instrument(skip(self))]
    pub async fn start_round(&self, game_id: &str, actor_id: &str) -> Result<GameRecord, AppError> {
        let lock = self.game_lock(game_id).await;
        let _guard = lock.lock().await;

        let mut game = self.load_game(game_id).await?;
        let players = self.load_players(game_id).await?;
        require_admin(&players, actor_id)?;
        require_phase(&game, &[GamePhase::AdminLobby, GamePhase::WaitingRoom])?;

        let min = self.inner.config.min_players;
        if players.len() < min {
            return Err(AppError::InsufficientPlayers {
                required: min,
                actual: players.len(),
            });
        }

        let config = &self.inner.config;
        let (starting_index, liar_id, categories, options) = self.with_rng(|rng| {
            let starting_index = (game.last_starting_index + 1).max(0) as usize % players.len();
            let liar_id = players.choose(&mut *rng).map(|p| p.id.clone());
            let (categories, options) = draw_options(
                self.inner.catalog.as_ref(),
                &mut *rng,
                config.category_count,
                config.words_per_category,
            );
            (starting_index, liar_id, categories, options)
        });

        let liar_id = liar_id.ok_or_else(|| AppError::game_not_found(game_id))?;
        if options.is_empty() {
            return Err(AppError::BadRequest("Word catalog is empty".to_string()));
        }

        self.inner.timers.cancel(game_id);
        self.inner.store.delete_votes(game_id).await?;
        self.inner.store.clear_cards(game_id).await?;

        game.clear_round();
        game.phase = GamePhase::CategorySelection;
        game.starting_player_id = Some(players[starting_index].id.clone());
        game.last_starting_index = starting_index as i32;
        game.liar_id = Some(liar_id);
        game.category_options = categories;
        game.word_options = options;
        let game = self.inner.store.update_game(&game).await?;

        info!(
            round = game.round_number + 1,
            starting_index,
            player_count = players.len(),
            "Round started"
        );
        Ok(game)
    }

    /// Non-liar starting player picks one of the offered words
    #[instrument(skip(self))]
    pub async fn select_word(
        &self,
        game_id: &str,
        player_id: &str,
        word: &str,
    ) -> Result<GameRecord, AppError> {
        let lock = self.game_lock(game_id).await;
        let _guard = lock.lock().await;

        let game = self.load_game(game_id).await?;
        let players = self.load_players(game_id).await?;
        require_starting_player(&game, player_id)?;
        if game.liar_id.as_deref() == Some(player_id) {
            return Err(AppError::BadRequest(
                "The liar chooses a category, not a word".to_string(),
            ));
        }

        let choice = game
            .word_options
            .iter()
            .find(|o| o.word.eq_ignore_ascii_case(word.trim()))
            .cloned()
            .ok_or_else(|| AppError::BadRequest(format!("Word was not offered: {}", word)))?;

        self.distribute(game, &players, choice).await
    }

    /// Liar starting player picks a category; the word is drawn among the
    /// options offered in it.
    #[instrument(skip(self))]
    pub async fn select_category(
        &self,
        game_id: &str,
        player_id: &str,
        category: &str,
    ) -> Result<GameRecord, AppError> {
        let lock = self.game_lock(game_id).await;
        let _guard = lock.lock().await;

        let game = self.load_game(game_id).await?;
        let players = self.load_players(game_id).await?;
        require_starting_player(&game, player_id)?;
        if game.liar_id.as_deref() != Some(player_id) {
            return Err(AppError::BadRequest(
                "Only the liar chooses a category".to_string(),
            ));
        }

        let category = game
            .category_options
            .iter()
            .find(|c| c.eq_ignore_ascii_case(category.trim()))
            .cloned()
            .ok_or_else(|| {
                AppError::BadRequest(format!("Category was not offered: {}", category))
            })?;

        let in_category: Vec<WordOption> = game
            .word_options
            .iter()
            .filter(|o| o.category == category)
            .cloned()
            .collect();
        let choice = self
            .with_rng(|rng| in_category.choose(&mut *rng).cloned())
            .ok_or_else(|| AppError::BadRequest(format!("No words offered in {}", category)))?;

        self.distribute(game, &players, choice).await
    }

    /// Hands out cards and moves to card-reveal. Caller holds the game lock.
    async fn distribute(
        &self,
        mut game: GameRecord,
        players: &[PlayerRecord],
        choice: WordOption,
    ) -> Result<GameRecord, AppError> {
        let liar_id = game.liar_id.clone().unwrap_or_default();
        let store = &self.inner.store;

        let writes = players.iter().map(|player| {
            let mut player = player.clone();
            player.card = Some(if player.id == liar_id {
                Card::Liar
            } else {
                Card::Word(choice.word.clone())
            });
            async move { store.update_player(&player).await }
        });
        // A partial failure leaves the game in category-selection; a retry rewrites every card
        try_join_all(writes).await?;

        game.current_word = Some(choice.word.clone());
        game.word_category = Some(choice.category.clone());
        game.category_options.clear();
        game.word_options.clear();
        game.phase = GamePhase::CardReveal;
        let game = store.update_game(&game).await?;

        info!(game_id = %game.id, category = %choice.category, "Cards distributed");
        Ok(game)
    }

    /// Admin opens the voting window
    #[instrument(skip(self))]
    pub async fn start_voting(&self, game_id: &str, actor_id: &str) -> Result<GameRecord, AppError> {
        let lock = self.game_lock(game_id).await;
        let _guard = lock.lock().await;

        let mut game = self.load_game(game_id).await?;
        let players = self.load_players(game_id).await?;
        require_admin(&players, actor_id)?;
        require_phase(&game, &[GamePhase::CardReveal])?;

        self.inner.store.delete_votes(game_id).await?;
        game.phase = GamePhase::Voting;
        game.time_left = self.inner.config.voting_seconds;
        let game = self.inner.store.update_game(&game).await?;

        let epoch = self.latch(game_id).await.arm();
        self.start_countdown(game_id, CountdownWindow::Voting, epoch);

        info!(time_left = game.time_left, "Voting opened");
        Ok(game)
    }

    /// Records or changes a vote. Returns the resolution when this vote
    /// completed the quorum.
    #[instrument(skip(self))]
    pub async fn cast_vote(
        &self,
        game_id: &str,
        voter_id: &str,
        target_id: &str,
    ) -> Result<Option<Resolution>, AppError> {
        let quorum = {
            let lock = self.game_lock(game_id).await;
            let _guard = lock.lock().await;

            let game = self.load_game(game_id).await?;
            require_phase(&game, &[GamePhase::Voting])?;
            let latch = self.latch(game_id).await;
            if latch.is_claimed() {
                return Err(AppError::Conflict("Voting is closed".to_string()));
            }

            let players = self.load_players(game_id).await?;
            if !players.iter().any(|p| p.id == voter_id) {
                return Err(AppError::player_not_found(voter_id));
            }
            if !players.iter().any(|p| p.id == target_id) {
                return Err(AppError::player_not_found(target_id));
            }
            if voter_id == target_id {
                return Err(AppError::BadRequest(
                    "Players cannot vote for themselves".to_string(),
                ));
            }

            self.inner
                .store
                .upsert_vote(&VoteRecord::new(game_id, voter_id, target_id))
                .await?;

            let votes = self.inner.store.list_votes(game_id).await?;
            has_quorum(&votes, &players).then_some(latch.epoch())
        };

        let Some(epoch) = quorum else {
            return Ok(None);
        };
        debug!(epoch, "Quorum reached");
        self.close_voting(game_id, epoch).await
    }

    /// Closes the current voting window. Returns `None` when another trigger
    /// already closed it or the game is no longer voting.
    #[instrument(skip(self))]
    pub async fn resolve_voting(&self, game_id: &str) -> Result<Option<Resolution>, AppError> {
        let epoch = self.latch(game_id).await.epoch();
        self.close_voting(game_id, epoch).await
    }

    /// Closes voting window `epoch`. The phase is checked under the game lock
    /// before claiming, so a trigger that outlived its window is a no-op.
    async fn close_voting(&self, game_id: &str, epoch: u64) -> Result<Option<Resolution>, AppError> {
        let lock = self.game_lock(game_id).await;
        let _guard = lock.lock().await;

        let game = match self.inner.store.get_game(game_id).await? {
            Some(game) if game.phase == GamePhase::Voting => game,
            _ => return Ok(None),
        };
        let latch = self.latch(game_id).await;
        if !latch.try_claim(epoch) {
            debug!(epoch, "Voting window already claimed");
            return Ok(None);
        }

        let result = self.tally_voting(game).await;
        if result.is_err() {
            latch.release(epoch);
        }
        result.map(Some)
    }

    /// Caller holds the game lock and the voting window's claim
    async fn tally_voting(&self, mut game: GameRecord) -> Result<Resolution, AppError> {
        let id = game.id.clone();
        let game_id = id.as_str();
        let players = self.load_players(game_id).await?;
        let votes = self.inner.store.list_votes(game_id).await?;
        let liar_id = game.liar_id.clone().unwrap_or_default();

        let outcome = tally(&votes, &players, &liar_id)
            .ok_or_else(|| AppError::game_not_found(game_id))?;
        debug!(?outcome, vote_count = votes.len(), "Votes tallied");

        let candidates = match outcome {
            TallyOutcome::ZeroVotes { eliminated } | TallyOutcome::Plurality { eliminated, .. } => {
                return self.finish_round(game, &players, &eliminated).await;
            }
            TallyOutcome::Tie { candidates, .. } => candidates,
        };

        let tie_breaker = self.with_rng(|rng| pick_tie_breaker(&players, &liar_id, rng));
        let Some(tie_breaker_id) = tie_breaker else {
            // Only the liar is left to break the tie
            let eliminated = tie_timeout_target(&candidates)
                .unwrap_or(liar_id.as_str())
                .to_string();
            return self.finish_round(game, &players, &eliminated).await;
        };

        self.inner.timers.cancel(game_id);
        game.phase = GamePhase::TieBreaker;
        game.tie_breaker_id = Some(tie_breaker_id.clone());
        game.tie_candidates = candidates.clone();
        game.time_left = self.inner.config.tie_breaker_seconds;
        self.inner.store.update_game(&game).await?;

        let epoch = self.latch(game_id).await.arm();
        self.start_countdown(game_id, CountdownWindow::TieBreaker, epoch);

        info!(
            tie_breaker_id = %tie_breaker_id,
            candidate_count = candidates.len(),
            "Tie-breaker started"
        );
        Ok(Resolution::TieBreaker {
            tie_breaker_id,
            candidates,
        })
    }

    /// The designated tie-breaker's vote decides the round
    #[instrument(skip(self))]
    pub async fn cast_tie_breaker_vote(
        &self,
        game_id: &str,
        voter_id: &str,
        target_id: &str,
    ) -> Result<Resolution, AppError> {
        let epoch = {
            let lock = self.game_lock(game_id).await;
            let _guard = lock.lock().await;

            let game = self.load_game(game_id).await?;
            require_phase(&game, &[GamePhase::TieBreaker])?;
            if game.tie_breaker_id.as_deref() != Some(voter_id) {
                return Err(AppError::Unauthorized(
                    "Only the designated tie-breaker may vote".to_string(),
                ));
            }
            if !game.tie_candidates.iter().any(|c| c == target_id) {
                return Err(AppError::BadRequest(format!(
                    "Not a tied candidate: {}",
                    target_id
                )));
            }

            self.inner
                .store
                .upsert_vote(&VoteRecord::new(game_id, voter_id, target_id))
                .await?;
            self.latch(game_id).await.epoch()
        };

        let resolution = self
            .close_tie_breaker(game_id, Some(target_id), epoch)
            .await?;
        resolution.ok_or_else(|| AppError::Conflict("Tie-breaker is already resolved".to_string()))
    }

    /// Closes the tie-breaker window with the given target, or the first tied
    /// candidate when `choice` is `None`.
    #[instrument(skip(self))]
    pub async fn resolve_tie_breaker(
        &self,
        game_id: &str,
        choice: Option<&str>,
    ) -> Result<Option<Resolution>, AppError> {
        let epoch = self.latch(game_id).await.epoch();
        self.close_tie_breaker(game_id, choice, epoch).await
    }

    /// Closes tie-breaker window `epoch`, checking the phase under the game
    /// lock before claiming.
    async fn close_tie_breaker(
        &self,
        game_id: &str,
        choice: Option<&str>,
        epoch: u64,
    ) -> Result<Option<Resolution>, AppError> {
        let lock = self.game_lock(game_id).await;
        let _guard = lock.lock().await;

        let game = match self.inner.store.get_game(game_id).await? {
            Some(game) if game.phase == GamePhase::TieBreaker => game,
            _ => return Ok(None),
        };
        let latch = self.latch(game_id).await;
        if !latch.try_claim(epoch) {
            debug!(epoch, "Tie-breaker window already claimed");
            return Ok(None);
        }

        let result = self.break_tie(game, choice).await;
        if result.is_err() {
            latch.release(epoch);
        }
        result.map(Some)
    }

    /// Caller holds the game lock and the tie-breaker window's claim
    async fn break_tie(
        &self,
        game: GameRecord,
        choice: Option<&str>,
    ) -> Result<Resolution, AppError> {
        let players = self.load_players(&game.id).await?;
        let eliminated = match choice {
            Some(target) => target.to_string(),
            None => tie_timeout_target(&game.tie_candidates)
                .map(str::to_string)
                .ok_or_else(|| AppError::Conflict("No tied candidates".to_string()))?,
        };

        self.finish_round(game, &players, &eliminated).await
    }

    /// Records the round and moves to results. Caller holds the game lock.
    async fn finish_round(
        &self,
        mut game: GameRecord,
        players: &[PlayerRecord],
        eliminated_id: &str,
    ) -> Result<Resolution, AppError> {
        self.inner.timers.cancel(&game.id);

        let liar_id = game.liar_id.clone().unwrap_or_default();
        let winner = Winner::decide(eliminated_id, &liar_id);
        let stat = self
            .inner
            .stats
            .record_round(&game, players, eliminated_id, winner)
            .await?;

        game.phase = GamePhase::Results;
        game.winner = Some(winner);
        game.time_left = 0;
        game.round_number = stat.round_number;
        game.tie_breaker_id = None;
        game.tie_candidates.clear();
        let game = self.inner.store.update_game(&game).await?;

        info!(
            game_id = %game.id,
            round = game.round_number,
            eliminated_id,
            winner = %winner,
            "Round resolved"
        );
        Ok(Resolution::RoundOver {
            round_number: game.round_number,
            eliminated_id: eliminated_id.to_string(),
            winner,
        })
    }

    /// Admin returns to the lobby after results; rotation and history survive
    #[instrument(skip(self))]
    pub async fn play_again(&self, game_id: &str, actor_id: &str) -> Result<GameRecord, AppError> {
        let lock = self.game_lock(game_id).await;
        let _guard = lock.lock().await;

        let mut game = self.load_game(game_id).await?;
        let players = self.load_players(game_id).await?;
        require_admin(&players, actor_id)?;
        require_phase(&game, &[GamePhase::Results])?;

        self.inner.timers.cancel(game_id);
        self.inner.store.delete_votes(game_id).await?;
        self.inner.store.clear_cards(game_id).await?;

        game.clear_round();
        game.phase = GamePhase::AdminLobby;
        let game = self.inner.store.update_game(&game).await?;

        info!(round = game.round_number, "Back to lobby");
        Ok(game)
    }

    /// Removes a non-admin player and repairs the round they leave behind.
    ///
    /// The leaver's votes go with them. If they were the liar the round is
    /// aborted to the lobby with no stat; a departed starting player or
    /// tie-breaker is replaced. During voting the quorum is checked again.
    #[instrument(skip(self, player), fields(player_id = %player.id))]
    pub async fn remove_player(
        &self,
        game_id: &str,
        player: &PlayerRecord,
    ) -> Result<Option<Resolution>, AppError> {
        let recheck_quorum = {
            let lock = self.game_lock(game_id).await;
            let _guard = lock.lock().await;

            self.inner.store.delete_player(&player.id).await?;

            let Some(mut game) = self.inner.store.get_game(game_id).await? else {
                return Ok(None);
            };
            if !game.phase.is_round_active() {
                return Ok(None);
            }

            self.inner
                .store
                .delete_votes_involving(game_id, &player.id)
                .await?;
            let players = self.inner.store.list_players(game_id).await?;

            if game.liar_id.as_deref() == Some(player.id.as_str()) {
                self.inner.timers.cancel(game_id);
                self.inner.store.delete_votes(game_id).await?;
                self.inner.store.clear_cards(game_id).await?;
                game.clear_round();
                game.phase = GamePhase::AdminLobby;
                self.inner.store.update_game(&game).await?;
                warn!("Liar left mid-round, round aborted");
                return Ok(None);
            }

            let mut changed = false;
            if game.starting_player_id.as_deref() == Some(player.id.as_str())
                && game.phase == GamePhase::CategorySelection
                && !players.is_empty()
            {
                // The next player in turn order now sits at the departed index
                let index = game.last_starting_index.max(0) as usize % players.len();
                game.starting_player_id = Some(players[index].id.clone());
                game.last_starting_index = index as i32;
                changed = true;
            }
            if game.phase == GamePhase::TieBreaker {
                if game.tie_candidates.len() > 1 {
                    let before = game.tie_candidates.len();
                    game.tie_candidates.retain(|c| c != &player.id);
                    changed |= game.tie_candidates.len() != before;
                }
                if game.tie_breaker_id.as_deref() == Some(player.id.as_str()) {
                    let liar_id = game.liar_id.clone().unwrap_or_default();
                    game.tie_breaker_id =
                        self.with_rng(|rng| pick_tie_breaker(&players, &liar_id, rng));
                    changed = true;
                }
            }
            if changed {
                self.inner.store.update_game(&game).await?;
            }

            if game.phase == GamePhase::Voting {
                let votes = self.inner.store.list_votes(game_id).await?;
                let epoch = self.latch(game_id).await.epoch();
                has_quorum(&votes, &players).then_some(epoch)
            } else {
                None
            }
        };

        if let Some(epoch) = recheck_quorum {
            return self.close_voting(game_id, epoch).await;
        }
        Ok(None)
    }

    /// Stops the game's countdown, if one is running
    pub fn cancel_timers(&self, game_id: &str) -> bool {
        self.inner.timers.cancel(game_id)
    }

    /// Ends whatever window is open: stops the countdown and retires the
    /// latch epoch so no pending trigger can close it. Caller holds the game lock.
    pub(crate) async fn end_window(&self, game_id: &str) {
        self.inner.timers.cancel(game_id);
        let epoch = self.latch(game_id).await.arm();
        debug!(game_id, epoch, "Round window ended");
    }

    /// Drops every per-game resource after the game is deleted
    pub async fn forget_game(&self, game_id: &str) {
        self.inner.timers.cancel(game_id);
        self.inner.latches.write().await.remove(game_id);
        self.inner.game_locks.write().await.remove(game_id);
    }

    pub fn active_countdown(&self, game_id: &str) -> Option<CountdownWindow> {
        self.inner.timers.active_window(game_id)
    }

    /// Per-game lock shared by every writer of the game's records
    pub(crate) async fn game_lock(&self, game_id: &str) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.inner.game_locks.read().await;
            if let Some(lock) = guard.get(game_id) {
                return lock.clone();
            }
        }

        let mut guard = self.inner.game_locks.write().await;
        guard
            .entry(game_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn latch(&self, game_id: &str) -> Arc<ResolutionLatch> {
        {
            let guard = self.inner.latches.read().await;
            if let Some(latch) = guard.get(game_id) {
                return latch.clone();
            }
        }

        let mut guard = self.inner.latches.write().await;
        guard
            .entry(game_id.to_string())
            .or_insert_with(|| Arc::new(ResolutionLatch::new()))
            .clone()
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self
            .inner
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    async fn load_game(&self, game_id: &str) -> Result<GameRecord, AppError> {
        self.inner
            .store
            .get_game(game_id)
            .await?
            .ok_or_else(|| AppError::game_not_found(game_id))
    }

    /// Players in turn order. A game without players or without its admin
    /// is abandoned and reported as missing.
    async fn load_players(&self, game_id: &str) -> Result<Vec<PlayerRecord>, AppError> {
        let players = self.inner.store.list_players(game_id).await?;
        if !players.iter().any(|p| p.is_admin) {
            warn!(game_id, player_count = players.len(), "Game has no admin");
            return Err(AppError::game_not_found(game_id));
        }
        Ok(players)
    }

    fn start_countdown(&self, game_id: &str, window: CountdownWindow, epoch: u64) {
        let orchestrator = self.clone();
        let id = game_id.to_string();
        self.inner.timers.start(game_id, window, move |generation| async move {
            orchestrator.run_countdown(id, window, generation, epoch).await;
        });
    }

    async fn run_countdown(
        &self,
        game_id: String,
        window: CountdownWindow,
        generation: u64,
        epoch: u64,
    ) {
        let mut ticker = interval(self.inner.config.countdown_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match self.countdown_tick(&game_id, window).await {
                Ok(Tick::Running(time_left)) => {
                    debug!(game_id = %game_id, time_left, "Countdown tick");
                }
                Ok(Tick::Expired) => {
                    self.inner.timers.disarm(&game_id, generation);
                    let result = match window {
                        CountdownWindow::Voting => self.close_voting(&game_id, epoch).await,
                        CountdownWindow::TieBreaker => {
                            self.close_tie_breaker(&game_id, None, epoch).await
                        }
                    };
                    if let Err(e) = result {
                        warn!(game_id = %game_id, error = %e, "Resolution after countdown failed");
                    }
                    return;
                }
                Ok(Tick::Stale) => {
                    debug!(game_id = %game_id, "Countdown no longer relevant");
                    self.inner.timers.disarm(&game_id, generation);
                    return;
                }
                Err(e) => {
                    // Transient store failure, retried on the next tick
                    warn!(game_id = %game_id, error = %e, "Countdown tick failed");
                }
            }
        }
    }

    async fn countdown_tick(&self, game_id: &str, window: CountdownWindow) -> Result<Tick, AppError> {
        let lock = self.game_lock(game_id).await;
        let _guard = lock.lock().await;

        let mut game = match self.inner.store.get_game(game_id).await? {
            Some(game) if game.phase == window.phase() => game,
            _ => return Ok(Tick::Stale),
        };
        if game.time_left == 0 {
            return Ok(Tick::Expired);
        }

        game.time_left -= 1;
        let game = self.inner.store.update_game(&game).await?;
        Ok(if game.time_left == 0 {
            Tick::Expired
        } else {
            Tick::Running(game.time_left)
        })
    }
}

pub(crate) fn require_admin(players: &[PlayerRecord], actor_id: &str) -> Result<(), AppError> {
    match players.iter().find(|p| p.id == actor_id) {
        Some(player) if player.is_admin => Ok(()),
        _ => Err(AppError::Unauthorized(
            "Only the admin can do this".to_string(),
        )),
    }
}

fn require_phase(game: &GameRecord, allowed: &[GamePhase]) -> Result<(), AppError> {
    if allowed.contains(&game.phase) {
        return Ok(());
    }
    Err(AppError::InvalidPhase {
        expected: allowed
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" or "),
        actual: game.phase.to_string(),
    })
}

fn require_starting_player(game: &GameRecord, player_id: &str) -> Result<(), AppError> {
    require_phase(game, &[GamePhase::CategorySelection])?;
    if game.starting_player_id.as_deref() != Some(player_id) {
        return Err(AppError::Unauthorized(
            "Only the starting player chooses the word".to_string(),
        ));
    }
    Ok(())
}

/// Every current player has a vote on record
fn has_quorum(votes: &[VoteRecord], players: &[PlayerRecord]) -> bool {
    let cast = votes
        .iter()
        .filter(|v| players.iter().any(|p| p.id == v.voter_id))
        .count();
    !players.is_empty() && cast >= players.len()
}
