#![allow(dead_code)] // Test utilities may not all be used in every test

use tokio::time::{sleep, Duration, Instant};

use liarcard::{
    store::{GameRecord, PlayerRecord},
    AppError, GamePhase, Resolution, SessionStore,
};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    pub async fn game(&self) -> GameRecord {
        self.records.get_game(&self.game_id).await.unwrap().unwrap()
    }

    pub async fn player_records(&self) -> Vec<PlayerRecord> {
        self.records.list_players(&self.game_id).await.unwrap()
    }

    /// Admin starts a round; returns the game in category-selection
    pub async fn start_round(&self) -> GameRecord {
        self.state
            .rounds
            .start_round(&self.game_id, self.admin())
            .await
            .unwrap()
    }

    /// Starting player makes the choice their role allows
    pub async fn try_choose_word(&self, game: &GameRecord) -> Result<GameRecord, AppError> {
        let starter = game.starting_player_id.clone().unwrap();
        if game.liar_id.as_ref() == Some(&starter) {
            let category = game.category_options[0].clone();
            self.state
                .rounds
                .select_category(&self.game_id, &starter, &category)
                .await
        } else {
            let word = game.word_options[0].word.clone();
            self.state
                .rounds
                .select_word(&self.game_id, &starter, &word)
                .await
        }
    }

    pub async fn choose_word(&self, game: &GameRecord) -> GameRecord {
        self.try_choose_word(game).await.unwrap()
    }

    /// Plays up to card-reveal and returns the liar's id
    pub async fn reach_card_reveal(&self) -> String {
        let game = self.start_round().await;
        self.choose_word(&game).await;
        game.liar_id.unwrap()
    }

    /// Plays up to an open voting window and returns the liar's id
    pub async fn reach_voting(&self) -> String {
        let liar = self.reach_card_reveal().await;
        self.state
            .rounds
            .start_voting(&self.game_id, self.admin())
            .await
            .unwrap();
        liar
    }

    pub async fn vote(&self, voter: &str, target: &str) -> Result<Option<Resolution>, AppError> {
        self.state
            .rounds
            .cast_vote(&self.game_id, voter, target)
            .await
    }

    /// Resolves the current round by quorum with everyone voting for the liar
    pub async fn finish_round_catching_liar(&self, liar: &str) -> Resolution {
        let mut last = None;
        for voter in &self.players {
            let target = if voter == liar {
                self.players.iter().find(|p| *p != liar).unwrap().as_str()
            } else {
                liar
            };
            last = self.vote(voter, target).await.unwrap();
        }
        last.expect("quorum should resolve the round")
    }

    pub async fn play_again(&self) -> GameRecord {
        self.state
            .rounds
            .play_again(&self.game_id, self.admin())
            .await
            .unwrap()
    }

    /// Polls until the game reaches `phase` or two seconds pass
    pub async fn wait_for_phase(&self, phase: GamePhase) -> GameRecord {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let game = self.game().await;
            if game.phase == phase {
                return game;
            }
            assert!(
                Instant::now() < deadline,
                "game stuck in {} while waiting for {}",
                game.phase,
                phase
            );
            sleep(Duration::from_millis(5)).await;
        }
    }
}
