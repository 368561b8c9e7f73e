//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use liarcard::{
    store::{GameRecord, PlayerRecord, RoundStatRecord, VoteRecord},
    GamePhase, SessionStore, Winner,
};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Everything the store holds for one game, loaded once
pub struct GameAssertion {
    game_id: String,
    game: Option<GameRecord>,
    players: Vec<PlayerRecord>,
    votes: Vec<VoteRecord>,
    stats: Vec<RoundStatRecord>,
}

impl GameAssertion {
    pub async fn for_game(setup: &TestSetup) -> Self {
        let store = &setup.records;
        let game_id = setup.game_id.clone();
        Self {
            game: store.get_game(&game_id).await.unwrap(),
            players: store.list_players(&game_id).await.unwrap(),
            votes: store.list_votes(&game_id).await.unwrap(),
            stats: store.list_round_stats(&game_id).await.unwrap(),
            game_id,
        }
    }

    fn existing(&self) -> &GameRecord {
        self.game
            .as_ref()
            .unwrap_or_else(|| panic!("game {} should exist", self.game_id))
    }

    pub fn is_deleted(self) -> Self {
        assert!(self.game.is_none(), "game {} should be deleted", self.game_id);
        assert!(self.players.is_empty(), "players should be deleted");
        assert!(self.votes.is_empty(), "votes should be deleted");
        self
    }

    pub fn in_phase(self, phase: GamePhase) -> Self {
        assert_eq!(self.existing().phase, phase, "unexpected phase");
        self
    }

    pub fn with_winner(self, winner: Winner) -> Self {
        assert_eq!(self.existing().winner, Some(winner), "unexpected winner");
        self
    }

    pub fn has_players(self, count: usize) -> Self {
        assert_eq!(self.players.len(), count, "unexpected player count");
        self
    }

    pub fn has_votes(self, count: usize) -> Self {
        assert_eq!(self.votes.len(), count, "unexpected vote count");
        self
    }

    pub fn has_round_stats(self, count: usize) -> Self {
        assert_eq!(self.stats.len(), count, "unexpected round stat count");
        self
    }

    pub fn last_eliminated(self, player_id: &str) -> Self {
        let last = self.stats.last().expect("a round stat should exist");
        assert_eq!(last.eliminated_player_id, player_id, "unexpected elimination");
        self
    }

    /// Exactly one liar card, every other card is the secret word
    pub fn has_one_liar_card(self) -> Self {
        let game = self.existing();
        let word = game.current_word.clone().expect("word should be chosen");
        let liar = game.liar_id.clone().expect("liar should be drawn");

        let liars: Vec<&PlayerRecord> = self
            .players
            .iter()
            .filter(|p| p.card.as_ref().map(|c| c.is_liar()).unwrap_or(false))
            .collect();
        assert_eq!(liars.len(), 1, "exactly one liar card expected");
        assert_eq!(liars[0].id, liar);

        for player in self.players.iter().filter(|p| p.id != liar) {
            assert_eq!(
                player.card,
                Some(liarcard::store::Card::Word(word.clone())),
                "{} should hold the word",
                player.name
            );
        }
        self
    }
}
