use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::store::RoundStatRecord;

pub const UNKNOWN_PLAYER_NAME: &str = "Unknown";

/// Aggregate over every recorded round of one game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStatsSummary {
    pub game_id: String,
    pub rounds_played: u32,
    pub liar_wins: u32,
    pub player_wins: u32,
    /// Keyed by player id
    pub player_stats: HashMap<String, PlayerStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: String,
    pub name: String,
    pub rounds_as_liar: u32,
    pub liar_wins: u32,
    pub times_eliminated: u32,
}

impl GameStatsSummary {
    pub fn from_rounds(game_id: &str, rounds: &[RoundStatRecord]) -> Self {
        let mut summary = GameStatsSummary {
            game_id: game_id.to_string(),
            ..Default::default()
        };

        for round in rounds {
            summary.rounds_played += 1;
            if round.liar_won {
                summary.liar_wins += 1;
            } else {
                summary.player_wins += 1;
            }

            let liar = summary.entry(&round.liar_player_id, &round.liar_player_name);
            liar.rounds_as_liar += 1;
            if round.liar_won {
                liar.liar_wins += 1;
            }

            let eliminated =
                summary.entry(&round.eliminated_player_id, &round.eliminated_player_name);
            eliminated.times_eliminated += 1;
        }

        summary
    }

    fn entry(&mut self, player_id: &str, name: &str) -> &mut PlayerStats {
        let stats = self
            .player_stats
            .entry(player_id.to_string())
            .or_insert_with(|| PlayerStats {
                player_id: player_id.to_string(),
                ..Default::default()
            });
        // Later rounds carry the most recent name
        if name != UNKNOWN_PLAYER_NAME || stats.name.is_empty() {
            stats.name = name.to_string();
        }
        stats
    }
}
