use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;

use crate::store::{PlayerRecord, VoteRecord};

/// Result of counting one voting window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TallyOutcome {
    /// Nobody voted; a non-liar is eliminated by default
    ZeroVotes { eliminated: String },
    /// Exactly one target holds the maximum count
    Plurality { eliminated: String, votes: usize },
    /// Two or more targets share the maximum count, in tie order
    Tie { candidates: Vec<String>, votes: usize },
}

impl TallyOutcome {
    pub fn eliminated(&self) -> Option<&str> {
        match self {
            TallyOutcome::ZeroVotes { eliminated } | TallyOutcome::Plurality { eliminated, .. } => {
                Some(eliminated)
            }
            TallyOutcome::Tie { .. } => None,
        }
    }
}

/// Counts the votes of a closed window.
///
/// `votes` must be in order of last write and `players` in turn order. Votes
/// aimed at someone no longer in `players` are ignored. Tie order is the
/// order in which the tied targets first appear in `votes`.
///
/// Returns `None` only when there are no players at all.
pub fn tally(votes: &[VoteRecord], players: &[PlayerRecord], liar_id: &str) -> Option<TallyOutcome> {
    let first = players.first()?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for vote in votes {
        let target = vote.target_id.as_str();
        if !players.iter().any(|p| p.id == target) {
            continue;
        }
        let count = counts.entry(target).or_insert(0);
        if *count == 0 {
            first_seen.push(target);
        }
        *count += 1;
    }

    let max = match counts.values().max() {
        Some(max) => *max,
        None => {
            // Deterministic default: first non-liar in turn order
            let eliminated = players
                .iter()
                .find(|p| p.id != liar_id)
                .unwrap_or(first)
                .id
                .clone();
            return Some(TallyOutcome::ZeroVotes { eliminated });
        }
    };

    let leaders: Vec<String> = first_seen
        .into_iter()
        .filter(|id| counts.get(id) == Some(&max))
        .map(str::to_string)
        .collect();

    Some(match leaders.as_slice() {
        [single] => TallyOutcome::Plurality {
            eliminated: single.clone(),
            votes: max,
        },
        _ => TallyOutcome::Tie {
            candidates: leaders,
            votes: max,
        },
    })
}

/// Picks the sole tie-breaking voter uniformly among the non-liars
pub fn pick_tie_breaker<R: Rng + ?Sized>(
    players: &[PlayerRecord],
    liar_id: &str,
    rng: &mut R,
) -> Option<String> {
    let eligible: Vec<&PlayerRecord> = players.iter().filter(|p| p.id != liar_id).collect();
    eligible.choose(rng).map(|p| p.id.clone())
}

/// Elimination target when the tie-breaker lets the clock run out
pub fn tie_timeout_target(candidates: &[String]) -> Option<&str> {
    candidates.first().map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn players(ids: &[&str]) -> Vec<PlayerRecord> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                let mut p = PlayerRecord::new("g", id, i == 0, i as u32);
                p.id = id.to_string();
                p
            })
            .collect()
    }

    fn votes(pairs: &[(&str, &str)]) -> Vec<VoteRecord> {
        pairs
            .iter()
            .map(|(voter, target)| VoteRecord::new("g", voter, target))
            .collect()
    }

    #[rstest]
    #[case::plurality(
        &["A", "B", "C", "X", "Y"],
        &[("A", "X"), ("B", "X"), ("C", "Y")],
        "Y",
        TallyOutcome::Plurality { eliminated: "X".to_string(), votes: 2 }
    )]
    #[case::unanimous(
        &["A", "B", "C"],
        &[("A", "C"), ("B", "C"), ("C", "A")],
        "C",
        TallyOutcome::Plurality { eliminated: "C".to_string(), votes: 2 }
    )]
    #[case::two_way_tie(
        &["A", "B", "X", "Y"],
        &[("A", "X"), ("B", "Y")],
        "Y",
        TallyOutcome::Tie { candidates: vec!["X".to_string(), "Y".to_string()], votes: 1 }
    )]
    #[case::tie_order_follows_first_vote(
        &["A", "B", "C", "D"],
        &[("A", "D"), ("B", "C"), ("C", "D"), ("D", "C")],
        "A",
        TallyOutcome::Tie { candidates: vec!["D".to_string(), "C".to_string()], votes: 2 }
    )]
    #[case::zero_votes_liar_first(
        &["B", "A", "C"],
        &[],
        "B",
        TallyOutcome::ZeroVotes { eliminated: "A".to_string() }
    )]
    #[case::zero_votes(
        &["A", "B", "C"],
        &[],
        "B",
        TallyOutcome::ZeroVotes { eliminated: "A".to_string() }
    )]
    #[case::votes_for_departed_player_ignored(
        &["A", "B", "C"],
        &[("A", "Z"), ("B", "Z"), ("C", "A")],
        "B",
        TallyOutcome::Plurality { eliminated: "A".to_string(), votes: 1 }
    )]
    fn test_tally(
        #[case] ids: &[&str],
        #[case] pairs: &[(&str, &str)],
        #[case] liar: &str,
        #[case] expected: TallyOutcome,
    ) {
        let outcome = tally(&votes(pairs), &players(ids), liar).unwrap();
        assert_eq!(outcome, expected);
    }

    #[test]
    fn test_tally_without_players() {
        assert!(tally(&[], &[], "x").is_none());
    }

    #[test]
    fn test_eliminated_accessor() {
        let tie = TallyOutcome::Tie {
            candidates: vec!["X".to_string(), "Y".to_string()],
            votes: 1,
        };
        assert_eq!(tie.eliminated(), None);
        let zero = TallyOutcome::ZeroVotes {
            eliminated: "A".to_string(),
        };
        assert_eq!(zero.eliminated(), Some("A"));
    }

    #[test]
    fn test_tie_breaker_is_never_the_liar() {
        let roster = players(&["A", "B", "X", "Y"]);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_tie_breaker(&roster, "Y", &mut rng).unwrap();
            assert_ne!(picked, "Y");
            assert!(["A", "B", "X"].contains(&picked.as_str()));
        }
    }

    #[test]
    fn test_tie_breaker_needs_a_non_liar() {
        let roster = players(&["Y"]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_tie_breaker(&roster, "Y", &mut rng).is_none());
    }

    #[test]
    fn test_tie_timeout_takes_first_candidate() {
        let candidates = vec!["D".to_string(), "C".to_string()];
        assert_eq!(tie_timeout_target(&candidates), Some("D"));
        assert_eq!(tie_timeout_target(&[]), None);
    }
}
