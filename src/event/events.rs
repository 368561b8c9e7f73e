use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Record family a change notification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Table {
    Games,
    Players,
    Votes,
    RoundStats,
}

/// What happened to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A change notification published by the session store
///
/// Notifications are facts about writes that already happened. They carry
/// identifiers only; subscribers re-read the store to get current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreChange {
    pub game_id: String,
    pub table: Table,
    pub kind: ChangeKind,
    pub record_id: String,
}

impl StoreChange {
    pub fn new(game_id: &str, table: Table, kind: ChangeKind, record_id: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            table,
            kind,
            record_id: record_id.to_string(),
        }
    }

    /// True when the game record itself was deleted, i.e. the session is over
    pub fn is_game_deleted(&self) -> bool {
        self.table == Table::Games && self.kind == ChangeKind::Delete
    }
}
