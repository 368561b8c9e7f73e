use serde::{Deserialize, Serialize};

/// A word offered to the starting player, tagged with its category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordOption {
    pub word: String,
    pub category: String,
}

impl WordOption {
    pub fn new(word: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            category: category.into(),
        }
    }
}
