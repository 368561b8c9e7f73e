// Durable records of a session and the store contract they live behind

// Public API - what other modules can use
pub use models::{
    Card, GamePhase, GameRecord, PlayerRecord, RoundStatRecord, VoteRecord, Winner,
};
pub use repository::{InMemorySessionStore, SessionStore};

// Internal modules
pub mod models;
pub mod repository;
