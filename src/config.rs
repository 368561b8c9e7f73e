use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Inconsistent(String),
}

/// Tunables for sessions and rounds
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Players required before the admin can start a round
    pub min_players: usize,
    /// Hard cap on session membership
    pub max_players: usize,
    /// Length of the voting window, in countdown ticks
    pub voting_seconds: u32,
    /// Length of the tie-breaker window, in countdown ticks
    pub tie_breaker_seconds: u32,
    /// Wall-clock length of one countdown tick
    pub countdown_tick: Duration,
    /// Fallback poll period of game watchers
    pub poll_interval: Duration,
    /// Pause before re-reading state after a lobby reset
    pub reset_settle_delay: Duration,
    /// Categories offered to the starting player each round
    pub category_count: usize,
    /// Words offered per category
    pub words_per_category: usize,
    /// How many join codes to try before giving up on a collision streak
    pub code_attempts: usize,
    /// Fixed seed for role and word draws (tests, replays)
    pub rng_seed: Option<u64>,
    /// JSON word list replacing the built-in catalog
    pub word_catalog_path: Option<PathBuf>,
    pub bind_addr: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 10,
            voting_seconds: 10,
            tie_breaker_seconds: 10,
            countdown_tick: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            reset_settle_delay: Duration::from_millis(500),
            category_count: 2,
            words_per_category: 5,
            code_attempts: 5,
            rng_seed: None,
            word_catalog_path: None,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl GameConfig {
    /// Builds a config from `LIARCARD_*` environment variables over the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "LIARCARD_MIN_PLAYERS")? {
            config.min_players = v;
        }
        if let Some(v) = parse_var(&lookup, "LIARCARD_MAX_PLAYERS")? {
            config.max_players = v;
        }
        if let Some(v) = parse_var(&lookup, "LIARCARD_VOTING_SECONDS")? {
            config.voting_seconds = v;
        }
        if let Some(v) = parse_var(&lookup, "LIARCARD_TIE_BREAKER_SECONDS")? {
            config.tie_breaker_seconds = v;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "LIARCARD_TICK_MS")? {
            config.countdown_tick = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "LIARCARD_POLL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "LIARCARD_RESET_SETTLE_MS")? {
            config.reset_settle_delay = Duration::from_millis(ms);
        }
        if let Some(seed) = parse_var(&lookup, "LIARCARD_RNG_SEED")? {
            config.rng_seed = Some(seed);
        }
        if let Some(path) = lookup("LIARCARD_WORDS") {
            config.word_catalog_path = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup("LIARCARD_BIND") {
            config.bind_addr = addr;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < 3 {
            return Err(ConfigError::Inconsistent(
                "at least 3 players are needed for a liar and a vote".to_string(),
            ));
        }
        if self.max_players < self.min_players {
            return Err(ConfigError::Inconsistent(format!(
                "max_players ({}) is below min_players ({})",
                self.max_players, self.min_players
            )));
        }
        if self.voting_seconds == 0 || self.tie_breaker_seconds == 0 {
            return Err(ConfigError::Inconsistent(
                "countdowns must last at least one tick".to_string(),
            ));
        }
        if self.countdown_tick.is_zero() || self.poll_interval.is_zero() {
            return Err(ConfigError::Inconsistent(
                "tick and poll intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}
