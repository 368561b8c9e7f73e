use std::sync::Arc;
use std::time::Duration;

use liarcard::{
    AppState, EventBus, GameConfig, InMemorySessionStore, SessionStore, StaticWordCatalog,
};

use super::mocks::FailingStore;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    /// Backing store, for inspection without injected failures
    pub records: Arc<InMemorySessionStore>,
    pub failures: Option<Arc<FailingStore>>,
    pub game_id: String,
    pub code: String,
    /// Player ids in join order; the admin is first
    pub players: Vec<String>,
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    config: GameConfig,
    failing_store: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            config: GameConfig {
                rng_seed: Some(42),
                reset_settle_delay: Duration::ZERO,
                countdown_tick: Duration::from_secs(60),
                poll_interval: Duration::from_millis(20),
                ..Default::default()
            },
            failing_store: false,
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_player_count(self, count: usize) -> Self {
        let names: Vec<String> = (0..count).map(|i| format!("player{}", i)).collect();
        self.with_players(names.iter().map(String::as_str).collect())
    }

    pub fn with_three_players(self) -> Self {
        self.with_players(vec!["alice", "bob", "charlie"])
    }

    pub fn with_five_players(self) -> Self {
        self.with_players(vec!["alice", "bob", "charlie", "david", "erin"])
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = Some(seed);
        self
    }

    /// Countdown ticks every few milliseconds instead of every second
    pub fn with_fast_countdown(mut self, voting_ticks: u32, tie_breaker_ticks: u32) -> Self {
        self.config.countdown_tick = Duration::from_millis(5);
        self.config.voting_seconds = voting_ticks;
        self.config.tie_breaker_seconds = tie_breaker_ticks;
        self
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_failing_store(mut self) -> Self {
        self.failing_store = true;
        self
    }

    /// Builds the services and, when players were given, a game whose
    /// admin is the first of them
    pub async fn build(self) -> TestSetup {
        let event_bus = EventBus::new();
        let records = Arc::new(InMemorySessionStore::new(event_bus.clone()));
        let failures = self
            .failing_store
            .then(|| Arc::new(FailingStore::new(records.clone())));
        let store: Arc<dyn SessionStore> = match &failures {
            Some(failing) => failing.clone() as Arc<dyn SessionStore>,
            None => records.clone() as Arc<dyn SessionStore>,
        };

        let state = AppState::new(
            self.config,
            store,
            event_bus,
            Arc::new(StaticWordCatalog::default()),
        );

        let mut setup = TestSetup {
            state,
            records,
            failures,
            game_id: String::new(),
            code: String::new(),
            players: vec![],
        };

        let Some((admin, others)) = self.players.split_first() else {
            return setup;
        };

        let created = setup.state.sessions.create_game(admin).await.unwrap();
        setup.game_id = created.game_id;
        setup.code = created.code;
        setup.players.push(created.player_id);

        for name in others {
            let joined = setup
                .state
                .sessions
                .join_game(&setup.code, name)
                .await
                .unwrap();
            setup.players.push(joined.player_id);
        }

        setup
    }
}

impl TestSetup {
    pub fn admin(&self) -> &str {
        &self.players[0]
    }

    pub fn failures(&self) -> &FailingStore {
        self.failures
            .as_deref()
            .expect("setup was built without a failing store")
    }
}
