use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::events::StoreChange;

/// Default buffer size of each per-game channel
const GAME_CHANNEL_CAPACITY: usize = 256;

/// Event bus distributing store change notifications per game
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Game-specific channels: game_id -> sender
    game_channels: Arc<RwLock<HashMap<String, broadcast::Sender<StoreChange>>>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(GAME_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            game_channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Emits a change to all subscribers of its game
    pub async fn emit(&self, change: StoreChange) {
        let game_channels = self.game_channels.read().await;

        match game_channels.get(&change.game_id) {
            Some(sender) => match sender.send(change.clone()) {
                Ok(receiver_count) => {
                    debug!(
                        game_id = %change.game_id,
                        table = %change.table,
                        kind = %change.kind,
                        receivers = receiver_count,
                        "Store change emitted"
                    );
                }
                Err(_) => {
                    debug!(game_id = %change.game_id, "Store change emitted with no receivers");
                }
            },
            None => {
                // Nobody ever subscribed; nothing to deliver
                debug!(game_id = %change.game_id, "No channel for game, dropping change");
            }
        }
    }

    /// Subscribe to changes of a specific game
    pub async fn subscribe(&self, game_id: &str) -> broadcast::Receiver<StoreChange> {
        {
            let game_channels = self.game_channels.read().await;
            if let Some(sender) = game_channels.get(game_id) {
                return sender.subscribe();
            }
        }

        debug!(game_id = %game_id, "Creating new game channel for subscription");
        let mut game_channels = self.game_channels.write().await;
        game_channels
            .entry(game_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Drops the channel of a game; subscribers drain what was sent and then see `Closed`
    pub async fn close(&self, game_id: &str) {
        let mut game_channels = self.game_channels.write().await;
        if game_channels.remove(game_id).is_some() {
            debug!(game_id = %game_id, "Game channel closed");
        }
    }

    pub async fn channel_count(&self) -> usize {
        self.game_channels.read().await.len()
    }
}
