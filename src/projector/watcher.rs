use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::models::GameSnapshot;
use super::service::ViewProjector;
use crate::event::StoreChange;
use crate::shared::AppError;
use crate::store::SessionStore;

/// Why the watcher should re-read the game
enum Refresh {
    Changed,
    GameDeleted,
}

/// Background task that turns change notifications and a fixed-interval
/// poll into one stream of distinct snapshots.
///
/// Publishes `None` once the game is gone, then stops. Dropping the watcher
/// stops the task.
pub struct GameWatcher {
    game_id: String,
    receiver: watch::Receiver<Option<GameSnapshot>>,
    handle: JoinHandle<()>,
}

impl GameWatcher {
    pub(crate) async fn spawn(
        projector: ViewProjector,
        store: Arc<dyn SessionStore>,
        game_id: &str,
        poll_interval: Duration,
    ) -> Result<Self, AppError> {
        let changes = store.subscribe(game_id).await;
        let initial = projector.snapshot(game_id).await?;
        let (sender, receiver) = watch::channel(Some(initial));

        let handle = tokio::spawn(run(
            projector,
            store,
            game_id.to_string(),
            poll_interval,
            changes,
            sender,
        ));

        Ok(Self {
            game_id: game_id.to_string(),
            receiver,
            handle,
        })
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Latest published snapshot; `None` once the game is gone
    pub fn current(&self) -> Option<GameSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next distinct snapshot. Returns `None` when the game is
    /// gone or the watcher stopped.
    pub async fn changed(&mut self) -> Option<GameSnapshot> {
        match self.receiver.changed().await {
            Ok(()) => self.receiver.borrow_and_update().clone(),
            Err(_) => None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<GameSnapshot>> {
        self.receiver.clone()
    }
}

impl Drop for GameWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    projector: ViewProjector,
    store: Arc<dyn SessionStore>,
    game_id: String,
    poll_interval: Duration,
    mut changes: broadcast::Receiver<StoreChange>,
    sender: watch::Sender<Option<GameSnapshot>>,
) {
    let mut poll = interval(poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    poll.tick().await;

    loop {
        let wake = tokio::select! {
            received = changes.recv() => Some(received),
            _ = poll.tick() => None,
        };

        let refresh = match wake {
            Some(Ok(change)) => coalesce(change, &mut changes),
            Some(Err(RecvError::Lagged(skipped))) => {
                debug!(game_id = %game_id, skipped, "Change feed lagged");
                Refresh::Changed
            }
            Some(Err(RecvError::Closed)) => match resubscribe(store.as_ref(), &game_id).await {
                Ok(Some(receiver)) => {
                    changes = receiver;
                    Refresh::Changed
                }
                Ok(None) => Refresh::GameDeleted,
                Err(e) => {
                    warn!(game_id = %game_id, error = %e, "Could not reopen change feed");
                    poll.tick().await;
                    continue;
                }
            },
            None => Refresh::Changed,
        };

        if let Refresh::GameDeleted = refresh {
            info!(game_id = %game_id, "Watched game deleted");
            sender.send_replace(None);
            return;
        }

        match projector.snapshot(&game_id).await {
            Ok(snapshot) => {
                sender.send_if_modified(|current| {
                    if current.as_ref() == Some(&snapshot) {
                        false
                    } else {
                        *current = Some(snapshot);
                        true
                    }
                });
            }
            Err(AppError::NotFound(_)) => {
                info!(game_id = %game_id, "Watched game no longer exists");
                sender.send_replace(None);
                return;
            }
            Err(e) => {
                // Retried on the next notification or poll
                warn!(game_id = %game_id, error = %e, "Snapshot refresh failed");
            }
        }

        if sender.is_closed() {
            debug!(game_id = %game_id, "No watchers left");
            return;
        }
    }
}

/// Reopens the change feed after its channel closed. Subscribing recreates
/// the channel, so a deleted game yields `None` instead.
async fn resubscribe(
    store: &dyn SessionStore,
    game_id: &str,
) -> Result<Option<broadcast::Receiver<StoreChange>>, AppError> {
    if store.get_game(game_id).await?.is_none() {
        return Ok(None);
    }
    Ok(Some(store.subscribe(game_id).await))
}

/// Drains notifications already queued so a burst of writes costs one read
fn coalesce(first: StoreChange, changes: &mut broadcast::Receiver<StoreChange>) -> Refresh {
    if first.is_game_deleted() {
        return Refresh::GameDeleted;
    }
    loop {
        match changes.try_recv() {
            Ok(change) if change.is_game_deleted() => return Refresh::GameDeleted,
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Refresh::Changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::store::{GameRecord, InMemorySessionStore, PlayerRecord};
    use tokio::time::timeout;

    async fn setup(poll: Duration) -> (Arc<InMemorySessionStore>, GameRecord, GameWatcher) {
        let (store, game, watcher, _bus) = setup_with_bus(poll).await;
        (store, game, watcher)
    }

    async fn setup_with_bus(
        poll: Duration,
    ) -> (Arc<InMemorySessionStore>, GameRecord, GameWatcher, EventBus) {
        let bus = EventBus::new();
        let store = Arc::new(InMemorySessionStore::new(bus.clone()));
        let game = store
            .insert_game(&GameRecord::new("ABCD1234".to_string()))
            .await
            .unwrap();
        store
            .insert_player(&PlayerRecord::new(&game.id, "ann", true, 0))
            .await
            .unwrap();
        let projector = ViewProjector::new(store.clone());
        let watcher = projector.watch(&game.id, poll).await.unwrap();
        (store, game, watcher, bus)
    }

    #[tokio::test]
    async fn test_publishes_changes_from_feed() {
        let (store, game, mut watcher) = setup(Duration::from_secs(60)).await;
        assert_eq!(watcher.current().unwrap().players.len(), 1);

        store
            .insert_player(&PlayerRecord::new(&game.id, "bob", false, 1))
            .await
            .unwrap();

        let snapshot = timeout(Duration::from_secs(1), watcher.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.players.len(), 2);
    }

    #[tokio::test]
    async fn test_poll_does_not_republish_identical_snapshot() {
        let (_store, _game, mut watcher) = setup(Duration::from_millis(5)).await;

        let result = timeout(Duration::from_millis(60), watcher.changed()).await;
        assert!(result.is_err(), "unchanged game must not be republished");
    }

    #[tokio::test]
    async fn test_publishes_none_when_game_deleted() {
        let (store, game, mut watcher) = setup(Duration::from_secs(60)).await;

        store.delete_game(&game.id).await.unwrap();

        let next = timeout(Duration::from_secs(1), watcher.changed())
            .await
            .unwrap();
        assert!(next.is_none());
        assert!(watcher.current().is_none());
    }

    #[tokio::test]
    async fn test_resubscribe_skips_deleted_game() {
        let bus = EventBus::new();
        let store = InMemorySessionStore::new(bus.clone());
        let game = store
            .insert_game(&GameRecord::new("ABCD1234".to_string()))
            .await
            .unwrap();

        assert!(resubscribe(&store, &game.id).await.unwrap().is_some());
        assert_eq!(bus.channel_count().await, 1);

        store.delete_game(&game.id).await.unwrap();
        assert_eq!(bus.channel_count().await, 0);

        assert!(resubscribe(&store, &game.id).await.unwrap().is_none());
        assert_eq!(bus.channel_count().await, 0);
    }

    #[tokio::test]
    async fn test_follows_game_after_feed_closed() {
        let (store, game, mut watcher, bus) = setup_with_bus(Duration::from_secs(60)).await;

        bus.close(&game.id).await;
        timeout(Duration::from_secs(1), async {
            while bus.channel_count().await == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        store
            .insert_player(&PlayerRecord::new(&game.id, "bob", false, 1))
            .await
            .unwrap();
        let snapshot = timeout(Duration::from_secs(1), watcher.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.players.len(), 2);
    }
}
