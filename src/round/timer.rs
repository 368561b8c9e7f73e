use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::store::GamePhase;

/// Which countdown a timer task is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownWindow {
    Voting,
    TieBreaker,
}

impl CountdownWindow {
    pub fn phase(&self) -> GamePhase {
        match self {
            CountdownWindow::Voting => GamePhase::Voting,
            CountdownWindow::TieBreaker => GamePhase::TieBreaker,
        }
    }
}

struct TimerEntry {
    generation: u64,
    window: CountdownWindow,
    handle: JoinHandle<()>,
}

/// At most one live countdown task per game
#[derive(Default)]
pub struct TimerRegistry {
    timers: Mutex<HashMap<String, TimerEntry>>,
    next_generation: AtomicU64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, TimerEntry>> {
        // Entries stay consistent even if a holder panicked
        self.timers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Spawns `task` as the game's countdown, aborting any previous one.
    /// The task receives its generation for `disarm`.
    pub fn start<F, Fut>(&self, game_id: &str, window: CountdownWindow, task: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut timers = self.entries();
        if let Some(previous) = timers.remove(game_id) {
            debug!(game_id, generation = previous.generation, "Replacing countdown");
            previous.handle.abort();
        }
        let handle = tokio::spawn(task(generation));
        timers.insert(
            game_id.to_string(),
            TimerEntry {
                generation,
                window,
                handle,
            },
        );
        debug!(game_id, generation, ?window, "Countdown started");
        generation
    }

    /// Aborts the game's countdown, if any
    pub fn cancel(&self, game_id: &str) -> bool {
        match self.entries().remove(game_id) {
            Some(entry) => {
                entry.handle.abort();
                debug!(game_id, generation = entry.generation, "Countdown cancelled");
                true
            }
            None => false,
        }
    }

    /// Unregisters a countdown without aborting it. Called by the task itself
    /// when it expires so that the resolution it runs cannot cancel it.
    pub fn disarm(&self, game_id: &str, generation: u64) -> bool {
        let mut timers = self.entries();
        match timers.get(game_id) {
            Some(entry) if entry.generation == generation => {
                timers.remove(game_id);
                true
            }
            _ => false,
        }
    }

    pub fn active_window(&self, game_id: &str) -> Option<CountdownWindow> {
        self.entries()
            .get(game_id)
            .filter(|entry| !entry.handle.is_finished())
            .map(|entry| entry.window)
    }

    pub fn active_count(&self) -> usize {
        self.entries()
            .values()
            .filter(|entry| !entry.handle.is_finished())
            .count()
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        for (_, entry) in self.entries().drain() {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_start_replaces_previous_timer() {
        let registry = TimerRegistry::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        let first_ticks = ticks.clone();
        registry.start("g1", CountdownWindow::Voting, move |_| async move {
            loop {
                tokio::time::sleep(Duration::from_millis(5)).await;
                first_ticks.fetch_add(1, Ordering::SeqCst);
            }
        });
        registry.start("g1", CountdownWindow::TieBreaker, |_| async {
            std::future::pending::<()>().await;
        });

        let before = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), before);
        assert_eq!(registry.active_window("g1"), Some(CountdownWindow::TieBreaker));
        assert_eq!(registry.active_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_stops_timer() {
        let registry = TimerRegistry::new();
        registry.start("g1", CountdownWindow::Voting, |_| async {
            std::future::pending::<()>().await;
        });

        assert!(registry.cancel("g1"));
        assert!(!registry.cancel("g1"));
        assert_eq!(registry.active_window("g1"), None);
    }

    #[tokio::test]
    async fn test_disarm_requires_matching_generation() {
        let registry = TimerRegistry::new();
        let old = registry.start("g1", CountdownWindow::Voting, |_| async {
            std::future::pending::<()>().await;
        });
        let current = registry.start("g1", CountdownWindow::Voting, |_| async {
            std::future::pending::<()>().await;
        });

        assert!(!registry.disarm("g1", old));
        assert!(registry.disarm("g1", current));
        assert_eq!(registry.active_count(), 0);
    }
}
