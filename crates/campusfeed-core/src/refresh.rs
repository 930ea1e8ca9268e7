// Periodic refresh of the notification feed
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    center::NotificationCenter,
    models::NotificationKind,
    sources::{self, NotificationSource},
};

/// How often the feed is rebuilt
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(150);

/// What a single refresh cycle ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// All three collections came back and the feed was replaced
    Success { count: usize },
    /// Some collections failed; the feed was rebuilt from the rest
    PartialFailure {
        count: usize,
        failed: Vec<NotificationKind>,
    },
    /// Nothing came back; the previous feed is kept
    Failed,
    /// Finished after a newer cycle started or after the refresher was stopped
    Discarded,
}

impl RefreshOutcome {
    pub fn applied(&self) -> bool {
        matches!(
            self,
            RefreshOutcome::Success { .. } | RefreshOutcome::PartialFailure { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Fetching,
}

/// Runs fetch -> normalize -> assemble, once or on a timer
///
/// Cycles may overlap. Each one takes a generation number when it starts and
/// only writes its result if no later cycle has started since, so a slow
/// cycle can never overwrite a newer feed. Both that check and the stop check
/// are repeated while holding the center lock, right before the feed is
/// swapped.
///
/// The center sits behind a plain `std::sync::Mutex`. Guards must never be
/// held across an `.await` or while writing to a terminal; take what you need
/// and let go.
#[derive(Clone)]
pub struct FeedRefresher {
    source: Arc<dyn NotificationSource>,
    center: Arc<Mutex<NotificationCenter>>,
    generation: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    cancel: CancellationToken,
    interval: Duration,
    revision: Arc<watch::Sender<u64>>,
}

impl FeedRefresher {
    pub fn new(source: Arc<dyn NotificationSource>, center: Arc<Mutex<NotificationCenter>>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            source,
            center,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            cancel: CancellationToken::new(),
            interval: DEFAULT_REFRESH_INTERVAL,
            revision: Arc::new(revision),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn center(&self) -> Arc<Mutex<NotificationCenter>> {
        Arc::clone(&self.center)
    }

    pub fn phase(&self) -> RefreshPhase {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            RefreshPhase::Fetching
        } else {
            RefreshPhase::Idle
        }
    }

    /// Ticks once for every cycle that actually changed the feed
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run one full cycle now
    pub async fn run_cycle(&self) -> RefreshOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Refresh cycle {} starting", generation);

        let collected = {
            let _fetching = InFlight::enter(&self.in_flight);
            sources::collect(self.source.as_ref()).await
        };

        if let Some(reason) = self.stale(generation) {
            debug!("Refresh cycle {} {}, discarding", generation, reason);
            return RefreshOutcome::Discarded;
        }

        if collected.all_failed() {
            warn!("Refresh cycle {}: every source failed, keeping previous feed", generation);
            return RefreshOutcome::Failed;
        }

        let failed = collected.failed;
        let count = {
            let mut center = lock(&self.center);
            // Stop or a newer cycle may have landed while we waited for the lock
            if let Some(reason) = self.stale(generation) {
                debug!("Refresh cycle {} {} before apply, discarding", generation, reason);
                return RefreshOutcome::Discarded;
            }
            center.apply_refresh(collected.notifications);
            center.feed().len()
        };
        self.revision.send_modify(|r| *r += 1);

        if failed.is_empty() {
            info!("Refresh cycle {}: {} notifications", generation, count);
            RefreshOutcome::Success { count }
        } else {
            info!(
                "Refresh cycle {}: {} notifications ({} unavailable)",
                generation,
                count,
                failed
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            RefreshOutcome::PartialFailure { count, failed }
        }
    }

    fn stale(&self, generation: u64) -> Option<&'static str> {
        if self.cancel.is_cancelled() {
            Some("finished after stop")
        } else if self.generation.load(Ordering::SeqCst) != generation {
            Some("superseded")
        } else {
            None
        }
    }

    /// Refresh now, then every `interval` until stopped
    ///
    /// Each tick spawns its own cycle, so a slow backend never delays the timer.
    pub fn start(&self) -> RefreshHandle {
        let refresher = self.clone();
        let cancel = self.cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresher.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    // First tick completes immediately: that's the initial load
                    _ = ticker.tick() => {
                        let cycle = refresher.clone();
                        tokio::spawn(async move {
                            cycle.run_cycle().await;
                        });
                    }
                }
            }
            debug!("Refresh loop stopped");
        });

        RefreshHandle {
            cancel: self.cancel.clone(),
            task: Some(task),
        }
    }

    /// Stop the timer and make any in-flight cycle drop its result
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Keeps the refresh loop alive; stopping or dropping it tears the loop down
pub struct RefreshHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop and wait for the timer loop to exit
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Counts a cycle as fetching for as long as it's alive
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn lock(center: &Mutex<NotificationCenter>) -> MutexGuard<'_, NotificationCenter> {
    // The feed is swapped in a single assignment, so a poisoned lock still holds a whole feed.
    // Only ever held for in-memory work, never across an await.
    center.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
