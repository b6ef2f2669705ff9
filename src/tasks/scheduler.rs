use std::{future::Future, sync::Arc, time::Duration};
use tokio::time::MissedTickBehavior;
use tracing::Instrument;
use uuid::Uuid;

use super::feed_monitor::{FeedWatcher, RunReport};
use crate::{
    errors::WatchResult, feeds::FeedSource, notifier::Notifier, observability::CycleSummary,
    state::StateStore,
};

/// Runs every registered watcher once at startup and then on a fixed
/// interval.
///
/// Watchers within a cycle run one after another. A cycle that outlasts
/// the interval delays the next one instead of overlapping it.
pub struct Scheduler {
    watchers: Vec<FeedWatcher>,
    source: Arc<dyn FeedSource>,
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn FeedSource>,
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        Self {
            watchers: Vec::new(),
            source,
            store,
            notifier,
            interval,
        }
    }

    pub fn with_watcher(mut self, watcher: FeedWatcher) -> Self {
        self.watchers.push(watcher);
        self
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// One check cycle over all watchers.
    ///
    /// A failing watcher is logged here and does not stop the others.
    pub async fn run_once(&self) -> Vec<WatchResult<RunReport>> {
        let span = tracing::info_span!("check_cycle", run_id = %Uuid::new_v4());

        async {
            tracing::info!("Checking feeds…");
            let mut results = Vec::with_capacity(self.watchers.len());

            for watcher in &self.watchers {
                let result = watcher
                    .run(
                        self.source.as_ref(),
                        self.store.as_ref(),
                        self.notifier.as_ref(),
                    )
                    .await;

                match &result {
                    Ok(report) => {
                        tracing::debug!(feed_key = %report.feed_key, "Watcher finished");
                    }
                    Err(e) if e.is_pre_delivery() => {
                        tracing::warn!(feed_key = %watcher.feed_key, error = %e, "Watcher skipped, will retry next cycle");
                    }
                    Err(e) => {
                        tracing::error!(feed_key = %watcher.feed_key, error = %e, "Watcher failed, items will be sent again next cycle");
                    }
                }
                results.push(result);
            }

            CycleSummary::from_results(&results).log();
            results
        }
        .instrument(span)
        .await
    }

    /// Runs cycles until `shutdown` resolves. The first cycle starts
    /// immediately.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.run_once().await;
                }
                _ = &mut shutdown => {
                    tracing::info!("Scheduler stopped");
                    break;
                }
            }
        }
    }

    /// Runs cycles until Ctrl-C.
    pub async fn run(&self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Unable to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        notifier::MessageTemplate,
        state::MemoryStore,
        test_helpers::{chapters, RecordingNotifier, StaticFeedSource},
    };
    use std::sync::atomic::Ordering;

    fn watchers() -> [FeedWatcher; 2] {
        [
            FeedWatcher::new(
                "free",
                "https://example.com/free",
                MessageTemplate::new("🆓", "New Free Chapter"),
            ),
            FeedWatcher::new(
                "paid",
                "https://example.com/paid",
                MessageTemplate::new("💰", "New Paid Chapter"),
            ),
        ]
    }

    #[tokio::test]
    async fn test_failed_watcher_does_not_block_the_other() {
        let store = Arc::new(MemoryStore::new(
            [("free", "c1"), ("paid", "c1")].into_iter().collect(),
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        let [free, paid] = watchers();

        let scheduler = Scheduler::new(
            Arc::new(StaticFeedSource::failing()),
            store.clone(),
            notifier.clone(),
            Duration::from_secs(60),
        )
        .with_watcher(free);
        let results = scheduler.run_once().await;
        assert!(results[0].is_err());

        let scheduler = Scheduler::new(
            Arc::new(StaticFeedSource::new(chapters(&["c2", "c1"]))),
            store.clone(),
            notifier.clone(),
            Duration::from_secs(60),
        )
        .with_watcher(paid);
        let results = scheduler.run_once().await;
        assert_eq!(results[0].as_ref().unwrap().notified, 1);

        let state = store.snapshot().await;
        assert_eq!(state.get("free"), Some("c1"));
        assert_eq!(state.get("paid"), Some("c2"));
    }

    #[tokio::test]
    async fn test_run_once_covers_every_watcher() {
        let store = Arc::new(MemoryStore::new(
            [("free", "c1"), ("paid", "c1")].into_iter().collect(),
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        let [free, paid] = watchers();
        let scheduler = Scheduler::new(
            Arc::new(StaticFeedSource::new(chapters(&["c3", "c2", "c1"]))),
            store.clone(),
            notifier.clone(),
            Duration::from_secs(60),
        )
        .with_watcher(free)
        .with_watcher(paid);

        let results = scheduler.run_once().await;

        assert_eq!(results.len(), 2);
        assert_eq!(notifier.messages().len(), 4);
        assert!(notifier.messages()[0].starts_with("🆓"));
        assert!(notifier.messages()[2].starts_with("💰"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_at_start_and_every_interval() {
        let source = Arc::new(StaticFeedSource::new(chapters(&["c1"])));
        let interval = Duration::from_secs(900);
        let [free, paid] = watchers();
        let scheduler = Scheduler::new(
            source.clone(),
            Arc::new(MemoryStore::default()),
            Arc::new(RecordingNotifier::default()),
            interval,
        )
        .with_watcher(free)
        .with_watcher(paid);

        scheduler
            .run_until(tokio::time::sleep(interval * 2 + Duration::from_secs(1)))
            .await;

        assert_eq!(source.fetches.load(Ordering::SeqCst), 6);
    }
}
