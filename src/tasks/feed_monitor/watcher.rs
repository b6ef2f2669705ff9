use std::time::Instant;

use super::diff::{is_newest_first, new_items, next_watermark};
use crate::{
    errors::WatchResult,
    feeds::FeedSource,
    models::feed_item::FeedItem,
    notifier::{dispatch, MessageTemplate, Notifier},
    state::StateStore,
    tasks::types::FirstRunPolicy,
};

/// Watches one feed and announces what is new since the last run.
#[derive(Debug, Clone)]
pub struct FeedWatcher {
    /// Key of this feed in the shared state record, e.g. `free`.
    pub feed_key: String,
    pub url: String,
    pub template: MessageTemplate,
    pub first_run: FirstRunPolicy,
}

/// Outcome of a successful watcher run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub feed_key: String,
    pub fetched: usize,
    pub notified: usize,
    /// Watermark stored by this run, if it moved.
    pub watermark: Option<String>,
    /// True when a first run stored a watermark without notifying.
    pub seeded: bool,
}

impl FeedWatcher {
    pub fn new(feed_key: &str, url: &str, template: MessageTemplate) -> Self {
        Self {
            feed_key: feed_key.to_string(),
            url: url.to_string(),
            template,
            first_run: FirstRunPolicy::default(),
        }
    }

    pub fn first_run(mut self, policy: FirstRunPolicy) -> Self {
        self.first_run = policy;
        self
    }

    /// fetch -> load -> diff -> notify -> advance.
    ///
    /// Any error returns before the watermark is touched, so the next run
    /// starts again from the same point. Items already delivered in a
    /// failed run will be delivered again.
    pub async fn run(
        &self,
        source: &dyn FeedSource,
        store: &dyn StateStore,
        notifier: &dyn Notifier,
    ) -> WatchResult<RunReport> {
        let started = Instant::now();

        let items = source.fetch(&self.url).await?;
        if !is_newest_first(&items) {
            log::warn!(
                "Feed {} is not sorted newest-first by id, watermark uses the maximum id",
                self.feed_key
            );
        }

        let state = store.load().await?;
        let current = state.get(&self.feed_key);

        let mut report = RunReport {
            feed_key: self.feed_key.clone(),
            fetched: items.len(),
            notified: 0,
            watermark: None,
            seeded: false,
        };

        let news: Vec<&FeedItem> = new_items(&items, current);
        let Some(watermark) = next_watermark(current, &news) else {
            log::debug!("No new items for {}", self.feed_key);
            return Ok(report);
        };

        if current.is_none() && self.first_run == FirstRunPolicy::Seed {
            log::info!(
                "First run for {}, seeding watermark {} without notifying {} items",
                self.feed_key,
                watermark,
                news.len()
            );
            report.seeded = true;
        } else {
            report.notified = dispatch(notifier, &self.template, &news).await?;
        }

        store.advance(&self.feed_key, &watermark).await?;
        report.watermark = Some(watermark);

        tracing::info!(
            feed_key = %self.feed_key,
            fetched = report.fetched,
            notified = report.notified,
            watermark = ?report.watermark,
            duration_ms = started.elapsed().as_millis() as u64,
            "Feed processing completed"
        );
        Ok(report)
    }
}
