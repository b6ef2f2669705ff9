use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use crate::{
    errors::{WatchError, WatchResult},
    feeds::FeedSource,
    models::{feed_item::FeedItem, watermark::WatermarkState},
    notifier::{Message, Notifier},
    state::{MemoryStore, StateStore},
};

/// Items titled `Chapter <id>` linking to `https://example.com/<id>`.
pub fn chapters(ids: &[&str]) -> Vec<FeedItem> {
    ids.iter()
        .map(|id| {
            FeedItem::new(
                id,
                &format!("Chapter {id}"),
                &format!("https://example.com/{id}"),
            )
        })
        .collect()
}

/// Feed source that always answers with the same items, or always fails.
pub struct StaticFeedSource {
    items: Option<Vec<FeedItem>>,
    pub fetches: AtomicUsize,
}

impl StaticFeedSource {
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self {
            items: Some(items),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            items: None,
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    async fn fetch(&self, url: &str) -> WatchResult<Vec<FeedItem>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.items
            .clone()
            .ok_or_else(|| WatchError::feed_fetch(url, "connection refused"))
    }
}

/// Notifier that records delivered messages and can fail the n-th attempt.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Message>>,
    attempts: AtomicUsize,
    fail_on: Option<usize>,
}

impl RecordingNotifier {
    /// Fails the `attempt`-th send (1-based) and every one after it.
    pub fn failing_on(attempt: usize) -> Self {
        Self {
            fail_on: Some(attempt),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Message> {
        self.sent.lock().unwrap().clone()
    }

    /// Delivered text as Discord would show it.
    pub fn messages(&self) -> Vec<String> {
        self.sent().iter().map(Message::content).collect()
    }

    /// The bold part of every delivered message.
    pub fn titles(&self) -> Vec<String> {
        self.messages()
            .iter()
            .filter_map(|m| m.split("**").nth(1).map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, message: &Message) -> WatchResult<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if matches!(self.fail_on, Some(n) if attempt >= n) {
            return Err(WatchError::delivery("channel unavailable"));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// In-memory store that counts changing writes and can be told to fail.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    fail_loads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FaultyStore {
    pub fn new(state: WatermarkState) -> Self {
        Self {
            inner: MemoryStore::new(state),
            ..Default::default()
        }
    }

    /// Number of saves that actually changed the record.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> WatermarkState {
        self.inner.snapshot().await
    }
}

#[async_trait]
impl StateStore for FaultyStore {
    async fn load(&self) -> WatchResult<WatermarkState> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(WatchError::StateUnavailable {
                path: "memory".to_string(),
                message: "load disabled".to_string(),
            });
        }
        self.inner.load().await
    }

    async fn advance(&self, feed_key: &str, id: &str) -> WatchResult<WatermarkState> {
        let before = self.inner.snapshot().await;
        if !before.clone().advance(feed_key, id) {
            return Ok(before);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(WatchError::StatePersist {
                path: "memory".to_string(),
                message: "write disabled".to_string(),
            });
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.advance(feed_key, id).await
    }
}
