use async_trait::async_trait;
use tokio::sync::Mutex;

use super::StateStore;
use crate::{errors::WatchResult, models::watermark::WatermarkState};

/// Watermarks held in process memory.
///
/// Used for dry runs, where the durable record must stay untouched.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<WatermarkState>,
}

impl MemoryStore {
    pub fn new(state: WatermarkState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub async fn snapshot(&self) -> WatermarkState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> WatchResult<WatermarkState> {
        Ok(self.state.lock().await.clone())
    }

    async fn advance(&self, feed_key: &str, id: &str) -> WatchResult<WatermarkState> {
        let mut state = self.state.lock().await;
        state.advance(feed_key, id);
        Ok(state.clone())
    }
}
