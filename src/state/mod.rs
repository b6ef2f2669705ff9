//! Durable watermark storage shared by all feed watchers.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::{errors::WatchResult, models::watermark::WatermarkState};

/// Whole-record access to the watermark state.
///
/// Implementations serialize `advance` calls so two watchers sharing one
/// record can never overwrite each other's key.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Reads the full record. A record that was never written loads as
    /// empty; an unreadable one fails with `StateUnavailable`.
    async fn load(&self) -> WatchResult<WatermarkState>;

    /// Read-modify-write of a single key. The stored value only moves
    /// forward; nothing is written when `id` is not newer.
    async fn advance(&self, feed_key: &str, id: &str) -> WatchResult<WatermarkState>;
}
