use async_trait::async_trait;

use super::{Message, Notifier};
use crate::errors::WatchResult;

/// Dry-run backend: logs each message instead of delivering it.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &Message) -> WatchResult<()> {
        tracing::info!(
            channel = message.channel.as_deref().unwrap_or("default"),
            message = %message.content(),
            "Dry run, not sending"
        );
        Ok(())
    }
}
