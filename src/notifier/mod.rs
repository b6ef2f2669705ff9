mod discord;
mod log_only;
mod telegram;
pub mod types;

pub use discord::DiscordClient;
pub use log_only::LogNotifier;
pub use telegram::TelegramClient;

use async_trait::async_trait;

use crate::{
    errors::{WatchError, WatchResult},
    models::feed_item::FeedItem,
};

/// Discord rejects message content longer than this many characters.
pub const MESSAGE_LIMIT: usize = 2000;

/// A chat backend that delivers rendered announcements.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Delivers one message. Resolves once the platform accepted it.
    async fn send(&self, message: &Message) -> WatchResult<()>;
}

/// Where a feed's announcements go, beyond the backend default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedRoute {
    /// Channel (Discord) or chat (Telegram) used instead of the default.
    pub channel: Option<String>,
    /// Discord role pinged by every announcement of the feed.
    pub mention_role: Option<String>,
}

/// One announcement, ready to hand to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Announcement text without any mention.
    pub body: String,
    pub channel: Option<String>,
    pub mention_role: Option<String>,
}

impl Message {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            channel: None,
            mention_role: None,
        }
    }

    /// The text as Discord renders it, with the role ping on its own line.
    pub fn content(&self) -> String {
        match &self.mention_role {
            Some(role) => format!("{}{}", mention_prefix(role), self.body),
            None => self.body.clone(),
        }
    }
}

fn mention_prefix(role: &str) -> String {
    format!("<@&{role}>\n")
}

/// Per-feed message wording, e.g. `🆓` / `New Free Chapter`, and routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub emoji: String,
    pub label: String,
    pub route: FeedRoute,
}

impl MessageTemplate {
    pub fn new(emoji: &str, label: &str) -> Self {
        Self {
            emoji: emoji.to_string(),
            label: label.to_string(),
            route: FeedRoute::default(),
        }
    }

    pub fn routed(mut self, route: FeedRoute) -> Self {
        self.route = route;
        self
    }

    /// Renders one item. The full [`Message::content`] never exceeds
    /// [`MESSAGE_LIMIT`] characters: the title is shortened first, and a
    /// link too long for any title is cut along with the rest.
    pub fn format(&self, item: &FeedItem) -> Message {
        let head = format!("{} {}: ", self.emoji, self.label);
        let tail = format!("\n{}", item.link);
        let limit = MESSAGE_LIMIT.saturating_sub(
            self.route
                .mention_role
                .as_deref()
                .map_or(0, |role| mention_prefix(role).chars().count()),
        );
        let frame = head.chars().count() + "****".len() + tail.chars().count();

        let body = if frame <= limit {
            let title = truncate_chars(&item.title, limit - frame);
            format!("{head}**{title}**{tail}")
        } else {
            log::warn!(
                "Link of {} is {} characters and does not fit in one message, cutting it",
                item.id,
                item.link.chars().count()
            );
            truncate_chars(&format!("{head}**{}**{tail}", item.title), limit)
        };

        Message {
            body,
            channel: self.route.channel.clone(),
            mention_role: self.route.mention_role.clone(),
        }
    }
}

/// Shortens `text` to at most `max` characters, ending in `...` when cut.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let cut = text
        .char_indices()
        .nth(max - 3)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    format!("{}...", &text[..cut])
}

/// Maps a transport or decode failure of a chat API call to a delivery error.
pub(crate) fn delivery_error(backend: &str, err: reqwest::Error) -> WatchError {
    log::error!("{backend} request failed: {err}");
    if err.is_timeout() || err.is_connect() {
        WatchError::delivery(format!("{backend} unreachable: {err}"))
    } else {
        WatchError::delivery(format!("{backend} request failed: {err}"))
    }
}

/// Sends one message per item, in order, one at a time.
///
/// Stops at the first failed delivery and returns its error; the caller
/// must not advance the watermark in that case.
pub async fn dispatch(
    notifier: &dyn Notifier,
    template: &MessageTemplate,
    items: &[&FeedItem],
) -> WatchResult<usize> {
    let mut sent = 0;
    for item in items {
        notifier.send(&template.format(item)).await.map_err(|e| {
            log::error!(
                "Delivery via {} failed at item {} ({} of {}): {e}",
                notifier.name(),
                item.id,
                sent + 1,
                items.len()
            );
            e
        })?;
        sent += 1;
        log::info!("Sent {} via {}", item.id, notifier.name());
    }
    Ok(sent)
}
