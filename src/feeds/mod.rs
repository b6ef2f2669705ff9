//! Feed Source: fetches a feed and turns it into validated [`FeedItem`]s.

mod client;

pub use client::HttpFeedSource;

use async_trait::async_trait;

use crate::{
    errors::{WatchError, WatchResult},
    models::feed_item::FeedItem,
};

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Items of the feed at `url`, in the order the feed lists them.
    async fn fetch(&self, url: &str) -> WatchResult<Vec<FeedItem>>;
}

/// Parses an RSS, Atom or JSON feed body. Entries lacking an id, title or
/// link are dropped.
pub fn parse_feed(url: &str, body: &[u8]) -> WatchResult<Vec<FeedItem>> {
    let parsed = feed_rs::parser::parse(body).map_err(|e| {
        log::warn!("Error parsing feed {url}: {e:?}");
        WatchError::feed_fetch(url, e)
    })?;

    let total = parsed.entries.len();
    let items: Vec<FeedItem> = parsed
        .entries
        .into_iter()
        .filter_map(FeedItem::from_entry)
        .collect();

    if items.len() < total {
        log::warn!("Dropped {} of {total} entries from {url}", total - items.len());
    }
    Ok(items)
}
