use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item of a polled feed.
///
/// `id` is the feed's own identifier (RSS `<guid>`, Atom `<id>`) and is
/// compared as an ordered string token by the watermark logic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    pub fn new(id: &str, title: &str, link: &str) -> Self {
        FeedItem {
            id: id.to_string(),
            title: title.to_string(),
            link: link.to_string(),
            published: None,
        }
    }

    pub fn published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    /// Builds an item from a parsed feed entry, dropping entries without
    /// the fields a notification needs.
    pub fn from_entry(entry: feed_rs::model::Entry) -> Option<Self> {
        if entry.id.trim().is_empty() {
            log::warn!("Skipping feed entry without identifier");
            return None;
        }

        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty());
        let title = match title {
            Some(title) => title,
            None => {
                log::warn!("Skipping feed entry {} without title", entry.id);
                return None;
            }
        };

        // entry.links may be an empty Vec
        let link = match entry.links.into_iter().next() {
            Some(link) => link.href,
            None => {
                log::warn!("Skipping feed entry {} without link", entry.id);
                return None;
            }
        };

        Some(FeedItem {
            id: entry.id,
            title,
            link,
            published: entry.published.or(entry.updated),
        })
    }
}
