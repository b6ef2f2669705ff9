use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{parse_feed, FeedSource};
use crate::{
    errors::{WatchError, WatchResult},
    models::feed_item::FeedItem,
};

/// Fetches feeds over HTTP(S) and parses them with feed-rs.
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> WatchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| WatchError::configuration(format!("Unable to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> WatchResult<Vec<FeedItem>> {
        let response = self
            .client
            .get(url)
            // See: https://stackoverflow.com/a/7001617/5155484
            .header(
                "Accept",
                "application/rss+xml, application/rdf+xml, application/atom+xml, application/feed+json, application/xml;q=0.9, text/xml;q=0.8"
            )
            .send()
            .await
            .map_err(|e| {
                log::warn!("Error getting feed {url}: {e:?}");
                WatchError::feed_fetch(url, e)
            })?;

        if !response.status().is_success() {
            log::warn!(
                "Got non-success response for feed {}: {}",
                url,
                response.status()
            );
            return Err(WatchError::feed_fetch(url, response.status()));
        }

        log::debug!("Got response for feed {url}");
        let body = response
            .bytes()
            .await
            .map_err(|e| WatchError::feed_fetch(url, e))?;
        parse_feed(url, &body)
    }
}
