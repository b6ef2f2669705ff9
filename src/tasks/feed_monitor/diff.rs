//! New-item detection against a stored watermark.
//!
//! Identifiers are compared as plain strings. Feeds publishing sequential
//! guids sort correctly this way; opaque random guids do not, which is why
//! the watermark is always taken from the maximum id rather than the first
//! item of the feed.

use crate::models::feed_item::FeedItem;

/// Items whose id compares strictly greater than `watermark`, in source
/// order. With no watermark every item is new.
pub fn new_items<'a>(items: &'a [FeedItem], watermark: Option<&str>) -> Vec<&'a FeedItem> {
    items
        .iter()
        .filter(|item| match watermark {
            Some(mark) => item.id.as_str() > mark,
            None => true,
        })
        .collect()
}

/// The watermark to store after `new_items` have all been notified.
///
/// `None` when nothing would move the watermark forward.
pub fn next_watermark(current: Option<&str>, new_items: &[&FeedItem]) -> Option<String> {
    let newest = new_items.iter().map(|item| item.id.as_str()).max()?;
    match current {
        Some(current) if newest <= current => None,
        _ => Some(newest.to_string()),
    }
}

/// Whether ids are strictly descending, as the feed is assumed to be.
pub fn is_newest_first(items: &[FeedItem]) -> bool {
    items.windows(2).all(|pair| pair[0].id > pair[1].id)
}
