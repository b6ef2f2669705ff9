pub mod feed_item;
pub mod watermark;
