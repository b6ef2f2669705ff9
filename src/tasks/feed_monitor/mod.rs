pub mod diff;
pub mod watcher;

pub use watcher::{FeedWatcher, RunReport};
