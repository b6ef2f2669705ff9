pub mod config;
pub mod errors;
pub mod feeds;
pub mod models;
pub mod notifier;
pub mod observability;
pub mod state;
pub mod tasks;
#[cfg(test)]
pub mod test_helpers;

pub use errors::{WatchError, WatchResult};
