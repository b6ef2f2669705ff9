use std::path::Path;
use thiserror::Error;

/// Errors raised while watching a feed.
///
/// Every variant aborts the current watcher run; the scheduler logs it and
/// the next tick starts again from the stored watermark.
#[derive(Debug, Error)]
pub enum WatchError {
    // Feed Source
    #[error("Unable to fetch feed {url}: {message}")]
    FeedFetch { url: String, message: String },

    // State Store
    #[error("State record {path} is unavailable: {message}")]
    StateUnavailable { path: String, message: String },
    #[error("Unable to persist state record {path}: {message}")]
    StatePersist { path: String, message: String },

    // Chat Channel
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    // System
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for watcher errors
pub type WatchResult<T> = Result<T, WatchError>;

/// Helper functions for common error conversions
impl WatchError {
    pub fn feed_fetch(url: &str, message: impl ToString) -> Self {
        WatchError::FeedFetch {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn state_unavailable(path: &Path, message: impl ToString) -> Self {
        WatchError::StateUnavailable {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    pub fn state_persist(path: &Path, message: impl ToString) -> Self {
        WatchError::StatePersist {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    pub fn delivery(message: impl ToString) -> Self {
        WatchError::Delivery(message.to_string())
    }

    pub fn configuration(message: impl ToString) -> Self {
        WatchError::Configuration(message.to_string())
    }

    /// Whether the failure happened before anything was sent for this run.
    pub fn is_pre_delivery(&self) -> bool {
        matches!(
            self,
            WatchError::FeedFetch { .. } | WatchError::StateUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_messages_name_the_resource() {
        let err = WatchError::feed_fetch("https://example.com/free.xml", "404 Not Found");
        assert_eq!(
            err.to_string(),
            "Unable to fetch feed https://example.com/free.xml: 404 Not Found"
        );

        let err = WatchError::state_unavailable(&PathBuf::from("state.json"), "expected value");
        assert_eq!(
            err.to_string(),
            "State record state.json is unavailable: expected value"
        );
    }

    #[test]
    fn test_pre_delivery_kinds() {
        assert!(WatchError::feed_fetch("u", "x").is_pre_delivery());
        assert!(WatchError::state_unavailable(Path::new("s"), "x").is_pre_delivery());
        assert!(!WatchError::delivery("x").is_pre_delivery());
        assert!(!WatchError::state_persist(Path::new("s"), "x").is_pre_delivery());
    }
}
