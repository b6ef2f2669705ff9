use std::{str::FromStr, time::Duration};

/// Default polling interval, matching a `*/15 * * * *` cron schedule.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Default timeout for a single feed request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// What a watcher does when its feed key has no stored watermark yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FirstRunPolicy {
    /// Store the newest id without announcing the existing backlog.
    #[default]
    Seed,
    /// Announce every item currently in the feed.
    NotifyAll,
}

impl FromStr for FirstRunPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seed" => Ok(FirstRunPolicy::Seed),
            "notify_all" | "notify-all" | "all" => Ok(FirstRunPolicy::NotifyAll),
            other => Err(format!("unknown first run policy '{other}'")),
        }
    }
}
