use std::str::FromStr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{errors::WatchResult, tasks::feed_monitor::RunReport};

/// How log lines are rendered, chosen with `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per event, prefixed with the `check_cycle{run_id=..}` span.
    #[default]
    Compact,
    /// One flat JSON object per event; the cycle's `run_id` sits under `span`.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "pretty" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// `level` for this service, warnings only from reqwest, hyper and friends.
pub fn default_directives(level: &str) -> String {
    format!("warn,{}={}", env!("CARGO_CRATE_NAME"), level.trim())
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` (default `info`) applies
/// to this service only. An unusable `LOG_FORMAT` or `LOG_LEVEL` falls back
/// to the defaults and is reported once logging is up.
pub fn init_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .as_deref()
        .map(LogFormat::from_str)
        .transpose();

    let (env_filter, filter_source) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, "RUST_LOG"),
        Err(_) => match EnvFilter::try_new(default_directives(&log_level)) {
            Ok(filter) => (filter, "LOG_LEVEL"),
            Err(_) => (EnvFilter::new(default_directives("info")), "default"),
        },
    };

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    match log_format.clone().ok().flatten().unwrap_or_default() {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt_layer
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.compact())
            .init(),
    }

    if let Err(e) = log_format {
        tracing::warn!("LOG_FORMAT: {e}, using compact output");
    }
    info!(
        service = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        filter = filter_source,
        "Logging initialized"
    );
}

/// Totals for one check cycle.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub watchers: usize,
    pub failed: usize,
    pub notified: usize,
}

impl CycleSummary {
    pub fn from_results(results: &[WatchResult<RunReport>]) -> Self {
        results.iter().fold(
            CycleSummary {
                watchers: results.len(),
                ..Default::default()
            },
            |mut acc, result| {
                match result {
                    Ok(report) => acc.notified += report.notified,
                    Err(_) => acc.failed += 1,
                }
                acc
            },
        )
    }

    pub fn log(&self) {
        info!(
            watchers = self.watchers,
            failed = self.failed,
            notified = self.notified,
            "Check cycle completed"
        );
    }
}
