use std::{collections::HashMap, path::PathBuf, time::Duration};
use url::Url;

use crate::{
    errors::{WatchError, WatchResult},
    notifier::{
        types::{DiscordConfig, TelegramConfig, DISCORD_API_BASE_URL, TELEGRAM_API_BASE_URL},
        FeedRoute,
    },
    tasks::types::{FirstRunPolicy, CHECK_INTERVAL, FETCH_TIMEOUT},
};

/// Where announcements go.
#[derive(Debug, Clone)]
pub enum NotifierConfig {
    Discord(DiscordConfig),
    Telegram(TelegramConfig),
    /// Log messages instead of sending them.
    Log,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub free_feed_url: String,
    pub paid_feed_url: String,
    pub free_route: FeedRoute,
    pub paid_route: FeedRoute,
    pub notifier: NotifierConfig,
    pub state_file: PathBuf,
    pub check_interval: Duration,
    pub fetch_timeout: Duration,
    pub first_run: FirstRunPolicy,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> WatchResult<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> WatchResult<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| WatchError::configuration(format!("{key} is not set")))
        };

        let free_feed_url = feed_url("FREE_FEED_URL", require("FREE_FEED_URL")?)?;
        let paid_feed_url = feed_url("PAID_FEED_URL", require("PAID_FEED_URL")?)?;

        let route = |channel_keys: &[&str], role_key: &str| -> WatchResult<FeedRoute> {
            Ok(FeedRoute {
                channel: channel_keys.iter().find_map(|&key| get(key)),
                mention_role: get(role_key)
                    .map(|role| role_id(role_key, &role))
                    .transpose()?,
            })
        };
        let free_route = route(
            &["CW_FREE_CHANNEL", "DISCORD_FREE_CHAPTERS_CHANNEL"],
            "CW_FREE_MENTION_ROLE",
        )?;
        let paid_route = route(
            &["CW_PAID_CHANNEL", "DISCORD_ADVANCE_CHAPTERS_CHANNEL"],
            "CW_PAID_MENTION_ROLE",
        )?;

        // The backend default may be left out only when every feed has its own.
        let every_feed_routed = free_route.channel.is_some() && paid_route.channel.is_some();
        let default_channel = |key: &str| match get(key) {
            Some(channel) => Ok(Some(channel)),
            None if every_feed_routed => Ok(None),
            None => Err(WatchError::configuration(format!(
                "{key} is not set and not every feed has its own channel"
            ))),
        };

        let notifier = match get("CW_NOTIFIER").as_deref().unwrap_or("discord") {
            "discord" => NotifierConfig::Discord(DiscordConfig {
                bot_token: require("DISCORD_BOT_TOKEN")?,
                channel_id: default_channel("DISCORD_CHANNEL_ID")?,
                api_base_url: get("DISCORD_API_BASE_URL")
                    .unwrap_or_else(|| DISCORD_API_BASE_URL.to_string()),
            }),
            "telegram" => NotifierConfig::Telegram(TelegramConfig {
                bot_token: require("TELEGRAM_BOT_TOKEN")?,
                chat_id: default_channel("TELEGRAM_CHAT_ID")?,
                api_base_url: get("TELEGRAM_API_BASE_URL")
                    .unwrap_or_else(|| TELEGRAM_API_BASE_URL.to_string()),
            }),
            "log" => NotifierConfig::Log,
            other => {
                return Err(WatchError::configuration(format!(
                    "CW_NOTIFIER must be discord, telegram or log, got '{other}'"
                )))
            }
        };

        if matches!(notifier, NotifierConfig::Telegram(_))
            && (free_route.mention_role.is_some() || paid_route.mention_role.is_some())
        {
            log::warn!("Mention roles have no Telegram form and will be left out");
        }

        let state_file = match get("CW_STATE_FILE") {
            Some(path) => {
                log::info!("Using state file from CW_STATE_FILE: {}", path);
                PathBuf::from(path)
            }
            None => {
                log::info!("Using default state file: ./state.json");
                PathBuf::from("state.json")
            }
        };

        let check_interval = match get("CW_CHECK_INTERVAL_SECS") {
            Some(secs) => seconds("CW_CHECK_INTERVAL_SECS", &secs)?,
            None => CHECK_INTERVAL,
        };
        let fetch_timeout = match get("CW_FETCH_TIMEOUT_SECS") {
            Some(secs) => seconds("CW_FETCH_TIMEOUT_SECS", &secs)?,
            None => FETCH_TIMEOUT,
        };

        let first_run = match get("CW_FIRST_RUN") {
            Some(policy) => policy
                .parse::<FirstRunPolicy>()
                .map_err(|e| WatchError::configuration(format!("CW_FIRST_RUN: {e}")))?,
            None => FirstRunPolicy::default(),
        };

        Ok(AppConfig {
            free_feed_url,
            paid_feed_url,
            free_route,
            paid_route,
            notifier,
            state_file,
            check_interval,
            fetch_timeout,
            first_run,
        })
    }
}

fn feed_url(key: &str, value: String) -> WatchResult<String> {
    let url = Url::parse(&value)
        .map_err(|e| WatchError::configuration(format!("{key} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(value),
        scheme => Err(WatchError::configuration(format!(
            "{key} must use http or https, got {scheme}"
        ))),
    }
}

/// Accepts a bare role id or the `<@&id>` mention form.
fn role_id(key: &str, value: &str) -> WatchResult<String> {
    let id = value
        .strip_prefix("<@&")
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(value);
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(id.to_string())
    } else {
        Err(WatchError::configuration(format!(
            "{key} must be a numeric Discord role id, got '{value}'"
        )))
    }
}

fn seconds(key: &str, value: &str) -> WatchResult<Duration> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(WatchError::configuration(format!(
            "{key} must be a positive number of seconds"
        ))),
    }
}
