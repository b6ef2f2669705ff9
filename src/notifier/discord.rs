use async_trait::async_trait;
use reqwest::Client;

use super::{
    delivery_error,
    types::{AllowedMentions, DiscordConfig, DiscordErrorResponse, DiscordMessage},
    Message, Notifier,
};
use crate::errors::{WatchError, WatchResult};

/// Posts messages to Discord channels through the bot REST API.
pub struct DiscordClient {
    client: Client,
    config: DiscordConfig,
}

impl DiscordClient {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// The message's own channel, else the configured default.
    fn channel_for<'a>(&'a self, message: &'a Message) -> WatchResult<&'a str> {
        message
            .channel
            .as_deref()
            .or(self.config.channel_id.as_deref())
            .ok_or_else(|| WatchError::delivery("No Discord channel configured for this feed"))
    }

    pub async fn create_message(&self, message: &Message) -> WatchResult<()> {
        let channel_id = self.channel_for(message)?;
        let payload = DiscordMessage {
            content: message.content(),
            allowed_mentions: AllowedMentions::only_role(message.mention_role.as_deref()),
        };

        let response = self
            .client
            .post(self.config.create_message_url(channel_id))
            .header("Authorization", self.config.authorization())
            .json(&payload)
            .send()
            .await
            .map_err(|e| delivery_error("discord", e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error_text = response
            .text()
            .await
            .map_err(|e| delivery_error("discord", e))?;
        let detail = match serde_json::from_str::<DiscordErrorResponse>(&error_text) {
            Ok(err) => format!("{} (code {})", err.message, err.code),
            Err(_) => error_text,
        };
        Err(WatchError::delivery(format!(
            "Discord API error {status} in channel {channel_id}: {detail}"
        )))
    }
}

#[async_trait]
impl Notifier for DiscordClient {
    fn name(&self) -> &str {
        "discord"
    }

    async fn send(&self, message: &Message) -> WatchResult<()> {
        self.create_message(message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(default_channel: Option<&str>) -> DiscordClient {
        DiscordClient::new(DiscordConfig {
            bot_token: "abc".to_string(),
            channel_id: default_channel.map(str::to_string),
            api_base_url: "https://discord.test/api".to_string(),
        })
    }

    #[test]
    fn test_feed_channel_overrides_default() {
        let discord = client(Some("100"));
        let mut message = Message::new("hi");
        assert_eq!(discord.channel_for(&message).unwrap(), "100");

        message.channel = Some("200".to_string());
        assert_eq!(discord.channel_for(&message).unwrap(), "200");
    }

    #[test]
    fn test_missing_channel_is_a_delivery_error() {
        let err = client(None).channel_for(&Message::new("hi")).unwrap_err();
        assert!(matches!(err, WatchError::Delivery(_)));
    }
}
