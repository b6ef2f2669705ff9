use async_trait::async_trait;
use reqwest::Client;

use super::{
    delivery_error,
    types::{TelegramConfig, TelegramMessage, TelegramResponse},
    Message, Notifier,
};
use crate::errors::{WatchError, WatchResult};

/// Sends messages to Telegram chats through the Bot API.
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<&str>,
    ) -> WatchResult<()> {
        let message = TelegramMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            parse_mode: parse_mode.map(|s| s.to_string()),
            disable_web_page_preview: Some(false),
        };

        let response = self
            .client
            .post(self.config.send_message_url())
            .json(&message)
            .send()
            .await
            .map_err(|e| delivery_error("telegram", e))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| delivery_error("telegram", e))?;
            return Err(WatchError::delivery(format!("Telegram API error: {error_text}")));
        }

        let telegram_response: TelegramResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| delivery_error("telegram", e))?;

        if !telegram_response.ok {
            let error_msg = telegram_response
                .description
                .unwrap_or_else(|| "Unknown Telegram API error".to_string());
            return Err(WatchError::delivery(error_msg));
        }

        if telegram_response.result.is_some() {
            Ok(())
        } else {
            Err(WatchError::delivery("No result in Telegram response"))
        }
    }
}

/// Rewrites the `**title**` markup used for Discord into Telegram HTML.
pub(crate) fn to_telegram_html(text: &str) -> String {
    let escaped = html_escape::encode_text(text);
    let mut html = String::with_capacity(escaped.len());
    for (idx, part) in escaped.split("**").enumerate() {
        if idx % 2 == 1 {
            html.push_str("<b>");
            html.push_str(part);
            html.push_str("</b>");
        } else {
            html.push_str(part);
        }
    }
    html
}

#[async_trait]
impl Notifier for TelegramClient {
    fn name(&self) -> &str {
        "telegram"
    }

    /// Sends the body only; Discord role mentions have no Telegram form.
    async fn send(&self, message: &Message) -> WatchResult<()> {
        let chat_id = message
            .channel
            .as_deref()
            .or(self.config.chat_id.as_deref())
            .ok_or_else(|| WatchError::delivery("No Telegram chat configured for this feed"))?;
        self.send_message(chat_id, &to_telegram_html(&message.body), Some("HTML"))
            .await
    }
}
