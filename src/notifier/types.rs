use serde::{Deserialize, Serialize};

pub const DISCORD_API_BASE_URL: &str = "https://discord.com/api/v10";
pub const TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize, Deserialize)]
pub struct DiscordMessage {
    pub content: String,
    /// Keeps titles from pinging anyone except the configured role.
    pub allowed_mentions: AllowedMentions,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl AllowedMentions {
    /// Allows pinging `role` and nothing else.
    pub fn only_role(role: Option<&str>) -> Self {
        Self {
            parse: Vec::new(),
            roles: role.map(str::to_string).into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DiscordErrorResponse {
    pub message: String,
    #[serde(default)]
    pub code: u32,
}

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub bot_token: String,
    /// Default channel for feeds without their own.
    pub channel_id: Option<String>,
    pub api_base_url: String,
}

impl DiscordConfig {
    pub fn create_message_url(&self, channel_id: &str) -> String {
        format!("{}/channels/{}/messages", self.api_base_url, channel_id)
    }

    pub fn authorization(&self) -> String {
        format!("Bot {}", self.bot_token)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub chat_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Default chat for feeds without their own.
    pub chat_id: Option<String>,
    pub api_base_url: String,
}

impl TelegramConfig {
    pub fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base_url, self.bot_token)
    }
}
