use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::config::Discord;

pub const COLOR_RED: u32 = 15158332;
pub const COLOR_ORANGE: u32 = 15105570;
pub const COLOR_YELLOW: u32 = 16776960;
pub const COLOR_GREEN: u32 = 3066993;
pub const COLOR_BLUE: u32 = 3900150;

/// Maximum length of an embed field value accepted by Discord
pub const MAX_FIELD_VALUE: usize = 1024;

/// Maximum number of fields in one embed
pub const MAX_FIELDS: usize = 25;

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

impl EmbedField {
    /// Create a field, cutting the value down to what a sink accepts.
    ///
    /// Empty values are rendered as `N/A`.
    pub fn new(name: impl ToString, value: impl ToString, inline: bool) -> Self {
        let value = value.to_string();
        let value = if value.trim().is_empty() {
            "N/A".to_string()
        } else {
            truncate(&value, MAX_FIELD_VALUE)
        };

        Self {
            name: name.to_string(),
            value,
            inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            content: None,
            embeds: Vec::new(),
        }
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[derive(Debug, Clone)]
pub struct DiscordManager {
    client: Client,
}

impl DiscordManager {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[instrument(skip(self, discord, message))]
    pub async fn send_message(&self, discord: &Discord, message: &Message) {
        match self.client.post(&discord.url).json(message).send().await {
            Ok(response) => {
                if response.status().is_success() {
                    info!("Successfully sent Discord message");
                } else {
                    error!("Discord message failed with status: {}", response.status());
                    if let Ok(error_text) = response.text().await {
                        error!("Discord API error response: {}", error_text);
                    }
                }
            }
            Err(e) => {
                error!("Failed to send Discord message: {}", e);
            }
        }
    }
}
