//! Best-effort notification delivery
//!
//! Delivery is at most once: a failed POST is logged and forgotten. Nothing
//! here ever fails a run.

use std::time::Duration;

use reqwest::Client;
use tracing::{error, info, instrument, warn};

use crate::alerts::Alert;
use crate::config::{NotificationSink, Webhook};
use crate::discord::{DiscordManager, MessageBuilder};
use crate::Severity;

/// Upper bound for one delivery attempt
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    sink: Option<NotificationSink>,
    discord_manager: DiscordManager,
}

impl Dispatcher {
    pub fn new(sink: Option<NotificationSink>) -> Self {
        Self::with_timeout(sink, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(sink: Option<NotificationSink>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("could not build notification client ({e}), sending without timeout");
                Client::new()
            });
        Self {
            discord_manager: DiscordManager::new(client.clone()),
            client,
            sink,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.sink.is_some()
    }

    #[instrument(skip(self, alert), fields(title = %alert.title))]
    pub async fn send(&self, alert: &Alert) {
        let Some(sink) = &self.sink else {
            info!("no notification sink configured, skipping '{}'", alert.title);
            return;
        };

        match sink {
            NotificationSink::Discord(discord) => {
                let mut message_builder = MessageBuilder::new().add_embed(alert.to_embed());
                // only urgent alerts ping the configured user
                if let (Some(user_id), Some(Severity::High)) = (&discord.user_id, alert.severity) {
                    message_builder = message_builder.content(format!("<@{user_id}>"));
                }

                self.discord_manager
                    .send_message(discord, &message_builder.build())
                    .await;
            }
            NotificationSink::Webhook(webhook) => {
                self.send_webhook(webhook, alert).await;
            }
        }
    }

    #[instrument(skip(self, webhook, alert))]
    async fn send_webhook(&self, webhook: &Webhook, alert: &Alert) {
        match self
            .client
            .post(&webhook.url)
            .json(&alert.to_embed())
            .send()
            .await
        {
            Ok(response) => {
                if response.status().is_success() {
                    info!("Successfully sent webhook alert");
                } else {
                    error!("Webhook alert failed with status: {}", response.status());
                }
            }
            Err(e) => {
                error!("Failed to send webhook alert: {}", e);
            }
        }
    }
}
