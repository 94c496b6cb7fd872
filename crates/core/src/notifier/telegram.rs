//! Telegram Bot API notifier.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{format_summary, Notifier, NotifierError, RetrievedEpisode};
use crate::config::TelegramConfig;

/// Sends the batch summary as a chat message.
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    async fn send_message(&self, text: &str) -> Result<(), NotifierError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);

        let resp = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(NotifierError::Api(error_text));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, episodes: &[RetrievedEpisode]) -> Result<(), NotifierError> {
        let summary = format_summary(episodes);
        self.send_message(&format!("{}\n\n{}", summary.subject, summary.text))
            .await
    }
}
