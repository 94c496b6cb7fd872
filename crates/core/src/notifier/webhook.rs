//! Generic JSON webhook notifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{format_summary, Notifier, NotifierError, RetrievedEpisode};
use crate::config::WebhookConfig;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: String,
    text: String,
    episodes: Vec<WebhookEpisode<'a>>,
}

#[derive(Debug, Serialize)]
struct WebhookEpisode<'a> {
    series_id: &'a str,
    series: &'a str,
    code: String,
    name: &'a str,
    filename: Option<&'a str>,
}

/// POSTs the batch as JSON to a configured URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(client: Client, config: &WebhookConfig) -> Self {
        Self {
            client,
            url: config.url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, episodes: &[RetrievedEpisode]) -> Result<(), NotifierError> {
        let summary = format_summary(episodes);
        let payload = WebhookPayload {
            subject: summary.subject,
            text: summary.text,
            episodes: episodes
                .iter()
                .map(|item| WebhookEpisode {
                    series_id: &item.series.id,
                    series: &item.series.name,
                    code: item.episode.code.to_string(),
                    name: &item.episode.name,
                    filename: item.episode.filename.as_deref(),
                })
                .collect(),
        };

        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifierError::Api(format!(
                "webhook returned {}",
                status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, http_stub};

    #[tokio::test]
    async fn test_posts_payload() {
        let (url, request) = http_stub::serve_once("200 OK", "")
            .await
            .unwrap();
        let notifier = WebhookNotifier::new(
            Client::new(),
            &WebhookConfig {
                url: format!("{}/hooks/tv", url),
                timeout_secs: 5,
            },
        );

        let series = fixtures::series("thetvdb:9", "Show");
        let mut episode = fixtures::aired_episode(3, &series.id, 2, 5, 1);
        episode.filename = Some("Show - s02e05 - Ep.mkv".to_string());
        notifier
            .notify(&[RetrievedEpisode { series, episode }])
            .await
            .unwrap();

        let request = request.await.unwrap().unwrap();
        assert!(request.head.starts_with("POST /hooks/tv "));
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["subject"], "[showrunner] downloaded 1 episode");
        assert_eq!(body["episodes"][0]["series_id"], "thetvdb:9");
        assert_eq!(body["episodes"][0]["code"], "s02e05");
        assert_eq!(body["episodes"][0]["filename"], "Show - s02e05 - Ep.mkv");
    }

    #[tokio::test]
    async fn test_error_status() {
        let (url, _request) = http_stub::serve_once("500 Internal Server Error", "")
            .await
            .unwrap();
        let notifier = WebhookNotifier::new(
            Client::new(),
            &WebhookConfig {
                url,
                timeout_secs: 5,
            },
        );

        let series = fixtures::series("thetvdb:9", "Show");
        let episode = fixtures::aired_episode(3, &series.id, 2, 5, 1);
        let err = notifier
            .notify(&[RetrievedEpisode { series, episode }])
            .await
            .unwrap_err();
        assert!(matches!(err, NotifierError::Api(_)));
    }
}
