use crate::domain::model::RunReport;
use crate::domain::ports::Notifier;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

/// Posts run activity to a Discord webhook. Every failure is logged and
/// swallowed: a broken webhook must never fail a reconciliation run.
pub struct DiscordNotifier {
    http: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            http: Client::new(),
            webhook_url,
        }
    }

    async fn post(&self, payload: serde_json::Value) {
        let result = self.http.post(&self.webhook_url).json(&payload).send().await;
        match result {
            Ok(response) if response.status() == StatusCode::NO_CONTENT => {
                tracing::debug!("Discord notification sent");
            }
            Ok(response) => {
                tracing::warn!(
                    "Failed to send Discord notification. Status code: {}",
                    response.status()
                );
            }
            Err(e) => {
                tracing::warn!("Failed to send Discord notification: {}", e);
            }
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, message: &str) {
        self.post(serde_json::json!({ "content": message })).await;
    }

    async fn send_report(&self, report: &RunReport) {
        let payload = serde_json::json!({
            "content": format!("Follow report: {}", report.summary()),
            "embeds": [{
                "title": "Follow/unfollow activity",
                "description": format!(
                    "```json\n{}\n```",
                    serde_json::to_string_pretty(&report.to_json()).unwrap_or_default()
                ),
            }],
        });
        self.post(payload).await;
    }
}
