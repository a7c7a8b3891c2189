use anyhow::Context;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::message::SlackMessage;

/// Posts messages to Slack incoming webhooks and interaction `response_url`s.
///
/// Delivery is best-effort: a non-2xx answer from Slack is logged and reported
/// as `Ok(false)`, only transport failures surface as errors. Nothing is retried.
#[derive(Clone)]
pub struct SlackNotifier {
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(concat!("approval-relay/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = cfg.http_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build().context("failed to build Slack HTTP client")?,
        })
    }

    /// Returns whether Slack accepted the message.
    pub async fn send(&self, url: &str, message: &SlackMessage) -> Result<bool, AppError> {
        let resp = self
            .client
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("failed to send slack message: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "slack returned error");
            return Ok(false);
        }

        tracing::debug!("Sent Slack message");
        Ok(true)
    }
}
