//! Home Assistant webhook client.
//!
//! Commands are posted as `{"action": ..., "target": ...}` to
//! `{url}/api/webhook/{webhook_id}`. The webhook id is the only credential.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::command::Command;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("webhook returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Clone)]
pub struct HomeAssistantClient {
    client: reqwest::Client,
    webhook_url: String,
}

impl HomeAssistantClient {
    pub fn new(
        base_url: &str,
        webhook_id: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url(base_url, webhook_id),
        })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Post `command` once. Only a 200 counts as success; failures are logged.
    pub async fn dispatch(&self, command: &Command) -> bool {
        match self.try_dispatch(command).await {
            Ok(()) => {
                info!(
                    "home assistant webhook accepted action={} target={}",
                    command.action, command.target
                );
                true
            }
            Err(err) => {
                warn!("home assistant webhook failed: {}", err);
                false
            }
        }
    }

    pub async fn try_dispatch(&self, command: &Command) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(command)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Status { status, body });
        }
        Ok(())
    }
}

pub fn webhook_url(base_url: &str, webhook_id: &str) -> String {
    format!(
        "{}/api/webhook/{}",
        base_url.trim().trim_end_matches('/'),
        webhook_id.trim()
    )
}
