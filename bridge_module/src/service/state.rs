use std::sync::Arc;

use crate::adapters::{HomeAssistantClient, TalkNotifier};

use super::config::BotConfig;
use super::BoxError;

/// Shared by every request handler; nothing in it changes after startup.
#[derive(Debug, Clone)]
pub struct BotState {
    pub config: Arc<BotConfig>,
    pub home_assistant: HomeAssistantClient,
    pub talk: TalkNotifier,
}

impl BotState {
    pub fn new(config: BotConfig) -> Result<Self, BoxError> {
        let home_assistant = HomeAssistantClient::new(
            &config.home_assistant.url,
            &config.home_assistant.webhook_id,
            config.home_assistant.timeout,
        )?;

        let extra_root = match &config.talk.ca_cert_path {
            Some(path) => Some(std::fs::read(path).map_err(|err| {
                format!("failed to read talk CA certificate {}: {}", path.display(), err)
            })?),
            None => None,
        };
        let talk = TalkNotifier::new(
            config.secret.clone(),
            config.talk.timeout,
            extra_root.as_deref(),
        )?;

        Ok(Self {
            config: Arc::new(config),
            home_assistant,
            talk,
        })
    }
}
