//! Signed replies to Nextcloud Talk via the bot API.
//!
//! The reply text is signed with the shared bot secret under a fresh random
//! value, and both are sent as `X-Nextcloud-Talk-Bot-*` headers so Talk can
//! authenticate the bot.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use crate::message::{encode_reply, Response};
use crate::signature::SignedFrame;

pub const HEADER_OCS_API_REQUEST: &str = "OCS-APIRequest";
pub const HEADER_BOT_RANDOM: &str = "X-Nextcloud-Talk-Bot-Random";
pub const HEADER_BOT_SIGNATURE: &str = "X-Nextcloud-Talk-Bot-Signature";

#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("reply request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("talk returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Clone)]
pub struct TalkNotifier {
    client: reqwest::Client,
    secret: String,
}

impl std::fmt::Debug for TalkNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TalkNotifier")
            .field("secret", &"***")
            .finish_non_exhaustive()
    }
}

impl TalkNotifier {
    /// Certificates are always validated; `extra_root_pem` adds a private CA
    /// on top of the system trust store.
    pub fn new(
        secret: String,
        timeout: Duration,
        extra_root_pem: Option<&[u8]>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(pem) = extra_root_pem {
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(pem)?);
        }
        Ok(Self {
            client: builder.build()?,
            secret,
        })
    }

    /// Best-effort reply; delivery failures are only logged.
    pub async fn notify(&self, backend_url: &str, room_token: &str, reply_to: &str, text: &str) {
        match self.try_notify(backend_url, room_token, reply_to, text).await {
            Ok(()) => debug!("talk reply delivered room={} reply_to={}", room_token, reply_to),
            Err(err) => warn!("talk reply to room={} failed: {}", room_token, err),
        }
    }

    pub async fn try_notify(
        &self,
        backend_url: &str,
        room_token: &str,
        reply_to: &str,
        text: &str,
    ) -> Result<(), ReplyError> {
        let body = encode_reply(&Response {
            message: text.to_string(),
            reply_to: reply_to.to_string(),
        });
        // Talk checks the signature against the message text, not the JSON body.
        let frame = SignedFrame::sign(text.as_bytes(), &self.secret);

        let response = self
            .client
            .post(reply_url(backend_url, room_token))
            .header(CONTENT_TYPE, "application/json")
            .header(HEADER_OCS_API_REQUEST, "true")
            .header(HEADER_BOT_RANDOM, &frame.nonce)
            .header(HEADER_BOT_SIGNATURE, &frame.signature)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReplyError::Status { status, body });
        }
        Ok(())
    }
}

pub fn reply_url(backend_url: &str, room_token: &str) -> String {
    let backend_url = backend_url.trim();
    let separator = if backend_url.ends_with('/') { "" } else { "/" };
    format!(
        "{}{}ocs/v2.php/apps/spreed/api/v1/bot/{}/message",
        backend_url, separator, room_token
    )
}
