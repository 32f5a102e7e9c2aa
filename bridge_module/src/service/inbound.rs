use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info, warn};

use crate::command::{parse_command, Command, ParseOutcome};
use crate::message::{decode_envelope, decode_rich_text};
use crate::signature::verify;

use super::state::BotState;

pub const HEADER_TALK_BACKEND: &str = "x-nextcloud-talk-backend";
pub const HEADER_TALK_RANDOM: &str = "x-nextcloud-talk-random";
pub const HEADER_TALK_SIGNATURE: &str = "x-nextcloud-talk-signature";

/// Where a webhook call from Talk ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    BodyUnreadable,
    SignatureMismatch,
    EnvelopeInvalid,
    /// Signed and valid, but not a chat message (joins, reactions, ...).
    NotChatMessage,
    RichTextInvalid,
    NonCommand,
    IncompleteCommand { tokens: usize },
    /// Home Assistant was called and a reply was attempted.
    CommandDispatched { command: Command, succeeded: bool },
}

impl InboundOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BodyUnreadable | Self::SignatureMismatch | Self::EnvelopeInvalid => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::OK,
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            Self::BodyUnreadable => "can't read body",
            Self::SignatureMismatch => "Invalid signature",
            Self::EnvelopeInvalid => "Invalid body",
            _ => "Received",
        }
    }
}

impl IntoResponse for InboundOutcome {
    fn into_response(self) -> Response {
        (self.status(), self.body()).into_response()
    }
}

pub(super) async fn receive_message(
    State(state): State<Arc<BotState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> InboundOutcome {
    let body = match body {
        Ok(body) => body,
        Err(err) => {
            warn!("talk request body unreadable: {}", err);
            return InboundOutcome::BodyUnreadable;
        }
    };
    process_message(&state, &headers, &body).await
}

/// Verify, decode and act on one webhook call from Talk.
///
/// Outbound calls are awaited here, so dropping the future stops them.
pub async fn process_message(state: &BotState, headers: &HeaderMap, body: &[u8]) -> InboundOutcome {
    let backend = header_value(headers, HEADER_TALK_BACKEND);
    let random = header_value(headers, HEADER_TALK_RANDOM);
    let signature = header_value(headers, HEADER_TALK_SIGNATURE);

    if !verify(body, random, signature, &state.config.secret) {
        warn!("talk request signature mismatch backend={}", backend);
        return InboundOutcome::SignatureMismatch;
    }

    let message = match decode_envelope(body) {
        Ok(message) => message,
        Err(err) => {
            warn!("talk request rejected: {}", err);
            return InboundOutcome::EnvelopeInvalid;
        }
    };

    if !message.is_chat_message() {
        debug!(
            "talk event ignored type={} object={}",
            message.message_type, message.object.name
        );
        return InboundOutcome::NotChatMessage;
    }

    let rich_text = match decode_rich_text(&message.object.content) {
        Ok(rich_text) => rich_text,
        Err(err) => {
            warn!("talk message {} dropped: {}", message.object.id, err);
            return InboundOutcome::RichTextInvalid;
        }
    };

    let command = match parse_command(&rich_text.message) {
        ParseOutcome::Command(command) => command,
        ParseOutcome::NoMatch => {
            info!("talk message is not a command: {}", rich_text.message);
            return InboundOutcome::NonCommand;
        }
        ParseOutcome::TooFewTokens(tokens) => {
            info!(
                "talk command needs an action and a target, got {} tokens: {}",
                tokens, rich_text.message
            );
            return InboundOutcome::IncompleteCommand { tokens };
        }
    };

    info!("talk command found: {}", rich_text.message);
    let succeeded = state.home_assistant.dispatch(&command).await;
    let reply = if succeeded {
        state.config.replies.pick_success()
    } else {
        state.config.replies.error.as_str()
    };
    state
        .talk
        .notify(backend, &message.target.id, &message.object.id, reply)
        .await;

    InboundOutcome::CommandDispatched { command, succeeded }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}
