//! Talk bot message envelope and rich-object payload.
//!
//! Talk posts an ActivityStreams-like envelope to the bot. For chat messages
//! (`object.name == "message"`) the `object.content` field is itself a JSON
//! string holding the rich-object message with its placeholder parameters.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Object name Talk uses for regular chat messages.
pub const CHAT_MESSAGE_OBJECT: &str = "message";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid message envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("invalid rich object message: {0}")]
    RichText(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MessageActor {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub actor_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MessageObject {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub object_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Rich object JSON when `name` is `"message"`.
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(rename = "mediaType", deserialize_with = "null_as_default")]
    pub media_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MessageTarget {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub target_type: String,
    /// Conversation token of the room the message was posted in.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

/// Envelope of a webhook call from Talk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Message {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub message_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub actor: MessageActor,
    #[serde(deserialize_with = "null_as_default")]
    pub object: MessageObject,
    #[serde(deserialize_with = "null_as_default")]
    pub target: MessageTarget,
}

impl Message {
    pub fn is_chat_message(&self) -> bool {
        self.object.name == CHAT_MESSAGE_OBJECT
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RichObjectParameter {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub parameter_type: String,
}

/// Decoded `object.content` of a chat message.
///
/// Only `message` drives the bot; `parameters` is kept as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RichTextPayload {
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(
        skip_serializing_if = "HashMap::is_empty",
        deserialize_with = "parameters_from_map_or_list"
    )]
    pub parameters: HashMap<String, RichObjectParameter>,
}

// An explicit `null` decodes like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Talk encodes an empty parameter set as `[]` rather than `{}`. Entries that
// do not fit `RichObjectParameter` are skipped so they never fail the message.
fn parameters_from_map_or_list<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, RichObjectParameter>, D::Error>
where
    D: Deserializer<'de>,
{
    let parameter = |value: Value| RichObjectParameter::deserialize(value).ok();

    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(key, value)| parameter(value).map(|parameter| (key, parameter)))
            .collect(),
        Value::Array(list) => list
            .into_iter()
            .filter_map(parameter)
            .map(|parameter| (parameter.id.clone(), parameter))
            .collect(),
        _ => HashMap::new(),
    })
}

/// Reply posted back into the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub message: String,
    #[serde(rename = "replyTo")]
    pub reply_to: String,
}

pub fn decode_envelope(body: &[u8]) -> Result<Message, DecodeError> {
    serde_json::from_slice(body).map_err(DecodeError::Envelope)
}

pub fn decode_rich_text(content: &str) -> Result<RichTextPayload, DecodeError> {
    serde_json::from_str(content).map_err(DecodeError::RichText)
}

pub fn encode_reply(response: &Response) -> Vec<u8> {
    // A struct of two strings always serializes.
    serde_json::to_vec(response).unwrap_or_default()
}
