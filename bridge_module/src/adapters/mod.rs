//! Outbound adapters for the two services the bot talks to.
//!
//! - `HomeAssistantClient`: posts parsed commands to a Home Assistant webhook
//! - `TalkNotifier`: posts signed replies back into a Nextcloud Talk room

pub mod home_assistant;
pub mod talk;

pub use home_assistant::{DispatchError, HomeAssistantClient};
pub use talk::{ReplyError, TalkNotifier};
