mod config;
mod inbound;
mod server;
mod state;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use config::{
    resolve_config_path, BotConfig, ConfigError, HomeAssistantConfig, ReplyTexts, TalkConfig,
    DEFAULT_ERROR_REPLY, DEFAULT_MAX_BODY_BYTES, DEFAULT_SUCCESS_REPLY,
};
pub use inbound::{
    process_message, InboundOutcome, HEADER_TALK_BACKEND, HEADER_TALK_RANDOM,
    HEADER_TALK_SIGNATURE,
};
pub use server::{build_router, run_server};
pub use state::BotState;
