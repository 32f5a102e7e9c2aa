#![allow(dead_code)]

use std::sync::Arc;

use bridge_module::service::{
    build_router, BotConfig, BotState, HEADER_TALK_BACKEND, HEADER_TALK_RANDOM,
    HEADER_TALK_SIGNATURE,
};
use bridge_module::sign;

pub const SECRET: &str = "integration-shared-secret";
pub const WEBHOOK_ID: &str = "talk-bridge";
pub const WEBHOOK_PATH: &str = "/api/webhook/talk-bridge";
pub const REPLY_PATH: &str = "/ocs/v2.php/apps/spreed/api/v1/bot/room-token/message";

pub fn bot_config(home_assistant_url: &str) -> BotConfig {
    BotConfig::from_toml_str(&format!(
        r#"
[bot]
port = 8080
secret = "{SECRET}"
max_body_bytes = 4096

[bot.ha]
url = "{home_assistant_url}/"
webhook_id = "{WEBHOOK_ID}"
timeout_secs = 5

[bot.talk]
timeout_secs = 5
"#
    ))
    .expect("valid test config")
}

/// Serve the bot on an ephemeral port and return its base URL.
pub async fn spawn_bot(config: BotConfig) -> String {
    let state = Arc::new(BotState::new(config).expect("bot state"));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, build_router(state))
            .await
            .expect("serve bot");
    });
    format!("http://{}", addr)
}

pub fn chat_envelope(text: &str) -> Vec<u8> {
    envelope("message", &serde_json::json!({"message": text, "parameters": []}).to_string())
}

pub fn envelope(object_name: &str, content: &str) -> Vec<u8> {
    serde_json::json!({
        "type": "Create",
        "actor": {"type": "users", "id": "users/alice", "name": "Alice"},
        "object": {
            "type": "Note",
            "id": "42",
            "name": object_name,
            "content": content,
            "mediaType": "text/markdown"
        },
        "target": {"type": "Collection", "id": "room-token", "name": "Living room"}
    })
    .to_string()
    .into_bytes()
}

/// POST `body` to the bot as Talk would, signed with `secret`.
pub async fn post_signed(
    bot_url: &str,
    talk_backend: &str,
    body: Vec<u8>,
    secret: &str,
) -> reqwest::Response {
    let random = bridge_module::generate_nonce();
    let signature = sign(&body, &random, secret);
    reqwest::Client::new()
        .post(format!("{}/message", bot_url))
        .header(HEADER_TALK_BACKEND, talk_backend)
        .header(HEADER_TALK_RANDOM, random)
        .header(HEADER_TALK_SIGNATURE, signature)
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .expect("request to bot")
}
