use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SUCCESS_REPLY: &str = "Done!";
pub const DEFAULT_ERROR_REPLY: &str = "Error calling Home Assistant";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read bot config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse bot config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct BotConfigFile {
    #[serde(default)]
    pub(super) bot: BotSection,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct BotSection {
    pub(super) host: Option<String>,
    pub(super) port: Option<u16>,
    pub(super) secret: Option<String>,
    pub(super) max_body_bytes: Option<usize>,
    #[serde(default)]
    pub(super) ha: HomeAssistantSection,
    #[serde(default)]
    pub(super) talk: TalkSection,
    #[serde(default)]
    pub(super) replies: RepliesSection,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct HomeAssistantSection {
    pub(super) url: Option<String>,
    pub(super) webhook_id: Option<String>,
    pub(super) timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct TalkSection {
    pub(super) timeout_secs: Option<u64>,
    pub(super) ca_cert_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RepliesSection {
    pub(super) success: Option<Vec<String>>,
    pub(super) error: Option<String>,
}

#[derive(Clone)]
pub struct BotConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret configured for the bot in Talk.
    pub secret: String,
    pub max_body_bytes: usize,
    pub home_assistant: HomeAssistantConfig,
    pub talk: TalkConfig,
    pub replies: ReplyTexts,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secret", &"***")
            .field("max_body_bytes", &self.max_body_bytes)
            .field("home_assistant", &self.home_assistant)
            .field("talk", &self.talk)
            .field("replies", &self.replies)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HomeAssistantConfig {
    pub url: String,
    pub webhook_id: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TalkConfig {
    pub timeout: Duration,
    /// Extra PEM root certificate trusted for the Talk backend.
    pub ca_cert_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ReplyTexts {
    pub success: Vec<String>,
    pub error: String,
}

impl Default for ReplyTexts {
    fn default() -> Self {
        Self {
            success: vec![DEFAULT_SUCCESS_REPLY.to_string()],
            error: DEFAULT_ERROR_REPLY.to_string(),
        }
    }
}

impl ReplyTexts {
    /// One of the acknowledgement texts, picked at random.
    pub fn pick_success(&self) -> &str {
        self.success
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_SUCCESS_REPLY)
    }
}

impl BotConfig {
    /// Load from `BOT_CONFIG_PATH` (or `./config.toml`), then apply `BOT_*`
    /// environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        match resolve_config_path() {
            Some(path) => Self::load(&path),
            None => Self::from_file(BotConfigFile::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file = toml::from_str::<BotConfigFile>(content)?;
        Self::from_file(file)
    }

    fn from_file(file: BotConfigFile) -> Result<Self, ConfigError> {
        let bot = file.bot;

        let host = env_value("BOT_HOST")
            .or(bot.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match env_value("BOT_PORT") {
            Some(value) => value.parse::<u16>().map_err(|err| ConfigError::Invalid {
                key: "bot.port",
                reason: format!("{}: {}", value, err),
            })?,
            None => bot.port.ok_or(ConfigError::Missing("bot.port"))?,
        };
        // The secret is the HMAC key, so it is used byte for byte.
        let secret = raw_env_value("BOT_SECRET")
            .or(bot.secret)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing("bot.secret"))?;
        let url = required(env_value("BOT_HA_URL").or(bot.ha.url), "bot.ha.url")?;
        let webhook_id = required(
            env_value("BOT_HA_WEBHOOK_ID").or(bot.ha.webhook_id),
            "bot.ha.webhook_id",
        )?;

        let max_body_bytes = bot.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES);
        if max_body_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "bot.max_body_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }

        let success = bot
            .replies
            .success
            .unwrap_or_else(|| vec![DEFAULT_SUCCESS_REPLY.to_string()]);
        if success.iter().all(|text| text.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                key: "bot.replies.success",
                reason: "needs at least one non-empty reply".to_string(),
            });
        }
        let success = success
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .collect();
        let error = bot
            .replies
            .error
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ERROR_REPLY.to_string());

        Ok(Self {
            host,
            port,
            secret,
            max_body_bytes,
            home_assistant: HomeAssistantConfig {
                url,
                webhook_id,
                timeout: timeout(bot.ha.timeout_secs, "bot.ha.timeout_secs")?,
            },
            talk: TalkConfig {
                timeout: timeout(bot.talk.timeout_secs, "bot.talk.timeout_secs")?,
                ca_cert_path: bot.talk.ca_cert_path,
            },
            replies: ReplyTexts { success, error },
        })
    }
}

/// `BOT_CONFIG_PATH` when set, else `config.toml` in the working directory
/// if it exists.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(path) = env_value("BOT_CONFIG_PATH") {
        return Some(PathBuf::from(path));
    }
    let direct = env::current_dir().ok()?.join("config.toml");
    direct.exists().then_some(direct)
}

fn env_value(key: &str) -> Option<String> {
    raw_env_value(key).map(|value| value.trim().to_string())
}

fn raw_env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn timeout(secs: Option<u64>, key: &'static str) -> Result<Duration, ConfigError> {
    match secs.unwrap_or(DEFAULT_TIMEOUT_SECS) {
        0 => Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const FULL: &str = r#"
[bot]
host = "127.0.0.1"
port = 8088
secret = "s3cr3t"
max_body_bytes = 4096

[bot.ha]
url = "http://homeassistant.local:8123/"
webhook_id = "talk-bot"
timeout_secs = 10

[bot.talk]
timeout_secs = 15
ca_cert_path = "/etc/ssl/private-ca.pem"

[bot.replies]
success = ["Done!", "On it."]
error = "Home Assistant is unhappy"
"#;

    const MINIMAL: &str = r#"
[bot]
port = 8080
secret = "s3cr3t"

[bot.ha]
url = "http://homeassistant.local:8123"
webhook_id = "talk-bot"
"#;

    fn clear_env() {
        for key in [
            "BOT_CONFIG_PATH",
            "BOT_HOST",
            "BOT_PORT",
            "BOT_SECRET",
            "BOT_HA_URL",
            "BOT_HA_WEBHOOK_ID",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn parses_full_config() {
        clear_env();
        let config = BotConfig::from_toml_str(FULL).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8088);
        assert_eq!(config.secret, "s3cr3t");
        assert_eq!(config.max_body_bytes, 4096);
        assert_eq!(config.home_assistant.url, "http://homeassistant.local:8123/");
        assert_eq!(config.home_assistant.webhook_id, "talk-bot");
        assert_eq!(config.home_assistant.timeout, Duration::from_secs(10));
        assert_eq!(config.talk.timeout, Duration::from_secs(15));
        assert_eq!(
            config.talk.ca_cert_path,
            Some(PathBuf::from("/etc/ssl/private-ca.pem"))
        );
        assert_eq!(config.replies.success, vec!["Done!", "On it."]);
        assert_eq!(config.replies.error, "Home Assistant is unhappy");
    }

    #[test]
    #[serial]
    fn minimal_config_uses_defaults() {
        clear_env();
        let config = BotConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.home_assistant.timeout, Duration::from_secs(30));
        assert_eq!(config.talk.timeout, Duration::from_secs(30));
        assert_eq!(config.talk.ca_cert_path, None);
        assert_eq!(config.replies.success, vec![DEFAULT_SUCCESS_REPLY]);
        assert_eq!(config.replies.error, DEFAULT_ERROR_REPLY);
        assert_eq!(config.replies.pick_success(), "Done!");
    }

    #[test]
    #[serial]
    fn missing_required_settings_fail() {
        clear_env();
        let err = BotConfig::from_toml_str("[bot]\nport = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("bot.secret")));

        let err = BotConfig::from_toml_str(&MINIMAL.replace("port = 8080", "")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("bot.port")));

        let err = BotConfig::from_toml_str(&MINIMAL.replace("\"talk-bot\"", "\"  \"")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("bot.ha.webhook_id")));
    }

    #[test]
    #[serial]
    fn invalid_values_fail() {
        clear_env();
        let zero_timeout = format!("{MINIMAL}timeout_secs = 0\n");
        let err = BotConfig::from_toml_str(&zero_timeout).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "bot.ha.timeout_secs", .. }));

        let no_replies = format!("{MINIMAL}\n[bot.replies]\nsuccess = []\n");
        let err = BotConfig::from_toml_str(&no_replies).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "bot.replies.success", .. }));

        assert!(matches!(
            BotConfig::from_toml_str("[bot\nport = 1").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    #[serial]
    fn env_overrides_file_values() {
        clear_env();
        env::set_var("BOT_PORT", "9191");
        env::set_var("BOT_SECRET", "from-env");
        env::set_var("BOT_HA_URL", "https://ha.example.org");
        env::set_var("BOT_HA_WEBHOOK_ID", "   ");

        let config = BotConfig::from_toml_str(MINIMAL);
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.port, 9191);
        assert_eq!(config.secret, "from-env");
        assert_eq!(config.home_assistant.url, "https://ha.example.org");
        // Blank overrides are ignored.
        assert_eq!(config.home_assistant.webhook_id, "talk-bot");
    }

    #[test]
    #[serial]
    fn env_only_config_is_enough() {
        clear_env();
        env::set_var("BOT_PORT", "8081");
        env::set_var("BOT_SECRET", "from-env");
        env::set_var("BOT_HA_URL", "https://ha.example.org");
        env::set_var("BOT_HA_WEBHOOK_ID", "hook");

        let config = BotConfig::from_toml_str("");
        clear_env();
        assert_eq!(config.unwrap().port, 8081);
    }

    #[test]
    #[serial]
    fn invalid_port_override_fails() {
        clear_env();
        env::set_var("BOT_PORT", "eighty");
        let err = BotConfig::from_toml_str(MINIMAL).unwrap_err();
        clear_env();
        assert!(matches!(err, ConfigError::Invalid { key: "bot.port", .. }));
    }

    #[test]
    #[serial]
    fn load_reads_file_and_reports_missing_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        assert_eq!(BotConfig::load(&path).unwrap().port, 8080);

        let err = BotConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    #[serial]
    fn secret_keeps_surrounding_whitespace() {
        clear_env();
        let padded = MINIMAL.replace("\"s3cr3t\"", "\" s3cr3t \"");
        assert_eq!(BotConfig::from_toml_str(&padded).unwrap().secret, " s3cr3t ");

        env::set_var("BOT_SECRET", "from-env\t");
        let config = BotConfig::from_toml_str(MINIMAL);
        clear_env();
        assert_eq!(config.unwrap().secret, "from-env\t");

        let blank = MINIMAL.replace("\"s3cr3t\"", "\"   \"");
        assert!(matches!(
            BotConfig::from_toml_str(&blank).unwrap_err(),
            ConfigError::Missing("bot.secret")
        ));
    }

    #[test]
    fn pick_success_stays_within_configured_texts() {
        let replies = ReplyTexts {
            success: vec!["Done!".to_string(), "On it.".to_string()],
            error: DEFAULT_ERROR_REPLY.to_string(),
        };
        for _ in 0..32 {
            assert!(["Done!", "On it."].contains(&replies.pick_success()));
        }
    }

    #[test]
    #[serial]
    fn debug_hides_secret() {
        clear_env();
        let config = BotConfig::from_toml_str(MINIMAL).unwrap();
        assert!(!format!("{config:?}").contains("s3cr3t"));
    }
}
