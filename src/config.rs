use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

// Default configuration constants
const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_MAX_IN_FLIGHT: usize = 256;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_IDLE_PER_HOST: usize = 10;
const DEFAULT_POOL_IDLE_TIMEOUT_SECONDS: u64 = 90;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub slack: SlackConfig,
    pub server: ServerConfig,
    pub connection: ConnectionConfig,
}

#[derive(Clone, Deserialize)]
pub struct SlackConfig {
    pub bot_token: String,
    pub user_token: String,
    #[serde(default)]
    pub safe_search: bool,
    pub api_base_url: String,
}

// Tokens must never reach the logs.
impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"<redacted>")
            .field("user_token", &"<redacted>")
            .field("safe_search", &self.safe_search)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
    pub max_in_flight: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub timeout_seconds: u64,
    pub max_idle_per_host: usize,
    pub pool_idle_timeout_seconds: u64,
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut settings = config::Config::builder();

        // Default values
        settings = settings
            .set_default("slack.safe_search", false)?
            .set_default("slack.api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", DEFAULT_PORT)?
            .set_default(
                "server.request_timeout_seconds",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            )?
            .set_default("server.max_in_flight", DEFAULT_MAX_IN_FLIGHT as u64)?
            .set_default("connection.timeout_seconds", DEFAULT_TIMEOUT_SECONDS)?
            .set_default(
                "connection.max_idle_per_host",
                DEFAULT_MAX_IDLE_PER_HOST as u64,
            )?
            .set_default(
                "connection.pool_idle_timeout_seconds",
                DEFAULT_POOL_IDLE_TIMEOUT_SECONDS,
            )?;

        // Load from config file if provided
        if let Some(path) = config_path
            && Path::new(path).exists()
        {
            settings = settings.add_source(config::File::with_name(path));
        }

        // Override with environment variables
        settings = settings.add_source(
            config::Environment::with_prefix("SLACK")
                .prefix_separator("_")
                .separator("__"),
        );

        // Both tokens are required: the bot token drives every tool except
        // message search, which needs the user token's search scope.
        let bot_token = non_empty_env("SLACK_BOT_TOKEN");
        let user_token = non_empty_env("SLACK_USER_TOKEN");

        if let Some(token) = bot_token {
            settings = settings.set_override("slack.bot_token", token)?;
        }
        if let Some(token) = user_token {
            settings = settings.set_override("slack.user_token", token)?;
        }

        if let Ok(flag) = std::env::var("SLACK_SAFE_SEARCH") {
            settings = settings.set_override("slack.safe_search", parse_flag(&flag))?;
        }

        let config: Config = settings.build()?.try_deserialize().map_err(|e| {
            anyhow::anyhow!(
                "Invalid configuration ({}). SLACK_BOT_TOKEN and SLACK_USER_TOKEN are required",
                e
            )
        })?;

        if config.slack.bot_token.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "SLACK_BOT_TOKEN environment variable is required"
            ));
        }
        if config.slack.user_token.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "SLACK_USER_TOKEN environment variable is required"
            ));
        }

        Ok(config)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Only a case-insensitive "true" enables a flag.
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "SLACK_BOT_TOKEN",
        "SLACK_USER_TOKEN",
        "SLACK_SAFE_SEARCH",
        "SLACK_SERVER__PORT",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: tests touching the environment are serialized.
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    #[serial]
    fn test_load_requires_both_tokens() {
        clear_env();
        set_env("SLACK_BOT_TOKEN", "xoxb-test");

        let err = Config::load(None).unwrap_err();
        assert!(err.to_string().contains("SLACK_USER_TOKEN"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_applies_defaults() {
        clear_env();
        set_env("SLACK_BOT_TOKEN", "xoxb-test");
        set_env("SLACK_USER_TOKEN", "xoxp-test");

        let config = Config::load(None).unwrap();
        assert_eq!(config.slack.bot_token, "xoxb-test");
        assert_eq!(config.slack.user_token, "xoxp-test");
        assert!(!config.slack.safe_search);
        assert_eq!(config.slack.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.connection.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_safe_search_flag_and_env_overrides() {
        clear_env();
        set_env("SLACK_BOT_TOKEN", "xoxb-test");
        set_env("SLACK_USER_TOKEN", "xoxp-test");
        set_env("SLACK_SAFE_SEARCH", "TRUE");
        set_env("SLACK_SERVER__PORT", "9100");

        let config = Config::load(None).unwrap();
        assert!(config.slack.safe_search);
        assert_eq!(config.server.port, 9100);

        set_env("SLACK_SAFE_SEARCH", "yes");
        let config = Config::load(None).unwrap();
        assert!(!config.slack.safe_search);

        clear_env();
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let slack = SlackConfig {
            bot_token: "xoxb-secret".to_string(),
            user_token: "xoxp-secret".to_string(),
            safe_search: true,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        };

        let rendered = format!("{:?}", slack);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
