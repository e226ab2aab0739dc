//! Centralized bot configuration.
//!
//! Loaded via the `config` crate from an optional TOML file followed by
//! environment variables prefixed with `PARLEY`, using `__` as the nesting
//! separator (`PARLEY__CHAT__CHAT_MODEL_NAME=llama3`).

use crate::error::ConfigError;
use parley_ai::DEFAULT_ENDPOINT;
use rootcause::Report;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Inference backend base URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Gates the whole chat subsystem.
    #[serde(default)]
    pub enable_chat: bool,

    /// Chat settings, only consulted when `enable_chat` is set.
    #[serde(default)]
    pub chat: ChatConfig,

    /// User-facing reply strings.
    #[serde(default)]
    pub replies: Replies,
}

/// Chat settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Messages longer than this many characters are rejected.
    #[serde(default = "default_too_long_threshold")]
    pub too_long_threshold: usize,

    /// Model to request from the backend. Required.
    #[serde(default)]
    pub chat_model_name: String,

    /// Prefix that addresses the bot in group chats.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// The bot's own platform id, for mention detection.
    #[serde(default = "default_bot_id")]
    pub bot_id: String,

    /// Upper bound on a whole backend call, in seconds.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Upper bound on connecting to the backend, in seconds.
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Minimum authority to reset someone else's conversation.
    #[serde(default = "default_reset_authority")]
    pub reset_authority: u8,
}

/// User-facing strings. Override these to localize the bot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Replies {
    pub too_long: String,
    pub connect_timeout: String,
    pub connection_refused: String,
    pub unknown_error: String,
    /// `{target}` is replaced with the reset conversation.
    pub reset_success: String,
    pub permission_denied: String,
    pub invalid_command: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_too_long_threshold() -> usize {
    100
}

fn default_bot_name() -> String {
    "parley".to_string()
}

fn default_bot_id() -> String {
    "parley".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    120
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_reset_authority() -> u8 {
    3
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            too_long_threshold: default_too_long_threshold(),
            chat_model_name: String::new(),
            bot_name: default_bot_name(),
            bot_id: default_bot_id(),
            request_timeout_seconds: default_request_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            reset_authority: default_reset_authority(),
        }
    }
}

impl ChatConfig {
    /// Bound on a whole backend call.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Bound on establishing the backend connection.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Default for Replies {
    fn default() -> Self {
        Self {
            too_long: "Your message is too long, please shorten it.".to_string(),
            connect_timeout: "Connecting to the model server timed out.".to_string(),
            connection_refused: "The model server refused the connection.".to_string(),
            unknown_error: "Something went wrong while generating a reply.".to_string(),
            reset_success: "Conversation context for {target} has been reset.".to_string(),
            permission_denied: "You are not allowed to reset that conversation.".to_string(),
            invalid_command: "Usage: resetChat [--user <target>]".to_string(),
        }
    }
}

impl Replies {
    /// Renders the reset confirmation for `target`.
    #[must_use]
    pub fn reset_success(&self, target: &str) -> String {
        self.reset_success.replace("{target}", target)
    }
}

impl BotConfig {
    /// Loads configuration from `path` (or `parley.toml` if present) and the
    /// environment, then validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read, or if chat is enabled
    /// without a usable chat section.
    pub fn load(path: Option<&Path>) -> Result<Self, Report<ConfigError>> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("parley").required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("PARLEY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| ConfigError::Load {
                details: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the chat section when chat is enabled.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), Report<ConfigError>> {
        if !self.enable_chat {
            return Ok(());
        }
        if self.chat.chat_model_name.trim().is_empty() {
            return Err(ConfigError::MissingModelName.into());
        }
        if self.chat.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "chat.request_timeout_seconds",
                reason: "must be positive".to_string(),
            }
            .into());
        }
        if self.chat.connect_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "chat.connect_timeout_seconds",
                reason: "must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Returns the chat settings if chat is enabled.
    #[must_use]
    pub fn chat(&self) -> Option<&ChatConfig> {
        self.enable_chat.then_some(&self.chat)
    }
}
