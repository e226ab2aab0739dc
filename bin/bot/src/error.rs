//! Domain error types for the bot.

use std::fmt;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Sources could not be read or deserialized.
    Load { details: String },
    /// Chat is enabled but no model name was given.
    MissingModelName,
    /// A numeric setting is out of range.
    InvalidValue { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { details } => write!(f, "failed to load configuration: {}", details),
            Self::MissingModelName => {
                write!(f, "chat.chat_model_name is required when enable_chat is set")
            }
            Self::InvalidValue { key, reason } => {
                write!(f, "invalid value for '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors parsing administrative commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Text does not start with a known command.
    UnknownCommand { name: String },
    /// A flag was given without its value.
    MissingValue { flag: String },
    /// An argument the command does not accept.
    UnexpectedArgument { argument: String },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand { name } => write!(f, "unknown command '{}'", name),
            Self::MissingValue { flag } => write!(f, "flag '{}' requires a value", flag),
            Self::UnexpectedArgument { argument } => {
                write!(f, "unexpected argument '{}'", argument)
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Delivering a reply failed.
    SendFailed { details: String },
    /// Reading inbound events failed.
    ReceiveFailed { details: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed { details } => write!(f, "failed to send reply: {}", details),
            Self::ReceiveFailed { details } => {
                write!(f, "failed to receive message: {}", details)
            }
        }
    }
}

impl std::error::Error for TransportError {}
