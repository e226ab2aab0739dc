//! parley chat bot.
//!
//! Wires a chat transport to an inference backend. The [`service`] module
//! holds the turn orchestrator; [`config`], [`command`] and [`transport`]
//! are the glue around it.

pub mod command;
pub mod config;
pub mod error;
pub mod service;
pub mod transport;

pub use command::ResetCommand;
pub use config::{BotConfig, ChatConfig, Replies};
pub use error::{CommandError, ConfigError, TransportError};
pub use service::{ChatService, TurnOutcome};
pub use transport::{ConsoleTransport, InboundEvent, Reply, Transport};
