//! Core domain types and utilities for parley.
//!
//! This crate provides the foundational types and error handling shared by
//! the inference client, the conversation context manager and the bot.

pub mod error;
pub mod id;
pub mod message;

pub use error::Result;
pub use id::{ConversationId, TurnId};
pub use message::{Message, MessageRole};
