//! Conversation context management for parley.
//!
//! This crate provides:
//!
//! - **Conversation Context**: the transcript sent to the backend and the
//!   trace buffer of messages seen since, for direct and group chats
//! - **Pending Request**: the transaction guard bracketing one backend call
//! - **Conversation Store**: lazily populated contexts keyed by conversation

pub mod context;
pub mod error;
pub mod message;
pub mod store;

pub use context::{ConversationContext, GROUP_PENDING_CAPACITY, PendingRequest};
pub use error::ConversationError;
pub use message::UserMessage;
pub use store::{ConversationStore, SharedContext};
