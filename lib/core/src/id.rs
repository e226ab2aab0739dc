//! Identifier types.
//!
//! Conversations are keyed by identifiers the chat platform hands us, so
//! [`ConversationId`] wraps platform strings. Turns are ours, and use ULIDs
//! for temporal ordering in logs.

use std::fmt;
use ulid::Ulid;

/// Key of a conversation in the store.
///
/// Direct conversations are keyed by the other party's user id, group
/// conversations by the group id. The two namespaces never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversationId {
    /// One-to-one conversation with a user.
    Direct(String),
    /// Group conversation.
    Group(String),
}

impl ConversationId {
    /// Creates a direct conversation key.
    #[must_use]
    pub fn direct(user_id: impl Into<String>) -> Self {
        Self::Direct(user_id.into())
    }

    /// Creates a group conversation key.
    #[must_use]
    pub fn group(group_id: impl Into<String>) -> Self {
        Self::Group(group_id.into())
    }

    /// Returns true for group conversations.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(id) => write!(f, "private:{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}

/// Identifies one request/response turn against the inference backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TurnId(Ulid);

impl TurnId {
    /// Creates a new turn ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn_{}", self.0)
    }
}
