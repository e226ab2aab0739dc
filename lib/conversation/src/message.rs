//! Trace records for inbound chat messages.

use serde::{Deserialize, Serialize};

/// An inbound message as remembered in a context's trace buffer.
///
/// Field names are the JSON keys the model sees when pending messages are
/// encoded into a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    /// Sender identifier.
    pub id: String,
    /// Sender display name.
    pub name: String,
    /// Formatted send time.
    pub time: String,
    /// Raw text.
    pub msg: String,
}

impl UserMessage {
    /// Creates a trace record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        time: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            time: time.into(),
            msg: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_short_keys() {
        let message = UserMessage::new("42", "alice", "2024-01-01 12:00:00", "hello");
        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "id": "42",
                "name": "alice",
                "time": "2024-01-01 12:00:00",
                "msg": "hello",
            })
        );
    }
}
