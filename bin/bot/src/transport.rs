//! Chat transport boundary.
//!
//! Platform adapters turn their native events into [`InboundEvent`]s and
//! deliver [`Reply`]s through the [`Transport`] trait. [`ConsoleTransport`]
//! is a line-based adapter used by the `parley` binary.

use crate::error::TransportError;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use parley_conversation::UserMessage;
use parley_core::ConversationId;
use rootcause::Report;
use std::collections::HashSet;
use std::fmt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// A message received from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub is_group: bool,
    /// Group id for group chats. Unused for direct chats.
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub timestamp_millis: i64,
    pub text: String,
    /// Ids mentioned in the message.
    pub mentioned_ids: HashSet<String>,
    /// Platform id of this message, used to quote it in replies.
    pub raw_message_id: String,
    /// Sender's privilege level in the platform's permission model.
    pub authority: u8,
}

impl InboundEvent {
    /// Returns the store key: group id for groups, sender id otherwise.
    #[must_use]
    pub fn conversation(&self) -> ConversationId {
        if self.is_group {
            ConversationId::group(&self.conversation_id)
        } else {
            ConversationId::direct(&self.sender_id)
        }
    }

    /// Builds the trace record for this event.
    #[must_use]
    pub fn user_message(&self) -> UserMessage {
        UserMessage::new(
            &self.sender_id,
            &self.sender_name,
            format_timestamp(self.timestamp_millis),
            &self.text,
        )
    }

    /// Length of the text in characters.
    #[must_use]
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|time| {
            time.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| millis.to_string())
}

/// An outbound text reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message being answered, if the reply quotes one.
    pub quote: Option<String>,
    pub text: String,
}

impl Reply {
    /// A reply without a quote.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            quote: None,
            text: text.into(),
        }
    }

    /// A reply quoting `message_id`.
    #[must_use]
    pub fn quoting(message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            quote: Some(message_id.into()),
            text: text.into(),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.quote {
            Some(id) => write!(f, "[quote:{}] {}", id, self.text),
            None => write!(f, "{}", self.text),
        }
    }
}

/// Sink for replies.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers `reply` to `conversation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects or cannot receive the reply.
    async fn send(
        &self,
        conversation: &ConversationId,
        reply: &Reply,
    ) -> Result<(), Report<TransportError>>;
}

/// Line-based transport.
///
/// Each input line is a message from one local user. Lines starting with
/// `#group ` are posted to a group instead; `@name` words in them count as
/// mentions.
pub struct ConsoleTransport<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    user_id: String,
    group_id: String,
    authority: u8,
    sequence: Mutex<u64>,
}

impl ConsoleTransport<tokio::io::BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    /// A transport over the process's stdin and stdout.
    #[must_use]
    pub fn stdio(user_id: impl Into<String>, authority: u8) -> Self {
        Self::new(
            tokio::io::BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            user_id,
            authority,
        )
    }
}

impl<R, W> ConsoleTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// A transport reading lines from `input` as messages from `user_id`.
    #[must_use]
    pub fn new(input: R, output: W, user_id: impl Into<String>, authority: u8) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            user_id: user_id.into(),
            group_id: "console".to_string(),
            authority,
            sequence: Mutex::new(0),
        }
    }

    /// Reads the next non-empty line as an event; `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn recv(&self) -> Result<Option<InboundEvent>, Report<TransportError>> {
        let mut input = self.input.lock().await;
        loop {
            let mut line = String::new();
            let read = input
                .read_line(&mut line)
                .await
                .map_err(|e| TransportError::ReceiveFailed {
                    details: e.to_string(),
                })?;
            if read == 0 {
                return Ok(None);
            }
            let line = line.trim();
            if !line.is_empty() {
                return Ok(Some(self.event_from_line(line).await));
            }
        }
    }

    async fn event_from_line(&self, line: &str) -> InboundEvent {
        let mut sequence = self.sequence.lock().await;
        *sequence += 1;

        let (is_group, text) = match line.strip_prefix("#group ") {
            Some(rest) => (true, rest.trim()),
            None => (false, line),
        };
        let mentioned_ids = if is_group {
            text.split_whitespace()
                .filter_map(|word| word.strip_prefix('@'))
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            HashSet::new()
        };

        InboundEvent {
            is_group,
            conversation_id: self.group_id.clone(),
            sender_id: self.user_id.clone(),
            sender_name: self.user_id.clone(),
            timestamp_millis: Utc::now().timestamp_millis(),
            text: text.to_string(),
            mentioned_ids,
            raw_message_id: sequence.to_string(),
            authority: self.authority,
        }
    }

    /// Consumes the transport, returning the output sink.
    pub fn into_output(self) -> W {
        self.output.into_inner()
    }
}

#[async_trait]
impl<R, W> Transport for ConsoleTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(
        &self,
        conversation: &ConversationId,
        reply: &Reply,
    ) -> Result<(), Report<TransportError>> {
        let line = format!("{conversation} {reply}\n");
        let mut output = self.output.lock().await;
        output
            .write_all(line.as_bytes())
            .await
            .map_err(|e| TransportError::SendFailed {
                details: e.to_string(),
            })?;
        output.flush().await.map_err(|e| TransportError::SendFailed {
            details: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(is_group: bool) -> InboundEvent {
        InboundEvent {
            is_group,
            conversation_id: "g1".to_string(),
            sender_id: "u1".to_string(),
            sender_name: "alice".to_string(),
            timestamp_millis: 1_700_000_000_000,
            text: "héllo".to_string(),
            mentioned_ids: HashSet::new(),
            raw_message_id: "m1".to_string(),
            authority: 1,
        }
    }

    #[test]
    fn conversation_key_follows_kind() {
        assert_eq!(event(false).conversation(), ConversationId::direct("u1"));
        assert_eq!(event(true).conversation(), ConversationId::group("g1"));
    }

    #[test]
    fn text_len_counts_characters() {
        assert_eq!(event(false).text_len(), 5);
    }

    #[test]
    fn user_message_carries_sender() {
        let message = event(false).user_message();
        assert_eq!(message.id, "u1");
        assert_eq!(message.name, "alice");
        assert_eq!(message.msg, "héllo");
        assert!(!message.time.is_empty());
    }

    #[test]
    fn reply_renders_quote() {
        assert_eq!(Reply::quoting("m1", "hi").to_string(), "[quote:m1] hi");
        assert_eq!(Reply::text("hi").to_string(), "hi");
    }

    #[tokio::test]
    async fn console_reads_direct_and_group_lines() {
        let input: &[u8] = b"hello\n\n#group @parley what's up\n";
        let console = ConsoleTransport::new(input, Vec::new(), "me", 4);

        let direct = console.recv().await.expect("read").expect("event");
        assert!(!direct.is_group);
        assert_eq!(direct.text, "hello");
        assert_eq!(direct.raw_message_id, "1");

        let group = console.recv().await.expect("read").expect("event");
        assert!(group.is_group);
        assert!(group.mentioned_ids.contains("parley"));
        assert_eq!(group.text, "@parley what's up");
        assert_eq!(group.authority, 4);

        assert!(console.recv().await.expect("read").is_none());
    }

    #[tokio::test]
    async fn console_writes_replies() {
        let input: &[u8] = b"";
        let console = ConsoleTransport::new(input, Vec::new(), "me", 4);

        console
            .send(&ConversationId::direct("me"), &Reply::quoting("3", "hi"))
            .await
            .expect("send");

        let written = String::from_utf8(console.into_output()).expect("utf-8");
        assert_eq!(written, "private:me [quote:3] hi\n");
    }
}
