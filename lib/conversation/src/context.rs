//! Per-conversation context.
//!
//! A context holds two things:
//!
//! - the *history*: the request/response transcript actually sent to the
//!   backend, which only changes through a [`PendingRequest`]
//! - the *trace buffer*: inbound messages seen since the last request
//!
//! Direct chats remember only the latest inbound message. Group chats keep up
//! to [`GROUP_PENDING_CAPACITY`] messages so that when someone finally
//! addresses the bot, the model sees what the group was talking about.

use crate::error::ConversationError;
use crate::message::UserMessage;
use parley_core::Message;
use rootcause::Report;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Maximum number of traced messages a group context keeps.
pub const GROUP_PENDING_CAPACITY: usize = 100;

/// Conversation state for one direct or group chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationContext {
    /// One-to-one chat.
    Direct {
        history: Vec<Message>,
        pending: Option<UserMessage>,
    },
    /// Group chat.
    Group {
        history: Vec<Message>,
        pending: VecDeque<UserMessage>,
    },
}

impl ConversationContext {
    /// Creates an empty context of the variant matching `is_group`.
    #[must_use]
    pub fn new(is_group: bool) -> Self {
        if is_group {
            Self::group()
        } else {
            Self::direct()
        }
    }

    /// Creates an empty direct-chat context.
    #[must_use]
    pub fn direct() -> Self {
        Self::Direct {
            history: Vec::new(),
            pending: None,
        }
    }

    /// Creates an empty group-chat context.
    #[must_use]
    pub fn group() -> Self {
        Self::Group {
            history: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Returns true for group-chat contexts.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }

    /// Returns the transcript, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        match self {
            Self::Direct { history, .. } | Self::Group { history, .. } => history,
        }
    }

    /// Returns the traced messages not yet answered, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<&UserMessage> {
        match self {
            Self::Direct { pending, .. } => pending.iter().collect(),
            Self::Group { pending, .. } => pending.iter().collect(),
        }
    }

    /// Records an inbound message.
    pub fn trace(&mut self, message: UserMessage) {
        match self {
            Self::Direct { pending, .. } => *pending = Some(message),
            Self::Group { pending, .. } => {
                pending.push_back(message);
                while pending.len() > GROUP_PENDING_CAPACITY {
                    pending.pop_front();
                }
            }
        }
    }

    /// Appends the encoded trace buffer to the history as a user turn.
    ///
    /// The returned guard must be settled with [`PendingRequest::finish`] or
    /// [`PendingRequest::cancel`]; dropping it unsettled rolls back.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the history untouched, if nothing has been
    /// traced or the trace buffer cannot be encoded.
    pub fn prepare_request(&mut self) -> Result<PendingRequest<'_>, Report<ConversationError>> {
        let encoded = match &*self {
            Self::Direct { pending, .. } => {
                let message = pending.as_ref().ok_or(ConversationError::NothingPending)?;
                serde_json::to_string(message)
            }
            Self::Group { pending, .. } => {
                if pending.is_empty() {
                    return Err(ConversationError::NothingPending.into());
                }
                serde_json::to_string(pending)
            }
        }
        .map_err(|e| ConversationError::EncodeFailed {
            reason: e.to_string(),
        })?;

        self.history_mut().push(Message::user(encoded));
        debug!(history = self.history().len(), "prepared request");

        Ok(PendingRequest {
            context: self,
            settled: false,
        })
    }

    fn history_mut(&mut self) -> &mut Vec<Message> {
        match self {
            Self::Direct { history, .. } | Self::Group { history, .. } => history,
        }
    }

    fn commit(&mut self, reply: Message) {
        match self {
            Self::Direct { history, .. } => history.push(reply),
            Self::Group { history, pending } => {
                history.push(reply);
                pending.clear();
            }
        }
    }

    fn rollback(&mut self) {
        self.history_mut().pop();
    }
}

/// An in-flight request against a context's history.
///
/// Holds the context mutably, so no other request can be prepared on it
/// until this one is settled.
#[derive(Debug)]
#[must_use = "a pending request must be finished or cancelled"]
pub struct PendingRequest<'a> {
    context: &'a mut ConversationContext,
    settled: bool,
}

impl PendingRequest<'_> {
    /// Returns the history to send, including the just-appended user turn.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.context.history()
    }

    /// Records the backend's reply.
    ///
    /// Group contexts also drop their trace buffer, which the reply answered.
    pub fn finish(mut self, reply: Message) {
        self.settled = true;
        self.context.commit(reply);
    }

    /// Removes the speculative user turn, restoring the history.
    pub fn cancel(mut self) {
        self.settled = true;
        self.context.rollback();
    }
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("pending request dropped without being settled, rolling back");
            self.context.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(n: usize) -> UserMessage {
        UserMessage::new(
            format!("u{n}"),
            format!("user {n}"),
            "2024-01-01 00:00:00",
            format!("message {n}"),
        )
    }

    #[test]
    fn new_picks_variant() {
        assert!(ConversationContext::new(true).is_group());
        assert!(!ConversationContext::new(false).is_group());
    }

    #[test]
    fn direct_trace_keeps_only_latest() {
        let mut context = ConversationContext::direct();
        context.trace(user(1));
        context.trace(user(2));

        assert_eq!(context.pending(), vec![&user(2)]);
    }

    #[test]
    fn group_trace_evicts_oldest_past_capacity() {
        let mut context = ConversationContext::group();
        for n in 0..=GROUP_PENDING_CAPACITY {
            context.trace(user(n));
        }

        let pending = context.pending();
        assert_eq!(pending.len(), GROUP_PENDING_CAPACITY);
        assert!(!pending.contains(&&user(0)));
        assert_eq!(pending[0], &user(1));
        assert_eq!(pending[GROUP_PENDING_CAPACITY - 1], &user(GROUP_PENDING_CAPACITY));
    }

    #[test]
    fn direct_prepare_encodes_single_record() {
        let mut context = ConversationContext::direct();
        context.trace(user(1));

        let request = context.prepare_request().expect("prepare");
        let messages = request.messages();
        assert_eq!(messages.len(), 1);

        let decoded: UserMessage =
            serde_json::from_str(messages[0].content()).expect("single record");
        assert_eq!(decoded, user(1));
        request.cancel();
    }

    #[test]
    fn group_prepare_encodes_whole_buffer() {
        let mut context = ConversationContext::group();
        for n in 0..4 {
            context.trace(user(n));
        }

        let request = context.prepare_request().expect("prepare");
        let decoded: Vec<UserMessage> =
            serde_json::from_str(request.messages()[0].content()).expect("record array");
        assert_eq!(decoded, (0..4).map(user).collect::<Vec<_>>());
        request.cancel();
    }

    #[test]
    fn finish_appends_reply() {
        let mut context = ConversationContext::direct();
        context.trace(user(1));

        context
            .prepare_request()
            .expect("prepare")
            .finish(Message::assistant("hi"));

        assert_eq!(context.history().len(), 2);
        assert_eq!(context.history()[1], Message::assistant("hi"));
        // Direct contexts keep the consumed message.
        assert_eq!(context.pending(), vec![&user(1)]);
    }

    #[test]
    fn group_finish_clears_pending() {
        let mut context = ConversationContext::group();
        context.trace(user(1));
        context.trace(user(2));

        context
            .prepare_request()
            .expect("prepare")
            .finish(Message::assistant("hi"));

        assert!(context.pending().is_empty());
        assert_eq!(context.history().len(), 2);
    }

    #[test]
    fn cancel_restores_history() {
        let mut context = ConversationContext::group();
        context.trace(user(1));
        context
            .prepare_request()
            .expect("prepare")
            .finish(Message::assistant("first"));
        let before = context.clone();

        context.trace(user(2));
        context.prepare_request().expect("prepare").cancel();

        assert_eq!(context.history(), before.history());
        // The traced message survives for the next attempt.
        assert_eq!(context.pending(), vec![&user(2)]);
    }

    #[test]
    fn dropping_unsettled_request_rolls_back() {
        let mut context = ConversationContext::direct();
        context.trace(user(1));
        {
            let _request = context.prepare_request().expect("prepare");
        }
        assert!(context.history().is_empty());
    }

    #[test]
    fn prepare_without_trace_fails_cleanly() {
        let mut direct = ConversationContext::direct();
        let err = direct.prepare_request().unwrap_err();
        assert_eq!(err.current_context(), &ConversationError::NothingPending);

        let mut group = ConversationContext::group();
        assert!(group.prepare_request().is_err());
        assert!(group.history().is_empty());
    }

    #[test]
    fn history_is_twice_successful_turns() {
        let mut context = ConversationContext::direct();
        for n in 0..5 {
            context.trace(user(n));
            let request = context.prepare_request().expect("prepare");
            if n % 2 == 0 {
                request.finish(Message::assistant(format!("reply {n}")));
            } else {
                request.cancel();
            }
        }
        assert_eq!(context.history().len(), 2 * 3);
    }
}
