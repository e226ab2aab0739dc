//! Turn orchestration.
//!
//! [`ChatService`] decides what to do with each inbound message: record it,
//! reject it as too long, or run a full request against the backend and
//! reconcile the conversation history with the outcome.
//!
//! Turns within one conversation are serialized by holding the context lock
//! from trace until the pending request is settled. Different conversations
//! run independently.

use crate::command::ResetCommand;
use crate::config::{ChatConfig, Replies};
use crate::error::TransportError;
use crate::transport::{InboundEvent, Reply, Transport};
use parley_ai::{ChatBackend, ChatRequest, LlmError};
use parley_conversation::ConversationStore;
use parley_core::TurnId;
use rootcause::Report;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// What a handled message produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Recorded (or not) without a reply.
    Ignored,
    /// A reply to send back.
    Replied(Reply),
}

/// The chat subsystem: conversation store plus backend.
pub struct ChatService<B> {
    backend: B,
    store: ConversationStore,
    config: ChatConfig,
    replies: Replies,
}

impl<B: ChatBackend> ChatService<B> {
    /// Creates a service with an empty conversation store.
    #[must_use]
    pub fn new(backend: B, config: ChatConfig, replies: Replies) -> Self {
        Self {
            backend,
            store: ConversationStore::new(),
            config,
            replies,
        }
    }

    /// Returns the conversation store.
    #[must_use]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Routes an inbound event to the reset command or the turn handler and
    /// sends whatever reply results.
    ///
    /// # Errors
    ///
    /// Returns an error only if the reply cannot be delivered.
    pub async fn dispatch<T: Transport + ?Sized>(
        &self,
        event: &InboundEvent,
        transport: &T,
    ) -> Result<(), Report<TransportError>> {
        let reply = if ResetCommand::matches(&event.text) {
            Some(self.reset(event).await)
        } else {
            match self.handle(event).await {
                TurnOutcome::Replied(reply) => Some(reply),
                TurnOutcome::Ignored => None,
            }
        };

        match reply {
            Some(reply) => transport.send(&event.conversation(), &reply).await,
            None => Ok(()),
        }
    }

    /// Handles one chat message.
    pub async fn handle(&self, event: &InboundEvent) -> TurnOutcome {
        let conversation = event.conversation();
        let turn = TurnId::new();
        let span = info_span!("turn", %turn, %conversation, sender = %event.sender_id);
        self.run_turn(event).instrument(span).await
    }

    async fn run_turn(&self, event: &InboundEvent) -> TurnOutcome {
        let mut context = self.store.lock(&event.conversation()).await;

        let too_long = event.text_len() > self.config.too_long_threshold;
        if !too_long {
            context.trace(event.user_message());
            debug!(pending = context.pending().len(), "traced message");
        }

        if !self.is_triggered(event) {
            return TurnOutcome::Ignored;
        }

        if too_long {
            info!(
                length = event.text_len(),
                threshold = self.config.too_long_threshold,
                "rejected message as too long"
            );
            return TurnOutcome::Replied(Reply::text(&self.replies.too_long));
        }

        let pending = match context.prepare_request() {
            Ok(pending) => pending,
            Err(report) => {
                error!(error = ?report, "failed to prepare request");
                return TurnOutcome::Replied(Reply::text(&self.replies.unknown_error));
            }
        };

        let request = ChatRequest::new(&self.config.chat_model_name, pending.messages());
        let result = tokio::time::timeout(self.config.request_timeout(), self.backend.chat(&request))
            .await
            .unwrap_or_else(|_| Err(LlmError::Timeout.into()));

        match result {
            Ok(response) => {
                let text = response.message.content().to_string();
                pending.finish(response.message);
                info!(history = context.history().len(), "turn completed");
                TurnOutcome::Replied(Reply::quoting(&event.raw_message_id, text))
            }
            Err(report) => {
                pending.cancel();
                TurnOutcome::Replied(Reply::text(self.failure_reply(&report)))
            }
        }
    }

    fn is_triggered(&self, event: &InboundEvent) -> bool {
        !event.is_group
            || event.mentioned_ids.contains(&self.config.bot_id)
            || event.text.starts_with(&self.config.bot_name)
    }

    fn failure_reply(&self, report: &Report<LlmError>) -> &str {
        match report.current_context() {
            LlmError::ConnectTimeout { endpoint } => {
                warn!(%endpoint, "backend connection timed out");
                &self.replies.connect_timeout
            }
            LlmError::ConnectionRefused { endpoint } => {
                warn!(%endpoint, "backend refused connection");
                &self.replies.connection_refused
            }
            _ => {
                error!(error = ?report, "backend call failed");
                &self.replies.unknown_error
            }
        }
    }

    /// Runs `resetChat` for `caller`.
    ///
    /// Resetting another user's conversation requires the configured
    /// authority. Resetting a conversation that does not exist succeeds.
    pub async fn reset(&self, caller: &InboundEvent) -> Reply {
        let command = match ResetCommand::parse(&caller.text) {
            Ok(command) => command,
            Err(report) => {
                debug!(error = %report, "invalid reset command");
                return Reply::text(&self.replies.invalid_command);
            }
        };

        if command.targets_other(caller) && caller.authority < self.config.reset_authority {
            warn!(
                sender = %caller.sender_id,
                authority = caller.authority,
                required = self.config.reset_authority,
                "reset denied"
            );
            return Reply::text(&self.replies.permission_denied);
        }

        let target = command.resolve(caller);
        self.store.reset(&target).await;
        Reply::text(self.replies.reset_success(&target.to_string()))
    }
}
