//! Chat backend abstraction.
//!
//! A backend takes the full ordered transcript of a conversation and a model
//! name and returns a single assistant reply. Streaming is never requested.

use crate::error::LlmError;
use async_trait::async_trait;
use parley_core::Message;
use rootcause::Report;
use serde::{Deserialize, Serialize};

/// A non-streaming chat request.
///
/// Borrows the transcript so the caller's history is sent without copying.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    /// Model to run.
    pub model: &'a str,
    /// Transcript, oldest first.
    pub messages: &'a [Message],
    /// Always false.
    pub stream: bool,
}

impl<'a> ChatRequest<'a> {
    /// Creates a request for `model` over `messages`.
    #[must_use]
    pub fn new(model: &'a str, messages: &'a [Message]) -> Self {
        Self {
            model,
            messages,
            stream: false,
        }
    }
}

/// A backend reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    /// The assistant's message.
    pub message: Message,
}

impl ChatResponse {
    /// Creates a response wrapping `message`.
    #[must_use]
    pub fn new(message: Message) -> Self {
        Self { message }
    }
}

/// Trait for chat backends.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends the transcript and waits for the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails; the report's context classifies
    /// the cause.
    async fn chat(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, Report<LlmError>>;
}
