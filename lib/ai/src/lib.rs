//! Inference backend access for parley.
//!
//! - **Backend**: the [`ChatBackend`] trait the bot drives, plus the
//!   request/response shapes it exchanges
//! - **Ollama**: a reqwest-based [`OllamaBackend`] speaking `/api/chat`
//!
//! Failures are reported as [`LlmError`] so callers can tell a refused or
//! timed-out connection apart from everything else.

pub mod backend;
pub mod error;
pub mod ollama;

pub use backend::{ChatBackend, ChatRequest, ChatResponse};
pub use error::LlmError;
pub use ollama::{DEFAULT_ENDPOINT, OllamaBackend};
