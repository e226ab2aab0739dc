//! Ollama chat backend.
//!
//! Posts [`ChatRequest`]s to `{endpoint}/api/chat` and classifies transport
//! failures so the bot can tell users why a reply did not arrive.

use crate::backend::{ChatBackend, ChatRequest, ChatResponse};
use crate::error::LlmError;
use async_trait::async_trait;
use parley_core::MessageRole;
use rootcause::Report;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default Ollama endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Chat backend talking to an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    endpoint: String,
    chat_url: String,
}

impl OllamaBackend {
    /// Creates a backend for `endpoint`.
    ///
    /// `connect_timeout` bounds connection establishment only; bounding the
    /// whole call is left to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        endpoint: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, Report<LlmError>> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;
        let chat_url = format!("{}/api/chat", endpoint.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            chat_url,
        })
    }
}

/// Maps a failed send to the error callers branch on.
///
/// Connect failures are split into timeouts and refusals; a timeout after
/// the connection was up is [`LlmError::Timeout`].
fn classify(
    endpoint: &str,
    connect: bool,
    timeout: bool,
    error: &(dyn std::error::Error + 'static),
) -> LlmError {
    if connect {
        if timeout {
            return LlmError::ConnectTimeout {
                endpoint: endpoint.to_string(),
            };
        }
        if is_connection_refused(error) {
            return LlmError::ConnectionRefused {
                endpoint: endpoint.to_string(),
            };
        }
    } else if timeout {
        return LlmError::Timeout;
    }
    LlmError::RequestFailed {
        reason: error.to_string(),
    }
}

/// Walks the source chain looking for a refused TCP connect.
fn is_connection_refused(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(error);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>()
            && io.kind() == std::io::ErrorKind::ConnectionRefused
        {
            return true;
        }
        source = err.source();
    }
    false
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    #[instrument(skip(self, request), fields(model = request.model, messages = request.messages.len()))]
    async fn chat(&self, request: &ChatRequest<'_>) -> Result<ChatResponse, Report<LlmError>> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let classified = classify(&self.endpoint, e.is_connect(), e.is_timeout(), &e);
                warn!(error = %e, endpoint = %self.endpoint, "chat request failed");
                classified
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "chat endpoint returned error");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let reply: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        if reply.message.role() != MessageRole::Assistant {
            return Err(LlmError::ResponseParseFailed {
                reason: format!("expected assistant reply, got {:?}", reply.message.role()),
            }
            .into());
        }

        debug!(chars = reply.message.content().len(), "chat reply received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::Message;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(endpoint: &str) -> OllamaBackend {
        OllamaBackend::new(endpoint, Duration::from_secs(2)).expect("client")
    }

    #[tokio::test]
    async fn posts_history_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3",
                "stream": false,
                "messages": [{"role": "user", "content": "hello"}],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3",
                "message": {"role": "assistant", "content": "hi"},
                "done": true,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let history = vec![Message::user("hello")];
        let reply = backend(&server.uri())
            .chat(&ChatRequest::new("llama3", &history))
            .await
            .expect("chat should succeed");

        assert_eq!(reply.message, Message::assistant("hi"));
    }

    #[tokio::test]
    async fn trailing_slash_in_endpoint_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "ok"},
            })))
            .mount(&server)
            .await;

        let history = vec![Message::user("ping")];
        let reply = backend(&format!("{}/", server.uri()))
            .chat(&ChatRequest::new("llama3", &history))
            .await
            .expect("chat should succeed");

        assert_eq!(reply.message.content(), "ok");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let history = vec![Message::user("hello")];
        let err = backend(&server.uri())
            .chat(&ChatRequest::new("missing", &history))
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &LlmError::Status {
                status: 404,
                body: "model not found".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn user_role_reply_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "user", "content": "echo"},
            })))
            .mount(&server)
            .await;

        let history = vec![Message::user("hello")];
        let err = backend(&server.uri())
            .chat(&ChatRequest::new("llama3", &history))
            .await
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            LlmError::ResponseParseFailed { .. }
        ));
    }

    #[test]
    fn connect_phase_timeout_is_distinguished() {
        let cause = std::io::Error::new(std::io::ErrorKind::TimedOut, "operation timed out");

        assert_eq!(
            classify("http://localhost:11434", true, true, &cause),
            LlmError::ConnectTimeout {
                endpoint: "http://localhost:11434".to_string(),
            }
        );
        assert_eq!(
            classify("http://localhost:11434", false, true, &cause),
            LlmError::Timeout
        );
    }

    #[test]
    fn refusal_is_found_in_source_chain() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(
            classify("http://localhost:11434", true, false, &cause),
            LlmError::ConnectionRefused {
                endpoint: "http://localhost:11434".to_string(),
            }
        );

        let other = std::io::Error::other("reset by peer");
        assert!(matches!(
            classify("http://localhost:11434", true, false, &other),
            LlmError::RequestFailed { .. }
        ));
    }

    #[tokio::test]
    async fn refused_connection_is_classified() {
        // Bind then drop to get a local port with nothing listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let endpoint = format!("http://127.0.0.1:{port}");

        let history = vec![Message::user("hello")];
        let err = backend(&endpoint)
            .chat(&ChatRequest::new("llama3", &history))
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &LlmError::ConnectionRefused { endpoint }
        );
    }
}
