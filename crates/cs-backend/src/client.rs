//! Chat endpoint client with streamed replies.

use std::sync::Arc;
use std::time::Duration;

use cs_protocol::ChatRequest;
use reqwest::{Client, Response};

use crate::abort::{abortable, AbortHandle};
use crate::accumulator::StreamSummary;
use crate::auth::TokenProvider;
use crate::consume::consume_stream;
use crate::error::ChatError;
use crate::sink::StreamSink;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const STREAM_PATH: &str = "/chat/stream";

/// Timeouts for the underlying HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Whole-request limit, covering the streamed body.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Lifecycle of one streamed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Sending,
    Streaming,
    Completed,
    Failed,
}

impl StreamPhase {
    fn advance(&mut self, next: StreamPhase) {
        let from = *self;
        tracing::debug!(?from, to = ?next, "reply stream phase");
        *self = next;
    }
}

/// Build an HTTP client with appropriate timeouts and connection limits.
fn build_http_client(options: &ClientOptions) -> Result<Client, ChatError> {
    let client = Client::builder()
        .timeout(options.request_timeout)
        .connect_timeout(options.connect_timeout)
        .pool_max_idle_per_host(2)
        .build()?;
    Ok(client)
}

/// Client for the chat stream endpoint.
pub struct ChatClient {
    base_url: String,
    http: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl ChatClient {
    /// Create a client for `base_url` (e.g. `http://localhost:5000/api`).
    pub fn new(
        base_url: impl Into<String>,
        tokens: impl TokenProvider + 'static,
    ) -> Result<Self, ChatError> {
        Self::with_options(base_url, tokens, &ClientOptions::default())
    }

    pub fn with_options(
        base_url: impl Into<String>,
        tokens: impl TokenProvider + 'static,
        options: &ClientOptions,
    ) -> Result<Self, ChatError> {
        Ok(Self {
            base_url: base_url.into(),
            http: build_http_client(options)?,
            tokens: Arc::new(tokens),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stream_url(&self) -> String {
        format!("{}{STREAM_PATH}", self.base_url.trim_end_matches('/'))
    }

    /// Send `message` and stream the reply into `sink`.
    ///
    /// Returns once the transport reports end-of-stream. Failing to open the
    /// stream, a non-success status, or a broken transport calls
    /// `sink.on_error` at most once and returns `Err`.
    pub async fn send_message_stream<K>(
        &self,
        message: &str,
        sink: &mut K,
    ) -> Result<StreamSummary, ChatError>
    where
        K: StreamSink + ?Sized,
    {
        self.send_message_stream_with_abort(message, sink, &AbortHandle::new())
            .await
    }

    /// Like [`send_message_stream`](Self::send_message_stream), stopping with
    /// [`ChatError::Aborted`] when `abort` fires.
    pub async fn send_message_stream_with_abort<K>(
        &self,
        message: &str,
        sink: &mut K,
        abort: &AbortHandle,
    ) -> Result<StreamSummary, ChatError>
    where
        K: StreamSink + ?Sized,
    {
        let mut phase = StreamPhase::Idle;

        phase.advance(StreamPhase::Sending);
        let response = match self.open_stream(message, abort).await {
            Ok(response) => response,
            Err(e) => {
                phase.advance(StreamPhase::Failed);
                tracing::warn!(error = %e, "chat stream request failed");
                sink.on_error(&e.to_string());
                return Err(e);
            }
        };

        phase.advance(StreamPhase::Streaming);
        let body = abortable(Box::pin(response.bytes_stream()), abort.clone());
        match consume_stream(Box::pin(body), sink).await {
            Ok(summary) => {
                phase.advance(StreamPhase::Completed);
                Ok(summary)
            }
            Err(e) => {
                phase.advance(StreamPhase::Failed);
                tracing::warn!(error = %e, "chat stream broke");
                Err(e)
            }
        }
    }

    async fn open_stream(&self, message: &str, abort: &AbortHandle) -> Result<Response, ChatError> {
        let mut request = self
            .http
            .post(self.stream_url())
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .json(&ChatRequest::new(message));

        // Providers may shell out or read files; keep that off the runtime threads.
        let tokens = Arc::clone(&self.tokens);
        let token = tokio::select! {
            biased;
            _ = abort.aborted() => return Err(ChatError::Aborted),
            joined = tokio::task::spawn_blocking(move || tokens.token()) => joined
                .map_err(|e| ChatError::Transport(format!("token lookup failed: {e}")))?,
        };
        match token {
            Some(token) => request = request.bearer_auth(token),
            None => tracing::debug!("no auth token available, sending without authorization"),
        }

        let response = tokio::select! {
            biased;
            _ = abort.aborted() => return Err(ChatError::Aborted),
            result = request.send() => result?,
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = tokio::select! {
                biased;
                _ = abort.aborted() => return Err(ChatError::Aborted),
                text = response.text() => text.unwrap_or_default(),
            };
            return Err(ChatError::from_status(status, body));
        }

        Ok(response)
    }
}
