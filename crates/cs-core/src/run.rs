//! One-shot mode: send a message, stream the reply to the terminal, exit.

use std::io;

use cs_backend::{AbortHandle, ChatClient, ChatError, StreamSink, StreamSummary};

use crate::config::Config;
use crate::output::TerminalSink;

/// Build a client from configuration.
pub fn build_client(config: &Config) -> Result<ChatClient, ChatError> {
    ChatClient::with_options(
        config.base_url(),
        config.auth.token_provider(),
        &config.server.client_options(),
    )
}

/// Stream one reply into `sink`, aborting the transport on Ctrl-C.
pub async fn stream_reply<K>(
    client: &ChatClient,
    message: &str,
    sink: &mut K,
) -> Result<StreamSummary, ChatError>
where
    K: StreamSink + ?Sized,
{
    let abort = AbortHandle::new();
    let on_interrupt = abort.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received, aborting reply stream");
            on_interrupt.abort();
        }
    });

    let result = client
        .send_message_stream_with_abort(message, sink, &abort)
        .await;
    watcher.abort();
    result
}

/// Run one message and return the process exit code.
pub async fn run_message(config: &Config, message: &str) -> i32 {
    let client = match build_client(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: failed to build HTTP client: {e}");
            return 1;
        }
    };

    let mut sink = TerminalSink::new(io::stdout(), io::stderr());
    match stream_reply(&client, message, &mut sink).await {
        Ok(summary) => {
            tracing::debug!(chunks = summary.chunks, "reply finished");
            if sink.failed() {
                1
            } else {
                0
            }
        }
        Err(ChatError::Unauthorized) => {
            eprintln!("hint: log in again or set CHATSTREAM_TOKEN");
            1
        }
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_backend::RecordingSink;

    #[test]
    fn build_client_uses_configured_url() {
        let mut config = Config::default();
        config.server.base_url = "http://plants.local/api".to_string();
        if std::env::var(crate::config::API_URL_ENV).is_ok() {
            return;
        }
        let client = build_client(&config).unwrap();
        assert_eq!(client.stream_url(), "http://plants.local/api/chat/stream");
    }

    #[tokio::test]
    async fn stream_reply_reports_unreachable_server() {
        let mut config = Config::default();
        config.server.base_url = "http://127.0.0.1:9/api".to_string();
        config.server.connect_timeout_secs = 2;
        let client = ChatClient::with_options(
            config.server.base_url.clone(),
            cs_backend::StaticToken::none(),
            &config.server.client_options(),
        )
        .unwrap();

        let mut sink = RecordingSink::new();
        let result = stream_reply(&client, "hello", &mut sink).await;

        assert!(result.is_err());
        assert_eq!(sink.error_count(), 1);
    }
}
