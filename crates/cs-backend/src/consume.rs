//! Consumption of one reply stream: decode, frame, interpret.

use futures::{Stream, StreamExt};

use crate::accumulator::{ReplyAccumulator, StreamSummary};
use crate::error::ChatError;
use crate::frame::parse_frame;
use crate::lines::line_stream;
use crate::sink::StreamSink;

/// Consume a reply byte stream, driving `sink` until the transport ends.
///
/// In-band `complete` and `error` events do not stop consumption. A transport
/// failure reports through `on_error` (unless a terminal callback already
/// fired) and is returned as `Err`.
pub async fn consume_stream<S, B, E, K>(stream: S, sink: &mut K) -> Result<StreamSummary, ChatError>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Into<ChatError>,
    K: StreamSink + ?Sized,
{
    let mut lines = line_stream(stream);
    let mut accumulator = ReplyAccumulator::new();

    while let Some(line) = lines.next().await {
        match line {
            Ok(line) => {
                if let Some(event) = parse_frame(&line) {
                    tracing::trace!(kind = event.kind().as_str(), "stream event");
                    accumulator.apply(event, sink);
                }
            }
            Err(e) => {
                let err: ChatError = e.into();
                tracing::debug!(error = %err, "reply stream failed");
                accumulator.fail(&err.to_string(), sink);
                return Err(err);
            }
        }
    }

    Ok(accumulator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{fixtures, mock_transport, MockConfig, MockFrame, RecordingSink, SinkCall};

    async fn consume(config: MockConfig) -> (RecordingSink, Result<StreamSummary, ChatError>) {
        let mut sink = RecordingSink::new();
        let result = consume_stream(Box::pin(mock_transport(config)), &mut sink).await;
        (sink, result)
    }

    #[tokio::test]
    async fn full_reply_with_explicit_final() {
        let (sink, result) = consume(fixtures::reply(
            &["partial text", " more text"],
            Some("partial text more text"),
        ))
        .await;

        let summary = result.unwrap();
        assert_eq!(
            sink.calls,
            vec![
                SinkCall::Chunk("partial text".to_string()),
                SinkCall::Chunk(" more text".to_string()),
                SinkCall::Complete("partial text more text".to_string()),
            ]
        );
        assert_eq!(summary.chunks, 2);
    }

    #[tokio::test]
    async fn byte_sized_transport_chunks_give_same_calls() {
        let whole = consume(fixtures::reply(&["叶子", "发黄 🌿"], None)).await.0;
        for size in 1..8 {
            let split = consume(fixtures::reply(&["叶子", "发黄 🌿"], None).with_split(size))
                .await
                .0;
            assert_eq!(split.calls, whole.calls, "split size {size}");
        }
        assert_eq!(whole.completed(), Some("叶子发黄 🌿"));
    }

    #[tokio::test]
    async fn malformed_frame_between_chunks_is_skipped() {
        let config = MockConfig::new().with_frames(vec![
            MockFrame::Start,
            MockFrame::chunk("A"),
            MockFrame::raw(r#"data:{"type":"chunk","content":"#),
            MockFrame::chunk("B"),
            MockFrame::Complete { content: None },
        ]);
        let (sink, result) = consume(config).await;

        assert!(result.is_ok());
        assert_eq!(sink.chunks(), vec!["A", "B"]);
        assert_eq!(sink.error_count(), 0);
        assert_eq!(sink.completed(), Some("AB"));
    }

    #[tokio::test]
    async fn lines_without_prefix_invoke_nothing() {
        let config = MockConfig::new().with_frames(vec![
            MockFrame::raw(": keep-alive"),
            MockFrame::raw(r#"{"type":"chunk","content":"bare"}"#),
            MockFrame::raw(r#"event: {"type":"error","error":"x"}"#),
            MockFrame::raw(""),
        ]);
        let (sink, result) = consume(config).await;

        assert!(sink.calls.is_empty());
        assert_eq!(result.unwrap(), StreamSummary::default());
    }

    #[tokio::test]
    async fn spring_style_framing_is_understood() {
        let (sink, result) = consume(fixtures::spring_framed(&["Hel", "lo"])).await;
        assert!(result.is_ok());
        assert_eq!(sink.chunks(), vec!["Hel", "lo"]);
        assert_eq!(sink.completed(), Some("Hello"));
    }

    #[tokio::test]
    async fn end_of_stream_without_complete_is_not_an_error() {
        let config = MockConfig::new().with_frames(vec![MockFrame::Start, MockFrame::chunk("A")]);
        let (sink, result) = consume(config).await;

        let summary = result.unwrap();
        assert_eq!(sink.calls, vec![SinkCall::Chunk("A".to_string())]);
        assert_eq!(summary.completed, None);
        assert_eq!(summary.content, "A");
    }

    #[tokio::test]
    async fn in_band_error_runs_to_transport_end() {
        let config = MockConfig::new().with_frames(vec![
            MockFrame::Start,
            MockFrame::error("description"),
            MockFrame::chunk("late"),
        ]);
        let (sink, result) = consume(config).await;

        let summary = result.unwrap();
        assert_eq!(sink.calls, vec![SinkCall::Error("description".to_string())]);
        assert_eq!(summary.error.as_deref(), Some("description"));
        assert_eq!(summary.content, "late");
    }

    #[tokio::test]
    async fn transport_failure_reports_once_and_fails() {
        let (sink, result) = consume(fixtures::fail_mid_stream(&["A"], "connection reset")).await;

        let err = result.unwrap_err();
        assert!(matches!(err, ChatError::Transport(_)));
        assert_eq!(sink.chunks(), vec!["A"]);
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.errors()[0], err.to_string());
    }

    #[tokio::test]
    async fn in_band_error_then_transport_failure_fires_on_error_once() {
        let config = MockConfig::new().with_frames(vec![
            MockFrame::Start,
            MockFrame::error("model unavailable"),
            MockFrame::fail("socket closed"),
        ]);
        let (sink, result) = consume(config).await;

        assert!(result.is_err());
        assert_eq!(sink.errors(), vec!["model unavailable"]);
    }

    #[tokio::test]
    async fn partial_frame_at_end_is_dropped() {
        let config = MockConfig::new().with_frames(vec![
            MockFrame::chunk("A"),
            MockFrame::unterminated(r#"data:{"type":"complete","content":"X"}"#),
        ]);
        let (sink, result) = consume(config).await;

        assert!(result.is_ok());
        assert_eq!(sink.calls, vec![SinkCall::Chunk("A".to_string())]);
    }
}
