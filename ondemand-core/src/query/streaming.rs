//! Streaming query responses
//!
//! The body is a sequence of text lines. Lines beginning with `data:` carry
//! one JSON event each, and a `data: [DONE]` line marks the logical end of the
//! feed. Bytes arrive in chunks whose boundaries are a transport artifact, so
//! the aggregator is fed raw chunks and decides itself where lines end.
//!
//! Two line assembly strategies exist:
//!
//! - [`LineAssembly::Buffered`] keeps the unterminated tail of each chunk and
//!   prepends it to the next one, so a line split across chunks is rebuilt
//!   intact. UTF-8 is decoded per complete line.
//! - [`LineAssembly::PerChunk`] splits every chunk on its own. A line cut by a
//!   chunk boundary is seen as two fragments; the fragment holding `data:` is
//!   usually invalid JSON and gets dropped. Kept for parity with clients that
//!   read this way.
//!
//! In both strategies `[DONE]` only ends the lines of the chunk it arrived in.
//! Chunks already in flight after it are still read until the body closes.
//!
//! Malformed frames never abort aggregation; they are counted and skipped.

use std::ops::ControlFlow;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use super::sync::QUERY_OK;
use crate::error::{ClientError, ClientResult};
use crate::http::StreamingResponse;
use crate::protocol::types::{StreamedData, StreamedDocument};
use crate::protocol::{
    ContextField, FinalResponse, StreamEvent, STREAM_COMPLETED_MESSAGE, STREAM_COMPLETED_STATUS,
};

/// Prefix of an event frame line
pub const DATA_PREFIX: &str = "data:";

/// Payload marking the end of the event feed
pub const DONE_SENTINEL: &str = "[DONE]";

/// How chunk bytes are cut into lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineAssembly {
    /// Reassemble lines across chunk boundaries
    #[default]
    Buffered,
    /// Split each chunk independently
    PerChunk,
}

/// Running result of a streamed query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedResult {
    /// Every `fulfillment` answer slice, concatenated in arrival order
    pub answer: String,
    /// Last non-empty `sessionId`
    pub session_id: String,
    /// Last non-empty `messageId`
    pub message_id: String,
    /// Last non-empty `publicMetrics`
    pub metrics: Map<String, Value>,
}

impl AggregatedResult {
    /// Merge one event into the running result
    pub fn absorb(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Fulfillment {
                answer,
                session_id,
                message_id,
            } => {
                if let Some(answer) = answer {
                    self.answer.push_str(&answer);
                }
                if let Some(session_id) = session_id.filter(|id| !id.is_empty()) {
                    self.session_id = session_id;
                }
                if let Some(message_id) = message_id.filter(|id| !id.is_empty()) {
                    self.message_id = message_id;
                }
            }
            StreamEvent::MetricsLog { public_metrics } => {
                if let Some(metrics) = public_metrics.filter(|m| !m.is_empty()) {
                    self.metrics = metrics;
                }
            }
            StreamEvent::Other => {}
        }
    }

    /// Freeze into the printed document
    pub fn into_final_response(
        self,
        context_metadata: &[ContextField],
    ) -> ClientResult<FinalResponse> {
        let document = StreamedDocument {
            message: STREAM_COMPLETED_MESSAGE,
            data: StreamedData {
                session_id: &self.session_id,
                message_id: &self.message_id,
                answer: &self.answer,
                metrics: &self.metrics,
                status: STREAM_COMPLETED_STATUS,
                context_metadata,
            },
        };

        let document = serde_json::to_value(&document).map_err(|source| ClientError::Encode {
            what: "streamed response",
            source,
        })?;
        Ok(FinalResponse::new(document))
    }
}

/// Incremental parser for a chunked event feed
#[derive(Debug)]
pub struct StreamAggregator {
    assembly: LineAssembly,
    /// Bytes after the last newline seen, buffered mode only
    residual: Vec<u8>,
    result: AggregatedResult,
    frames: usize,
    skipped: usize,
}

impl Default for StreamAggregator {
    fn default() -> Self {
        Self::new(LineAssembly::default())
    }
}

impl StreamAggregator {
    pub fn new(assembly: LineAssembly) -> Self {
        Self {
            assembly,
            residual: Vec::new(),
            result: AggregatedResult::default(),
            frames: 0,
            skipped: 0,
        }
    }

    /// Result so far
    pub fn result(&self) -> &AggregatedResult {
        &self.result
    }

    /// Number of `data:` frames decoded
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of `data:` frames dropped as malformed
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Feed one transport chunk
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        match self.assembly {
            LineAssembly::PerChunk => {
                let text = String::from_utf8_lossy(chunk);
                for line in text.split('\n') {
                    if self.process_line(line).is_break() {
                        break;
                    }
                }
            }
            LineAssembly::Buffered => {
                // Earlier bytes of the residual hold no newline
                let searched = self.residual.len();
                self.residual.extend_from_slice(chunk);
                let Some(last_newline) = chunk
                    .iter()
                    .rposition(|b| *b == b'\n')
                    .map(|at| searched + at)
                else {
                    return;
                };

                let complete: Vec<u8> = self.residual.drain(..=last_newline).collect();
                // The trailing newline yields one empty slice, which is ignored.
                for raw in complete.split(|b| *b == b'\n') {
                    let line = String::from_utf8_lossy(raw);
                    if self.process_line(&line).is_break() {
                        break;
                    }
                }
            }
        }
    }

    /// End of body: flush any unterminated line and return the result
    pub fn finish(mut self) -> AggregatedResult {
        if !self.residual.is_empty() {
            let rest = std::mem::take(&mut self.residual);
            let line = String::from_utf8_lossy(&rest);
            let _ = self.process_line(&line);
        }

        debug!(
            "Stream finished: {} frames, {} skipped, {} answer bytes",
            self.frames,
            self.skipped,
            self.result.answer.len()
        );
        self.result
    }

    fn process_line(&mut self, line: &str) -> ControlFlow<()> {
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return ControlFlow::Continue(());
        };
        let payload = payload.trim();

        if payload == DONE_SENTINEL {
            trace!("Received {} sentinel", DONE_SENTINEL);
            return ControlFlow::Break(());
        }

        let event = serde_json::from_str::<Value>(payload)
            .ok()
            .and_then(|frame| StreamEvent::from_value(&frame));

        match event {
            Some(event) => {
                self.frames += 1;
                self.result.absorb(event);
            }
            None => {
                self.skipped += 1;
                trace!("Skipping malformed frame: {}", payload);
            }
        }
        ControlFlow::Continue(())
    }
}

/// Consume a streaming response to the end
///
/// A non-200 status is reported with its full body and nothing is aggregated.
pub async fn aggregate_stream(
    response: StreamingResponse,
    assembly: LineAssembly,
) -> ClientResult<AggregatedResult> {
    if response.status != QUERY_OK {
        let status = response.status;
        warn!("Stream query returned {}", status);
        let body = response.into_text().await?;
        return Err(ClientError::QueryRejected {
            mode: "stream",
            status,
            body,
        });
    }

    let mut aggregator = StreamAggregator::new(assembly);
    let mut body = response.body;
    while let Some(chunk) = body.next().await {
        aggregator.push_chunk(&chunk?);
    }

    Ok(aggregator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::TransportError;
    use bytes::Bytes;
    use futures::stream;
    use serde_json::json;

    fn aggregate(assembly: LineAssembly, chunks: &[&str]) -> AggregatedResult {
        let mut aggregator = StreamAggregator::new(assembly);
        for chunk in chunks {
            aggregator.push_chunk(chunk.as_bytes());
        }
        aggregator.finish()
    }

    fn both(chunks: &[&str]) -> AggregatedResult {
        let buffered = aggregate(LineAssembly::Buffered, chunks);
        let per_chunk = aggregate(LineAssembly::PerChunk, chunks);
        assert_eq!(buffered, per_chunk, "strategies disagree on {chunks:?}");
        buffered
    }

    #[test]
    fn test_hi_there() {
        let body = concat!(
            "data: {\"eventType\":\"fulfillment\",\"answer\":\"Hi \"}\n",
            "data: {\"eventType\":\"fulfillment\",\"answer\":\"there\"}\n",
            "data: [DONE]\n"
        );
        assert_eq!(both(&[body]).answer, "Hi there");
    }

    #[test]
    fn test_line_aligned_chunks() {
        let result = both(&[
            "data: {\"eventType\":\"fulfillment\",\"answer\":\"Hel\",\"sessionId\":\"s1\"}\n",
            "data: {\"eventType\":\"fulfillment\",\"answer\":\"lo\",\"messageId\":\"m1\"}\n",
            "data: {\"eventType\":\"metricsLog\",\"publicMetrics\":{\"inputTokens\":3}}\n",
            "data: [DONE]\n",
        ]);

        assert_eq!(result.answer, "Hello");
        assert_eq!(result.session_id, "s1");
        assert_eq!(result.message_id, "m1");
        assert_eq!(Value::Object(result.metrics), json!({"inputTokens": 3}));
    }

    #[test]
    fn test_last_non_empty_identifiers_win() {
        let result = both(&[concat!(
            "data: {\"eventType\":\"fulfillment\",\"sessionId\":\"s1\",\"messageId\":\"m1\"}\n",
            "data: {\"eventType\":\"fulfillment\",\"sessionId\":\"s2\",\"messageId\":\"\"}\n",
            "data: {\"eventType\":\"fulfillment\",\"sessionId\":\"\",\"messageId\":null}\n",
            "data: {\"eventType\":\"metricsLog\",\"publicMetrics\":{\"a\":1}}\n",
            "data: {\"eventType\":\"metricsLog\",\"publicMetrics\":{}}\n",
            "data: {\"eventType\":\"metricsLog\"}\n",
        )]);

        assert_eq!(result.session_id, "s2");
        assert_eq!(result.message_id, "m1");
        assert_eq!(Value::Object(result.metrics), json!({"a": 1}));
    }

    #[test]
    fn test_non_data_lines_ignored() {
        let result = both(&[concat!(
            ": keep-alive\n",
            "event: fulfillment\n",
            "id: 7\n",
            " data: {\"eventType\":\"fulfillment\",\"answer\":\"indented\"}\n",
            "{\"eventType\":\"fulfillment\",\"answer\":\"bare\"}\n",
            "\n",
            "data: {\"eventType\":\"fulfillment\",\"answer\":\"ok\"}\n",
        )]);
        assert_eq!(result.answer, "ok");
    }

    #[test]
    fn test_malformed_frames_skipped() {
        let mut aggregator = StreamAggregator::new(LineAssembly::Buffered);
        aggregator.push_chunk(
            concat!(
                "data: {\"eventType\":\"fulfillment\",\"answer\":\"a\"}\n",
                "data: {not json}\n",
                "data: 42\n",
                "data: {\"answer\":\"no type\"}\n",
                "data: {\"eventType\":\"fulfillment\",\"answer\":7}\n",
                "data: {\"eventType\":\"fulfillment\",\"answer\":\"b\"}\n",
            )
            .as_bytes(),
        );

        assert_eq!(aggregator.frames(), 3);
        assert_eq!(aggregator.skipped(), 3);
        assert_eq!(aggregator.finish().answer, "ab");
    }

    #[test]
    fn test_mistyped_field_does_not_drop_answer() {
        let mut aggregator = StreamAggregator::new(LineAssembly::Buffered);
        aggregator.push_chunk(
            b"data: {\"eventType\":\"fulfillment\",\"answer\":\"Hi \",\"sessionId\":42}\n",
        );
        aggregator.push_chunk(
            concat!(
                "data: {\"eventType\":\"fulfillment\",\"answer\":\"there\",\"sessionId\":\"s1\"}\n",
                "data: {\"eventType\":\"fulfillment\",\"sessionId\":[\"s2\"]}\n",
                "data: {\"eventType\":\"metricsLog\",\"publicMetrics\":{\"a\":1}}\n",
                "data: {\"eventType\":\"metricsLog\",\"publicMetrics\":\"n/a\"}\n",
            )
            .as_bytes(),
        );

        assert_eq!(aggregator.frames(), 5);
        assert_eq!(aggregator.skipped(), 0);
        let result = aggregator.finish();
        assert_eq!(result.answer, "Hi there");
        assert_eq!(result.session_id, "s1");
        assert_eq!(Value::Object(result.metrics), json!({"a": 1}));
    }

    #[test]
    fn test_long_line_in_small_chunks() {
        let answer = "x".repeat(4096);
        let line = format!(
            "data: {}\n",
            json!({"eventType": "fulfillment", "answer": &answer})
        );

        let mut aggregator = StreamAggregator::new(LineAssembly::Buffered);
        for chunk in line.as_bytes().chunks(3) {
            aggregator.push_chunk(chunk);
        }
        aggregator.push_chunk(b"data: [DONE]\n");

        assert_eq!(aggregator.frames(), 1);
        assert_eq!(aggregator.finish().answer, answer);
    }

    #[test]
    fn test_unknown_event_types_ignored() {
        let result = both(&[concat!(
            "data: {\"eventType\":\"heartbeat\",\"answer\":\"x\"}\n",
            "data: {\"eventType\":\"fulfillment\",\"answer\":\"y\"}\n",
        )]);
        assert_eq!(result.answer, "y");
    }

    #[test]
    fn test_data_prefix_without_space_and_crlf() {
        let result = both(&[concat!(
            "data:{\"eventType\":\"fulfillment\",\"answer\":\"a\"}\r\n",
            "data:   {\"eventType\":\"fulfillment\",\"answer\":\"b\"}   \r\n",
            "data: [DONE]\r\n",
        )]);
        assert_eq!(result.answer, "ab");
    }

    #[test]
    fn test_done_only_ends_current_chunk() {
        let result = both(&[
            concat!(
                "data: {\"eventType\":\"fulfillment\",\"answer\":\"one\"}\n",
                "data: [DONE]\n",
                "data: {\"eventType\":\"fulfillment\",\"answer\":\"dropped\"}\n",
            ),
            "data: {\"eventType\":\"fulfillment\",\"answer\":\" two\"}\n",
        ]);
        assert_eq!(result.answer, "one two");
    }

    #[test]
    fn test_line_split_across_chunks() {
        let chunks = [
            "data: {\"eventType\":\"fulfillment\",\"ans",
            "wer\":\"whole\"}\ndata: [DONE]\n",
        ];

        assert_eq!(aggregate(LineAssembly::Buffered, &chunks).answer, "whole");
        assert_eq!(aggregate(LineAssembly::PerChunk, &chunks).answer, "");
    }

    #[test]
    fn test_buffered_keeps_multibyte_characters_intact() {
        let line = "data: {\"eventType\":\"fulfillment\",\"answer\":\"héllo ✓\"}\n";
        let bytes = line.as_bytes();
        let split = line.find('é').unwrap() + 1;

        let mut aggregator = StreamAggregator::new(LineAssembly::Buffered);
        aggregator.push_chunk(&bytes[..split]);
        aggregator.push_chunk(&bytes[split..]);
        assert_eq!(aggregator.finish().answer, "héllo ✓");
    }

    #[test]
    fn test_unterminated_last_line_flushed() {
        let result = both(&["data: {\"eventType\":\"fulfillment\",\"answer\":\"tail\"}"]);
        assert_eq!(result.answer, "tail");
    }

    #[test]
    fn test_buffered_done_keeps_partial_tail() {
        let result = aggregate(
            LineAssembly::Buffered,
            &[
                "data: [DONE]\ndata: {\"eventType\":\"fulfillment\",",
                "\"answer\":\"late\"}\n",
            ],
        );
        assert_eq!(result.answer, "late");
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(both(&[]), AggregatedResult::default());
    }

    #[test]
    fn test_final_response_shape() {
        let result = AggregatedResult {
            answer: "Hi there".to_string(),
            session_id: "s1".to_string(),
            message_id: "m1".to_string(),
            metrics: Map::new(),
        };
        let context = vec![ContextField::new("userId", "1")];
        let document = result.into_final_response(&context).unwrap().into_document();

        assert_eq!(
            document,
            json!({
                "message": "Chat query submitted successfully",
                "data": {
                    "sessionId": "s1",
                    "messageId": "m1",
                    "answer": "Hi there",
                    "metrics": {},
                    "status": "completed",
                    "contextMetadata": [{"key": "userId", "value": "1"}]
                }
            })
        );
        let keys: Vec<_> = document["data"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["sessionId", "messageId", "answer", "metrics", "status", "contextMetadata"]
        );
    }

    #[tokio::test]
    async fn test_aggregate_stream_reads_all_chunks() {
        let chunks: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from_static(b"data: {\"eventType\":\"fulfillment\",\"answer\":\"Hi \"}\n")),
            Ok(Bytes::from_static(b"data: {\"eventType\":\"fulfillment\",\"answer\":\"there\"}\n")),
            Ok(Bytes::from_static(b"data: [DONE]\n")),
        ];
        let response = StreamingResponse::new(200, stream::iter(chunks).boxed());

        let result = aggregate_stream(response, LineAssembly::Buffered).await.unwrap();
        assert_eq!(result.answer, "Hi there");
    }

    #[tokio::test]
    async fn test_aggregate_stream_rejects_non_200() {
        let chunks: Vec<Result<Bytes, TransportError>> =
            vec![Ok(Bytes::from_static(b"{\"message\":\"bad session\"}"))];
        let response = StreamingResponse::new(404, stream::iter(chunks).boxed());

        match aggregate_stream(response, LineAssembly::Buffered).await {
            Err(ClientError::QueryRejected { mode, status, body }) => {
                assert_eq!(mode, "stream");
                assert_eq!(status, 404);
                assert_eq!(body, "{\"message\":\"bad session\"}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_aggregate_stream_surfaces_body_errors() {
        let chunks: Vec<Result<Bytes, TransportError>> = vec![
            Ok(Bytes::from_static(b"data: {\"eventType\":\"fulfillment\",\"answer\":\"x\"}\n")),
            Err(TransportError::Body("connection reset".to_string())),
        ];
        let response = StreamingResponse::new(200, stream::iter(chunks).boxed());

        let result = aggregate_stream(response, LineAssembly::Buffered).await;
        assert!(matches!(
            result,
            Err(ClientError::Transport(TransportError::Body(_)))
        ));
    }
}
