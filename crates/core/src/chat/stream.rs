//! Reader for the chatbot's server-sent event stream.
//!
//! The relay forwards the completion stream as newline-delimited records:
//!
//! ```text
//! : keep-alive
//! data: {"choices":[{"delta":{"content":"Hi"}}]}
//!
//! data: [DONE]
//! ```
//!
//! Chunks from the network can end anywhere, including inside a line, a JSON
//! payload or a multi-byte character. [`FrameDecoder`] buffers until a line
//! is complete and parses. A line that fails to parse goes back to the front
//! of the buffer and waits for more input.

use std::fmt::Display;

use broto_common::{AppError, AppResult};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Incremental decoder from raw bytes to content fragments.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Trailing bytes of a character split across chunks.
    partial: Vec<u8>,
    /// Decoded text not yet consumed as a complete line.
    buffer: String,
    done: bool,
}

impl FrameDecoder {
    /// An empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `[DONE]` sentinel has been seen.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Text buffered while waiting for the rest of a line.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Feed one chunk and return the content fragments it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.partial.extend_from_slice(chunk);
        self.decode_partial();
        self.drain_lines()
    }

    /// Move every complete character from `partial` into `buffer`.
    /// Invalid sequences become U+FFFD.
    fn decode_partial(&mut self) {
        loop {
            match std::str::from_utf8(&self.partial) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.partial.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.partial[..valid]));
                    match e.error_len() {
                        // Incomplete character at the end; keep it for the next chunk.
                        None => {
                            self.partial.drain(..valid);
                            return;
                        }
                        Some(bad) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.partial.drain(..valid + bad);
                        }
                    }
                }
            }
        }
    }

    fn drain_lines(&mut self) -> Vec<String> {
        let mut fragments = Vec::new();

        while let Some(newline) = self.buffer.find('\n') {
            let mut line: String = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }

            if line.starts_with(':') || line.trim().is_empty() {
                continue;
            }
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            let payload = payload.trim();

            if payload == DONE_SENTINEL {
                self.done = true;
                self.buffer.clear();
                break;
            }

            match serde_json::from_str::<Chunk>(payload) {
                Ok(chunk) => {
                    if let Some(content) = chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        .filter(|c| !c.is_empty())
                    {
                        fragments.push(content);
                    }
                }
                Err(e) => {
                    debug!(error = %e, "Incomplete stream record; waiting for more data");
                    line.push('\n');
                    self.buffer.insert_str(0, &line);
                    break;
                }
            }
        }

        fragments
    }
}

/// Decode a response body into content fragments.
///
/// A transport error ends the stream with one `Err` item.
pub fn decode_stream<S, E>(body: S) -> impl Stream<Item = AppResult<String>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    async_stream::stream! {
        let mut decoder = FrameDecoder::new();
        let mut body = std::pin::pin!(body);

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(error = %e, "Chat stream read failed");
                    yield Err(AppError::ExternalService(format!("Stream read failed: {e}")));
                    return;
                }
            };

            for fragment in decoder.push(&chunk) {
                yield Ok(fragment);
            }
            if decoder.is_done() {
                return;
            }
        }

        if !decoder.pending().trim().is_empty() {
            debug!(pending = decoder.pending().len(), "Chat stream ended mid-record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_two_frames_yield_two_fragments() {
        let mut decoder = FrameDecoder::new();
        let input = format!("{}{}", frame("Hi"), frame(" there"));
        assert_eq!(decoder.push(input.as_bytes()), ["Hi", " there"]);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"cho").is_empty());
        assert_eq!(
            decoder.push(b"ices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n"),
            ["Hello"]
        );
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        let input = frame("👋");
        let bytes = input.as_bytes();
        let cut = input.find('👋').unwrap() + 2;

        assert!(decoder.push(&bytes[..cut]).is_empty());
        assert_eq!(decoder.push(&bytes[cut..]), ["👋"]);
    }

    #[test]
    fn test_comments_blank_lines_and_other_fields_are_skipped() {
        let mut decoder = FrameDecoder::new();
        let input = format!(
            ": keep-alive\n\r\n\nevent: ping\n{}: another comment\n",
            frame("ok")
        );
        assert_eq!(decoder.push(input.as_bytes()), ["ok"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut decoder = FrameDecoder::new();
        let input = frame("crlf").replace('\n', "\r\n");
        assert_eq!(decoder.push(input.as_bytes()), ["crlf"]);
    }

    #[test]
    fn test_done_stops_decoding() {
        let mut decoder = FrameDecoder::new();
        let input = format!("{}data: [DONE]\n{}", frame("a"), frame("b"));
        assert_eq!(decoder.push(input.as_bytes()), ["a"]);
        assert!(decoder.is_done());
        assert!(decoder.push(frame("c").as_bytes()).is_empty());
    }

    #[test]
    fn test_role_only_delta_yields_nothing() {
        let mut decoder = FrameDecoder::new();
        let input = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n";
        assert!(decoder.push(input.as_bytes()).is_empty());
    }

    #[test]
    fn test_unparseable_line_is_kept() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"choices\": [\n").is_empty());
        assert_eq!(decoder.pending(), "data: {\"choices\": [\n");
    }

    #[tokio::test]
    async fn test_decode_stream_collects_fragments() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from(frame("Hi"))),
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":")),
            Ok(Bytes::from_static(b"{\"content\":\" there\"}}]}\n\ndata: [DONE]\n")),
            Ok(Bytes::from(frame("ignored"))),
        ];

        let fragments: Vec<String> = decode_stream(stream::iter(chunks))
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, ["Hi", " there"]);
    }

    #[tokio::test]
    async fn test_decode_stream_reports_transport_error() {
        let chunks: Vec<Result<Bytes, String>> =
            vec![Ok(Bytes::from(frame("Hi"))), Err("connection reset".to_string())];

        let items: Vec<AppResult<String>> = decode_stream(stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], Err(AppError::ExternalService(_))));
    }
}
