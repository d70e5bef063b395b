//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module handles parsing and processing of SSE streams from the
//! chat-completions endpoint, converting raw byte streams into
//! [`ChatCompletionChunk`] values. The stream ends at the `data: [DONE]`
//! sentinel or when the connection closes, whichever comes first.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::{ChatCompletionChunk, Error, Result};

const DONE_SENTINEL: &str = "[DONE]";

/// Process a stream of bytes into a stream of completion chunks.
///
/// This function takes a byte stream from an HTTP response and converts it into
/// a stream of parsed chunks, handling SSE framing, UTF-8 sequences split across
/// network reads, and error payloads.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + Send + 'static,
{
    let state = SseState {
        stream: byte_stream,
        pending: Vec::new(),
        buffer: String::new(),
        done: false,
    };

    stream::unfold(state, move |mut state| async move {
        if state.done {
            return None;
        }
        loop {
            // First check if we have a complete event in the buffer
            if let Some((frame, remaining)) = split_frame(&state.buffer) {
                state.buffer = remaining;
                match parse_frame(&frame) {
                    Frame::Chunk(chunk) => return Some((chunk, state)),
                    Frame::Done => return None,
                    Frame::Empty => continue,
                }
            }

            // Read more data
            match state.stream.next().await {
                Some(Ok(bytes)) => {
                    if let Err(err) = state.push_bytes(&bytes) {
                        return Some((Err(err), state));
                    }
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((
                        Err(Error::streaming(
                            format!("Error in HTTP stream: {e}"),
                            Some(Box::new(e)),
                        )),
                        state,
                    ));
                }
                None => {
                    // End of stream without a sentinel; flush whatever is left.
                    state.done = true;
                    let tail = std::mem::take(&mut state.buffer);
                    if let Frame::Chunk(chunk) = parse_frame(&tail) {
                        return Some((chunk, state));
                    }
                    if !state.pending.is_empty() {
                        return Some((
                            Err(Error::encoding(
                                "stream ended inside a UTF-8 sequence",
                                None,
                            )),
                            state,
                        ));
                    }
                    return None;
                }
            }
        }
    })
}

struct SseState<S> {
    stream: S,
    pending: Vec<u8>,
    buffer: String,
    done: bool,
}

impl<S> SseState<S> {
    /// Appends decoded bytes to the text buffer, holding back an incomplete
    /// trailing UTF-8 sequence until the next read completes it.
    fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(bytes);
        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.pending.len()
            }
            Err(e) if e.error_len().is_none() => {
                let valid_up_to = e.valid_up_to();
                // The prefix was just validated by from_utf8.
                let text = std::str::from_utf8(&self.pending[..valid_up_to])?;
                self.buffer.push_str(text);
                valid_up_to
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                let text = std::str::from_utf8(&self.pending[..valid_up_to])?;
                self.buffer.push_str(text);
                self.pending.clear();
                return Err(Error::encoding(
                    format!("Invalid UTF-8 in stream: {e}"),
                    Some(Box::new(e)),
                ));
            }
        };
        self.pending.drain(..valid_up_to);
        if self.buffer.contains("\r\n") {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }
        Ok(())
    }
}

enum Frame {
    Chunk(Result<ChatCompletionChunk>),
    Done,
    Empty,
}

/// Split the first complete event (terminated by a blank line) off the buffer.
fn split_frame(buffer: &str) -> Option<(String, String)> {
    let (frame, rest) = buffer.split_once("\n\n")?;
    Some((frame.to_string(), rest.to_string()))
}

/// Parse one SSE event into a frame.
///
/// Comment lines and fields other than `event` and `data` are ignored; multiple
/// `data` lines are joined with newlines as the SSE format prescribes.
fn parse_frame(frame: &str) -> Frame {
    let mut event_type = None;
    let mut data_lines = Vec::new();
    for line in frame.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        } else if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim());
        }
    }
    if data_lines.is_empty() {
        return Frame::Empty;
    }
    let data = data_lines.join("\n");
    if data.trim() == DONE_SENTINEL {
        return Frame::Done;
    }
    if event_type == Some("error") {
        return Frame::Chunk(Err(stream_error(&data)));
    }
    Frame::Chunk(parse_chunk(&data))
}

fn parse_chunk(data: &str) -> Result<ChatCompletionChunk> {
    let value: serde_json::Value = serde_json::from_str(data)?;
    if value.get("error").is_some() {
        return Err(stream_error(data));
    }
    serde_json::from_value(value).map_err(|e| {
        Error::serialization(
            format!("Failed to parse stream chunk: {e}"),
            Some(Box::new(e)),
        )
    })
}

/// Build the error for an error payload delivered inside the stream.
fn stream_error(data: &str) -> Error {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
        #[serde(rename = "type")]
        error_type: Option<String>,
    }

    match serde_json::from_str::<ErrorPayload>(data) {
        Ok(payload) => Error::api(
            500,
            Some(
                payload
                    .error
                    .error_type
                    .unwrap_or_else(|| "stream_error".to_string()),
            ),
            payload.error.message.unwrap_or_else(|| data.to_string()),
            None,
        ),
        Err(_) => Error::api(
            500,
            Some("stream_error".to_string()),
            data.to_string(),
            None,
        ),
    }
}
