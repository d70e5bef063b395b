//! Logging trait for Groq client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all API interactions passing through the [`Groq`](crate::Groq) client.

use crate::{ChatCompletion, ChatCompletionChunk};

/// A trait for logging Groq client operations.
///
/// Implement this trait to capture and record all API interactions,
/// including both buffered completions and individual streamed chunks.
///
/// # Example
///
/// ```rust,ignore
/// use groqchat::{ChatCompletion, ChatCompletionChunk, ClientLogger};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_response(&self, completion: &ChatCompletion) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Response: {}", serde_json::to_string(completion).unwrap()).unwrap();
///     }
///
///     fn log_stream_chunk(&self, chunk: &ChatCompletionChunk) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "Chunk: {}", serde_json::to_string(chunk).unwrap()).unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a complete response from a buffered `send` call.
    fn log_response(&self, completion: &ChatCompletion);

    /// Log an individual streamed chunk, in arrival order.
    fn log_stream_chunk(&self, chunk: &ChatCompletionChunk);
}
