use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, Model};

/// Parameters for a chat-completions request.
///
/// Sampling parameters are passed to the API as given; the API is the
/// authority on their valid ranges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionCreateParams {
    /// The transcript, oldest message first.
    pub messages: Vec<ChatMessage>,

    /// The model that will complete the transcript.
    pub model: Model,

    /// Sampling temperature.
    pub temperature: f32,

    /// The maximum number of tokens to generate.
    pub max_tokens: u32,

    /// Nucleus sampling cutoff.
    pub top_p: f32,

    /// Whether to deliver the response as server-sent events.
    pub stream: bool,

    /// Sequences that stop generation.
    pub stop: Option<Vec<String>>,
}

impl ChatCompletionCreateParams {
    /// Create a buffered request with temperature and top-p of 1.0.
    pub fn new(messages: Vec<ChatMessage>, model: Model, max_tokens: u32) -> Self {
        Self {
            messages,
            model,
            temperature: 1.0,
            max_tokens,
            top_p: 1.0,
            stream: false,
            stop: None,
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the top-p value.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Sets whether the response is streamed.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}
