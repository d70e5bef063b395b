use serde::{Deserialize, Serialize};

use crate::types::{ChatRole, FinishReason, Usage};

/// One incremental piece of a streamed chat completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Identifier shared by every chunk of the same completion.
    pub id: String,

    /// Object type, always `chat.completion.chunk`.
    #[serde(default)]
    pub object: String,

    /// Unix timestamp of creation.
    #[serde(default)]
    pub created: u64,

    /// The model that produced the chunk.
    #[serde(default)]
    pub model: String,

    /// Deltas for each choice.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,

    /// Groq extension carrying usage on the final chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_groq: Option<GroqChunkExtension>,
}

/// The delta for one choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkChoice {
    /// Position of this choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The newly generated piece of the message.
    #[serde(default)]
    pub delta: ChoiceDelta,

    /// Set on the last chunk of the choice.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// Newly generated fields of the assistant message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChoiceDelta {
    /// Present on the first chunk only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ChatRole>,

    /// A text fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Groq-specific metadata attached to stream chunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GroqChunkExtension {
    /// Request identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Token accounting for the whole stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletionChunk {
    /// The text fragment of the first choice, or the empty string.
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .unwrap_or_default()
    }

    /// Usage carried by this chunk, if it is the final one.
    pub fn usage(&self) -> Option<Usage> {
        self.x_groq.as_ref().and_then(|ext| ext.usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_chunk_carries_role_and_no_text() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "id": "chatcmpl-9",
            "object": "chat.completion.chunk",
            "created": 1715000000,
            "model": "mixtral-8x7b-32768",
            "choices": [{"index": 0, "delta": {"role": "assistant", "content": ""}, "finish_reason": null}]
        }))
        .unwrap();
        assert_eq!(chunk.text(), "");
        assert_eq!(chunk.choices[0].delta.role, Some(ChatRole::Assistant));
    }

    #[test]
    fn final_chunk_carries_usage() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "id": "chatcmpl-9",
            "object": "chat.completion.chunk",
            "created": 1715000000,
            "model": "mixtral-8x7b-32768",
            "choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}],
            "x_groq": {"id": "req_9", "usage": {"prompt_tokens": 4, "completion_tokens": 2, "total_tokens": 6}}
        }))
        .unwrap();
        assert_eq!(chunk.text(), "");
        assert_eq!(chunk.choices[0].finish_reason, Some(FinishReason::Stop));
        assert_eq!(chunk.usage(), Some(Usage::new(4, 2)));
    }
}
