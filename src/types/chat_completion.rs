use serde::{Deserialize, Serialize};

use crate::types::{ChatRole, Usage};

/// A buffered response from the chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletion {
    /// Unique identifier for the completion.
    pub id: String,

    /// Object type, always `chat.completion`.
    #[serde(default)]
    pub object: String,

    /// Unix timestamp of creation.
    #[serde(default)]
    pub created: u64,

    /// The model that produced the completion.
    pub model: String,

    /// Candidate completions; the client only ever asks for one.
    pub choices: Vec<Choice>,

    /// Token accounting, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Backend configuration fingerprint, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

/// One candidate completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    /// Position of this choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    pub message: ResponseMessage,

    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

/// The assistant message inside a [`Choice`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResponseMessage {
    /// Role of the author, normally assistant.
    pub role: ChatRole,

    /// Generated text; absent when the model produced none.
    #[serde(default)]
    pub content: Option<String>,
}

/// Why the model stopped generating.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of the response or a stop sequence.
    Stop,

    /// `max_tokens` was reached.
    Length,

    /// The model called a tool.
    ToolCalls,

    /// Output was withheld by a content filter.
    ContentFilter,

    /// The model called a function (legacy).
    FunctionCall,

    /// A reason this client does not know about.
    #[serde(other)]
    Other,
}

impl ChatCompletion {
    /// The text of the first choice, or the empty string if there is none.
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completion_deserialization() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1715000000,
            "model": "llama3-8b-8192",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello there."},
                "logprobs": null,
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15},
            "system_fingerprint": "fp_abc",
            "x_groq": {"id": "req_01"}
        }))
        .unwrap();

        assert_eq!(completion.text(), "Hello there.");
        assert_eq!(completion.choices[0].finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage, Some(Usage::new(12, 3)));
    }

    #[test]
    fn missing_content_reads_as_empty_text() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "model": "gemma-7b-it",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": null},
                "finish_reason": "length"
            }]
        }))
        .unwrap();
        assert_eq!(completion.text(), "");
        assert_eq!(completion.choices[0].finish_reason, Some(FinishReason::Length));
    }

    #[test]
    fn no_choices_reads_as_empty_text() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-2",
            "model": "gemma-7b-it",
            "choices": []
        }))
        .unwrap();
        assert_eq!(completion.text(), "");
        assert!(completion.choices.is_empty());
    }

    #[test]
    fn unknown_finish_reason_is_other() {
        let reason: FinishReason = serde_json::from_str(r#""eos_token""#).unwrap();
        assert_eq!(reason, FinishReason::Other);
    }
}
