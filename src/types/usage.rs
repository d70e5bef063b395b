use serde::{Deserialize, Serialize};

/// Token accounting reported by the API.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Tokens in the request transcript.
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens generated for the response.
    #[serde(default)]
    pub completion_tokens: u32,

    /// Sum of prompt and completion tokens.
    #[serde(default)]
    pub total_tokens: u32,
}

impl Usage {
    /// Create a new `Usage` with the given prompt and completion tokens.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_ignores_extra_groq_fields() {
        let usage: Usage = serde_json::from_str(
            r#"{"prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7, "queue_time": 0.01}"#,
        )
        .unwrap();
        assert_eq!(usage, Usage::new(3, 4));
    }
}
