//! Summary-buffer conversation memory.
//!
//! Recent turns are kept verbatim.  Once their approximate token count exceeds
//! the limit, the oldest messages are folded into a running summary by a
//! [`Summarizer`].  Messages leave the buffer only after the summarizer has
//! succeeded, so a failed summarization never loses history.

use std::fmt;

use crate::backend::ChatBackend;
use crate::error::Result;
use crate::observability::{MEMORY_SUMMARIZATIONS, MEMORY_SUMMARIZATION_ERRORS};
use crate::responder::{DEFAULT_TOP_P, ResponseOptions};
use crate::types::ChatMessage;

/// Default token budget for verbatim history.
pub const DEFAULT_MEMORY_TOKEN_LIMIT: usize = 300;

const SUMMARY_PROMPT: &str = "\
Progressively summarize the lines of conversation provided, adding onto the previous summary and returning a new summary.

EXAMPLE
Current summary:
The user asks what the assistant thinks of artificial intelligence. The assistant thinks artificial intelligence is a force for good.

New lines of conversation:
user: Why do you think artificial intelligence is a force for good?
assistant: Because artificial intelligence will help humans reach their full potential.

New summary:
The user asks what the assistant thinks of artificial intelligence. The assistant thinks artificial intelligence is a force for good because it will help humans reach their full potential.
END OF EXAMPLE

Current summary:
{summary}

New lines of conversation:
{new_lines}

New summary:";

/// Approximate the number of tokens in `text` at four bytes per token.
pub fn approx_token_count(text: &str) -> usize {
    text.len().div_ceil(4)
}

fn message_tokens(message: &ChatMessage) -> usize {
    approx_token_count(&format_line(message))
}

fn format_line(message: &ChatMessage) -> String {
    format!("{}: {}", message.role, message.content)
}

fn format_lines(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(format_line)
        .collect::<Vec<_>>()
        .join("\n")
}

///////////////////////////////////////////// Summarizer ////////////////////////////////////////////

/// Folds conversation lines into a running summary.
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    /// Return a new summary covering `existing_summary` followed by `new_lines`.
    async fn summarize(&self, existing_summary: &str, new_lines: &[ChatMessage]) -> Result<String>;
}

/// A [`Summarizer`] that asks the chat backend to write the summary.
///
/// It uses the conversation's model, temperature and token limit, with
/// buffered delivery and the default top-p.
pub struct LlmSummarizer<'a, B: ?Sized> {
    backend: &'a B,
    options: ResponseOptions,
}

impl<'a, B: ChatBackend + ?Sized> LlmSummarizer<'a, B> {
    /// Summarize with `backend`, shaping requests like `options`.
    pub fn new(backend: &'a B, options: &ResponseOptions) -> Self {
        let mut options = options.clone().with_stream(false);
        options.sampling.top_p = DEFAULT_TOP_P;
        Self { backend, options }
    }

    fn prompt(existing_summary: &str, new_lines: &[ChatMessage]) -> String {
        SUMMARY_PROMPT
            .replace("{summary}", existing_summary)
            .replace("{new_lines}", &format_lines(new_lines))
    }
}

#[async_trait::async_trait]
impl<'a, B: ChatBackend + ?Sized> Summarizer for LlmSummarizer<'a, B> {
    async fn summarize(&self, existing_summary: &str, new_lines: &[ChatMessage]) -> Result<String> {
        let prompt = Self::prompt(existing_summary, new_lines);
        let params = self.options.request(&[ChatMessage::user(prompt)]);
        let completion = self.backend.complete(params).await?;
        Ok(completion.text().trim().to_string())
    }
}

////////////////////////////////////////////// Snapshot /////////////////////////////////////////////

/// What the memory currently remembers.
///
/// Displays as one `role: content` line per message, the summary (if any)
/// first as a system line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemorySnapshot {
    /// Running summary of pruned turns.
    pub summary: Option<String>,
    /// Verbatim recent messages, oldest first.
    pub messages: Vec<ChatMessage>,
}

impl MemorySnapshot {
    /// True when nothing has been remembered yet.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.messages.is_empty()
    }

    /// The snapshot as messages, summary first.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if let Some(summary) = &self.summary {
            messages.push(ChatMessage::system(summary.clone()));
        }
        messages.extend(self.messages.iter().cloned());
        messages
    }
}

impl fmt::Display for MemorySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_lines(&self.to_messages()))
    }
}

/////////////////////////////////////// SummaryBufferMemory ///////////////////////////////////////

/// Verbatim recent turns plus a running summary of older ones.
pub struct SummaryBufferMemory<S> {
    summarizer: S,
    summary: String,
    buffer: Vec<ChatMessage>,
    max_token_limit: usize,
}

impl<S: Summarizer> SummaryBufferMemory<S> {
    /// Empty memory with the default token limit.
    pub fn new(summarizer: S) -> Self {
        Self::with_token_limit(summarizer, DEFAULT_MEMORY_TOKEN_LIMIT)
    }

    /// Empty memory that keeps at most `max_token_limit` tokens verbatim.
    pub fn with_token_limit(summarizer: S, max_token_limit: usize) -> Self {
        Self {
            summarizer,
            summary: String::new(),
            buffer: Vec::new(),
            max_token_limit,
        }
    }

    /// The configured token limit.
    pub fn max_token_limit(&self) -> usize {
        self.max_token_limit
    }

    /// The running summary; empty until the first pruning.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// The verbatim messages.
    pub fn buffer(&self) -> &[ChatMessage] {
        &self.buffer
    }

    /// Approximate tokens held verbatim.
    pub fn buffer_tokens(&self) -> usize {
        self.buffer.iter().map(message_tokens).sum()
    }

    /// The current snapshot.
    pub fn load_memory(&self) -> MemorySnapshot {
        MemorySnapshot {
            summary: (!self.summary.is_empty()).then(|| self.summary.clone()),
            messages: self.buffer.clone(),
        }
    }

    /// Remember one exchange, then summarize whatever exceeds the limit.
    ///
    /// The exchange is kept even when summarization fails; the error is
    /// returned and the next call tries again.
    pub async fn save_context(&mut self, user: &str, assistant: &str) -> Result<()> {
        self.buffer.push(ChatMessage::user(user));
        self.buffer.push(ChatMessage::assistant(assistant));
        self.prune().await
    }

    async fn prune(&mut self) -> Result<()> {
        let mut tokens = self.buffer_tokens();
        if tokens <= self.max_token_limit {
            return Ok(());
        }
        let mut cut = 0;
        while tokens > self.max_token_limit && cut < self.buffer.len() {
            tokens -= message_tokens(&self.buffer[cut]);
            cut += 1;
        }
        tracing::debug!(
            pruned = cut,
            remaining_tokens = tokens,
            limit = self.max_token_limit,
            "summarizing memory"
        );
        match self
            .summarizer
            .summarize(&self.summary, &self.buffer[..cut])
            .await
        {
            Ok(summary) => {
                MEMORY_SUMMARIZATIONS.click();
                self.summary = summary;
                self.buffer.drain(..cut);
                Ok(())
            }
            Err(err) => {
                MEMORY_SUMMARIZATION_ERRORS.click();
                tracing::warn!(error = %err, "memory summarization failed");
                Err(err)
            }
        }
    }
}

impl<S> fmt::Debug for SummaryBufferMemory<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryBufferMemory")
            .field("summary", &self.summary)
            .field("buffer", &self.buffer)
            .field("max_token_limit", &self.max_token_limit)
            .finish()
    }
}
