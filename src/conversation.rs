//! The multi-turn conversation loop.

use crate::backend::ChatBackend;
use crate::error::{Error, Result};
use crate::input::{InputSource, UserInput, read_user_input};
use crate::memory::{LlmSummarizer, Summarizer, SummaryBufferMemory};
use crate::observability::{CONVERSATION_TURN_FAILURES, CONVERSATION_TURNS};
use crate::render::Renderer;
use crate::responder::{ResponseOptions, respond};
use crate::types::ChatMessage;

/// Prefix of the system message that carries the memory snapshot.
pub const MEMORY_PREFIX: &str = "Here is your memory (chat history): ";

/// Counts reported when a conversation ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConversationStats {
    /// Turns that produced a reply.
    pub turns: usize,
    /// Turns whose request failed.
    pub failed_turns: usize,
    /// Turns whose reply arrived but could not be summarized into memory.
    pub summarization_failures: usize,
}

/// The result of one successful turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The assistant's reply.
    pub reply: String,
    /// Set when memory could not summarize; the reply is stored verbatim.
    pub memory_error: Option<Error>,
}

/// A conversation: the transcript sent on every turn plus summarizing memory.
///
/// The transcript starts with the system prompt.  Each turn appends a system
/// message carrying the memory snapshot and then the user's text, so the
/// newest user message is always last.
pub struct Conversation<'a, B: ?Sized, S> {
    backend: &'a B,
    options: ResponseOptions,
    messages: Vec<ChatMessage>,
    memory: SummaryBufferMemory<S>,
}

impl<'a, B: ChatBackend + ?Sized> Conversation<'a, B, LlmSummarizer<'a, B>> {
    /// A conversation whose memory is summarized by the same backend and model.
    pub fn new(
        backend: &'a B,
        system_prompt: impl Into<String>,
        options: ResponseOptions,
        memory_token_limit: usize,
    ) -> Self {
        let summarizer = LlmSummarizer::new(backend, &options);
        let memory = SummaryBufferMemory::with_token_limit(summarizer, memory_token_limit);
        Self::with_memory(backend, system_prompt, options, memory)
    }
}

impl<'a, B: ChatBackend + ?Sized, S: Summarizer> Conversation<'a, B, S> {
    /// A conversation with caller-provided memory.
    pub fn with_memory(
        backend: &'a B,
        system_prompt: impl Into<String>,
        options: ResponseOptions,
        memory: SummaryBufferMemory<S>,
    ) -> Self {
        Self {
            backend,
            options,
            messages: vec![ChatMessage::system(system_prompt)],
            memory,
        }
    }

    /// The transcript so far.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The conversation's memory.
    pub fn memory(&self) -> &SummaryBufferMemory<S> {
        &self.memory
    }

    /// How each turn is requested.
    pub fn options(&self) -> &ResponseOptions {
        &self.options
    }

    /// Run one turn for `text`.
    ///
    /// If the request fails, the messages appended for this turn are removed
    /// and memory is left alone.  If the reply arrives but memory cannot
    /// summarize, the turn still succeeds and the error is carried in the
    /// outcome.
    pub async fn dispatch(&mut self, text: &str, renderer: &mut dyn Renderer) -> Result<TurnOutcome> {
        let snapshot = self.memory.load_memory();
        let rollback = self.messages.len();
        self.messages
            .push(ChatMessage::system(format!("{MEMORY_PREFIX}{snapshot}")));
        self.messages.push(ChatMessage::user(text));
        tracing::debug!(
            messages = self.messages.len(),
            remembered = snapshot.messages.len(),
            summarized = snapshot.summary.is_some(),
            "dispatching turn"
        );

        let reply = match respond(self.backend, renderer, &self.messages, &self.options).await {
            Ok(reply) => reply,
            Err(err) => {
                CONVERSATION_TURN_FAILURES.click();
                self.messages.truncate(rollback);
                tracing::info!(error = %err, "turn failed");
                return Err(err);
            }
        };
        CONVERSATION_TURNS.click();

        let memory_error = self.memory.save_context(text, &reply).await.err();
        Ok(TurnOutcome {
            reply,
            memory_error,
        })
    }

    /// Read and answer entries until the user quits or input ends.
    ///
    /// Failed turns are shown as error panels and the loop carries on; only a
    /// failure to read input ends it with an error.
    pub async fn run(
        &mut self,
        input: &mut dyn InputSource,
        renderer: &mut dyn Renderer,
    ) -> Result<ConversationStats> {
        let mut stats = ConversationStats::default();
        loop {
            let text = match read_user_input(input, renderer)? {
                UserInput::Message(text) => text,
                UserInput::Quit => break,
            };
            match self.dispatch(&text, renderer).await {
                Ok(outcome) => {
                    stats.turns += 1;
                    if let Some(err) = outcome.memory_error {
                        stats.summarization_failures += 1;
                        renderer.print_error_panel(&err.to_string());
                    }
                }
                Err(err) => {
                    stats.failed_turns += 1;
                    renderer.print_error_panel(&err.to_string());
                }
            }
        }
        tracing::info!(
            turns = stats.turns,
            failed = stats.failed_turns,
            "conversation ended"
        );
        Ok(stats)
    }
}
