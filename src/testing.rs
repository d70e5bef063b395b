//! Scripted collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::stream;

use crate::backend::{ChatBackend, ChunkStream};
use crate::error::{Error, Result};
use crate::input::InputSource;
use crate::memory::Summarizer;
use crate::render::Renderer;
use crate::types::{
    ChatCompletion, ChatCompletionChunk, ChatCompletionCreateParams, ChatMessage, ChatRole,
    ChoiceDelta, ChunkChoice, Choice, FinishReason, ResponseMessage,
};

/// Size of the fragments a scripted stream is cut into.
const FRAGMENT_CHARS: usize = 4;

/// One scripted answer.
#[derive(Debug)]
pub enum Reply {
    /// Answer with this text.
    Text(String),
    /// Answer with a choice that carries no content.
    NoContent,
    /// Fail the request.
    Fail(Error),
    /// Stream this text, then fail; buffered requests just fail.
    BrokenStream(String),
}

/// A [`ChatBackend`] that answers from a script and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatCompletionCreateParams>>,
}

impl ScriptedBackend {
    pub fn new<I, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::with_replies(texts.into_iter().map(|text| Reply::Text(text.into())))
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatCompletionCreateParams> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next_reply(&self, params: ChatCompletionCreateParams) -> Reply {
        self.requests.lock().unwrap().push(params);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail(Error::unknown("script exhausted")))
    }
}

fn completion(model: &str, content: Option<String>) -> ChatCompletion {
    ChatCompletion {
        id: "chatcmpl-test".to_string(),
        object: "chat.completion".to_string(),
        created: 0,
        model: model.to_string(),
        choices: vec![Choice {
            index: 0,
            message: ResponseMessage {
                role: ChatRole::Assistant,
                content,
            },
            finish_reason: Some(FinishReason::Stop),
        }],
        usage: None,
        system_fingerprint: None,
    }
}

fn chunk(model: &str, content: String) -> ChatCompletionChunk {
    ChatCompletionChunk {
        id: "chatcmpl-test".to_string(),
        object: "chat.completion.chunk".to_string(),
        created: 0,
        model: model.to_string(),
        choices: vec![ChunkChoice {
            index: 0,
            delta: ChoiceDelta {
                role: None,
                content: Some(content),
            },
            finish_reason: None,
        }],
        x_groq: None,
    }
}

fn fragments(model: &str, text: &str) -> Vec<Result<ChatCompletionChunk>> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(FRAGMENT_CHARS)
        .map(|piece| Ok(chunk(model, piece.iter().collect())))
        .collect()
}

#[async_trait::async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, params: ChatCompletionCreateParams) -> Result<ChatCompletion> {
        let model = params.model.id().to_string();
        match self.next_reply(params) {
            Reply::Text(text) => Ok(completion(&model, Some(text))),
            Reply::NoContent => Ok(completion(&model, None)),
            Reply::Fail(err) => Err(err),
            Reply::BrokenStream(_) => Err(Error::streaming("connection reset", None)),
        }
    }

    async fn complete_streaming(&self, params: ChatCompletionCreateParams) -> Result<ChunkStream> {
        let model = params.model.id().to_string();
        let items = match self.next_reply(params) {
            Reply::Text(text) => fragments(&model, &text),
            Reply::NoContent => vec![],
            Reply::Fail(err) => return Err(err),
            Reply::BrokenStream(text) => {
                let mut items = fragments(&model, &text);
                items.push(Err(Error::streaming("connection reset", None)));
                items
            }
        };
        Ok(Box::pin(stream::iter(items)))
    }
}

/// An [`InputSource`] that yields scripted lines, then end of input.
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<I, T>(lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}

/// A [`Renderer`] that records what it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub user_prompts: usize,
    pub stream_headers: Vec<String>,
    pub fragments: Vec<String>,
    pub streams_finished: usize,
    pub responses: Vec<(String, String)>,
    pub error_panels: Vec<String>,
    pub helps: Vec<String>,
    pub errors: Vec<String>,
    pub infos: Vec<String>,
}

impl Renderer for RecordingRenderer {
    fn print_user_prompt(&mut self) {
        self.user_prompts += 1;
    }

    fn print_stream_header(&mut self, model: &str) {
        self.stream_headers.push(model.to_string());
    }

    fn print_text(&mut self, text: &str) {
        self.fragments.push(text.to_string());
    }

    fn finish_stream(&mut self) {
        self.streams_finished += 1;
    }

    fn print_response(&mut self, model: &str, markdown: &str) {
        self.responses
            .push((model.to_string(), markdown.to_string()));
    }

    fn print_error_panel(&mut self, message: &str) {
        self.error_panels.push(message.to_string());
    }

    fn print_help(&mut self, markdown: &str) {
        self.helps.push(markdown.to_string());
    }

    fn print_error(&mut self, error: &str) {
        self.errors.push(error.to_string());
    }

    fn print_info(&mut self, info: &str) {
        self.infos.push(info.to_string());
    }
}

/// A [`Summarizer`] with a fixed answer that records its calls.
#[derive(Clone)]
pub struct StaticSummarizer {
    result: Result<String>,
    calls: Arc<Mutex<Vec<(String, Vec<ChatMessage>)>>>,
}

impl StaticSummarizer {
    pub fn ok(summary: &str) -> Self {
        Self {
            result: Ok(summary.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn failing(err: Error) -> Self {
        Self {
            result: Err(err),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Summarizer for StaticSummarizer {
    async fn summarize(&self, existing_summary: &str, new_lines: &[ChatMessage]) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((existing_summary.to_string(), new_lines.to_vec()));
        self.result.clone()
    }
}
