//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::memory::DEFAULT_MEMORY_TOKEN_LIMIT;
use crate::prompts::{self, DEFAULT_PROMPT_ALIAS, DEFAULT_PROMPT_DIR};
use crate::responder::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_P, ResponseOptions, SamplingParams,
};
use crate::types::Model;

/// Command-line arguments for the groqchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// A single message to send; without it the chat is interactive.
    #[arrrg(optional, "Send one message and exit", "TEXT")]
    pub message: Option<String>,

    /// Model alias.
    #[arrrg(optional, "Model alias: l3-8, l3-70, ge, l2-70, mi (default: l3-70)", "ALIAS")]
    pub model: Option<String>,

    /// System prompt alias.
    #[arrrg(optional, "System prompt alias: def, cli (default: def)", "ALIAS")]
    pub prompt: Option<String>,

    /// Directory holding the prompt files.
    #[arrrg(optional, "Directory of prompt files (default: prompts)", "DIR")]
    pub prompt_dir: Option<String>,

    /// Stream the response as it is generated.
    #[arrrg(flag, "Stream responses as they are generated")]
    pub stream: bool,

    /// Sampling temperature.
    #[arrrg(optional, "Sampling temperature (default: 1.0)", "FLOAT")]
    pub temperature: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: 1024)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling cutoff.
    #[arrrg(optional, "Top p for nucleus sampling (default: 1.0)", "FLOAT")]
    pub top_p: Option<String>,

    /// Token budget for verbatim conversation memory.
    #[arrrg(optional, "Tokens of history kept before summarizing (default: 300)", "TOKENS")]
    pub memory_tokens: Option<usize>,

    /// API root to send requests to.
    #[arrrg(optional, "API base URL (default: https://api.groq.com/openai/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Print the model aliases and exit.
    #[arrrg(flag, "List the available models and exit")]
    pub list_models: bool,
}

/// Configuration for a chat run.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The single message to send, if not interactive.
    pub message: Option<String>,

    /// The model to use for generating responses.
    pub model: Model,

    /// The resolved prompt alias.
    pub prompt_alias: String,

    /// Where prompt files live.
    pub prompt_dir: PathBuf,

    /// Whether responses are streamed.
    pub stream: bool,

    /// Sampling parameters for every request.
    pub sampling: SamplingParams,

    /// Token budget for verbatim conversation memory.
    pub memory_token_limit: usize,

    /// API root override.
    pub base_url: Option<String>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Print the model table instead of chatting.
    pub list_models: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: l3-70 (llama3-70b-8192)
    /// - Prompt: def, read from `prompts/`
    /// - Streaming: off
    /// - Temperature 1.0, max tokens 1024, top-p 1.0
    /// - Memory: 300 tokens
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            message: None,
            model: Model::default(),
            prompt_alias: DEFAULT_PROMPT_ALIAS.to_string(),
            prompt_dir: PathBuf::from(DEFAULT_PROMPT_DIR),
            stream: false,
            sampling: SamplingParams::default(),
            memory_token_limit: DEFAULT_MEMORY_TOKEN_LIMIT,
            base_url: None,
            use_color: true,
            list_models: false,
        }
    }

    /// Sets the single message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the prompt alias, falling back to the default alias if unknown.
    pub fn with_prompt(mut self, alias: &str) -> Self {
        self.prompt_alias = resolve_prompt_alias(alias);
        self
    }

    /// Sets the prompt directory.
    pub fn with_prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = dir.into();
        self
    }

    /// Sets whether responses are streamed.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.sampling.temperature = temperature;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.sampling.max_tokens = max_tokens;
        self
    }

    /// Sets the top-p value.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.sampling.top_p = top_p;
        self
    }

    /// Sets the memory token budget.
    pub fn with_memory_token_limit(mut self, limit: usize) -> Self {
        self.memory_token_limit = limit;
        self
    }

    /// Sets the API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The prompt file the alias selects.
    pub fn prompt_path(&self) -> PathBuf {
        prompts::prompt_path(&self.prompt_dir, &self.prompt_alias)
    }

    /// How each request is shaped.
    pub fn response_options(&self) -> ResponseOptions {
        ResponseOptions::new(self.model.clone())
            .with_stream(self.stream)
            .with_sampling(self.sampling)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_prompt_alias(alias: &str) -> String {
    let file = prompts::resolve(alias);
    prompts::prompt_aliases()
        .iter()
        .find(|(_, f)| *f == file)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| DEFAULT_PROMPT_ALIAS.to_string())
}

fn parse_float(name: &str, value: Option<String>, default: f32) -> f32 {
    let Some(value) = value else {
        return default;
    };
    match value.trim().parse::<f32>() {
        Ok(parsed) if parsed.is_finite() => parsed,
        _ => {
            tracing::warn!(option = name, value = %value, default, "not a number, using default");
            default
        }
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let model = args
            .model
            .as_deref()
            .map(Model::resolve)
            .unwrap_or_default();
        let prompt_alias = args
            .prompt
            .as_deref()
            .map(resolve_prompt_alias)
            .unwrap_or_else(|| DEFAULT_PROMPT_ALIAS.to_string());

        ChatConfig {
            message: args.message,
            model,
            prompt_alias,
            prompt_dir: args
                .prompt_dir
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPT_DIR)),
            stream: args.stream,
            sampling: SamplingParams {
                temperature: parse_float("temperature", args.temperature, DEFAULT_TEMPERATURE),
                max_tokens: args.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                top_p: parse_float("top-p", args.top_p, DEFAULT_TOP_P),
            },
            memory_token_limit: args.memory_tokens.unwrap_or(DEFAULT_MEMORY_TOKEN_LIMIT),
            base_url: args.base_url,
            use_color: !args.no_color,
            list_models: args.list_models,
        }
    }
}
