//! A command-line chat client for Groq's OpenAI-compatible chat-completions API.
//!
//! The crate is small and layered.  [`Groq`] speaks the wire protocol behind the
//! [`ChatBackend`] trait; [`responder::respond`] turns one message list into one
//! rendered answer; [`Conversation`] strings turns together with a
//! [`SummaryBufferMemory`] that folds old turns into a running summary.

// Public modules
pub mod backend;
pub mod cli;
pub mod client;
pub mod client_logger;
pub mod config;
pub mod conversation;
pub mod error;
pub mod input;
pub mod memory;
pub mod prompts;
pub mod render;
pub mod responder;
pub mod sse;
pub mod types;

mod observability;

#[cfg(test)]
mod testing;

// Re-exports
pub use backend::{ChatBackend, ChunkStream};
pub use client::Groq;
pub use client_logger::ClientLogger;
pub use config::{ChatArgs, ChatConfig};
pub use conversation::{Conversation, ConversationStats, TurnOutcome};
pub use error::{Error, Result};
pub use input::{InputSource, LineEditor, UserInput};
pub use memory::{LlmSummarizer, MemorySnapshot, Summarizer, SummaryBufferMemory};
pub use observability::register_biometrics;
pub use render::{Renderer, TerminalRenderer};
pub use responder::{ResponseOptions, SamplingParams, respond};
pub use types::*;
