use std::pin::Pin;

use futures::Stream;

use crate::{ChatCompletion, ChatCompletionChunk, ChatCompletionCreateParams, Result};

/// A boxed stream of completion chunks, in arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk>> + Send>>;

/// The inference capability the responder and the summarizer depend on.
///
/// [`Groq`](crate::Groq) is the production implementation.  Tests substitute a
/// scripted backend so that conversations can be replayed without a network.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issue one buffered request and wait for the whole completion.
    async fn complete(&self, params: ChatCompletionCreateParams) -> Result<ChatCompletion>;

    /// Issue one streaming request.
    ///
    /// Errors that happen before the first byte (authentication, bad status)
    /// are returned directly; failures after that surface as items of the
    /// stream.
    async fn complete_streaming(&self, params: ChatCompletionCreateParams) -> Result<ChunkStream>;
}
