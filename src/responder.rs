//! One request, one rendered answer.

use futures::StreamExt;

use crate::backend::ChatBackend;
use crate::error::Result;
use crate::render::Renderer;
use crate::types::{ChatCompletionCreateParams, ChatMessage, Model, Usage};

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Default cap on generated tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Default nucleus sampling cutoff.
pub const DEFAULT_TOP_P: f32 = 1.0;

/// Sampling parameters passed through to the API unchecked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplingParams {
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
        }
    }
}

/// How a single turn is requested and delivered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseOptions {
    /// Resolved model.
    pub model: Model,
    /// Deliver incrementally instead of as one panel.
    pub stream: bool,
    /// Sampling parameters.
    pub sampling: SamplingParams,
}

impl ResponseOptions {
    /// Buffered delivery with default sampling.
    pub fn new(model: Model) -> Self {
        Self {
            model,
            stream: false,
            sampling: SamplingParams::default(),
        }
    }

    /// Sets whether the response is streamed.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Sets the sampling parameters.
    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Build the request for `messages`.
    pub fn request(&self, messages: &[ChatMessage]) -> ChatCompletionCreateParams {
        ChatCompletionCreateParams::new(
            messages.to_vec(),
            self.model.clone(),
            self.sampling.max_tokens,
        )
        .with_temperature(self.sampling.temperature)
        .with_top_p(self.sampling.top_p)
        .with_stream(self.stream)
    }
}

/// Send `messages` and render the answer.
///
/// Buffered responses are rendered as one markdown panel titled with the model
/// id.  Streamed responses print a header, then every fragment as it arrives,
/// then a newline; the returned text is the fragments concatenated in arrival
/// order.  Any failure, including one in the middle of a stream, is returned
/// for the caller to display.
pub async fn respond<B>(
    backend: &B,
    renderer: &mut dyn Renderer,
    messages: &[ChatMessage],
    options: &ResponseOptions,
) -> Result<String>
where
    B: ChatBackend + ?Sized,
{
    let params = options.request(messages);
    let model = options.model.id().to_string();
    if options.stream {
        respond_streaming(backend, renderer, params, &model).await
    } else {
        let completion = backend.complete(params).await?;
        if let Some(usage) = completion.usage {
            log_usage(&model, usage);
        }
        let text = completion.text().to_string();
        renderer.print_response(&model, &text);
        Ok(text)
    }
}

async fn respond_streaming<B>(
    backend: &B,
    renderer: &mut dyn Renderer,
    params: ChatCompletionCreateParams,
    model: &str,
) -> Result<String>
where
    B: ChatBackend + ?Sized,
{
    let mut stream = backend.complete_streaming(params).await?;
    renderer.print_stream_header(model);
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => {
                renderer.finish_stream();
                return Err(err);
            }
        };
        let fragment = chunk.text();
        if !fragment.is_empty() {
            renderer.print_text(fragment);
            text.push_str(fragment);
        }
        if let Some(usage) = chunk.usage() {
            log_usage(model, usage);
        }
    }
    renderer.finish_stream();
    Ok(text)
}

fn log_usage(model: &str, usage: Usage) {
    tracing::debug!(
        model,
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        "token usage"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::testing::{RecordingRenderer, Reply, ScriptedBackend};
    use crate::types::KnownModel;

    fn transcript() -> Vec<ChatMessage> {
        vec![ChatMessage::system(""), ChatMessage::user("hello")]
    }

    #[tokio::test]
    async fn buffered_response_is_rendered_as_panel() {
        let backend = ScriptedBackend::new(["Hi **there**"]);
        let mut renderer = RecordingRenderer::default();
        let options = ResponseOptions::new(Model::Known(KnownModel::Llama38b8192));

        let text = respond(&backend, &mut renderer, &transcript(), &options)
            .await
            .unwrap();

        assert_eq!(text, "Hi **there**");
        assert_eq!(
            renderer.responses,
            vec![("llama3-8b-8192".to_string(), "Hi **there**".to_string())]
        );
        assert!(renderer.fragments.is_empty());

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model.id(), "llama3-8b-8192");
        assert_eq!(requests[0].messages, transcript());
        assert!(!requests[0].stream);
    }

    #[tokio::test]
    async fn streamed_fragments_concatenate_to_buffered_text() {
        let reply = "The quick brown fox jumps over the lazy dog.";
        let options = ResponseOptions::new(Model::default());

        let buffered_backend = ScriptedBackend::new([reply]);
        let mut buffered_renderer = RecordingRenderer::default();
        let buffered = respond(&buffered_backend, &mut buffered_renderer, &transcript(), &options)
            .await
            .unwrap();

        let streamed_backend = ScriptedBackend::new([reply]);
        let mut streamed_renderer = RecordingRenderer::default();
        let streamed = respond(
            &streamed_backend,
            &mut streamed_renderer,
            &transcript(),
            &options.clone().with_stream(true),
        )
        .await
        .unwrap();

        assert_eq!(buffered, streamed);
        assert!(streamed_renderer.fragments.len() > 1);
        assert_eq!(streamed_renderer.fragments.concat(), reply);
        assert_eq!(streamed_renderer.stream_headers, vec!["llama3-70b-8192".to_string()]);
        assert_eq!(streamed_renderer.streams_finished, 1);
        assert!(streamed_backend.requests()[0].stream);
    }

    #[tokio::test]
    async fn sampling_parameters_pass_through_unchecked() {
        let backend = ScriptedBackend::new(["ok"]);
        let mut renderer = RecordingRenderer::default();
        let options = ResponseOptions::new(Model::default()).with_sampling(SamplingParams {
            temperature: 7.5,
            max_tokens: 3,
            top_p: 2.0,
        });
        respond(&backend, &mut renderer, &transcript(), &options)
            .await
            .unwrap();
        let request = &backend.requests()[0];
        assert_eq!(request.temperature, 7.5);
        assert_eq!(request.max_tokens, 3);
        assert_eq!(request.top_p, 2.0);
        assert_eq!(request.stop, None);
    }

    #[tokio::test]
    async fn missing_content_is_empty_text() {
        let backend = ScriptedBackend::with_replies([Reply::NoContent]);
        let mut renderer = RecordingRenderer::default();
        let text = respond(
            &backend,
            &mut renderer,
            &transcript(),
            &ResponseOptions::new(Model::default()),
        )
        .await
        .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn request_failure_is_returned_not_rendered() {
        let backend = ScriptedBackend::with_replies([Reply::Fail(Error::rate_limit(
            "slow down",
            None,
        ))]);
        let mut renderer = RecordingRenderer::default();
        let err = respond(
            &backend,
            &mut renderer,
            &transcript(),
            &ResponseOptions::new(Model::default()).with_stream(true),
        )
        .await
        .unwrap_err();
        assert!(err.is_rate_limit());
        assert!(renderer.stream_headers.is_empty());
        assert!(renderer.error_panels.is_empty());
    }

    #[tokio::test]
    async fn mid_stream_failure_is_returned() {
        let backend = ScriptedBackend::with_replies([Reply::BrokenStream("partial answer".into())]);
        let mut renderer = RecordingRenderer::default();
        let err = respond(
            &backend,
            &mut renderer,
            &transcript(),
            &ResponseOptions::new(Model::default()).with_stream(true),
        )
        .await
        .unwrap_err();
        assert!(err.is_streaming());
        assert_eq!(renderer.fragments.concat(), "partial answer");
        assert_eq!(renderer.streams_finished, 1);
    }
}
