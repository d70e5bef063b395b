//! The non-interactive paths of the `groqchat` binary.

use crate::backend::ChatBackend;
use crate::render::Renderer;
use crate::responder::{ResponseOptions, respond};
use crate::types::{ChatMessage, model_aliases};

/// Print every model alias with the model id it selects.
pub fn list_models(renderer: &mut dyn Renderer) {
    renderer.print_info("Available models:");
    for (alias, id) in model_aliases() {
        renderer.print_info(&format!("{alias} ({id})"));
    }
}

/// Answer one message with the given system prompt.
///
/// A failed request is shown in an error panel and yields `None`; it is not
/// an error for the caller, so the process still exits successfully.
pub async fn single_turn<B>(
    backend: &B,
    renderer: &mut dyn Renderer,
    system_prompt: impl Into<String>,
    message: &str,
    options: &ResponseOptions,
) -> Option<String>
where
    B: ChatBackend + ?Sized,
{
    let messages = [ChatMessage::system(system_prompt), ChatMessage::user(message)];
    match respond(backend, renderer, &messages, options).await {
        Ok(reply) => Some(reply),
        Err(err) => {
            tracing::debug!(error = %err, "single turn failed");
            renderer.print_error_panel(&err.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::testing::{RecordingRenderer, Reply, ScriptedBackend};
    use crate::types::Model;

    #[test]
    fn list_models_prints_header_then_aliases() {
        let mut renderer = RecordingRenderer::default();
        list_models(&mut renderer);

        assert_eq!(renderer.infos[0], "Available models:");
        assert!(renderer.infos.contains(&"l3-70 (llama3-70b-8192)".to_string()));
        assert!(renderer.infos.contains(&"mi (mixtral-8x7b-32768)".to_string()));
        assert_eq!(renderer.infos.len(), model_aliases().count() + 1);
    }

    #[tokio::test]
    async fn single_turn_sends_system_and_user() {
        let backend = ScriptedBackend::new(["42"]);
        let mut renderer = RecordingRenderer::default();
        let options = ResponseOptions::new(Model::default());

        let reply = single_turn(&backend, &mut renderer, "be terse", "meaning?", &options).await;

        assert_eq!(reply.as_deref(), Some("42"));
        assert!(renderer.error_panels.is_empty());
        assert_eq!(
            backend.requests()[0].messages,
            vec![ChatMessage::system("be terse"), ChatMessage::user("meaning?")]
        );
    }

    #[tokio::test]
    async fn single_turn_failure_renders_panel() {
        let backend =
            ScriptedBackend::with_replies([Reply::Fail(Error::authentication("Invalid API Key"))]);
        let mut renderer = RecordingRenderer::default();
        let options = ResponseOptions::new(Model::default()).with_stream(true);

        let reply = single_turn(&backend, &mut renderer, "", "hello", &options).await;

        assert!(reply.is_none());
        assert_eq!(renderer.error_panels.len(), 1);
        assert!(renderer.error_panels[0].contains("Invalid API Key"));
        assert!(renderer.stream_headers.is_empty());
    }
}
