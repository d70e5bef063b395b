//! Command-line chat client for Groq.
//!
//! With `--message` the client sends one message and prints the answer.
//! Without it, the client runs an interactive conversation that remembers
//! earlier turns.
//!
//! # Usage
//!
//! ```bash
//! # One question, streamed
//! groqchat --message "What is a monad?" --stream
//!
//! # Interactive, with the shell-helper prompt on Mixtral
//! groqchat --model mi --prompt cli
//!
//! # Show the model aliases
//! groqchat --list-models
//! ```
//!
//! In interactive mode, end a line with a tab to keep typing on the next
//! line, and enter `q` to quit.  `GROQ_API_KEY` carries the credential and
//! `RUST_LOG` controls diagnostics on stderr.

use std::io::{self, Write};
use std::process::ExitCode;

use arrrg::CommandLine;
use tracing_subscriber::EnvFilter;

use groqchat::render::ANSI_RESET;
use groqchat::{
    ChatArgs, ChatConfig, Conversation, Groq, LineEditor, Renderer, Result, TerminalRenderer, cli,
    prompts,
};

/// Main entry point for the groqchat application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let (args, free) = ChatArgs::from_command_line_relaxed("groqchat [OPTIONS]");
    init_tracing();
    if !free.is_empty() {
        tracing::warn!(ignored = ?free, "ignoring positional arguments");
    }

    let config = ChatConfig::from(args);
    let mut renderer = TerminalRenderer::with_color(config.use_color);

    if let Err(err) = ctrlc::set_handler(|| {
        print!("{ANSI_RESET}");
        let _ = io::stdout().flush();
        std::process::exit(130);
    }) {
        tracing::warn!(error = %err, "could not install Ctrl-C handler");
    }

    match run(&config, &mut renderer).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            renderer.print_error_panel(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn run(config: &ChatConfig, renderer: &mut TerminalRenderer) -> Result<()> {
    if config.list_models {
        cli::list_models(renderer);
        return Ok(());
    }

    let client = Groq::with_options(None, config.base_url.clone(), None)?;
    let system_prompt = prompts::load(config.prompt_path(), renderer);
    let options = config.response_options();
    tracing::debug!(model = %options.model, stream = options.stream, "starting");

    match &config.message {
        Some(message) => {
            cli::single_turn(&client, renderer, system_prompt, message, &options).await;
        }
        None => {
            let mut editor = LineEditor::new()?;
            let mut conversation =
                Conversation::new(&client, system_prompt, options, config.memory_token_limit);
            conversation.run(&mut editor, renderer).await?;
        }
    }
    Ok(())
}
