//! Interactive input: the line editor and multi-line entry.

use rustyline::error::ReadlineError;
use rustyline::{Cmd, DefaultEditor, EventHandler, KeyCode, KeyEvent, Modifiers};

use crate::error::{Error, Result};
use crate::render::Renderer;

/// A line equal to this ends the session.
pub const QUIT_SENTINEL: &str = "q";

/// A line ending in this character continues on the next line.
pub const CONTINUATION: char = '\t';

/// Shown when the user submits nothing.
pub const EMPTY_INPUT_HELP: &str =
    "Prompt cannot be **empty**, please enter again or type `q` to *quit*";

/// A source of raw input lines.
pub trait InputSource {
    /// Read one line without its terminator.
    ///
    /// Returns `Ok(None)` at end of input or when the user interrupts.
    fn read_line(&mut self) -> Result<Option<String>>;
}

/// What one round of [`read_user_input`] produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserInput {
    /// Text to send.
    Message(String),
    /// The user asked to leave.
    Quit,
}

/// Read one entry from the user.
///
/// Lines are accumulated while the buffered text ends in [`CONTINUATION`]; the
/// marker is replaced by a newline.  A line that is exactly [`QUIT_SENTINEL`]
/// quits, even in the middle of an entry.  While nothing has been buffered,
/// every empty line prints help and reading continues.
pub fn read_user_input(
    input: &mut dyn InputSource,
    renderer: &mut dyn Renderer,
) -> Result<UserInput> {
    renderer.print_user_prompt();
    let mut buffer = String::new();
    loop {
        let Some(line) = input.read_line()? else {
            return Ok(UserInput::Quit);
        };
        if line == QUIT_SENTINEL {
            return Ok(UserInput::Quit);
        }
        buffer.push_str(&line);
        if buffer.is_empty() {
            renderer.print_help(EMPTY_INPUT_HELP);
            continue;
        }
        if buffer.ends_with(CONTINUATION) {
            buffer.pop();
            if !buffer.is_empty() {
                buffer.push('\n');
            }
            continue;
        }
        let len = buffer.trim_end_matches('\n').len();
        buffer.truncate(len);
        return Ok(UserInput::Message(buffer));
    }
}

/// [`InputSource`] backed by `rustyline`.
///
/// Tab inserts a literal tab instead of completing, so the continuation
/// marker can be typed.
pub struct LineEditor {
    editor: DefaultEditor,
}

impl LineEditor {
    /// Start the line editor on the controlling terminal.
    pub fn new() -> Result<Self> {
        let mut editor = DefaultEditor::new().map_err(readline_error)?;
        editor.bind_sequence(
            KeyEvent(KeyCode::Tab, Modifiers::NONE),
            EventHandler::Simple(Cmd::Insert(1, CONTINUATION.to_string())),
        );
        Ok(Self { editor })
    }
}

impl InputSource for LineEditor {
    fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.readline("") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(readline_error(err)),
        }
    }
}

fn readline_error(err: ReadlineError) -> Error {
    match err {
        ReadlineError::Io(err) => Error::io(format!("line editor failed: {err}"), err),
        err => Error::unknown(format!("line editor failed: {err}")),
    }
}
