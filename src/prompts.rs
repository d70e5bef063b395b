//! System-prompt files, selected by alias.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::render::Renderer;

/// Alias used when none is given or the given one is unknown.
pub const DEFAULT_PROMPT_ALIAS: &str = "def";

/// Directory prompt files are read from, relative to the working directory.
pub const DEFAULT_PROMPT_DIR: &str = "prompts";

const PROMPT_ALIASES: &[(&str, &str)] = &[
    ("def", "prompt_default.md"),
    ("cli", "cli_helper.md"),
];

/// All `(alias, file name)` pairs in table order.
pub fn prompt_aliases() -> &'static [(&'static str, &'static str)] {
    PROMPT_ALIASES
}

/// Resolve a prompt alias to its file name, falling back to the default alias.
pub fn resolve(alias: &str) -> &'static str {
    let alias = alias.trim();
    PROMPT_ALIASES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(alias))
        .or_else(|| PROMPT_ALIASES.iter().find(|(name, _)| *name == DEFAULT_PROMPT_ALIAS))
        .map(|(_, file)| *file)
        .unwrap_or("prompt_default.md")
}

/// The path of the prompt file `alias` selects inside `dir`.
pub fn prompt_path(dir: impl AsRef<Path>, alias: &str) -> PathBuf {
    dir.as_ref().join(resolve(alias))
}

/// Read a prompt file.
///
/// A missing or unreadable file is reported through `renderer` and yields the
/// empty string; an empty system prompt is a valid request.
pub fn load(path: impl AsRef<Path>, renderer: &mut dyn Renderer) -> String {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "prompt file not found");
            renderer.print_error(&format!("File not found: {}", path.display()));
            String::new()
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "prompt file unreadable");
            renderer.print_error(&format!("Could not read {}: {err}", path.display()));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRenderer;
    use std::io::Write;

    #[test]
    fn known_aliases_resolve() {
        assert_eq!(resolve("def"), "prompt_default.md");
        assert_eq!(resolve("cli"), "cli_helper.md");
        assert_eq!(resolve(" CLI "), "cli_helper.md");
    }

    #[test]
    fn unknown_alias_falls_back_to_default() {
        assert_eq!(resolve("nope"), "prompt_default.md");
        assert_eq!(resolve(""), "prompt_default.md");
    }

    #[test]
    fn prompt_path_joins_dir() {
        assert_eq!(
            prompt_path("prompts", "cli"),
            PathBuf::from("prompts").join("cli_helper.md")
        );
    }

    #[test]
    fn load_reads_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "You are terse.").unwrap();
        let mut renderer = RecordingRenderer::default();
        assert_eq!(load(file.path(), &mut renderer), "You are terse.");
        assert!(renderer.errors.is_empty());
    }

    #[test]
    fn missing_file_yields_empty_string_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.md");
        let mut renderer = RecordingRenderer::default();
        assert_eq!(load(&path, &mut renderer), "");
        assert_eq!(
            renderer.errors,
            vec![format!("File not found: {}", path.display())]
        );
    }

    #[test]
    fn bundled_prompts_exist() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_PROMPT_DIR);
        for (alias, _) in prompt_aliases() {
            assert!(prompt_path(&dir, alias).is_file(), "missing prompt for {alias}");
        }
    }
}
