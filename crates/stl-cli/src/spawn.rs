//! Launching the user's editor.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

use thiserror::Error;

/// Tried in order when no editor is configured.
const FALLBACK_EDITORS: [&str; 2] = ["vim", "vi"];

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("could not find an editor, set $EDITOR or the editor option")]
    NoEditor,

    #[error("could not run {editor}")]
    Launch {
        editor: String,
        #[source]
        source: io::Error,
    },

    #[error("{editor} exited with {status}")]
    ExitStatus { editor: String, status: ExitStatus },
}

/// Opens `path` in an editor and blocks until the editor exits.
///
/// The editor is `configured` if given, otherwise `$EDITOR`, otherwise the
/// first of vim and vi that can be started. Editor commands may carry
/// arguments, e.g. `code --wait`.
pub fn edit(path: &Path, configured: Option<&str>) -> Result<(), SpawnError> {
    let chosen = configured
        .map(str::to_string)
        .or_else(|| std::env::var("EDITOR").ok())
        .filter(|editor| !editor.trim().is_empty());

    if let Some(editor) = chosen {
        return run_editor(&editor, path);
    }

    for editor in FALLBACK_EDITORS {
        match run_editor(editor, path) {
            Err(SpawnError::Launch { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(editor, "editor not found");
            }
            result => return result,
        }
    }
    Err(SpawnError::NoEditor)
}

fn run_editor(editor: &str, path: &Path) -> Result<(), SpawnError> {
    let mut words = editor.split_whitespace();
    let Some(program) = words.next() else {
        return Err(SpawnError::NoEditor);
    };

    tracing::debug!(editor, path = %path.display(), "launching editor");
    let status = Command::new(program)
        .args(words)
        .arg(path)
        .status()
        .map_err(|source| SpawnError::Launch {
            editor: editor.to_string(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(SpawnError::ExitStatus {
            editor: editor.to_string(),
            status,
        })
    }
}
