//! Expands a leading command token into a stored instruction.

use parley_types::error::ServiceError;
use parley_types::shortcut::COMMAND_MARKER;
use parley_types::user::User;
use tracing::debug;
use uuid::Uuid;

use crate::repository::shortcut::ShortcutRepository;

/// Result of command resolution: what to send and to which model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub prompt: String,
    pub model_id: Uuid,
}

/// Split a prompt into `(command, remainder)` if it starts with the marker.
///
/// The command runs up to the first whitespace; the remainder is trimmed.
pub fn split_command(prompt: &str) -> Option<(&str, &str)> {
    if !prompt.starts_with(COMMAND_MARKER) {
        return None;
    }
    let trimmed = prompt.trim();
    Some(match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    })
}

pub struct ShortcutResolver<S: ShortcutRepository> {
    shortcuts: S,
}

impl<S: ShortcutRepository> ShortcutResolver<S> {
    pub fn new(shortcuts: S) -> Self {
        Self { shortcuts }
    }

    /// Resolve the effective prompt and model for `prompt`.
    ///
    /// A registered command becomes `instruction + " " + remainder` and uses
    /// the shortcut's model override, if any. An unknown command is stripped
    /// and the remainder is sent on its own.
    pub async fn resolve(&self, user: &User, prompt: &str) -> Result<ResolvedCommand, ServiceError> {
        let unchanged = ResolvedCommand {
            prompt: prompt.to_string(),
            model_id: user.default_model_id,
        };
        let Some((command, rest)) = split_command(prompt) else {
            return Ok(unchanged);
        };

        match self.shortcuts.find_by_command(&user.id, command).await? {
            Some(shortcut) => {
                debug!(command, shortcut_id = %shortcut.id, "shortcut expanded");
                let prompt = if rest.is_empty() {
                    shortcut.instruction
                } else {
                    format!("{} {rest}", shortcut.instruction)
                };
                Ok(ResolvedCommand {
                    prompt,
                    model_id: shortcut.model_id.unwrap_or(user.default_model_id),
                })
            }
            None => {
                debug!(command, "unknown command stripped");
                Ok(ResolvedCommand {
                    prompt: rest.to_string(),
                    model_id: user.default_model_id,
                })
            }
        }
    }
}
