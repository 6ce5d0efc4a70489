//! User-defined command shortcuts.
//!
//! A shortcut maps a leading-slash command token (e.g. `/summarize`) to an
//! instruction template and an optional model override, scoped to one user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Marker character that introduces a command token.
pub const COMMAND_MARKER: char = '/';

/// A stored shortcut owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcut {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Unique per user, starts with `/`.
    pub command: String,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Request body for registering a shortcut.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShortcutRequest {
    pub external_id: String,
    pub command: String,
    pub instruction: String,
    #[serde(default)]
    pub model_id: Option<Uuid>,
}

/// Partial shortcut update.
///
/// `model_id` distinguishes "absent" (leave unchanged) from an explicit
/// `null` (clear the override).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateShortcutRequest {
    pub command: Option<String>,
    pub instruction: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub model_id: Option<Option<Uuid>>,
}

impl UpdateShortcutRequest {
    pub fn is_empty(&self) -> bool {
        self.command.is_none() && self.instruction.is_none() && self.model_id.is_none()
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_absent_model_is_none() {
        let req: UpdateShortcutRequest =
            serde_json::from_str(r#"{"instruction":"Translate:"}"#).unwrap();
        assert!(req.model_id.is_none());
        assert!(!req.is_empty());
    }

    #[test]
    fn test_update_request_null_model_clears_override() {
        let req: UpdateShortcutRequest = serde_json::from_str(r#"{"model_id":null}"#).unwrap();
        assert_eq!(req.model_id, Some(None));
    }

    #[test]
    fn test_update_request_empty_body() {
        let req: UpdateShortcutRequest = serde_json::from_str("{}").unwrap();
        assert!(req.is_empty());
    }
}
