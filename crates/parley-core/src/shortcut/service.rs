//! Shortcut registration and management.

use chrono::Utc;
use parley_types::config::ShortcutConfig;
use parley_types::error::{RepositoryError, ServiceError};
use parley_types::shortcut::{COMMAND_MARKER, Shortcut, UpdateShortcutRequest};
use tracing::info;
use uuid::Uuid;

use crate::repository::model::ModelRepository;
use crate::repository::shortcut::ShortcutRepository;

/// CRUD over a user's shortcuts with registration rules applied.
pub struct ShortcutService<S: ShortcutRepository, M: ModelRepository> {
    shortcuts: S,
    models: M,
    rules: ShortcutConfig,
}

impl<S: ShortcutRepository, M: ModelRepository> ShortcutService<S, M> {
    pub fn new(shortcuts: S, models: M, rules: ShortcutConfig) -> Self {
        Self {
            shortcuts,
            models,
            rules,
        }
    }

    /// Register a new shortcut for `user_id`.
    pub async fn register(
        &self,
        user_id: Uuid,
        command: &str,
        instruction: &str,
        model_id: Option<Uuid>,
    ) -> Result<Shortcut, ServiceError> {
        let command = self.validate_command(command)?;
        let instruction = self.validate_instruction(instruction)?;
        self.ensure_unused(&user_id, &command, None).await?;
        if let Some(model_id) = model_id {
            self.ensure_model(&model_id).await?;
        }

        let shortcut = Shortcut {
            id: Uuid::now_v7(),
            user_id,
            command,
            instruction,
            model_id,
            created_at: Utc::now(),
        };
        let created = self
            .shortcuts
            .create(&shortcut)
            .await
            .map_err(|e| duplicate_or(e, &shortcut.command))?;
        info!(user_id = %user_id, command = %created.command, "shortcut registered");
        Ok(created)
    }

    pub async fn list(&self, user_id: &Uuid) -> Result<Vec<Shortcut>, ServiceError> {
        Ok(self.shortcuts.list(user_id).await?)
    }

    pub async fn get(&self, user_id: &Uuid, id: &Uuid) -> Result<Shortcut, ServiceError> {
        self.shortcuts
            .get(user_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("shortcut not found"))
    }

    /// Apply a partial update. `model_id: Some(None)` clears the override.
    pub async fn update(
        &self,
        user_id: &Uuid,
        id: &Uuid,
        changes: UpdateShortcutRequest,
    ) -> Result<Shortcut, ServiceError> {
        if changes.is_empty() {
            return Err(ServiceError::validation("no fields to update"));
        }
        let mut shortcut = self.get(user_id, id).await?;

        if let Some(command) = changes.command {
            let command = self.validate_command(&command)?;
            if command != shortcut.command {
                self.ensure_unused(user_id, &command, Some(id)).await?;
            }
            shortcut.command = command;
        }
        if let Some(instruction) = changes.instruction {
            shortcut.instruction = self.validate_instruction(&instruction)?;
        }
        if let Some(model_id) = changes.model_id {
            if let Some(model_id) = model_id {
                self.ensure_model(&model_id).await?;
            }
            shortcut.model_id = model_id;
        }

        let updated = self
            .shortcuts
            .update(&shortcut)
            .await
            .map_err(|e| duplicate_or(e, &shortcut.command))?;
        info!(shortcut_id = %id, "shortcut updated");
        Ok(updated)
    }

    pub async fn delete(&self, user_id: &Uuid, id: &Uuid) -> Result<(), ServiceError> {
        self.shortcuts.delete(user_id, id).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::not_found("shortcut not found"),
            other => other.into(),
        })?;
        info!(shortcut_id = %id, "shortcut deleted");
        Ok(())
    }

    fn validate_command(&self, raw: &str) -> Result<String, ServiceError> {
        let command = raw.trim();
        if !command.starts_with(COMMAND_MARKER) || command.chars().count() < 2 {
            return Err(ServiceError::validation(format!(
                "command must start with '{COMMAND_MARKER}' followed by a name"
            )));
        }
        if command.chars().any(char::is_whitespace) {
            return Err(ServiceError::validation("command must not contain whitespace"));
        }
        if self
            .rules
            .reserved_commands
            .iter()
            .any(|r| r.eq_ignore_ascii_case(command))
        {
            return Err(ServiceError::denied(format!(
                "'{command}' is a system command and cannot be used as a shortcut"
            )));
        }
        Ok(command.to_string())
    }

    fn validate_instruction(&self, raw: &str) -> Result<String, ServiceError> {
        let instruction = raw.trim();
        if instruction.is_empty() {
            return Err(ServiceError::validation("instruction must not be empty"));
        }
        if instruction.chars().count() > self.rules.max_instruction_chars {
            return Err(ServiceError::validation(format!(
                "instruction exceeds {} characters",
                self.rules.max_instruction_chars
            )));
        }
        Ok(instruction.to_string())
    }

    async fn ensure_unused(
        &self,
        user_id: &Uuid,
        command: &str,
        except: Option<&Uuid>,
    ) -> Result<(), ServiceError> {
        match self.shortcuts.find_by_command(user_id, command).await? {
            Some(existing) if Some(&existing.id) != except => Err(duplicate(command)),
            _ => Ok(()),
        }
    }

    async fn ensure_model(&self, model_id: &Uuid) -> Result<(), ServiceError> {
        match self.models.get_by_id(model_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found(format!("model '{model_id}' not found"))),
        }
    }
}

fn duplicate(command: &str) -> ServiceError {
    ServiceError::denied(format!("you already have a shortcut named '{command}'"))
}

/// The unique index can still fire when two registrations race.
fn duplicate_or(err: RepositoryError, command: &str) -> ServiceError {
    match err {
        RepositoryError::Conflict(_) => duplicate(command),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryModels, InMemoryShortcuts, sample_model, sample_user};
    use parley_types::error::ErrorKind;

    fn service() -> (ShortcutService<InMemoryShortcuts, InMemoryModels>, InMemoryModels) {
        let models = InMemoryModels::new();
        (
            ShortcutService::new(InMemoryShortcuts::new(), models.clone(), ShortcutConfig::default()),
            models,
        )
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let (svc, _) = service();
        let user = sample_user();
        let created = svc
            .register(user.id, " /summarize ", "  Summarize:  ", None)
            .await
            .unwrap();
        assert_eq!(created.command, "/summarize");
        assert_eq!(created.instruction, "Summarize:");

        let listed = svc.list(&user.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(svc.get(&user.id, &created.id).await.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_reserved_command_is_denied() {
        let (svc, _) = service();
        let err = svc
            .register(sample_user().id, "/start", "Hijack", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_duplicate_command_is_denied() {
        let (svc, _) = service();
        let user = sample_user();
        svc.register(user.id, "/tr", "Translate:", None).await.unwrap();
        let err = svc.register(user.id, "/tr", "Again", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        // Another user may own the same token.
        svc.register(sample_user().id, "/tr", "Translate:", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_malformed_commands_fail_validation() {
        let (svc, _) = service();
        let user = sample_user();
        for bad in ["summarize", "/", "/two words"] {
            let err = svc.register(user.id, bad, "x", None).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "command {bad:?}");
        }
    }

    #[tokio::test]
    async fn test_instruction_limits() {
        let (svc, _) = service();
        let user = sample_user();
        let too_long = "a".repeat(2001);
        let err = svc.register(user.id, "/long", &too_long, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = svc.register(user.id, "/blank", "   ", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_unknown_override_model_is_not_found() {
        let (svc, _) = service();
        let err = svc
            .register(sample_user().id, "/x", "y", Some(Uuid::now_v7()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_sets_and_clears_model() {
        let (svc, models) = service();
        let model = sample_model(false);
        models.insert(model.clone());
        let user = sample_user();
        let created = svc.register(user.id, "/tr", "Translate:", None).await.unwrap();

        let updated = svc
            .update(
                &user.id,
                &created.id,
                UpdateShortcutRequest {
                    model_id: Some(Some(model.id)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.model_id, Some(model.id));

        let cleared = svc
            .update(
                &user.id,
                &created.id,
                UpdateShortcutRequest {
                    model_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.model_id, None);
        assert_eq!(cleared.instruction, "Translate:");
    }

    #[tokio::test]
    async fn test_update_rename_checks_uniqueness() {
        let (svc, _) = service();
        let user = sample_user();
        svc.register(user.id, "/a", "A", None).await.unwrap();
        let b = svc.register(user.id, "/b", "B", None).await.unwrap();

        let err = svc
            .update(
                &user.id,
                &b.id,
                UpdateShortcutRequest {
                    command: Some("/a".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        // Renaming to its own name is fine.
        svc.update(
            &user.id,
            &b.id,
            UpdateShortcutRequest {
                command: Some("/b".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_delete_is_user_scoped() {
        let (svc, _) = service();
        let owner = sample_user();
        let created = svc.register(owner.id, "/a", "A", None).await.unwrap();

        let err = svc.delete(&sample_user().id, &created.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        svc.delete(&owner.id, &created.id).await.unwrap();
        assert!(svc.list(&owner.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let (svc, _) = service();
        let user = sample_user();
        let created = svc.register(user.id, "/a", "A", None).await.unwrap();
        let err = svc
            .update(&user.id, &created.id, UpdateShortcutRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
