//! Shortcut handlers. All operations are scoped to the owning user.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use parley_types::shortcut::{CreateShortcutRequest, Shortcut, UpdateShortcutRequest};

use crate::http::error::AppError;
use crate::http::extractors::query::OwnerQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// PATCH body: the owner plus the partial update.
#[derive(Debug, Deserialize)]
pub struct UpdateShortcutBody {
    pub external_id: String,
    #[serde(flatten)]
    pub changes: UpdateShortcutRequest,
}

async fn user_id(state: &AppState, external_id: &str) -> Result<Uuid, AppError> {
    Ok(state.user_service.get_user(external_id).await?.id)
}

/// GET /api/v1/shortcuts - List the user's shortcuts.
pub async fn list_shortcuts(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<Vec<Shortcut>>>, AppError> {
    let start = Instant::now();
    let owner = user_id(&state, &query.external_id).await?;
    let shortcuts = state.shortcut_service.list(&owner).await?;
    Ok(Json(ApiResponse::timed(shortcuts, start)))
}

/// POST /api/v1/shortcuts - Register a shortcut.
pub async fn create_shortcut(
    State(state): State<AppState>,
    Json(body): Json<CreateShortcutRequest>,
) -> Result<Json<ApiResponse<Shortcut>>, AppError> {
    let start = Instant::now();
    let owner = user_id(&state, &body.external_id).await?;
    let shortcut = state
        .shortcut_service
        .register(owner, &body.command, &body.instruction, body.model_id)
        .await?;
    Ok(Json(ApiResponse::timed(shortcut, start)))
}

/// GET /api/v1/shortcuts/{id}
pub async fn get_shortcut(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<Shortcut>>, AppError> {
    let start = Instant::now();
    let owner = user_id(&state, &query.external_id).await?;
    let shortcut = state.shortcut_service.get(&owner, &id).await?;
    Ok(Json(ApiResponse::timed(shortcut, start)))
}

/// PATCH /api/v1/shortcuts/{id} - Partial update; `model_id: null` clears the override.
pub async fn update_shortcut(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateShortcutBody>,
) -> Result<Json<ApiResponse<Shortcut>>, AppError> {
    let start = Instant::now();
    let owner = user_id(&state, &body.external_id).await?;
    let shortcut = state
        .shortcut_service
        .update(&owner, &id, body.changes)
        .await?;
    Ok(Json(ApiResponse::timed(shortcut, start)))
}

/// DELETE /api/v1/shortcuts/{id}
pub async fn delete_shortcut(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let owner = user_id(&state, &query.external_id).await?;
    state.shortcut_service.delete(&owner, &id).await?;
    Ok(Json(ApiResponse::timed(
        serde_json::json!({ "deleted": true, "id": id }),
        start,
    )))
}
