//! Chat handlers for the REST API.
//!
//! Every route is scoped to the user named by `external_id`; a chat the
//! user is not a member of is reported as not found.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use parley_types::chat::{Chat, ChatWithHistory, CreateChatRequest, RenameChatRequest};

use crate::http::error::AppError;
use crate::http::extractors::query::{ChatListQuery, OwnerQuery};
use crate::http::response::ApiResponse;
use crate::state::AppState;

async fn user_id(state: &AppState, external_id: &str) -> Result<Uuid, AppError> {
    Ok(state.user_service.get_user(external_id).await?.id)
}

/// GET /api/v1/chats - List a user's chats, most recent first.
pub async fn list_chats(
    State(state): State<AppState>,
    Query(query): Query<ChatListQuery>,
) -> Result<Json<ApiResponse<Vec<Chat>>>, AppError> {
    let start = Instant::now();
    let owner = user_id(&state, &query.external_id).await?;

    let chats = state
        .orchestrator
        .conversations()
        .list_chats(&owner, query.page())
        .await?;

    Ok(Json(ApiResponse::timed(chats, start)))
}

/// POST /api/v1/chats - Create an empty chat with an explicit title.
pub async fn create_chat(
    State(state): State<AppState>,
    Json(body): Json<CreateChatRequest>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let owner = user_id(&state, &body.external_id).await?;

    let chat = state
        .orchestrator
        .conversations()
        .create_chat(owner, &body.title)
        .await?;

    Ok(Json(ApiResponse::timed(chat, start)))
}

/// GET /api/v1/chats/{id} - Get a chat with its full message history.
pub async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<ChatWithHistory>>, AppError> {
    let start = Instant::now();
    let owner = user_id(&state, &query.external_id).await?;

    let chat = state
        .orchestrator
        .conversations()
        .get_chat_with_history(&owner, &id)
        .await?;

    Ok(Json(ApiResponse::timed(chat, start)))
}

/// PATCH /api/v1/chats/{id} - Rename a chat.
pub async fn rename_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RenameChatRequest>,
) -> Result<Json<ApiResponse<Chat>>, AppError> {
    let start = Instant::now();
    let owner = user_id(&state, &body.external_id).await?;

    let chat = state
        .orchestrator
        .conversations()
        .rename_chat(&owner, &id, &body.title)
        .await?;

    Ok(Json(ApiResponse::timed(chat, start)))
}

/// DELETE /api/v1/chats/{id} - Delete a chat and all its messages.
pub async fn delete_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let owner = user_id(&state, &query.external_id).await?;

    state
        .orchestrator
        .conversations()
        .delete_chat(&owner, &id)
        .await?;

    Ok(Json(ApiResponse::timed(
        serde_json::json!({ "deleted": true, "id": id }),
        start,
    )))
}
