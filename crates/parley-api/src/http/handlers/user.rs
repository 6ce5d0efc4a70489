//! User account handlers.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;

use parley_types::user::{LoginRequest, UpdateProfileRequest, User};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/users - Log in, registering the user on first sight.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let user = state
        .user_service
        .login(&body.external_id, body.display_name.as_deref())
        .await?;
    Ok(Json(ApiResponse::timed(user, start)))
}

/// GET /api/v1/users/{external_id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let user = state.user_service.get_user(&external_id).await?;
    Ok(Json(ApiResponse::timed(user, start)))
}

/// PATCH /api/v1/users/{external_id} - Update display name, system prompt or default model.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let start = Instant::now();
    let user = state
        .user_service
        .update_profile(&external_id, body)
        .await?;
    Ok(Json(ApiResponse::timed(user, start)))
}
