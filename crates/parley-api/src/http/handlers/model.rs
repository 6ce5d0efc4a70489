//! Model catalog handlers.

use std::time::Instant;

use axum::extract::State;
use axum::Json;

use parley_types::model::AiModel;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/models - List the model catalog, free models first.
pub async fn list_models(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AiModel>>>, AppError> {
    let start = Instant::now();
    let models = state.model_service.list_models().await?;
    Ok(Json(ApiResponse::timed(models, start)))
}
