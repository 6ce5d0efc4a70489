//! Subscription activation handler.

use std::time::Instant;

use axum::extract::State;
use axum::Json;

use parley_types::user::{ActivateSubscriptionRequest, Subscription};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/subscriptions - Activate or renew a plan for a user.
pub async fn activate_subscription(
    State(state): State<AppState>,
    Json(body): Json<ActivateSubscriptionRequest>,
) -> Result<Json<ApiResponse<Subscription>>, AppError> {
    let start = Instant::now();
    let subscription = state.subscription_service.activate(body).await?;
    Ok(Json(ApiResponse::timed(subscription, start)))
}
