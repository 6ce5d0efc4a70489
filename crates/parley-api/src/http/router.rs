//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Message pipeline
        .route("/messages", post(handlers::message::send_message))
        // Chats
        .route(
            "/chats",
            get(handlers::chat::list_chats).post(handlers::chat::create_chat),
        )
        .route(
            "/chats/{id}",
            get(handlers::chat::get_chat)
                .patch(handlers::chat::rename_chat)
                .delete(handlers::chat::delete_chat),
        )
        // Users
        .route("/users", post(handlers::user::login))
        .route(
            "/users/{external_id}",
            get(handlers::user::get_user).patch(handlers::user::update_profile),
        )
        // Subscriptions
        .route(
            "/subscriptions",
            post(handlers::subscription::activate_subscription),
        )
        // Model catalog
        .route("/models", get(handlers::model::list_models))
        // Shortcuts
        .route(
            "/shortcuts",
            get(handlers::shortcut::list_shortcuts).post(handlers::shortcut::create_shortcut),
        )
        .route(
            "/shortcuts/{id}",
            get(handlers::shortcut::get_shortcut)
                .patch(handlers::shortcut::update_shortcut)
                .delete(handlers::shortcut::delete_shortcut),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
