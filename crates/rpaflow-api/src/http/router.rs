//! Axum router configuration with middleware.
//!
//! REST routes are under `/api/v1/`; the event channel is at `/ws`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/executions",
            get(handlers::execution::list_executions).post(handlers::execution::submit_execution),
        )
        .route(
            "/executions/{id}",
            get(handlers::execution::get_execution).delete(handlers::execution::evict_execution),
        )
        .route("/executions/{id}/logs", get(handlers::execution::get_logs))
        .route(
            "/executions/{id}/pause",
            post(handlers::execution::pause_execution),
        )
        .route(
            "/executions/{id}/resume",
            post(handlers::execution::resume_execution),
        )
        .route(
            "/executions/{id}/stop",
            post(handlers::execution::stop_execution),
        )
        .route(
            "/executions/{id}/acknowledge",
            post(handlers::execution::acknowledge_message_box),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/ws", get(handlers::ws::ws_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
