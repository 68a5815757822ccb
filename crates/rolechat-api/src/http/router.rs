//! Axum router configuration with middleware.
//!
//! API routes live under `/api`. Middleware: CORS (any origin) and request
//! tracing.
//!
//! When `server.web_dir` points at an existing directory the built frontend
//! is served from it. API routes take priority; unknown paths fall through
//! to the SPA's `index.html` for client-side routing.

use std::path::Path;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
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
        .route(
            "/roles",
            get(handlers::role::list_roles).post(handlers::role::create_role),
        )
        .route("/roles/sync", post(handlers::role::sync_roles))
        .route("/roles/{role_id}/history", get(handlers::role::role_history))
        .route("/messages/{role_id}", post(handlers::message::send_message));

    let web_dir = state.config.server.web_dir.clone();

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(web_dir) = web_dir.filter(|dir| Path::new(dir).is_dir()) {
        let index = Path::new(&web_dir).join("index.html");
        let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(index));
        router = router.fallback_service(serve_dir);
        tracing::info!(path = %web_dir, "SPA static file serving enabled");
    }

    router
}

/// GET /health - Liveness probe.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
