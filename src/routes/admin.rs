use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible with an authenticated admin
/// session: session introspection and the AI analysis proxy.
///
/// Access Control:
/// This entire router is wrapped in the session middleware layer in
/// `create_router`, and every handler additionally takes the `AdminUser`
/// extractor — a request without a valid, unexpired session cookie is rejected
/// with 401 before any handler body runs.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/admin/me
        // Reports the current session's username. The admin frontend uses this
        // to decide between the dashboard and the login form.
        .route("/api/admin/me", get(handlers::me))
        // POST /api/analyze
        // Server-side AI proxy: forwards the prompt to the configured
        // chat-completion provider and returns the first completion's text.
        // 503 when no upstream credential is configured.
        .route("/api/analyze", post(handlers::analyze))
        // GET /api/analyze/status
        // Reports whether the upstream credential is loaded and the active model,
        // without ever echoing the key.
        .route("/api/analyze/status", get(handlers::analyze_status))
}
