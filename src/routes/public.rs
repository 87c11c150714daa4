use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
/// This covers the whole employee-facing surface (the captcha and the feedback
/// form), the session entry/exit points, and operational probes.
///
/// Security Mandate:
/// The session entry point (POST /api/admin/login) is protected by the signed
/// math captcha verified in the handler; the feedback form is deliberately
/// open, and everything else here is read-only or side-effect-free for
/// unauthenticated callers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // GET /api/captcha
        // Issues a signed, five-minute arithmetic challenge. Stateless: the answer
        // travels inside the HMAC-signed token, so nothing is stored server-side.
        .route("/api/captcha", get(handlers::get_captcha))
        // POST /api/admin/login
        // Admin authentication. Captcha first (400 on failure), then the static
        // credential table (401). Success sets the HttpOnly session cookie.
        .route("/api/admin/login", post(handlers::login))
        // POST /api/admin/logout
        // Destroys whatever session the request carries and clears the cookie.
        // Not gated: logging out without a session still reports success.
        .route("/api/admin/logout", post(handlers::logout))
        // GET/POST/DELETE /api/submissions
        // POST is the public employee form (201, always-ack persistence).
        // GET and DELETE are admin-only; because the three methods share one path,
        // they cannot sit behind the admin router's middleware layer — the
        // `AdminUser` extractor in their handler signatures enforces the gate
        // per-method instead.
        .route(
            "/api/submissions",
            get(handlers::get_submissions)
                .post(handlers::create_submission)
                .delete(handlers::clear_submissions),
        )
        // GET /api/debug/storage
        // Deployment probe reporting the active persistence backend and the
        // in-memory count. Counts only; submission content stays admin-gated.
        .route("/api/debug/storage", get(handlers::storage_status))
}
