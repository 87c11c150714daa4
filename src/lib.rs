use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod captcha;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod storage;
pub mod store;

// Module for routing segregation (Public, Admin).
pub mod routes;
use auth::AdminUser; // The resolved authenticated admin identity.
use routes::{admin, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use auth::SessionStore;
pub use captcha::CaptchaService;
pub use config::AppConfig;
pub use storage::{DatabaseBackend, FileBackend, MockBackend, StorageState};
pub use store::SubmissionStore;

/// ApiDoc
///
/// This struct auto-generates the OpenAPI documentation (Swagger JSON) for the
/// application. It aggregates all API paths and data schemas decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all public handler functions here for documentation generation.
    paths(
        handlers::get_captcha, handlers::login, handlers::me, handlers::logout,
        handlers::get_submissions, handlers::create_submission, handlers::clear_submissions,
        handlers::analyze, handlers::analyze_status, handlers::storage_status
    ),
    // List all models (schemas) used in the request/response bodies.
    components(
        schemas(
            models::Submission, models::CreateSubmissionRequest, models::LoginRequest,
            models::AnalyzeRequest, models::CaptchaResponse, models::SessionResponse,
            models::AckResponse, models::SubmissionListResponse,
            models::SubmissionCreatedResponse, models::AnalysisText, models::AnalyzeResponse,
            models::AnalyzeStatusResponse, models::StorageStatusResponse, models::ErrorResponse,
        )
    ),
    tags(
        (name = "swot-portal", description = "Employee SWOT Feedback API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe
/// container holding all essential application services and configuration,
/// shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Submission Store: owns the in-memory sequence and the injected
    /// persistence backend (database row or local JSON file).
    pub store: SubmissionStore,
    /// Session Layer: the in-process admin session table.
    pub sessions: SessionStore,
    /// Captcha Service: issues/verifies the signed arithmetic challenges.
    pub captcha: CaptchaService,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers and extractors to selectively pull
// components from the shared AppState.

impl FromRef<AppState> for SubmissionStore {
    fn from_ref(app_state: &AppState) -> SubmissionStore {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(app_state: &AppState) -> SessionStore {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for CaptchaService {
    fn from_ref(app_state: &AppState) -> CaptchaService {
        app_state.captcha.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// session_middleware
///
/// A middleware function that enforces an active admin session for the
/// `admin_routes` group.
///
/// *Mechanism*: It attempts to extract `AdminUser` from the request. Since
/// `AdminUser` implements `FromRequestParts`, if session resolution fails the
/// extractor immediately rejects the request with a 401 error envelope,
/// preventing execution of the handler. If successful, the request proceeds.
async fn session_middleware(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and
/// scoped middleware, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied. The mixed-method submissions
        // path gates its admin methods via the AdminUser extractor.
        .merge(public::public_routes())
        // Admin Routes: Protected by the session middleware. Handlers also take
        // the AdminUser extractor, giving Defense-in-Depth for these routes.
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), session_middleware)),
        )
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a
                // tracing span carrying the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: return the x-request-id header to
                // the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation: includes the
/// `x-request-id` header (if present) in the structured logging metadata
/// alongside the HTTP method and URI, so every log line for a single request
/// is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
