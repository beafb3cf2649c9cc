use axum::{Router, extract::FromRef, http::HeaderName, middleware};
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
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod validate;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point
// (main.rs) and to the integration test suite.
pub use auth::TokenService;
pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas decorated with the
/// `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::logout, handlers::verify,
        handlers::get_concerts, handlers::create_concert, handlers::update_concert,
        handlers::delete_concert,
        handlers::get_attendance_forms, handlers::create_attendance_form,
        handlers::update_attendance_form, handlers::delete_attendance_form,
        handlers::get_scores, handlers::create_score, handlers::update_score,
        handlers::get_practices, handlers::create_practice, handlers::update_practice,
        handlers::delete_practice,
        handlers::get_contact_info, handlers::update_contact_info,
    ),
    components(
        schemas(
            models::Concert, models::AttendanceForm, models::Score, models::ScoreComment,
            models::ScoreWithComments, models::Practice, models::ContactInfo,
            models::ConcertDetail,
            models::LoginRequest, models::LoginResponse, models::VerifyResponse,
            models::SessionUser, models::MessageResponse,
            models::CreateConcertRequest, models::UpdateConcertRequest,
            models::CreateAttendanceFormRequest, models::UpdateAttendanceFormRequest,
            models::CreateScoreRequest, models::UpdateScoreRequest,
            models::CreatePracticeRequest, models::UpdatePracticeRequest,
            models::UpdateContactRequest,
            auth::Role,
        )
    ),
    tags(
        (name = "orch-link", description = "Orchestra member portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**: the single, thread-safe, immutable
/// container holding all essential application services and configuration,
/// shared across all incoming requests. Every dependency is constructed once in
/// main and injected here; nothing reaches into process globals afterwards.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: abstracts persistence behind the `Repository` trait.
    pub repo: RepositoryState,
    /// Token Service: issues and verifies session JWTs.
    pub tokens: TokenService,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Allow handlers and middleware to selectively pull components from the shared
// AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies the
/// Authorization Gate and the global middleware stack, and registers the
/// application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    // The three access-segregated routers merge into one surface; overlapping
    // paths (e.g. GET vs POST /concerts) merge at the method-router level.
    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes())
        // 3. Authorization Gate: the single choke point. Layered over the whole
        // surface; public paths pass through inside the gate itself, so the
        // path classification lives in exactly one place.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_gate,
        ))
        .with_state(state);

    // 4. Observability and Correlation Layers (applied outermost)
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID generation: a unique UUID for every request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Request tracing: wraps the request/response lifecycle in
                // a span correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS layer (applied last)
        .layer(cors)
}

/// trace_span_logger
///
/// Helper used by `TraceLayer` to customize span creation: extracts the
/// `x-request-id` header and includes it in the structured metadata alongside
/// the HTTP method and URI, so every log line for a request is correlated.
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
