use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. `classify` in the auth module lists
/// exactly these paths as public; keep the two in sync when adding routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /login
        // Issues the session cookie for a valid {password, role} pair.
        .route("/login", post(handlers::login))
        // GET /verify
        // Session introspection. Public so an unauthenticated client can ask
        // "am I logged in?" and get a clean `authenticated: false` instead of
        // bouncing off the gate.
        .route("/verify", get(handlers::verify))
}
