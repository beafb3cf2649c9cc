use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Admin Router Module
///
/// Mutation endpoints. The gate's path classification marks every non-GET
/// method on these resource paths admin-only, so a viewer session is rejected
/// with 403 before any of these handlers run. Handlers therefore never check
/// roles themselves.
///
/// These paths also carry GET routes (wired in the authenticated module);
/// axum merges the method routers when the two routers are combined.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST/PUT /concerts, DELETE /concerts?id=
        // DELETE is a logical delete: the concert is deactivated, its children
        // stay. Reactivation happens through PUT with isActive=true.
        .route(
            "/concerts",
            post(handlers::create_concert)
                .put(handlers::update_concert)
                .delete(handlers::delete_concert),
        )
        // POST/PUT /attendance, DELETE /attendance?id= (physical delete)
        .route(
            "/attendance",
            post(handlers::create_attendance_form)
                .put(handlers::update_attendance_form)
                .delete(handlers::delete_attendance_form),
        )
        // POST/PUT /practices, DELETE /practices?id= (physical delete)
        .route(
            "/practices",
            post(handlers::create_practice)
                .put(handlers::update_practice)
                .delete(handlers::delete_practice),
        )
        // POST/PUT /scores
        // PUT may atomically append one comment to the score's history.
        // Scores have no delete endpoint; invalid ones are flagged, not removed.
        .route(
            "/scores",
            post(handlers::create_score).put(handlers::update_score),
        )
        // PUT /contact
        .route("/contact", put(handlers::update_contact_info))
}
