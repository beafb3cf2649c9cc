use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Read endpoints available to any role that holds a valid session, plus
/// logout. The gate has already verified the token by the time these handlers
/// run; viewers and admins see identical data here.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // POST /logout
        // Clears the session cookie. Stateless sessions mean there is nothing
        // else to tear down.
        .route("/logout", post(handlers::logout))
        // GET /concerts?active=&id=
        // Concert listing (optionally active-only), or full detail with
        // attendance forms, scores + comments, and practices when id is given.
        .route("/concerts", get(handlers::get_concerts))
        // GET /attendance?concertId=&id=
        .route("/attendance", get(handlers::get_attendance_forms))
        // GET /practices?concertId=&id=
        .route("/practices", get(handlers::get_practices))
        // GET /scores?concertId=
        // Scores carry their full comment history, newest comment first.
        .route("/scores", get(handlers::get_scores))
        // GET /contact
        .route("/contact", get(handlers::get_contact_info))
}
