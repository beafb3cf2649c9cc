use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::{
    AppState,
    auth::{AUTH_COOKIE_NAME, Role, clear_session_cookie, session_cookie},
    error::ApiError,
    models::{LoginRequest, LoginResponse, MessageResponse, SessionUser, VerifyResponse},
    validate,
};

/// Contact address embedded in admin sessions.
const ADMIN_EMAIL: &str = "admin@orch-link.com";

/// login
///
/// [Public Route] Issues a session for `{password, role}`. The role string is
/// parsed into the closed `Role` enum first so an unknown role is a 400, and
/// the password is compared against the per-role configured value. On success
/// the signed token travels back in the httpOnly session cookie alongside the
/// `{success, user}` body.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Missing or invalid field"),
        (status = 401, description = "Wrong password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    validate::required("password", &payload.password)?;
    validate::required("role", &payload.role)?;
    let role = Role::parse(&payload.role)?;

    let expected = match role {
        Role::Admin => &state.config.admin_password,
        Role::Viewer => &state.config.viewer_password,
    };
    if payload.password != *expected {
        return Err(ApiError::Authentication("incorrect password".to_string()));
    }

    let email = (role == Role::Admin).then(|| ADMIN_EMAIL.to_string());
    let token = state.tokens.issue(role, email.clone()).map_err(|e| {
        tracing::error!("token issuance failed: {}", e);
        ApiError::Internal
    })?;

    tracing::info!(role = ?role, "login succeeded");

    let user = SessionUser {
        user_id: role.subject_id().to_string(),
        role,
        email,
    };
    let cookie = session_cookie(&token, &state.config);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            user,
        }),
    )
        .into_response())
}

/// logout
///
/// [Session Route] Destroys the session by instructing the client to drop the
/// cookie. Nothing is tracked server-side, so there is nothing else to revoke.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 200, description = "Session cleared", body = MessageResponse))
)]
pub async fn logout() -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(MessageResponse::ok("logged out")),
    )
        .into_response()
}

/// verify
///
/// [Public Route] Session introspection for the client. This path sits outside
/// the gate so an unauthenticated check is answerable; the handler performs its
/// own cookie inspection and scrubs stale tokens the same way the gate does.
#[utoipa::path(
    get,
    path = "/verify",
    responses(
        (status = 200, description = "Authenticated", body = VerifyResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn verify(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(token) = jar.get(AUTH_COOKIE_NAME).map(|c| c.value().to_string()) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false, "error": "no session token" })),
        )
            .into_response();
    };

    match state.tokens.verify(&token) {
        Some(claims) => Json(VerifyResponse {
            authenticated: true,
            user: Some(SessionUser {
                user_id: claims.sub,
                role: claims.role,
                email: claims.email,
            }),
        })
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            [(header::SET_COOKIE, clear_session_cookie())],
            Json(json!({ "authenticated": false, "error": "invalid or expired token" })),
        )
            .into_response(),
    }
}
