use axum::{
    extract::{FromRequestParts, Request, State},
    http::{Method, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    AppState,
    config::{AppConfig, Env},
    error::ApiError,
};

/// Cookie name carrying the session JWT.
pub const AUTH_COOKIE_NAME: &str = "auth-token";

/// Fixed session lifetime: tokens and their cookie expire 24 hours after issuance.
pub const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Role
///
/// The closed set of authorization roles. This is the sole authorization
/// dimension in the system; the Authorization Gate checks it exactly once per
/// request and downstream handlers receive the already-validated value, never
/// re-deriving it from raw claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Viewer,
}

impl Role {
    /// Parses a raw role string from a login payload. Unknown values are a
    /// validation failure, not a deserialization crash.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        match raw {
            "admin" => Ok(Role::Admin),
            "viewer" => Ok(Role::Viewer),
            other => Err(ApiError::Validation(format!("invalid role: {other}"))),
        }
    }

    /// The opaque subject identifier embedded in tokens for this role.
    pub fn subject_id(&self) -> &'static str {
        match self {
            Role::Admin => "admin-user",
            Role::Viewer => "viewer-user",
        }
    }
}

/// Claims
///
/// The signed JWT payload: the full session state in the bearer-token model.
/// There is no server-side session table; everything the gate needs to
/// authorize a request travels inside the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: opaque user identifier (`admin-user` / `viewer-user`).
    pub sub: String,
    /// The authorization role baked into the session at login time.
    pub role: Role,
    /// Contact email, present for admin sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued At: epoch seconds.
    pub iat: usize,
    /// Expiration: epoch seconds after which the token must not be accepted.
    pub exp: usize,
}

/// TokenService
///
/// Issues and verifies the compact signed session tokens. The symmetric secret
/// is loaded once at startup (see `AppConfig::load`, which fails fast without
/// it) and the derived keys are read-only afterwards, so concurrent use across
/// request tasks needs no synchronization.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// issue
    ///
    /// Builds and signs a session token for the given role, valid for 24 hours.
    pub fn issue(
        &self,
        role: Role,
        email: Option<String>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as usize)
            .unwrap_or(0);

        let claims = Claims {
            sub: role.subject_id().to_string(),
            role,
            email,
            iat: now,
            exp: now + TOKEN_TTL_SECS as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// verify
    ///
    /// Validates signature and expiration. Any failure (bad signature, expired,
    /// malformed) collapses to `None`; invalid tokens are a routine condition
    /// at this boundary, not an exceptional one.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("token verification failed: {}", e);
                None
            }
        }
    }
}

// --- Session cookie helpers ---

/// Builds the Set-Cookie value carrying a freshly issued token.
/// httpOnly always; `Secure` only in production so local http development works.
pub fn session_cookie(token: &str, config: &AppConfig) -> String {
    let mut cookie = format!(
        "{AUTH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={TOKEN_TTL_SECS}"
    );
    if config.env == Env::Production {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Builds the Set-Cookie value that scrubs the session cookie from the client.
/// Used on logout and whenever the gate encounters an invalid or expired token,
/// so clients stop replaying tokens that will never verify again.
pub fn clear_session_cookie() -> String {
    format!("{AUTH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}

// --- Authorization Gate ---

/// Access
///
/// The gate's path classification: every (path, method) pair falls into exactly
/// one of these buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No check at all: login, token introspection, health, API docs.
    Public,
    /// Any valid session.
    Session,
    /// Valid session with the admin role.
    Admin,
}

/// Resource paths whose mutating methods are reserved for administrators.
const ADMIN_MUTABLE_PATHS: [&str; 5] = [
    "/concerts",
    "/attendance",
    "/practices",
    "/scores",
    "/contact",
];

/// classify
///
/// The single source of truth for path-based access rules. Handlers never make
/// role decisions of their own; whatever reaches them has already been let
/// through here.
pub fn classify(path: &str, method: &Method) -> Access {
    if path == "/health"
        || path == "/login"
        || path == "/verify"
        || path.starts_with("/swagger-ui")
        || path.starts_with("/api-docs")
    {
        return Access::Public;
    }

    if method != Method::GET && ADMIN_MUTABLE_PATHS.contains(&path) {
        return Access::Admin;
    }

    Access::Session
}

/// Whether the path belongs to the JSON API surface. API callers get machine-
/// readable 401s; anything else (page navigation) gets bounced to the login page.
fn is_api_path(path: &str) -> bool {
    ADMIN_MUTABLE_PATHS.contains(&path) || matches!(path, "/login" | "/logout" | "/verify")
}

/// Builds the redirect-or-401 denial response, optionally instructing the
/// client to drop its session cookie.
fn deny(path: &str, message: &str, scrub_cookie: bool) -> Response {
    let mut response = if is_api_path(path) {
        ApiError::Authentication(message.to_string()).into_response()
    } else {
        Redirect::to("/login").into_response()
    };

    if scrub_cookie {
        if let Ok(value) = clear_session_cookie().parse() {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

/// auth_gate
///
/// The single choke point through which every inbound request passes. Stateless
/// per request: the token carried by the session cookie is the whole session.
///
/// 1. Public paths pass through untouched.
/// 2. Missing token: redirect-or-401, nothing to scrub.
/// 3. Invalid or expired token: redirect-or-401 and the cookie is actively
///    scrubbed so the client stops replaying it.
/// 4. Admin-only path without the admin role: 403. The token is valid, merely
///    insufficient, so the cookie stays.
/// 5. Otherwise the verified identity is attached as a request extension for
///    downstream handlers.
pub async fn auth_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let required = classify(&path, req.method());

    if required == Access::Public {
        return next.run(req).await;
    }

    let Some(token) = jar.get(AUTH_COOKIE_NAME).map(|c| c.value().to_string()) else {
        return deny(&path, "authentication required", false);
    };

    let Some(claims) = state.tokens.verify(&token) else {
        return deny(&path, "invalid or expired token", true);
    };

    if required == Access::Admin && claims.role != Role::Admin {
        return ApiError::Authorization("admin privileges required".to_string()).into_response();
    }

    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        role: claims.role,
    });
    next.run(req).await
}

/// AuthUser
///
/// The resolved identity of an authenticated request, attached by the gate and
/// consumed by handlers as a plain extractor argument. Carrying the closed
/// `Role` enum here (instead of a raw claim string) means no handler ever
/// re-derives authorization state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The gate runs before any handler; a missing extension means the route
        // was wired up outside the gated router.
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::Authentication("authentication required".to_string()))
    }
}
