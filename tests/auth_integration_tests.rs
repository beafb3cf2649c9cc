use axum::{
    extract::FromRequestParts,
    http::{Method, Request, request::Parts},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use orch_link::{
    AppConfig, TokenService,
    auth::{self, Access, AuthUser, Claims, Role, classify},
    config::Env,
};
use std::time::SystemTime;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

/// Hand-encodes a token with an arbitrary expiration offset, so tests can
/// produce already-expired tokens without waiting.
fn create_token(secret: &str, role: Role, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: role.subject_id().to_string(),
        role,
        email: None,
        iat: now as usize,
        exp: (now + exp_offset).max(0) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn get_request_parts(method: Method, uri: &str) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

// --- Token Service Tests ---

#[test]
fn test_issue_and_verify_round_trip() {
    let service = TokenService::new(TEST_JWT_SECRET);

    let token = service
        .issue(Role::Admin, Some("admin@orch-link.com".to_string()))
        .unwrap();
    let claims = service.verify(&token).expect("freshly issued token verifies");

    assert_eq!(claims.sub, "admin-user");
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(claims.email.as_deref(), Some("admin@orch-link.com"));
    // 24 hour lifetime
    assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
}

#[test]
fn test_verify_rejects_expired_token() {
    let service = TokenService::new(TEST_JWT_SECRET);

    // Expired an hour ago. jsonwebtoken applies default expiry leeway, so a
    // token just past its exp could still verify; one hour is well outside it.
    let token = create_token(TEST_JWT_SECRET, Role::Viewer, -3600);
    assert!(service.verify(&token).is_none());
}

#[test]
fn test_verify_rejects_wrong_secret() {
    let service = TokenService::new(TEST_JWT_SECRET);

    let token = create_token("a-completely-different-secret", Role::Admin, 3600);
    assert!(service.verify(&token).is_none());
}

#[test]
fn test_verify_rejects_malformed_token() {
    let service = TokenService::new(TEST_JWT_SECRET);

    assert!(service.verify("not-a-jwt").is_none());
    assert!(service.verify("").is_none());
}

#[test]
fn test_viewer_token_carries_no_email() {
    let service = TokenService::new(TEST_JWT_SECRET);

    let token = service.issue(Role::Viewer, None).unwrap();
    let claims = service.verify(&token).unwrap();

    assert_eq!(claims.sub, "viewer-user");
    assert_eq!(claims.role, Role::Viewer);
    assert!(claims.email.is_none());
}

// --- Role Parsing Tests ---

#[test]
fn test_role_parse() {
    assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
    assert_eq!(Role::parse("viewer").unwrap(), Role::Viewer);
    assert!(Role::parse("superuser").is_err());
    assert!(Role::parse("").is_err());
}

// --- Path Classification Tests ---

#[test]
fn test_classify_public_paths() {
    assert_eq!(classify("/health", &Method::GET), Access::Public);
    assert_eq!(classify("/login", &Method::POST), Access::Public);
    assert_eq!(classify("/verify", &Method::GET), Access::Public);
    assert_eq!(classify("/swagger-ui", &Method::GET), Access::Public);
    assert_eq!(
        classify("/api-docs/openapi.json", &Method::GET),
        Access::Public
    );
}

#[test]
fn test_classify_session_paths() {
    // Reads on resource paths need a session of any role
    assert_eq!(classify("/concerts", &Method::GET), Access::Session);
    assert_eq!(classify("/attendance", &Method::GET), Access::Session);
    assert_eq!(classify("/practices", &Method::GET), Access::Session);
    assert_eq!(classify("/scores", &Method::GET), Access::Session);
    assert_eq!(classify("/contact", &Method::GET), Access::Session);
    // Logout mutates nothing persistent; any session may call it
    assert_eq!(classify("/logout", &Method::POST), Access::Session);
}

#[test]
fn test_classify_admin_paths() {
    // Every non-GET method on a resource path is reserved for administrators
    assert_eq!(classify("/concerts", &Method::POST), Access::Admin);
    assert_eq!(classify("/concerts", &Method::PUT), Access::Admin);
    assert_eq!(classify("/concerts", &Method::DELETE), Access::Admin);
    assert_eq!(classify("/attendance", &Method::POST), Access::Admin);
    assert_eq!(classify("/practices", &Method::DELETE), Access::Admin);
    assert_eq!(classify("/scores", &Method::PUT), Access::Admin);
    assert_eq!(classify("/contact", &Method::PUT), Access::Admin);
}

// --- Session Cookie Tests ---

#[test]
fn test_session_cookie_local_omits_secure() {
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);

    let cookie = auth::session_cookie("tok123", &config);
    assert!(cookie.starts_with("auth-token=tok123;"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(!cookie.contains("Secure"));
}

#[test]
fn test_session_cookie_production_is_secure() {
    let mut config = AppConfig::default();
    config.env = Env::Production;

    let cookie = auth::session_cookie("tok123", &config);
    assert!(cookie.contains("Secure"));
}

#[test]
fn test_clear_session_cookie_expires_immediately() {
    let cookie = auth::clear_session_cookie();
    assert!(cookie.starts_with("auth-token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

// --- AuthUser Extractor Tests ---

#[tokio::test]
async fn test_auth_user_extractor_reads_gate_extension() {
    let mut parts = get_request_parts(Method::GET, "/concerts");
    parts.extensions.insert(AuthUser {
        id: "admin-user".to_string(),
        role: Role::Admin,
    });

    let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(user.id, "admin-user");
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_auth_user_extractor_fails_without_extension() {
    // A handler wired outside the gated router gets no identity extension
    let mut parts = get_request_parts(Method::GET, "/concerts");
    let result = AuthUser::from_request_parts(&mut parts, &()).await;
    assert!(result.is_err());
}
