use orch_link::{
    AppConfig, AppState, InMemoryRepository, TokenService, create_router,
    repository::RepositoryState,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

/// Boots the full application (router, gate, middleware stack) against the
/// in-memory repository on an ephemeral port.
async fn spawn_app() -> TestApp {
    let config = AppConfig::default();
    let repo = Arc::new(InMemoryRepository::new()) as RepositoryState;
    let tokens = TokenService::new(&config.jwt_secret);

    let state = AppState {
        repo,
        tokens,
        config,
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

/// Cookie-holding client, so the session survives across requests the way a
/// browser session would.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

async fn login(app: &TestApp, client: &reqwest::Client, role: &str, password: &str) -> Value {
    let response = client
        .post(format!("{}/login", app.address))
        .json(&json!({ "password": password, "role": role }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), 200, "login should succeed");
    response.json().await.unwrap()
}

async fn login_admin(app: &TestApp, client: &reqwest::Client) {
    login(app, client, "admin", "admin-password").await;
}

async fn create_concert(app: &TestApp, client: &reqwest::Client) -> Value {
    let response = client
        .post(format!("{}/concerts", app.address))
        .json(&json!({
            "title": "Autumn Concert",
            "date": "2026-11-03T18:00:00Z",
            "venue": "City Hall"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    body["data"].clone()
}

// --- Public Surface ---

#[tokio::test]
async fn test_health_check_requires_no_session() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = spawn_app().await;
    let response = client()
        .post(format!("{}/login", app.address))
        .json(&json!({ "password": "nope", "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "incorrect password");
}

#[tokio::test]
async fn test_login_rejects_unknown_role() {
    let app = spawn_app().await;
    let response = client()
        .post(format!("{}/login", app.address))
        .json(&json!({ "password": "admin-password", "role": "superuser" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_login_issues_session_and_verify_reports_it() {
    let app = spawn_app().await;
    let client = client();

    let body = login(&app, &client, "admin", "admin-password").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["userId"], "admin-user");
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["email"], "admin@orch-link.com");

    // The cookie issued at login now authenticates /verify
    let response = client
        .get(format!("{}/verify", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["role"], "admin");
}

#[tokio::test]
async fn test_verify_without_session_is_unauthenticated() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/verify", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["authenticated"], false);
}

// --- Authorization Gate ---

#[tokio::test]
async fn test_api_read_without_session_is_401() {
    let app = spawn_app().await;
    let response = client()
        .get(format!("{}/concerts", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "authentication required");
}

#[tokio::test]
async fn test_garbage_token_is_rejected_and_scrubbed() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/concerts", app.address))
        .header("cookie", "auth-token=garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // The gate instructs the client to drop the dead cookie
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("expected cookie scrub")
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("auth-token=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_viewer_cannot_mutate_but_keeps_session() {
    let app = spawn_app().await;
    let client = client();
    login(&app, &client, "viewer", "viewer-password").await;

    let response = client
        .post(format!("{}/concerts", app.address))
        .json(&json!({
            "title": "Forbidden",
            "date": "2026-11-03T18:00:00Z",
            "venue": "Nowhere"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    // Insufficient is not invalid: the 403 must not scrub the cookie
    assert!(response.headers().get("set-cookie").is_none());

    // The same session still reads fine
    let response = client
        .get(format!("{}/concerts", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;

    let response = client
        .post(format!("{}/logout", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // The cleared cookie no longer authenticates anything
    let response = client
        .get(format!("{}/concerts", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

// --- Concert Lifecycle ---

#[tokio::test]
async fn test_concert_crud_lifecycle() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;

    // Create
    let concert = create_concert(&app, &client).await;
    let concert_id = concert["id"].as_str().unwrap().to_string();
    assert_eq!(concert["title"], "Autumn Concert");
    assert_eq!(concert["isActive"], true);

    // Merge-patch: only the venue changes
    let response = client
        .put(format!("{}/concerts", app.address))
        .json(&json!({ "id": concert_id, "venue": "Concert Hall B" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["venue"], "Concert Hall B");
    assert_eq!(body["data"]["title"], "Autumn Concert");

    // Soft delete
    let response = client
        .delete(format!("{}/concerts?id={}", app.address, concert_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Gone from the active listing
    let response = client
        .get(format!("{}/concerts?active=true", app.address))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());

    // Still reachable by id, flagged inactive
    let response = client
        .get(format!("{}/concerts?id={}", app.address, concert_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["concert"]["isActive"], false);

    // Deleting again is still a success: the row exists
    let response = client
        .delete(format!("{}/concerts?id={}", app.address, concert_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Reactivation through the merge-patch path
    let response = client
        .put(format!("{}/concerts", app.address))
        .json(&json!({ "id": concert_id, "isActive": true }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["isActive"], true);
}

#[tokio::test]
async fn test_concert_create_rejects_bad_date() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;

    let response = client
        .post(format!("{}/concerts", app.address))
        .json(&json!({ "title": "X", "date": "next tuesday", "venue": "Hall" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_concert_delete_requires_id() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;

    let response = client
        .delete(format!("{}/concerts", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

// --- Attendance Forms ---

#[tokio::test]
async fn test_attendance_form_lifecycle() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;
    let concert = create_concert(&app, &client).await;
    let concert_id = concert["id"].as_str().unwrap();

    // Create
    let response = client
        .post(format!("{}/attendance", app.address))
        .json(&json!({
            "concertId": concert_id,
            "title": "November attendance",
            "url": "https://forms.example.com/nov"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let form_id = body["data"]["id"].as_str().unwrap().to_string();

    // Merge-patch the description only
    let response = client
        .put(format!("{}/attendance", app.address))
        .json(&json!({ "id": form_id, "description": "please respond by Friday" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["description"], "please respond by Friday");
    assert_eq!(body["data"]["title"], "November attendance");

    // List by concert
    let response = client
        .get(format!("{}/attendance?concertId={}", app.address, concert_id))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Physical delete; a second delete finds nothing
    let response = client
        .delete(format!("{}/attendance?id={}", app.address, form_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let response = client
        .delete(format!("{}/attendance?id={}", app.address, form_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_attendance_form_rejects_bad_url() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;
    let concert = create_concert(&app, &client).await;

    let response = client
        .post(format!("{}/attendance", app.address))
        .json(&json!({
            "concertId": concert["id"],
            "title": "Bad link",
            "url": "ftp://forms.example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_attendance_form_under_missing_concert_is_404() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;

    let response = client
        .post(format!("{}/attendance", app.address))
        .json(&json!({
            "concertId": "00000000-0000-0000-0000-000000000000",
            "title": "Orphan",
            "url": "https://forms.example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

// --- Scores ---

#[tokio::test]
async fn test_score_update_appends_comment_atomically() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;
    let concert = create_concert(&app, &client).await;
    let concert_id = concert["id"].as_str().unwrap();

    let response = client
        .post(format!("{}/scores", app.address))
        .json(&json!({
            "concertId": concert_id,
            "title": "Symphony No. 5",
            "url": "https://scores.example.com/sym5.pdf"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let score_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["isValid"], true);

    // Update with a comment: the history entry rides along with the change
    let response = client
        .put(format!("{}/scores", app.address))
        .json(&json!({
            "id": score_id,
            "url": "https://scores.example.com/sym5-rev2.pdf",
            "comment": "  corrected measure 41  "
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // A whitespace-only comment appends nothing
    let response = client
        .put(format!("{}/scores", app.address))
        .json(&json!({ "id": score_id, "comment": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/scores?concertId={}", app.address, concert_id))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let scores = body["data"].as_array().unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0]["url"], "https://scores.example.com/sym5-rev2.pdf");
    let comments = scores[0]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    // Comment content is stored trimmed
    assert_eq!(comments[0]["content"], "corrected measure 41");
}

#[tokio::test]
async fn test_scores_listing_requires_concert_id() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;

    let response = client
        .get(format!("{}/scores", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "concertId is required");
}

// --- Practices ---

#[tokio::test]
async fn test_practice_lifecycle_and_ordering() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;
    let concert = create_concert(&app, &client).await;
    let concert_id = concert["id"].as_str().unwrap();

    // Insert out of chronological order
    for (title, start) in [
        ("Later rehearsal", "2026-10-20T18:00:00Z"),
        ("First rehearsal", "2026-10-06T18:00:00Z"),
    ] {
        let response = client
            .post(format!("{}/practices", app.address))
            .json(&json!({
                "concertId": concert_id,
                "title": title,
                "startTime": start,
                "venue": "Rehearsal Room 2"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    // Listing comes back earliest-start-first
    let response = client
        .get(format!("{}/practices?concertId={}", app.address, concert_id))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let practices = body["data"].as_array().unwrap();
    assert_eq!(practices.len(), 2);
    assert_eq!(practices[0]["title"], "First rehearsal");
    assert_eq!(practices[1]["title"], "Later rehearsal");

    // Delete one
    let practice_id = practices[0]["id"].as_str().unwrap();
    let response = client
        .delete(format!("{}/practices?id={}", app.address, practice_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_practice_rejects_inverted_interval_and_persists_nothing() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;
    let concert = create_concert(&app, &client).await;
    let concert_id = concert["id"].as_str().unwrap();

    let response = client
        .post(format!("{}/practices", app.address))
        .json(&json!({
            "concertId": concert_id,
            "title": "Broken",
            "startTime": "2026-10-06T20:00:00Z",
            "endTime": "2026-10-06T18:00:00Z",
            "venue": "Room"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "endTime must be strictly after startTime");

    // The rejected practice never reached storage
    let response = client
        .get(format!("{}/practices?concertId={}", app.address, concert_id))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_practice_update_revalidates_merged_interval() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;
    let concert = create_concert(&app, &client).await;

    let response = client
        .post(format!("{}/practices", app.address))
        .json(&json!({
            "concertId": concert["id"],
            "title": "Rehearsal",
            "startTime": "2026-10-06T18:00:00Z",
            "endTime": "2026-10-06T20:00:00Z",
            "venue": "Room"
        }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let practice_id = body["data"]["id"].as_str().unwrap().to_string();

    // Moving only the start past the stored end inverts the merged interval
    let response = client
        .put(format!("{}/practices", app.address))
        .json(&json!({ "id": practice_id, "startTime": "2026-10-06T21:00:00Z" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

// --- Contact Info ---

#[tokio::test]
async fn test_contact_info_upsert_and_read() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;

    // Nothing stored yet
    let response = client
        .get(format!("{}/contact", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // First write creates the record
    let response = client
        .put(format!("{}/contact", app.address))
        .json(&json!({ "email": "contact@orch-link.com", "description": "Reach the committee here" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let first_id = body["data"]["id"].as_str().unwrap().to_string();

    // Second write updates in place, same logical record
    let response = client
        .put(format!("{}/contact", app.address))
        .json(&json!({ "email": "committee@orch-link.com", "description": "Updated address" }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["id"], first_id.as_str());

    let response = client
        .get(format!("{}/contact", app.address))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["email"], "committee@orch-link.com");
}

#[tokio::test]
async fn test_contact_info_rejects_malformed_email() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;

    let response = client
        .put(format!("{}/contact", app.address))
        .json(&json!({ "email": "not-an-email", "description": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

// --- Concert Detail Aggregate ---

#[tokio::test]
async fn test_concert_detail_carries_all_children() {
    let app = spawn_app().await;
    let client = client();
    login_admin(&app, &client).await;
    let concert = create_concert(&app, &client).await;
    let concert_id = concert["id"].as_str().unwrap();

    client
        .post(format!("{}/attendance", app.address))
        .json(&json!({
            "concertId": concert_id,
            "title": "Attendance",
            "url": "https://forms.example.com/a"
        }))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/scores", app.address))
        .json(&json!({
            "concertId": concert_id,
            "title": "Overture",
            "url": "https://scores.example.com/o.pdf"
        }))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/practices", app.address))
        .json(&json!({
            "concertId": concert_id,
            "title": "Rehearsal",
            "startTime": "2026-10-06T18:00:00Z",
            "venue": "Room"
        }))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("{}/concerts?id={}", app.address, concert_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let detail = &body["data"];
    assert_eq!(detail["concert"]["id"], concert_id);
    assert_eq!(detail["attendanceForms"].as_array().unwrap().len(), 1);
    assert_eq!(detail["scores"].as_array().unwrap().len(), 1);
    assert_eq!(detail["practices"].as_array().unwrap().len(), 1);
}
