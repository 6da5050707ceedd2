use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use commons_auth_types::cookie::ACCESS_TOKEN_COOKIE;
use commons_auth_types::identity::JwtSecret;
use commons_community::domain::repository::ProgressReporter;
use commons_community::infra::jobs::JobRegistry;
use commons_community::infra::luma::{LumaClient, LumaConfig};
use commons_community::infra::mailer::{AppMailer, LogMailer};
use commons_community::router::build_router;
use commons_community::state::AppState;
use commons_domain::id::SyncJobId;
use commons_domain::sync::{SyncMessage, SyncResult};
use commons_testing::auth::{MockAuth, TEST_JWT_SECRET};
use commons_testing::sse::sync_messages;

/// State without a database; routes exercised here never reach it.
fn test_state() -> AppState {
    let luma = LumaClient::new(LumaConfig {
        base_url: "http://127.0.0.1:9".into(),
        api_key: "test-key".into(),
        max_retries: 0,
        timeout_secs: 1,
        backoff_base_ms: 1,
    })
    .unwrap();
    AppState {
        db: DatabaseConnection::Disconnected,
        jwt_secret: JwtSecret::new(TEST_JWT_SECRET),
        cookie_domain: "example.com".into(),
        public_url: "https://community.example.com".into(),
        request_timeout: Duration::from_secs(30),
        mailer: AppMailer::Log(LogMailer),
        luma,
        jobs: JobRegistry::new(),
    }
}

fn server(state: AppState) -> TestServer {
    TestServer::new(build_router(state)).unwrap()
}

// ── health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_answer_health_checks_with_request_id() {
    let server = server(test_state());

    let response = server.get("/healthz").await;

    response.assert_status_ok();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let server = server(test_state());
    server
        .get("/readyz")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

// ── validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_malformed_claim_email_with_error_envelope() {
    let server = server(test_state());

    let response = server
        .post("/api/auth/claim-profile")
        .json(&json!({"email": "not an email"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "INVALID_EMAIL");
}

#[tokio::test]
async fn should_wrap_incomplete_json_body_in_error_envelope() {
    let server = server(test_state());

    let response = server.post("/api/auth/claim-profile").json(&json!({})).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "INVALID_REQUEST");
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn should_wrap_non_json_body_in_error_envelope() {
    let server = server(test_state());

    let response = server.post("/api/events/send-invite").text("email=a@b.io").await;

    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(response.json::<Value>()["kind"], "INVALID_REQUEST");
}

#[tokio::test]
async fn should_wrap_bad_query_string_in_error_envelope() {
    let server = server(test_state());

    let response = server.get("/api/people").add_query_param("page", "first").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "INVALID_REQUEST");
}

#[tokio::test]
async fn should_return_empty_suggestions_for_short_query_and_echo_seq() {
    let server = server(test_state());

    let response = server
        .get("/api/people/search-emails")
        .add_query_param("query", "a")
        .add_query_param("seq", 7)
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"results": [], "seq": 7}));
}

#[tokio::test]
async fn should_reject_malformed_email_on_check() {
    let server = server(test_state());

    let response = server
        .get("/api/people/check-email")
        .add_query_param("email", "ada@")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["kind"], "INVALID_EMAIL");
}

// ── session ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_me_without_session() {
    let server = server(test_state());
    server
        .get("/api/auth/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_check_access_token_and_expose_expiry_header() {
    let server = server(test_state());
    let auth = MockAuth::member();
    let (name, value) = auth.cookie_header();

    let response = server.get("/api/auth/token").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["userId"], auth.user_id.to_string());
    assert_eq!(body["role"], "member");
    let header = response.header("x-commons-access-token-expires");
    assert_eq!(header.to_str().unwrap(), body["accessTokenExp"].to_string());
}

#[tokio::test]
async fn should_reject_token_signed_with_another_secret() {
    let server = server(test_state());
    let (name, value) = MockAuth::member().with_secret("other").cookie_header();

    let response = server.get("/api/auth/token").add_header(name, value).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["kind"], "INVALID_TOKEN");
}

#[tokio::test]
async fn should_clear_cookies_on_logout() {
    let server = server(test_state());

    let response = server.delete("/api/auth/token").await;

    response.assert_status(StatusCode::NO_CONTENT);
    let cookie = response.cookie(ACCESS_TOKEN_COOKIE);
    assert_eq!(cookie.value(), "");
}

// ── admin ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_require_admin_for_sync() {
    let server = server(test_state());

    server
        .post("/api/admin/sync")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let (name, value) = MockAuth::member().cookie_header();
    server
        .post("/api/admin/sync")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn should_refuse_sync_while_one_is_running() {
    let state = test_state();
    let running = state.jobs.start().unwrap();
    let server = server(state);
    let (name, value) = MockAuth::admin().cookie_header();

    let response = server.post("/api/admin/sync").add_header(name, value).await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["kind"], "SYNC_ALREADY_RUNNING");
    assert_eq!(body["jobId"], running.id().to_string());
}

#[tokio::test]
async fn should_return_404_for_unknown_job() {
    let server = server(test_state());
    let (name, value) = MockAuth::admin().cookie_header();

    let response = server
        .get(&format!("/api/admin/sync/{}", SyncJobId::new()))
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["kind"], "SYNC_JOB_NOT_FOUND");
}

#[tokio::test]
async fn should_serve_job_snapshot() {
    let state = test_state();
    let job = state.jobs.start().unwrap();
    job.advance(40, "Importing events...");
    let server = server(state);
    let (name, value) = MockAuth::admin().cookie_header();

    let response = server
        .get(&format!("/api/admin/sync/{}", job.id()))
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({
            "jobId": job.id().to_string(),
            "type": "status",
            "message": "Importing events...",
            "progress": 40,
        })
    );
}

#[tokio::test]
async fn should_stream_progress_until_result_then_close() {
    let state = test_state();
    let job = state.jobs.start().unwrap();
    let id = job.id();
    job.advance(40, "Importing events...");
    let server = server(state);
    let (name, value) = MockAuth::admin().cookie_header();

    let result = SyncResult {
        total: 120,
        created: 80,
        skipped: 40,
    };
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        job.succeed("Sync complete: 80 people added, 40 skipped", result);
    });

    let response = server
        .get(&format!("/api/admin/sync/{id}/events"))
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    assert_eq!(
        sync_messages(&response.text()),
        vec![
            SyncMessage::Status {
                message: "Importing events...".into(),
                progress: 40,
                data: None,
            },
            SyncMessage::Status {
                message: "Sync complete: 80 people added, 40 skipped".into(),
                progress: 100,
                data: Some(result),
            },
        ]
    );
}

#[tokio::test]
async fn should_replay_terminal_state_to_late_subscriber() {
    let state = test_state();
    let job = state.jobs.start().unwrap();
    let id = job.id();
    job.advance(30, "Fetching events...");
    job.fail("Sync failed: events platform unavailable");
    drop(job);
    let server = server(state);
    let (name, value) = MockAuth::admin().cookie_header();

    let response = server
        .get(&format!("/api/admin/sync/{id}/events"))
        .add_header(name, value)
        .await;

    assert_eq!(
        sync_messages(&response.text()),
        vec![SyncMessage::Error {
            message: "Sync failed: events platform unavailable".into(),
        }]
    );
}

#[tokio::test]
async fn should_attach_reset_stream_to_running_job() {
    let state = test_state();
    let job = state.jobs.start().unwrap();
    let server = server(state);
    let (name, value) = MockAuth::admin().cookie_header();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        job.succeed("Sync complete: 0 people added, 0 skipped", SyncResult::default());
    });

    let response = server
        .get("/api/admin/reset-database")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let messages = sync_messages(&response.text());
    assert!(messages.last().unwrap().is_terminal());
    assert_eq!(
        messages.first().unwrap(),
        &SyncMessage::Status {
            message: "Starting sync...".into(),
            progress: 0,
            data: None,
        }
    );
}
