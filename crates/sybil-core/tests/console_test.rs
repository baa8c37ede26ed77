#![allow(clippy::unwrap_used)]
// End-to-end tests for the console layer against a wiremock backend.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sybil_core::{
    AdminUser, ActionDispatcher, ChatHistory, ClassificationSettings, Console, ConsoleConfig,
    CoreError, Dispatch, PipelineAction, SessionStore,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn console(logged_in: bool) -> (MockServer, Console) {
    let server = MockServer::start().await;
    let session = SessionStore::in_memory();
    if logged_in {
        session.login(
            "test-token",
            AdminUser {
                username: Some("ops".into()),
                ..AdminUser::default()
            },
        );
    }
    let config = ConsoleConfig::new(Url::parse(&server.uri()).unwrap());
    let console = Console::new(config, session).unwrap();
    (server, console)
}

fn summary(is_running: bool, failed: u64) -> serde_json::Value {
    json!({
        "status": {
            "status": if is_running { "running" } else { "stopped" },
            "is_running": is_running,
            "circuit_breaker_open": false,
            "consecutive_failures": 0,
            "interval_seconds": 300,
            "last_run_at": "2025-03-01T09:55:00Z",
            "next_scheduled_run": "2025-03-01T10:00:00Z"
        },
        "processing": {
            "processed_transcripts": 412,
            "failed_transcripts": failed,
            "pending_transcripts": 3,
            "total_chunks": 5120,
            "total_entities": 9800,
            "total_relationships": 14002,
            "success_rate_7d": 98.2
        },
        "performance": {
            "avg_processing_time_ms": 5300.0,
            "p95_processing_time_ms": 12000.0,
            "transcripts_per_hour": 6.5
        },
        "data_quality": {
            "avg_entities_per_transcript": 23.8,
            "avg_relationships_per_transcript": 34.0
        },
        "recent_errors_count": failed,
        "last_updated": "2025-03-01T10:00:00Z"
    })
}

fn daily() -> serde_json::Value {
    json!([
        {"date": "2025-02-28", "transcripts_processed": 40, "transcripts_failed": 1},
        {"date": "2025-03-01", "transcripts_processed": 12, "transcripts_failed": 0}
    ])
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn login_then_views_use_the_token() {
    let (server, console) = console(false).await;

    Mock::given(method("POST"))
        .and(path("/admin/auth/login"))
        .and(body_partial_json(json!({"username": "ops@example.org"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "user": {"username": "ops", "email": "ops@example.org"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/whitelist"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/whitelist/stats"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"total": 0, "active": 0, "inactive": 0})),
        )
        .mount(&server)
        .await;

    assert!(!console.is_authenticated());
    let mut auth = console.auth_changes();
    let user = console
        .login("ops@example.org", &SecretString::from("hunter2"))
        .await
        .unwrap();
    assert_eq!(user.display_name(), "ops");
    assert!(console.is_authenticated());
    assert!(auth.has_changed().unwrap());
    assert!(*auth.borrow_and_update());

    let view = console.whitelist(true);
    let state = view.settled().await.unwrap();
    assert!(state.error.is_none(), "unexpected error: {:?}", state.error);
    assert_eq!(state.data.unwrap().stats.total, 0);
}

#[tokio::test]
async fn expired_session_is_flagged_on_the_view() {
    let (server, console) = console(true).await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})),
        )
        .mount(&server)
        .await;

    let view = console.pipeline_runs();
    let state = view.settled().await.unwrap();
    assert!(state.session_expired);
    assert!(state.data.is_none());
    assert!(!console.is_authenticated());

    // The next poll fails locally without reaching the backend.
    let received = server.received_requests().await.unwrap().len();
    view.refresh();
    let state = view.next_result().await.unwrap();
    assert!(!state.session_expired);
    assert!(matches!(state.error, Some(CoreError::NotAuthenticated)));
    assert_eq!(server.received_requests().await.unwrap().len(), received);
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn one_failing_resource_keeps_the_whole_snapshot() {
    let (server, console) = console(true).await;

    Mock::given(method("GET"))
        .and(path("/admin/otter/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary(true, 2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/otter/daily-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily()))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/otter/daily-stats"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .with_priority(2)
        .mount(&server)
        .await;

    let view = console.pipeline_dashboard();
    let first = view.settled().await.unwrap();
    let first_data = first.data.clone().unwrap();
    assert_eq!(first_data.daily.len(), 2);
    assert!(first_data.summary.status.is_running);

    view.refresh();
    let second = view.next_result().await.unwrap();
    let err = second.error.unwrap();
    assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
    assert_eq!(err.to_string(), "HTTP 500");
    assert!(std::sync::Arc::ptr_eq(&second.data.unwrap(), &first_data));
    assert_eq!(second.last_updated, first.last_updated);
}

// ── Actions ─────────────────────────────────────────────────────────

#[tokio::test]
async fn forced_retry_failed_reaches_the_backend() {
    let (server, console) = console(true).await;

    Mock::given(method("GET"))
        .and(path("/admin/otter/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(summary(true, 0)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/otter/daily-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/otter/retry-failed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "No failed transcripts to retry",
            "retried": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let view = console.pipeline_dashboard();
    let state = view.settled().await.unwrap();
    let summary = &state.data.as_ref().unwrap().summary;
    assert!(!PipelineAction::RetryFailed.is_enabled(summary));

    let dispatcher = console.dispatcher(view.handle());
    let client = console.client().clone();
    let result = dispatcher
        .dispatch("retry-failed", || async move {
            PipelineAction::RetryFailed.run(&client).await
        })
        .await;

    match result {
        Dispatch::Succeeded(message) => assert_eq!(message, "No failed transcripts to retry"),
        other => panic!("unexpected dispatch result: {other:?}"),
    }
}

#[tokio::test]
async fn backend_rejection_becomes_error_outcome() {
    let (server, console) = console(true).await;

    Mock::given(method("POST"))
        .and(path("/admin/otter/start"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"detail": "Pipeline is already running"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = ActionDispatcher::new(console.config().settle_delay);
    let client = console.client().clone();
    let result = dispatcher
        .dispatch("start", || async move { PipelineAction::Start.run(&client).await })
        .await;

    assert!(matches!(result, Dispatch::Failed(CoreError::Api { status: Some(409), .. })));
    let last = dispatcher.state().last.unwrap();
    assert!(!last.is_success());
    assert_eq!(last.message(), "Pipeline is already running");
}

// ── Transcripts ─────────────────────────────────────────────────────

#[tokio::test]
async fn classification_save_sends_full_config() {
    let (server, console) = console(true).await;

    Mock::given(method("PUT"))
        .and(path("/admin/otter/transcripts/config"))
        .and(body_partial_json(json!({
            "team_call_indicators": ["retro", "board review"],
            "team_calls_folder_name": "Team Calls",
            "private_folder_name": "Private"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "team_call_indicators": ["retro", "board review"],
            "team_calls_folder_name": "Team Calls",
            "private_folder_name": "Private",
            "message": "Saved"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = ClassificationSettings::default();
    settings.team_call_indicators = vec!["retro".into()];
    settings.add_indicator("Board Review");
    let message = settings.save(console.client()).await.unwrap();
    assert_eq!(message, "Saved");

    settings.team_call_indicators.clear();
    let err = settings.save(console.client()).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

// ── Chat ────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_keeps_user_message_on_failure() {
    let (server, console) = console(true).await;

    Mock::given(method("POST"))
        .and(path("/admin/chat"))
        .and(body_partial_json(json!({"message": "What did we decide?", "history": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "You agreed to ship Friday.",
            "timestamp": "2025-03-01T10:00:05Z"
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/chat"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(2)
        .mount(&server)
        .await;

    let mut chat = console.chat(None).unwrap();
    let reply = chat.send("What did we decide?").await.unwrap();
    assert_eq!(reply.content, "You agreed to ship Friday.");
    assert_eq!(reply.timestamp, "2025-03-01T10:00:05Z");

    let err = chat.send("And after that?").await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 503");
    let contents: Vec<_> = chat.history().messages().map(|m| m.content.clone()).collect();
    assert_eq!(
        contents,
        ["What did we decide?", "You agreed to ship Friday.", "And after that?"]
    );

    assert!(chat.send("   ").await.is_err());
    assert_eq!(chat.history().len(), 3);
}

#[tokio::test]
async fn chat_history_for_another_user_is_discarded() {
    let (_server, console) = console(true).await;
    let foreign = ChatHistory::from_messages("someone-else", 10, Vec::new());
    let chat = console.chat(Some(foreign)).unwrap();
    assert_eq!(chat.history().user(), "ops");

    console.logout();
    assert!(matches!(console.chat(None), Err(CoreError::NotAuthenticated)));
}
