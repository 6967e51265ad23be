//! OpenAI-compatible provider against an in-process mock endpoint.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use wand_rs_core::{CorrectionError, CorrectionPipeline, OpenAiProvider};
use wand_rs_protocol::{Completion, CompletionProvider, FinishReason, ProviderError, Record, Role};

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Value,
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn chat_completions(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.requests.lock().push((auth, body));
    (state.status, Json(state.reply.clone()))
}

struct MockServer {
    base_url: String,
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn serve(status: StatusCode, reply: Value) -> MockServer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        reply,
        requests: requests.clone(),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    MockServer {
        base_url: format!("http://{addr}/v1"),
        requests,
    }
}

fn reply(finish_reason: &str, content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "finish_reason": finish_reason,
            "message": { "role": "assistant", "content": content }
        }]
    })
}

/// The prompt goes out as a single system message with bearer auth.
#[tokio::test]
async fn sends_single_system_message_and_parses_answer() {
    let server = serve(StatusCode::OK, reply("stop", "Ship it to 12 Main Street")).await;
    let provider = OpenAiProvider::new(
        &server.base_url,
        "gpt-3.5-turbo",
        Some("sk-test".to_string()),
    );

    let completion = provider.complete("fix this").await.expect("complete");

    assert_eq!(completion, Completion::stop("Ship it to 12 Main Street"));
    let requests = server.requests.lock().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0.as_deref(), Some("Bearer sk-test"));
    assert_eq!(
        requests[0].1,
        json!({
            "model": "gpt-3.5-turbo",
            "messages": [{ "role": "system", "content": "fix this" }]
        })
    );
}

#[tokio::test]
async fn omits_auth_header_without_key() {
    let server = serve(StatusCode::OK, reply("stop", "ok")).await;
    let provider = OpenAiProvider::new(&server.base_url, "local-model", None);
    provider.complete("hi").await.expect("complete");
    assert_eq!(server.requests.lock()[0].0, None);
}

#[tokio::test]
async fn reports_non_stop_finish_reason() {
    let server = serve(StatusCode::OK, reply("length", "Ship it to")).await;
    let provider = OpenAiProvider::new(&server.base_url, "m", None);
    let completion = provider.complete("p").await.expect("complete");
    assert_eq!(completion.finish_reason, FinishReason::Length);
    assert_eq!(completion.text, "Ship it to");
}

#[tokio::test]
async fn error_status_becomes_status_error() {
    let server = serve(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "slow down" } }),
    )
    .await;
    let provider = OpenAiProvider::new(&server.base_url, "m", None);
    let err = provider.complete("p").await.expect_err("should fail");
    match err {
        ProviderError::Status { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("slow down"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_choices_are_malformed() {
    let server = serve(StatusCode::OK, json!({ "choices": [] })).await;
    let provider = OpenAiProvider::new(&server.base_url, "m", None);
    assert!(matches!(
        provider.complete("p").await,
        Err(ProviderError::Malformed(_))
    ));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let provider = OpenAiProvider::new(&format!("http://{addr}/v1"), "m", None);
    assert!(matches!(
        provider.complete("p").await,
        Err(ProviderError::Transport(_))
    ));
}

/// Server errors abort a pipeline run with nothing kept.
#[tokio::test]
async fn pipeline_over_failing_endpoint_discards_run() {
    let server = serve(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "down" })).await;
    let provider = OpenAiProvider::new(&server.base_url, "m", None);
    let pipeline = CorrectionPipeline::new(Arc::new(provider));
    let records = vec![Record::new(Role::User, "a"), Record::new(Role::User, "b")];

    let err = pipeline
        .run(&records, "fix")
        .await
        .expect_err("run should fail");

    assert!(matches!(
        err,
        CorrectionError::ServiceFailure {
            position: 0,
            source: ProviderError::Status { status: 500, .. }
        }
    ));
    assert_eq!(server.requests.lock().len(), 1);
}

/// A normal stop with no message content aborts the run instead of blanking a record.
#[tokio::test]
async fn stop_without_content_fails_the_run() {
    let server = serve(
        StatusCode::OK,
        json!({ "choices": [{ "finish_reason": "stop", "message": { "content": null } }] }),
    )
    .await;
    let provider = OpenAiProvider::new(&server.base_url, "m", None);
    let pipeline = CorrectionPipeline::new(Arc::new(provider));
    let records = vec![Record::new(Role::User, "keep me"), Record::new(Role::User, "b")];

    let err = pipeline
        .run(&records, "fix")
        .await
        .expect_err("run should fail");

    assert!(matches!(
        err,
        CorrectionError::ServiceFailure {
            position: 0,
            source: ProviderError::Malformed(_)
        }
    ));
    assert_eq!(server.requests.lock().len(), 1);
}
