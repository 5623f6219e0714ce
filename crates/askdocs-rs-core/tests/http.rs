//! HTTP knowledge-base backend against a local mock server.

use askdocs_rs_core::{HttpKnowledgeBase, KnowledgeBase, RetrievalClient, RetryPolicy};
use askdocs_rs_protocol::{
    AttemptOutcome, CitationRef, KnowledgeBaseError, Notice, RetrievalRequest,
};
use askdocs_rs_test_utils::{RecordingAttemptSink, RecordingNoticeSink};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

const MODEL_ARN: &str = "arn:aws:bedrock:us-east-1::foundation-model/test-model";

struct MockResponse {
    status: StatusCode,
    error_type: Option<&'static str>,
    body: String,
}

impl MockResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            error_type: None,
            body: body.to_string(),
        }
    }

    fn error(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            error_type: None,
            body: body.to_string(),
        }
    }
}

#[derive(Clone, Default)]
struct MockState {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn retrieve_and_generate(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.seen.lock().push((auth, body));
    let Some(response) = state.responses.lock().pop_front() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "no scripted response").into_response();
    };
    let mut reply = (
        response.status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response();
    if let Some(error_type) = response.error_type {
        reply.headers_mut().insert(
            "x-amzn-errortype",
            error_type.parse().expect("header value"),
        );
    }
    reply
}

async fn spawn_mock(responses: Vec<MockResponse>) -> (String, MockState) {
    let state = MockState {
        responses: Arc::new(Mutex::new(responses.into())),
        seen: Arc::default(),
    };
    let app = Router::new()
        .route("/retrieveAndGenerate", post(retrieve_and_generate))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), state)
}

fn backend(endpoint: &str) -> HttpKnowledgeBase {
    HttpKnowledgeBase::new(endpoint, MODEL_ARN, Duration::from_secs(5)).expect("backend")
}

fn request() -> RetrievalRequest {
    RetrievalRequest {
        question_text: "Who owns the billing service?".to_string(),
        knowledge_base_id: "KB777".to_string(),
    }
}

#[tokio::test]
async fn sends_request_shape_and_parses_answer() {
    let (endpoint, state) = spawn_mock(vec![MockResponse::ok(json!({
        "output": { "text": "The payments team." },
        "citations": [{
            "retrievedReferences": [
                { "location": { "confluenceLocation": { "url": "https://wiki.example.com/billing" } } }
            ]
        }]
    }))])
    .await;

    let answer = backend(&format!("{endpoint}/"))
        .with_auth_token("token-abc")
        .retrieve_and_generate(&request())
        .await
        .expect("answer");

    assert_eq!(answer.answer_text, "The payments team.");
    assert_eq!(
        answer.citations,
        vec![CitationRef::new("https://wiki.example.com/billing")]
    );
    let seen = state.seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("Bearer token-abc"));
    assert_eq!(
        seen[0].1,
        json!({
            "input": { "text": "Who owns the billing service?" },
            "retrieveAndGenerateConfiguration": {
                "type": "KNOWLEDGE_BASE",
                "knowledgeBaseConfiguration": {
                    "knowledgeBaseId": "KB777",
                    "modelArn": MODEL_ARN
                }
            }
        })
    );
}

#[tokio::test]
async fn too_many_requests_is_throttled() {
    let (endpoint, _) = spawn_mock(vec![MockResponse::error(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "message": "Rate exceeded" }),
    )])
    .await;

    let err = backend(&endpoint)
        .retrieve_and_generate(&request())
        .await
        .unwrap_err();
    assert_eq!(err, KnowledgeBaseError::Throttled("Rate exceeded".to_string()));
}

#[tokio::test]
async fn throttling_exception_header_is_throttled() {
    let (endpoint, _) = spawn_mock(vec![MockResponse {
        status: StatusCode::BAD_REQUEST,
        error_type: Some("ThrottlingException"),
        body: "{}".to_string(),
    }])
    .await;

    let err = backend(&endpoint)
        .retrieve_and_generate(&request())
        .await
        .unwrap_err();
    assert!(err.is_throttled());
}

#[tokio::test]
async fn server_error_and_bad_body_are_other_failures() {
    let (endpoint, _) = spawn_mock(vec![
        MockResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "__type": "InternalServerException", "message": "boom" }),
        ),
        MockResponse::ok(json!({ "unexpected": true })),
    ])
    .await;
    let backend = backend(&endpoint);

    let err = backend.retrieve_and_generate(&request()).await.unwrap_err();
    assert_eq!(
        err,
        KnowledgeBaseError::Other("HTTP 500 Internal Server Error: boom".to_string())
    );
    let err = backend.retrieve_and_generate(&request()).await.unwrap_err();
    assert!(!err.is_throttled());
    assert!(err.to_string().starts_with("invalid response body"));
}

#[tokio::test]
async fn unreachable_endpoint_is_not_retried() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let attempts = Arc::new(RecordingAttemptSink::default());
    let notices = Arc::new(RecordingNoticeSink::default());
    let client = RetrievalClient::new(
        Arc::new(backend(&format!("http://{addr}"))),
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        },
    )
    .with_attempt_sink(attempts.clone())
    .with_notice_sink(notices.clone());

    assert!(client.retrieve("q", "KB777").await.is_failed());
    assert_eq!(attempts.outcomes(), vec![AttemptOutcome::Failed]);
    let notices = notices.notices();
    assert_eq!(notices.len(), 1);
    assert!(matches!(&notices[0], Notice::Error(description) if description.starts_with("request failed")));
}

#[tokio::test]
async fn client_retries_throttled_http_calls() {
    let (endpoint, state) = spawn_mock(vec![
        MockResponse::error(StatusCode::TOO_MANY_REQUESTS, json!({})),
        MockResponse::error(
            StatusCode::BAD_REQUEST,
            json!({ "__type": "ThrottlingException", "message": "slow down" }),
        ),
        MockResponse::ok(json!({ "output": { "text": "done" } })),
    ])
    .await;
    let attempts = Arc::new(RecordingAttemptSink::default());
    let client = RetrievalClient::new(
        Arc::new(backend(&endpoint)),
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        },
    )
    .with_attempt_sink(attempts.clone());

    let result = client.retrieve("q", "KB777").await;

    let answer = result.answer().expect("answered");
    assert_eq!(answer.answer_text, "done");
    assert!(answer.citations.is_empty());
    assert_eq!(state.seen.lock().len(), 3);
    assert_eq!(
        attempts.outcomes(),
        vec![
            AttemptOutcome::Throttled,
            AttemptOutcome::Throttled,
            AttemptOutcome::Success,
        ]
    );
}
