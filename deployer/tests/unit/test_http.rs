//! HTTP backends against local stand-in servers

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use deployerai::context::CallContext;
use deployerai::errors::{DeployerError, ErrorKind};
use deployerai::http::pulls::{MAX_PAGES, PAGE_SIZE};
use deployerai::models::selection::Model;
use deployerai::resolve::pattern::TicketPattern;
use deployerai::resolve::resolver::TicketResolver;
use deployerai::resolve::source::{GitHubSource, ReviewSource};
use deployerai::select::client::TargetSelector;
use deployerai::select::oracle::ChatCompletionsOracle;

use crate::common::{request, serve, target};

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

// --- chat completions ---

#[derive(Clone)]
struct OracleStub {
    status: StatusCode,
    body: Value,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn completions(
    State(stub): State<OracleStub>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    stub.seen.lock().unwrap().push((auth, payload));
    (stub.status, Json(stub.body.clone())).into_response()
}

async fn oracle_stub(status: StatusCode, body: Value) -> (String, OracleStub) {
    let stub = OracleStub {
        status,
        body,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let router = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(stub.clone());
    (format!("{}/v1", serve(router).await), stub)
}

fn completion_with(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-4-0125-preview",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 420, "completion_tokens": 40, "total_tokens": 460 }
    })
}

fn selector(base_url: &str) -> TargetSelector {
    let oracle =
        ChatCompletionsOracle::new(base_url, secret("sk-test"), Duration::from_secs(5)).unwrap();
    TargetSelector::new(Arc::new(oracle))
}

#[tokio::test]
async fn test_chat_completions_round_trip() {
    let reply = r#"{"deployment_target_name":"devb","deployment_image":"pr-1462","message":"devb is the least recently used"}"#;
    let (base_url, stub) = oracle_stub(StatusCode::OK, completion_with(reply)).await;
    let req = request(vec![target("deva", Some(2)), target("devb", Some(3))], "None");

    let outcome = selector(&base_url)
        .select_target(&CallContext::background(), &Model::Gpt35, &req)
        .await
        .unwrap();
    assert_eq!(outcome.deployment_target_name, "devb");
    assert_eq!(outcome.deployment_image, "pr-1462");

    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (auth, payload) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(payload["model"], "gpt-3.5-turbo-0125");
    assert_eq!(payload["response_format"]["type"], "json_object");
    assert_eq!(payload["messages"][0]["role"], "system");
    assert_eq!(payload["messages"][1]["role"], "user");

    let user = payload["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains(r#""message_from_developer":"Please deploy pr-1462""#));
    assert!(user.contains(r#""deployment_target_name":"devb""#));
}

#[tokio::test]
async fn test_chat_completions_server_error_keeps_body() {
    let (base_url, _) = oracle_stub(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": { "message": "overloaded" } }),
    )
    .await;
    let req = request(vec![target("deva", Some(2))], "None");

    let err = selector(&base_url)
        .select_target(&CallContext::background(), &Model::default(), &req)
        .await
        .unwrap_err();

    match &err {
        DeployerError::StatusError { status, body } => {
            assert_eq!(*status, 500);
            assert!(body.contains("overloaded"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_chat_completions_without_choices() {
    let mut body = completion_with("");
    body["choices"] = json!([]);
    let (base_url, _) = oracle_stub(StatusCode::OK, body).await;
    let req = request(vec![target("deva", Some(2))], "None");

    let err = selector(&base_url)
        .select_target(&CallContext::background(), &Model::default(), &req)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOutcome);
}

#[tokio::test]
async fn test_chat_completions_unreadable_body() {
    let (base_url, _) = oracle_stub(StatusCode::OK, json!("not a completion")).await;
    let req = request(vec![target("deva", Some(2))], "None");

    let err = selector(&base_url)
        .select_target(&CallContext::background(), &Model::default(), &req)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployerError::DecodeError(_)));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_chat_completions_unknown_target() {
    let reply = r#"{"deployment_target_name":"staging","deployment_image":"pr-1462","message":"?"}"#;
    let (base_url, _) = oracle_stub(StatusCode::OK, completion_with(reply)).await;
    let req = request(vec![target("deva", Some(2)), target("devb", Some(3))], "None");

    let err = selector(&base_url)
        .select_target(&CallContext::background(), &Model::default(), &req)
        .await
        .unwrap_err();
    assert!(matches!(err, DeployerError::InvalidOutcome(_)));
}

#[tokio::test]
async fn test_unreachable_oracle_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let req = request(vec![target("deva", Some(2))], "None");
    let err = selector(&format!("http://{}", addr))
        .select_target(&CallContext::background(), &Model::default(), &req)
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

// --- pull requests ---

#[derive(Clone, Default)]
struct PullsStub {
    repos: Arc<HashMap<String, Vec<Value>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn pulls(
    State(stub): State<PullsStub>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    stub.queries.lock().unwrap().push(query.clone());

    if owner != "omiq-ai" {
        return (StatusCode::NOT_FOUND, "owner not found").into_response();
    }
    let Some(all) = stub.repos.get(&repo) else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    };

    let per_page: usize = query.get("per_page").and_then(|v| v.parse().ok()).unwrap_or(30);
    let page: usize = query.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);
    let items: Vec<Value> = all
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    Json(items).into_response()
}

fn pull(number: u64, title: &str) -> Value {
    json!({
        "number": number,
        "title": title,
        "state": "open",
        "html_url": format!("https://github.com/omiq-ai/repo/pull/{}", number),
        "draft": false,
        "user": { "login": "someone" }
    })
}

async fn pulls_stub(repos: HashMap<String, Vec<Value>>) -> (String, PullsStub) {
    let stub = PullsStub {
        repos: Arc::new(repos),
        ..Default::default()
    };
    let router = Router::new()
        .route("/repos/{owner}/{repo}/pulls", get(pulls))
        .with_state(stub.clone());
    (serve(router).await, stub)
}

fn github(base_url: &str) -> GitHubSource {
    GitHubSource::new(base_url, "omiq-ai", secret("ghp_test"), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_listing_follows_pages() {
    let many: Vec<Value> = (1..=150)
        .map(|n| pull(n, &format!("OM-{} change {}", n, n)))
        .collect();
    let (base_url, stub) = pulls_stub(HashMap::from([("platform".to_string(), many)])).await;

    let open = github(&base_url).list_open("platform").await.unwrap();
    assert_eq!(open.len(), 150);
    assert!(open.iter().all(|pr| pr.repo == "platform"));
    assert_eq!(open[149].number, 150);

    let queries = stub.queries.lock().unwrap();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].get("state").map(String::as_str), Some("open"));
    assert_eq!(queries[0].get("per_page").map(String::as_str), Some("100"));
    assert_eq!(queries[1].get("page").map(String::as_str), Some("2"));
}

#[tokio::test]
async fn test_listing_that_never_ends_is_an_error() {
    let full: Vec<Value> = (1..=PAGE_SIZE as u64)
        .map(|n| pull(n, &format!("OM-{} change", n)))
        .collect();
    let requests = Arc::new(Mutex::new(0usize));
    let counter = requests.clone();
    // Every page is full, whatever page is asked for
    let router = Router::new().route(
        "/repos/{owner}/{repo}/pulls",
        get(move || {
            *counter.lock().unwrap() += 1;
            let page = full.clone();
            async move { Json(page) }
        }),
    );
    let base_url = serve(router).await;

    let err = github(&base_url).list_open("platform").await.unwrap_err();
    assert!(matches!(err, DeployerError::DecodeError(_)));
    assert!(err.to_string().contains("omiq-ai/platform"));
    assert_eq!(*requests.lock().unwrap(), MAX_PAGES as usize);
}

#[tokio::test]
async fn test_listing_error_status() {
    let (base_url, _) = pulls_stub(HashMap::new()).await;

    let err = github(&base_url).list_open("missing").await.unwrap_err();
    match err {
        DeployerError::StatusError { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_resolve_over_http() {
    let (base_url, _) = pulls_stub(HashMap::from([
        (
            "platform".to_string(),
            vec![
                pull(1507, "OM-410 Add Cache to Groups Service"),
                pull(1490, "OM-337-allow-omiq-staff-override-in-concat-files"),
            ],
        ),
        ("webapp".to_string(), vec![pull(12, "Update README")]),
    ]))
    .await;

    let resolver = TicketResolver::new(
        Arc::new(github(&base_url)),
        vec!["platform".to_string(), "webapp".to_string()],
        TicketPattern::any_prefix().unwrap(),
    )
    .unwrap();

    let found = resolver
        .resolve_ticket(&CallContext::background(), "om-410")
        .await
        .unwrap();
    assert_eq!(found.number, 1507);
    assert_eq!(found.repo, "platform");
    assert_eq!(found.title, "OM-410 Add Cache to Groups Service");
}

#[tokio::test]
async fn test_resolve_fails_when_one_repository_errors() {
    let (base_url, _) = pulls_stub(HashMap::from([(
        "platform".to_string(),
        vec![pull(1507, "OM-410 Add Cache to Groups Service")],
    )]))
    .await;

    let resolver = TicketResolver::new(
        Arc::new(github(&base_url)),
        vec!["platform".to_string(), "webapp".to_string()],
        TicketPattern::any_prefix().unwrap(),
    )
    .unwrap();

    let err = resolver
        .resolve_ticket(&CallContext::background(), "OM-410")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
