//! Integration tests for the Inbound Notifier (`POST /hooks/build-paused`).
//!
//! A wiremock server stands in for the Slack incoming webhook; requests are
//! driven through the real router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use relay::api::notify::{post_approval_request, BuildPaused};
use relay::config::Config;
use relay::models::approval::{ApprovalRequest, ButtonEncoding};
use relay::{api, AppState};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(slack_webhook: Option<String>, encoding: ButtonEncoding) -> axum::Router {
    let cfg = Config {
        slack_webhook,
        button_encoding: encoding,
        ..Config::default()
    };
    api::router(Arc::new(AppState::new(cfg).unwrap()))
}

async fn post_json(app: axum::Router, body: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri("/hooks/build-paused")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn mount_slack(server: &MockServer, status: u16, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/services/T/B/X"))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_end_to_end_posts_both_buttons() {
    let slack = MockServer::start().await;
    mount_slack(&slack, 200, 1).await;

    let app = app(Some(format!("{}/services/T/B/X", slack.uri())), ButtonEncoding::Pipe);
    let (status, body) = post_json(
        app,
        r#"{"buildUrl":"http://j/b/1/","pipelineUrl":"http://j/","buildVersion":"2.3.0"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty(), "expected empty body, got {:?}", body);

    let requests = slack.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();

    assert_eq!(sent["text"], "Build 2.3.0 requests deployment");
    let actions = sent["attachments"][0]["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0]["value"], "true|http://j/b/1/|http://j/|2.3.0");
    assert_eq!(actions[1]["value"], "false|http://j/b/1/|http://j/|2.3.0");
    assert!(actions.iter().all(|a| a["name"] == "approve" && a["type"] == "button"));
}

#[tokio::test]
async fn test_missing_build_url_is_400_without_network_call() {
    let slack = MockServer::start().await;
    mount_slack(&slack, 200, 0).await;

    let app = app(Some(format!("{}/services/T/B/X", slack.uri())), ButtonEncoding::Pipe);
    let (status, body) = post_json(app, r#"{"pipelineUrl":"http://j/","buildVersion":"2.3.0"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "buildUrl must be present in request");
}

#[tokio::test]
async fn test_missing_build_version_is_named() {
    let slack = MockServer::start().await;
    mount_slack(&slack, 200, 0).await;

    let app = app(Some(format!("{}/services/T/B/X", slack.uri())), ButtonEncoding::Pipe);
    let (status, body) = post_json(app, r#"{"buildUrl":"http://j/b/1/","jenkinsUrl":"http://j/"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("buildVersion"));
}

#[tokio::test]
async fn test_slack_rejection_still_returns_200() {
    let slack = MockServer::start().await;
    mount_slack(&slack, 500, 1).await;

    let app = app(Some(format!("{}/services/T/B/X", slack.uri())), ButtonEncoding::Pipe);
    let (status, body) = post_json(
        app,
        r#"{"buildUrl":"http://j/b/1/","pipelineUrl":"http://j/","buildVersion":"2.3.0"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_delimiter_in_field_is_rejected_under_pipe_encoding() {
    let slack = MockServer::start().await;
    mount_slack(&slack, 200, 0).await;

    let app = app(Some(format!("{}/services/T/B/X", slack.uri())), ButtonEncoding::Pipe);
    let (status, body) = post_json(
        app,
        r#"{"buildUrl":"http://j/b/1/","pipelineUrl":"http://j/","buildVersion":"2.3.0|rc"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("buildVersion"));
}

#[tokio::test]
async fn test_json_encoding_round_trips_through_buttons() {
    let slack = MockServer::start().await;
    mount_slack(&slack, 200, 1).await;

    let app = app(Some(format!("{}/services/T/B/X", slack.uri())), ButtonEncoding::Json);
    let (status, _) = post_json(
        app,
        r#"{"buildUrl":"http://j/b/1/","pipelineUrl":"http://j/","buildVersion":"2.3.0|rc"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let requests = slack.received_requests().await.unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let proceed = sent["attachments"][0]["actions"][0]["value"].as_str().unwrap();
    let decoded = ApprovalRequest::decode(proceed).unwrap();
    assert_eq!(decoded, ApprovalRequest::new(true, "http://j/b/1/", "http://j/", "2.3.0|rc"));
}

#[tokio::test]
async fn test_missing_webhook_is_configuration_error() {
    let app = app(None, ButtonEncoding::Pipe);
    let (status, body) = post_json(
        app,
        r#"{"buildUrl":"http://j/b/1/","pipelineUrl":"http://j/","buildVersion":"2.3.0"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("configuration_error"));
}

#[tokio::test]
async fn test_non_json_body_is_400() {
    let app = app(Some("http://127.0.0.1:1/unused".into()), ButtonEncoding::Pipe);
    let (status, body) = post_json(app, "buildUrl=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("JSON object"));
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = app(None, ButtonEncoding::Pipe);
    let resp = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_post_approval_request_reports_slack_rejection() {
    let slack = MockServer::start().await;
    mount_slack(&slack, 404, 1).await;

    let state = AppState::new(Config::default()).unwrap();
    let build = BuildPaused {
        build_url: "http://j/b/1/".into(),
        pipeline_url: "http://j/".into(),
        build_version: "2.3.0".into(),
    };
    let url = format!("{}/services/T/B/X", slack.uri());
    let delivered = post_approval_request(&state.slack, &url, &build, ButtonEncoding::Pipe)
        .await
        .unwrap();
    assert!(!delivered);
}
