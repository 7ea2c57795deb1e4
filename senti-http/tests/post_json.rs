use senti_http::{HttpClient, HttpError};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::new(&format!("{}/api", server.uri())).expect("valid base")
}

#[tokio::test]
async fn posts_json_under_base_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/predict"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"text": "hello", "model": "roberta"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let got: Value = client
        .post_json("predict", &json!({"text": "hello", "model": "roberta"}))
        .await
        .expect("success");
    assert_eq!(got, json!({"ok": true}));
}

#[tokio::test]
async fn non_success_uses_body_text_as_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/predict"))
        .respond_with(ResponseTemplate::new(422).set_body_string("text must not be empty"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .post_json::<_, Value>("predict", &json!({}))
        .await
        .unwrap_err();
    match err {
        HttpError::Api { status, message, .. } => {
            assert_eq!(status.as_u16(), 422);
            assert_eq!(message, "text must not be empty");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_error_body_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .post_json::<_, Value>("predict", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "API 503");
}

#[tokio::test]
async fn failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let _ = client_for(&server)
        .await
        .post_json::<_, Value>("predict", &json!({}))
        .await;
    // `expect(1)` is verified when the server drops.
}

#[tokio::test]
async fn ack_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/feedback"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let ack = client_for(&server)
        .await
        .post_for_ack("feedback", &json!({"id": "x", "correct": true}))
        .await
        .expect("ack");
    assert_eq!(ack, Value::Null);
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .await
        .post_json::<_, Value>("predict", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Decode(_, ref snip) if snip == "<html>"));
}

#[tokio::test]
async fn client_timeout_applies_to_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server)
        .await
        .with_timeout(std::time::Duration::from_millis(50));
    let err = client
        .post_json::<_, Value>("predict", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Network(_)));
}
