//! Integration tests for the reqwest transport

use super::*;
use serde_json::json;
use social_auth_integration::{
    HttpRequest, HttpTransport, ReqwestHttpTransport, TransportErrorKind,
};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_error_statuses_are_not_transport_errors() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v2/missing"))
        .respond_with(error_response(404, json!({"meta": {"msg": "Not Found"}})))
        .mount(&mock_server)
        .await;

    let transport = ReqwestHttpTransport::new();
    let response = transport
        .send(HttpRequest::get(format!("{}/v2/missing", mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(response.status_text, "Not Found");
    assert!(response.body.contains("Not Found"));
}

#[tokio::test]
async fn test_headers_and_body_are_forwarded() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/v2/post"))
        .and(header("x-custom", "yes"))
        .and(body_string("text=hello+world"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-RateLimit-Remaining", "99")
                .set_body_json(json!({"id": 1})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = HttpRequest::post(format!("{}/v2/post", mock_server.uri()))
        .with_header("X-Custom", "yes")
        .with_form([("text", "hello world")]);

    let response = ReqwestHttpTransport::new().send(request).await.unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(
        response.headers.get("x-ratelimit-remaining").map(String::as_str),
        Some("99")
    );
}

#[tokio::test]
async fn test_request_timeout_maps_to_timed_out() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .respond_with(success_response(json!({})).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let request = HttpRequest::get(mock_server.uri()).with_timeout(Duration::from_millis(100));
    let error = ReqwestHttpTransport::new().send(request).await.unwrap_err();

    assert_eq!(error.kind, TransportErrorKind::TimedOut);
    assert!(error.is_connection_error());
}

#[tokio::test]
async fn test_refused_connection_is_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let error = ReqwestHttpTransport::new()
        .send(HttpRequest::get(format!("http://{}/", addr)))
        .await
        .unwrap_err();

    assert!(error.is_connection_error(), "unexpected kind {:?}", error.kind);
}
