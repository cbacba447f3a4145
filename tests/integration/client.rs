//! Integration tests for the full client

use super::*;
use serde_json::json;
use social_auth_integration::signing::{FixedClock, FixedNonceGenerator};
use social_auth_integration::{
    AuthEvent, ChannelDecisionProvider, ClassifiedError, HttpRequest, OAuth1Credential,
    OAuth1Signer, OAuth2Credential, TokenLocation,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_oauth1_signed_request() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v2/user/info"))
        .and(header("accept-language", "en-US"))
        .and(header("user-agent", "social-it/1.0"))
        .respond_with(success_response(json!({"response": {"user": {"name": "alice"}}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let credential = OAuth1Credential::new("ck", "cs").with_token("tok", "ts");
    let signer = OAuth1Signer::with_sources(
        Arc::new(FixedNonceGenerator::new("nonce-1")),
        Arc::new(FixedClock::new(1_700_000_000)),
    );
    let client = test_client(credential.clone(), RetryConfig::default()).with_signer(signer.clone());

    let url = format!("{}/v2/user/info?fields=name", mock_server.uri());
    let response = client.execute(HttpRequest::get(url.clone())).await.unwrap();
    assert_eq!(response.status, 200);

    let expected = signer
        .sign_with(&HttpRequest::get(url), &credential, 1_700_000_000, "nonce-1")
        .unwrap();
    let received = mock_server.received_requests().await.unwrap();
    let authorization = received[0]
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap();

    assert_eq!(authorization, expected.header_value);
    assert!(authorization.starts_with("OAuth oauth_consumer_key=\"ck\""));
}

#[tokio::test]
async fn test_oauth2_header_placement() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer token-abc"))
        .respond_with(success_response(json!({"id": "1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(OAuth2Credential::new("token-abc"), RetryConfig::default());
    let response = client
        .execute(HttpRequest::get(format!("{}/me", mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_oauth2_parameter_placement() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(query_param("access_token", "token-abc"))
        .and(query_param("fields", "id"))
        .respond_with(success_response(json!({"id": "1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let credential = OAuth2Credential::new("token-abc").with_location(TokenLocation::Parameter);
    let client = test_client(credential, RetryConfig::default());
    client
        .execute(HttpRequest::get(format!("{}/me?fields=id", mock_server.uri())))
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_retry_on_service_unavailable() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/v2/blog"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/blog"))
        .respond_with(success_response(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = test_client(OAuth2Credential::new("t"), RetryConfig::default());
    let response = client
        .execute(HttpRequest::get(format!("{}/v2/blog", mock_server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unauthorized_surfaces_session_expired() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .respond_with(error_response(
            401,
            json!({"errors": [{"code": 89}], "error": {"message": "Invalid or expired token"}}),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(OAuth2Credential::new("stale"), RetryConfig::default());
    let error = client
        .execute(HttpRequest::get(mock_server.uri()))
        .await
        .unwrap_err();

    assert!(error.needs_reauth());
    assert_eq!(
        error.classified(),
        Some(&ClassifiedError::SessionExpired(Some(
            "Invalid or expired token".to_string()
        )))
    );
}

#[tokio::test]
async fn test_rate_limit_negotiation_retry_now() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .respond_with(error_response(429, json!({"message": "Limit exceeded"})))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(success_response(json!({})))
        .mount(&mock_server)
        .await;

    let (provider, mut prompts) = ChannelDecisionProvider::new(1);
    let client = test_client(
        OAuth2Credential::new("t"),
        RetryConfig::default().rate_limit_retry_enabled(true),
    )
    .with_decision_provider(Arc::new(provider));

    let host = tokio::spawn(async move {
        let pending = prompts.recv().await.unwrap();
        let prompt = pending.prompt().clone();
        assert!(pending.retry_now());
        prompt
    });

    let response = client
        .execute(HttpRequest::get(mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status, 200);

    let prompt = host.await.unwrap();
    assert_eq!(prompt.wait_seconds, 30);
    assert_eq!(prompt.reason.as_deref(), Some("Limit exceeded"));
    assert!(!prompt.offer_login_again);
}

#[tokio::test]
async fn test_rate_limit_negotiation_cancel() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .respond_with(error_response(429, json!({"message": "Limit exceeded"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (provider, mut prompts) = ChannelDecisionProvider::new(1);
    let client = test_client(
        OAuth2Credential::new("t"),
        RetryConfig::default().rate_limit_retry_enabled(true),
    )
    .with_decision_provider(Arc::new(provider));
    let mut events = client.coordinator().subscribe();

    tokio::spawn(async move {
        if let Some(pending) = prompts.recv().await {
            pending.cancel();
        }
    });

    let error = client
        .execute(HttpRequest::get(mock_server.uri()))
        .await
        .unwrap_err();

    assert_eq!(
        error.classified(),
        Some(&ClassifiedError::RateLimited(Some("Limit exceeded".to_string())))
    );
    assert_eq!(events.recv().await.unwrap(), AuthEvent::RateLimitCancelled);
}
