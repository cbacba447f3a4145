//! Integration tests using WireMock
//!
//! These tests drive the reqwest transport and the full client against a
//! mock HTTP server: authentication, classification, retries and
//! rate-limit negotiation.

mod client;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use social_auth_integration::{
    client_config, Credential, InMemoryCredentialStore, RetryConfig, ReqwestHttpTransport,
    SocialApiClient,
};
use wiremock::{MockServer, ResponseTemplate};

/// Helper to create a mock server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Helper to create error response templates
pub fn error_response(status: u16, error_body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(error_body)
}

/// Helper to create success response templates
pub fn success_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Client with fast retries over the reqwest transport.
pub fn test_client(
    credential: impl Into<Credential>,
    retry: RetryConfig,
) -> SocialApiClient<ReqwestHttpTransport> {
    let config = client_config()
        .service_name("Tumblr")
        .accept_language("en-US")
        .user_agent("social-it/1.0")
        .retry(
            retry
                .base_retry_delay(Duration::from_millis(10))
                .settle_delay(Duration::from_millis(10)),
        )
        .build()
        .expect("valid config");

    let credentials = Arc::new(InMemoryCredentialStore::with_credential(credential));
    SocialApiClient::with_transport(
        config,
        credentials,
        ReqwestHttpTransport::with_timeout(Duration::from_secs(5)),
    )
}
