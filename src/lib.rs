//! Social Auth Integration Module
//!
//! Authenticated, resilient request delivery for social-platform APIs.
//!
//! # Features
//!
//! - OAuth 1.0a HMAC-SHA1 request signing (RFC 5849)
//! - OAuth2 bearer token attachment (header or parameter)
//! - Closed error taxonomy for every failed request
//! - Retry coordination with bounded transient retries
//! - Interactive rate-limit negotiation, one at a time per client
//! - Global cancellation of pending retries
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use social_auth_integration::{
//!     client_config, HttpRequest, InMemoryCredentialStore, OAuth1Credential, SocialApiClient,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = client_config()
//!         .service_name("Tumblr")
//!         .accept_language("en-US")
//!         .rate_limit_retry_enabled(true)
//!         .build()?;
//!
//!     let credentials = Arc::new(InMemoryCredentialStore::with_credential(
//!         OAuth1Credential::new("consumer-key", "consumer-secret")
//!             .with_token("token", "token-secret"),
//!     ));
//!
//!     let client = SocialApiClient::new(config, credentials);
//!     let response = client
//!         .execute(HttpRequest::get("https://api.tumblr.com/v2/user/info"))
//!         .await?;
//!
//!     println!("{}", response.body);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: credentials, requests and request outcomes
//! - `error`: signing/configuration errors and the classified error taxonomy
//! - `signing`: percent-encoding, OAuth1 signer, OAuth2 attacher
//! - `core`: credential store, request interceptor, HTTP transport
//! - `classify`: error classifier and per-platform strategies
//! - `resilience`: retry state, decision providers, retry coordinator
//! - `builders`: fluent configuration builder
//! - `client`: high-level client combining all of the above

pub mod builders;
pub mod classify;
pub mod client;
pub mod core;
pub mod error;
pub mod resilience;
pub mod signing;
pub mod types;

// Re-export main client
pub use client::{social_api_client, SocialApiClient};

// Re-export builders
pub use builders::{client_config, ClientConfig, ClientConfigBuilder};

// Re-export errors
pub use error::{
    ClassifiedError, ConfigurationError, SigningError, SocialAuthError, SocialAuthResult,
};

// Re-export core components
pub use crate::core::{
    CredentialStore, HttpTransport, InMemoryCredentialStore, MockHttpTransport,
    RequestInterceptor, ReqwestHttpTransport,
};

// Re-export signing
pub use signing::{OAuth1Authorization, OAuth1Signer, OAuth2Attacher};

// Re-export classification
pub use classify::{ErrorClassifier, UNKNOWN_ERROR_REASON};

// Re-export resilience
pub use resilience::{
    AuthEvent, ChannelDecisionProvider, CountdownOnlyDecisionProvider, DecisionProvider,
    NegotiationDecision, PendingDecision, RateLimitPrompt, RetryConfig, RetryCoordinator,
    RetryState, RetryVerdict, ScriptedDecisionProvider,
};

// Re-export types
pub use types::{
    Credential, HttpMethod, HttpRequest, HttpResponse, OAuth1Credential, OAuth2Credential,
    RequestOutcome, TokenLocation, TransportError, TransportErrorKind,
};
