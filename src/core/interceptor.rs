//! Request Interceptor
//!
//! Turns a caller's request into one the remote API will accept: signs or
//! attaches the current credential, then adds the common headers.

use std::sync::Arc;

use tracing::instrument;

use super::credentials::CredentialStore;
use crate::error::SigningError;
use crate::signing::{OAuth1Signer, OAuth2Attacher};
use crate::types::{Credential, HttpRequest};

/// Adapts outbound requests with authentication and common headers.
#[derive(Clone)]
pub struct RequestInterceptor {
    credentials: Arc<dyn CredentialStore>,
    signer: OAuth1Signer,
    attacher: OAuth2Attacher,
    accept_language: Option<String>,
    default_user_agent: Option<String>,
}

impl RequestInterceptor {
    /// Create an interceptor reading credentials from `credentials`.
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            credentials,
            signer: OAuth1Signer::new(),
            attacher: OAuth2Attacher::new(),
            accept_language: None,
            default_user_agent: None,
        }
    }

    /// Use a custom OAuth1 signer (e.g. with fixed nonce/clock).
    pub fn with_signer(mut self, signer: OAuth1Signer) -> Self {
        self.signer = signer;
        self
    }

    /// Set the `Accept-Language` value.
    pub fn with_accept_language(mut self, language: impl Into<String>) -> Self {
        self.accept_language = Some(language.into());
        self
    }

    /// Set the `User-Agent` used when the credential carries none.
    pub fn with_default_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.default_user_agent = Some(user_agent.into());
        self
    }

    /// Authenticate `request` and attach the common headers.
    ///
    /// Signing failures abort here; the request never reaches the transport.
    #[instrument(skip_all, fields(method = %request.method))]
    pub async fn adapt(&self, request: HttpRequest) -> Result<HttpRequest, SigningError> {
        let credential = self.credentials.credential().await;

        let mut request = match &credential {
            Some(Credential::OAuth1(c)) => self.signer.sign_request(request, c)?,
            Some(Credential::OAuth2(c)) => self.attacher.attach(request, c)?,
            None => {
                tracing::debug!("No credential available, sending unauthenticated");
                request
            }
        };

        if request.header("accept").is_none() {
            request.set_header("accept", "application/json");
        }
        if let Some(language) = &self.accept_language {
            request.set_header("accept-language", language.clone());
        }
        let user_agent = credential
            .as_ref()
            .and_then(Credential::user_agent)
            .or(self.default_user_agent.as_deref());
        if let Some(user_agent) = user_agent {
            request.set_header("user-agent", user_agent);
        }

        Ok(request)
    }
}
