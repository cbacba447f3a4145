//! Social API Client
//!
//! High-level client combining request adaptation, transport, error
//! classification and retry coordination.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::builders::ClientConfig;
use crate::classify::{CheckpointPredicate, ErrorClassifier, MessageExtractor};
use crate::core::{CredentialStore, HttpTransport, ReqwestHttpTransport, RequestInterceptor};
use crate::error::{ClassifiedError, SocialAuthResult};
use crate::resilience::{DecisionProvider, RetryCoordinator, RetryVerdict};
use crate::signing::OAuth1Signer;
use crate::types::{HttpRequest, HttpResponse, RequestOutcome};

/// Client for an authenticated social-platform API.
pub struct SocialApiClient<T: HttpTransport = ReqwestHttpTransport> {
    config: ClientConfig,
    interceptor: RequestInterceptor,
    transport: Arc<T>,
    classifier: ErrorClassifier,
    coordinator: RetryCoordinator,
}

impl SocialApiClient<ReqwestHttpTransport> {
    /// Create a client with the default reqwest transport.
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_transport(config, credentials, ReqwestHttpTransport::new())
    }
}

impl<T: HttpTransport> SocialApiClient<T> {
    /// Create a client with a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        credentials: Arc<dyn CredentialStore>,
        transport: T,
    ) -> Self {
        let mut interceptor = RequestInterceptor::new(credentials);
        if let Some(language) = &config.accept_language {
            interceptor = interceptor.with_accept_language(language.clone());
        }
        if let Some(user_agent) = &config.user_agent {
            interceptor = interceptor.with_default_user_agent(user_agent.clone());
        }

        Self {
            classifier: ErrorClassifier::new(config.service_name.clone()),
            coordinator: RetryCoordinator::new(config.retry.clone()),
            interceptor,
            transport: Arc::new(transport),
            config,
        }
    }

    /// Set the provider consulted during rate-limit negotiations.
    pub fn with_decision_provider(mut self, decisions: Arc<dyn DecisionProvider>) -> Self {
        self.coordinator = self.coordinator.with_decision_provider(decisions);
        self
    }

    /// Use a custom OAuth1 signer.
    pub fn with_signer(mut self, signer: OAuth1Signer) -> Self {
        self.interceptor = self.interceptor.with_signer(signer);
        self
    }

    pub fn with_checkpoint_predicate(mut self, predicate: Arc<dyn CheckpointPredicate>) -> Self {
        self.classifier = self.classifier.with_checkpoint_predicate(predicate);
        self
    }

    pub fn with_message_extractor(mut self, extractor: Arc<dyn MessageExtractor>) -> Self {
        self.classifier = self.classifier.with_message_extractor(extractor);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Retry coordinator, for configuration changes and cancellation.
    pub fn coordinator(&self) -> &RetryCoordinator {
        &self.coordinator
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Send `request` until it succeeds or a verdict stops it.
    ///
    /// Only 2xx responses are returned as `Ok`. Every other outcome is
    /// classified; the error surfaced is the classified one.
    #[instrument(skip_all, fields(method = %request.method, service = %self.config.service_name))]
    pub async fn execute(&self, request: HttpRequest) -> SocialAuthResult<HttpResponse> {
        let mut attempt: u32 = 0;

        loop {
            let adapted = self.interceptor.adapt(request.clone()).await?;

            let (outcome, response) = match self.transport.send(adapted).await {
                Ok(response) if response.is_success() => {
                    self.coordinator.record_success();
                    if attempt > 0 {
                        debug!(attempt, "Request succeeded after retry");
                    }
                    return Ok(response);
                }
                Ok(response) => (RequestOutcome::from_response(&response), Some(response)),
                Err(error) => (RequestOutcome::from_transport_error(error), None),
            };

            let classified = self.classifier.classify(&outcome);
            let verdict = self
                .coordinator
                .evaluate(&classified, attempt, response.as_ref())
                .await;

            match verdict {
                RetryVerdict::Retry => {}
                RetryVerdict::RetryAfter(delay) => {
                    let cancel = self.coordinator.cancellation_token();
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            debug!("Retry wait cancelled");
                            return Err(ClassifiedError::Canceled.into());
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                RetryVerdict::DoNotRetry => {
                    warn!(attempt, error = %classified, "Request failed");
                    return Err(classified.into());
                }
                RetryVerdict::DoNotRetryWithError(error) => {
                    warn!(attempt, error = %error, "Request failed");
                    return Err(error.into());
                }
            }

            attempt = attempt.saturating_add(1);
        }
    }
}

impl<T: HttpTransport> std::fmt::Debug for SocialApiClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialApiClient")
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

/// Create a client over `transport` from a finished configuration.
pub fn social_api_client<T: HttpTransport>(
    config: ClientConfig,
    credentials: Arc<dyn CredentialStore>,
    transport: T,
) -> SocialApiClient<T> {
    SocialApiClient::with_transport(config, credentials, transport)
}
