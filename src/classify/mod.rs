//! Error Classification
//!
//! Maps a completed request (transport error, status, parsed body) onto the
//! closed [`ClassifiedError`] taxonomy. Classification is pure: no I/O, no
//! shared state.

pub mod strategies;

use std::sync::Arc;

use tracing::debug;

pub use strategies::{
    CheckpointPredicate, FieldCheckpointPredicate, JsonPointerMessageExtractor, MessageExtractor,
    NeverCheckpoint, DEFAULT_MESSAGE_POINTERS,
};

use crate::error::ClassifiedError;
use crate::types::RequestOutcome;

/// Reason used when nothing better is known.
pub const UNKNOWN_ERROR_REASON: &str = "Unknown error";

/// Classifies request outcomes for one target service.
#[derive(Clone)]
pub struct ErrorClassifier {
    service_name: String,
    checkpoint: Arc<dyn CheckpointPredicate>,
    extractor: Arc<dyn MessageExtractor>,
}

impl ErrorClassifier {
    /// Create a classifier with the default strategies.
    ///
    /// `service_name` is the display name used in user-facing reasons.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            checkpoint: Arc::new(NeverCheckpoint),
            extractor: Arc::new(JsonPointerMessageExtractor::default()),
        }
    }

    /// Override the checkpoint predicate.
    pub fn with_checkpoint_predicate(mut self, predicate: Arc<dyn CheckpointPredicate>) -> Self {
        self.checkpoint = predicate;
        self
    }

    /// Override the message extractor.
    pub fn with_message_extractor(mut self, extractor: Arc<dyn MessageExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Classify one outcome. First matching rule wins.
    pub fn classify(&self, outcome: &RequestOutcome) -> ClassifiedError {
        let classified = self.classify_inner(outcome);
        debug!(
            status = ?outcome.status,
            transport_error = ?outcome.transport_error.as_ref().map(|e| e.kind),
            code = classified.error_code(),
            "Classified request failure"
        );
        classified
    }

    fn classify_inner(&self, outcome: &RequestOutcome) -> ClassifiedError {
        let transport = outcome.transport_error.as_ref();

        if transport.map(|e| e.is_cancelled()).unwrap_or(false) {
            return ClassifiedError::Canceled;
        }

        if transport.map(|e| e.is_connection_error()).unwrap_or(false) {
            return ClassifiedError::ConnectionError(self.connection_reason());
        }

        let status = outcome.status;
        if let Some(500..=599) = status {
            let reason = transport
                .map(|e| e.message.clone())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| self.server_down_reason());
            return ClassifiedError::ServerError(reason);
        }

        if let Some(body) = &outcome.body {
            if self.checkpoint.is_checkpoint(status, body) {
                return ClassifiedError::CheckpointRequired(body.clone());
            }
        }

        let body_message = outcome
            .body
            .as_ref()
            .and_then(|body| self.extractor.extract(body));

        match status {
            Some(429) => return ClassifiedError::RateLimited(body_message),
            Some(401) => return ClassifiedError::SessionExpired(body_message),
            _ => {}
        }

        if let Some(message) = body_message {
            return ClassifiedError::Failed(message);
        }

        if let Some(message) = transport.map(|e| e.message.clone()).filter(|m| !m.is_empty()) {
            return ClassifiedError::Failed(message);
        }

        ClassifiedError::Failed(UNKNOWN_ERROR_REASON.to_string())
    }

    fn connection_reason(&self) -> String {
        format!(
            "Could not connect to {}. Please check your internet connection and try again.",
            self.service_name
        )
    }

    fn server_down_reason(&self) -> String {
        format!(
            "{} might be down right now. Please try again later.",
            self.service_name
        )
    }
}

impl std::fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorClassifier")
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}
