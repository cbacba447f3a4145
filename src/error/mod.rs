//! Error Types
//!
//! Local construction errors (signing, configuration) and the closed
//! taxonomy every remote failure is classified into.

use thiserror::Error;

/// Root error type for the integration.
#[derive(Error, Debug)]
pub enum SocialAuthError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Request error: {0}")]
    Request(#[from] ClassifiedError),
}

impl SocialAuthError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "SOCIAL_AUTH_CONFIG",
            Self::Signing(_) => "SOCIAL_AUTH_SIGNING",
            Self::Request(e) => e.error_code(),
        }
    }

    /// Check if error requires the user to sign in again.
    pub fn needs_reauth(&self) -> bool {
        matches!(self, Self::Request(e) if e.needs_reauth())
    }

    /// Classified error, if the failure came back from the remote side.
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Request(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for integration operations.
pub type SocialAuthResult<T> = Result<T, SocialAuthError>;

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvironment { name: String, value: String },
}

/// Request signing error.
///
/// These abort a request before it reaches the transport and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("Request has no URL")]
    MissingUrlInRequest,

    #[error("Invalid request URL: {url}")]
    InvalidUrl { url: String },

    #[error("Form-encoded request body is not valid UTF-8")]
    RequestBodyNotUtf8Encodable,

    #[error("Signature generation failed: {message}")]
    SignatureGenerationFailed { message: String },
}

/// Semantic classification of a failed request.
///
/// Exactly one kind is produced per outcome. Raw transport and HTTP details
/// only survive as the human-readable reason.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifiedError {
    #[error("Request was cancelled")]
    Canceled,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Rate limit exceeded{}", reason_suffix(.0))]
    RateLimited(Option<String>),

    #[error("Session expired{}", reason_suffix(.0))]
    SessionExpired(Option<String>),

    #[error("Checkpoint required")]
    CheckpointRequired(serde_json::Value),

    #[error("Request failed: {0}")]
    Failed(String),

    #[error("Unknown error")]
    Unknown,
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
}

impl ClassifiedError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Canceled => "SOCIAL_AUTH_CANCELED",
            Self::ConnectionError(_) => "SOCIAL_AUTH_CONNECTION",
            Self::ServerError(_) => "SOCIAL_AUTH_SERVER",
            Self::RateLimited(_) => "SOCIAL_AUTH_RATE_LIMITED",
            Self::SessionExpired(_) => "SOCIAL_AUTH_SESSION_EXPIRED",
            Self::CheckpointRequired(_) => "SOCIAL_AUTH_CHECKPOINT",
            Self::Failed(_) => "SOCIAL_AUTH_FAILED",
            Self::Unknown => "SOCIAL_AUTH_UNKNOWN",
        }
    }

    /// Human-readable reason, when one was captured.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::ConnectionError(r) | Self::ServerError(r) | Self::Failed(r) => Some(r),
            Self::RateLimited(r) | Self::SessionExpired(r) => r.as_deref(),
            Self::Canceled | Self::CheckpointRequired(_) | Self::Unknown => None,
        }
    }

    /// Check if the failure was a connectivity problem.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }

    /// Check if the user has to authenticate again.
    pub fn needs_reauth(&self) -> bool {
        matches!(self, Self::SessionExpired(_) | Self::CheckpointRequired(_))
    }
}
