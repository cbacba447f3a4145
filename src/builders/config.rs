//! Configuration Builder
//!
//! Fluent builder for client configuration, with environment loading.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigurationError;
use crate::resilience::RetryConfig;

/// Environment variable names read by [`ClientConfig::from_env`].
pub mod env {
    pub const SERVICE_NAME: &str = "SOCIAL_AUTH_SERVICE_NAME";
    pub const ACCEPT_LANGUAGE: &str = "SOCIAL_AUTH_ACCEPT_LANGUAGE";
    pub const USER_AGENT: &str = "SOCIAL_AUTH_USER_AGENT";
    pub const MAX_RETRIES: &str = "SOCIAL_AUTH_MAX_RETRIES";
    pub const RETRY_DELAY_MS: &str = "SOCIAL_AUTH_RETRY_DELAY_MS";
    pub const RATE_LIMIT_RETRY: &str = "SOCIAL_AUTH_RATE_LIMIT_RETRY";
    pub const RATE_LIMIT_WAIT_SECS: &str = "SOCIAL_AUTH_RATE_LIMIT_WAIT_SECS";
    pub const ALWAYS_PROMPT_LOGIN: &str = "SOCIAL_AUTH_ALWAYS_PROMPT_LOGIN";
    pub const RATE_LIMIT_MAX_RETRIES: &str = "SOCIAL_AUTH_RATE_LIMIT_MAX_RETRIES";
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Display name used in user-facing error reasons.
    pub service_name: String,
    /// `Accept-Language` sent with every request.
    pub accept_language: Option<String>,
    /// `User-Agent` used when the credential carries none.
    pub user_agent: Option<String>,
    /// Retry policy.
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Load configuration from `SOCIAL_AUTH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ClientConfigBuilder::new();

        if let Some(name) = lookup(env::SERVICE_NAME) {
            builder = builder.service_name(name);
        }
        if let Some(language) = lookup(env::ACCEPT_LANGUAGE) {
            builder = builder.accept_language(language);
        }
        if let Some(user_agent) = lookup(env::USER_AGENT) {
            builder = builder.user_agent(user_agent);
        }

        let mut retry = RetryConfig::default();
        if let Some(n) = parse_var::<u32>(&lookup, env::MAX_RETRIES)? {
            retry.max_retry_count = n;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, env::RETRY_DELAY_MS)? {
            retry.base_retry_delay = Duration::from_millis(ms);
        }
        if let Some(enabled) = parse_flag(&lookup, env::RATE_LIMIT_RETRY)? {
            retry.rate_limit_retry_enabled = enabled;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, env::RATE_LIMIT_WAIT_SECS)? {
            retry.rate_limit_base_wait_seconds = secs;
        }
        if let Some(always) = parse_flag(&lookup, env::ALWAYS_PROMPT_LOGIN)? {
            retry.always_prompt_login_again = always;
        }
        if let Some(n) = parse_var::<u32>(&lookup, env::RATE_LIMIT_MAX_RETRIES)? {
            retry.max_rate_limit_negotiations = n;
        }

        builder.retry(retry).build()
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigurationError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigurationError::InvalidEnvironment {
                name: name.to_string(),
                value,
            }),
        None => Ok(None),
    }
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<bool>, ConfigurationError> {
    match lookup(name) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigurationError::InvalidEnvironment {
                name: name.to_string(),
                value,
            }),
        },
        None => Ok(None),
    }
}

/// Client configuration builder.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    service_name: Option<String>,
    accept_language: Option<String>,
    user_agent: Option<String>,
    retry: RetryConfig,
}

impl ClientConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set service display name.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set Accept-Language.
    pub fn accept_language(mut self, language: impl Into<String>) -> Self {
        self.accept_language = Some(language.into());
        self
    }

    /// Set fallback User-Agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set retry configuration.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set maximum transient retries.
    pub fn max_retry_count(mut self, n: u32) -> Self {
        self.retry.max_retry_count = n;
        self
    }

    /// Enable or disable rate-limit negotiation.
    pub fn rate_limit_retry_enabled(mut self, enabled: bool) -> Self {
        self.retry.rate_limit_retry_enabled = enabled;
        self
    }

    /// Set how many rate-limit negotiations may retry before giving up.
    pub fn max_rate_limit_negotiations(mut self, n: u32) -> Self {
        self.retry.max_rate_limit_negotiations = n;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ClientConfig, ConfigurationError> {
        let service_name = self
            .service_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ConfigurationError::MissingRequired {
                field: "service_name".to_string(),
            })?;

        if self.retry.countdown_tick.is_zero() {
            return Err(ConfigurationError::InvalidConfig {
                message: "countdown_tick must be non-zero".to_string(),
            });
        }

        Ok(ClientConfig {
            service_name,
            accept_language: self.accept_language,
            user_agent: self.user_agent,
            retry: self.retry,
        })
    }
}

/// Create a new client configuration builder.
pub fn client_config() -> ClientConfigBuilder {
    ClientConfigBuilder::new()
}
