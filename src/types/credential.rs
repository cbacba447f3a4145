//! Credential Types
//!
//! OAuth1 and OAuth2 credential material as seen at one point in time.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Default OAuth2 query/form parameter name.
pub const DEFAULT_ACCESS_TOKEN_PARAM: &str = "access_token";

/// Default OAuth2 authorization header scheme.
pub const DEFAULT_HEADER_SCHEME: &str = "Bearer";

/// OAuth 1.0a credential.
///
/// Without a token and token secret the credential is in the request-token
/// phase: no user is associated with it yet.
#[derive(Clone)]
pub struct OAuth1Credential {
    pub consumer_key: String,
    pub consumer_secret: SecretString,
    pub token: Option<String>,
    pub token_secret: Option<SecretString>,
    /// `oauth_callback`, sent while obtaining a request token.
    pub callback: Option<String>,
    /// `oauth_verifier`, sent while exchanging for an access token.
    pub verifier: Option<String>,
    pub user_agent: Option<String>,
}

impl OAuth1Credential {
    /// Create a consumer-only credential.
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: SecretString::new(consumer_secret.into()),
            token: None,
            token_secret: None,
            callback: None,
            verifier: None,
            user_agent: None,
        }
    }

    /// Attach the user token pair.
    pub fn with_token(mut self, token: impl Into<String>, token_secret: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self.token_secret = Some(SecretString::new(token_secret.into()));
        self
    }

    /// Set `oauth_callback`.
    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = Some(callback.into());
        self
    }

    /// Set `oauth_verifier`.
    pub fn with_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.verifier = Some(verifier.into());
        self
    }

    /// Set the user agent sent with signed requests.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Token, if present and non-empty.
    pub fn active_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Whether this credential is still in the request-token phase.
    pub fn is_request_token_phase(&self) -> bool {
        self.active_token().is_none()
    }

    pub(crate) fn consumer_secret(&self) -> &str {
        self.consumer_secret.expose_secret()
    }

    pub(crate) fn token_secret(&self) -> &str {
        self.token_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .unwrap_or("")
    }
}

impl std::fmt::Debug for OAuth1Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Credential")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("token", &self.token)
            .field(
                "token_secret",
                &self.token_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("callback", &self.callback)
            .field("verifier", &self.verifier.as_ref().map(|_| "[REDACTED]"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Where an OAuth2 access token is placed on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenLocation {
    /// `Authorization: <scheme> <token>`.
    #[default]
    Header,
    /// `<param_name>=<token>` in the query string or form body.
    Parameter,
}

/// OAuth2 bearer credential.
#[derive(Clone)]
pub struct OAuth2Credential {
    pub access_token: Option<SecretString>,
    pub token_location: TokenLocation,
    pub param_name: String,
    pub header_scheme: String,
    pub user_agent: Option<String>,
}

impl OAuth2Credential {
    /// Create a header-placed bearer credential.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(SecretString::new(access_token.into())),
            ..Self::anonymous()
        }
    }

    /// Credential with no access token yet.
    pub fn anonymous() -> Self {
        Self {
            access_token: None,
            token_location: TokenLocation::Header,
            param_name: DEFAULT_ACCESS_TOKEN_PARAM.to_string(),
            header_scheme: DEFAULT_HEADER_SCHEME.to_string(),
            user_agent: None,
        }
    }

    /// Set token placement.
    pub fn with_location(mut self, location: TokenLocation) -> Self {
        self.token_location = location;
        self
    }

    /// Set the parameter name used for [`TokenLocation::Parameter`].
    pub fn with_param_name(mut self, name: impl Into<String>) -> Self {
        self.param_name = name.into();
        self
    }

    /// Set the header scheme used for [`TokenLocation::Header`].
    pub fn with_header_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.header_scheme = scheme.into();
        self
    }

    /// Set the user agent sent with attached requests.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Access token, if present and non-empty.
    pub(crate) fn active_token(&self) -> Option<&str> {
        self.access_token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .filter(|t| !t.is_empty())
    }
}

impl std::fmt::Debug for OAuth2Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Credential")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_location", &self.token_location)
            .field("param_name", &self.param_name)
            .field("header_scheme", &self.header_scheme)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Credential for one account.
#[derive(Debug, Clone)]
pub enum Credential {
    OAuth1(OAuth1Credential),
    OAuth2(OAuth2Credential),
}

impl Credential {
    /// User agent carried by the credential.
    pub fn user_agent(&self) -> Option<&str> {
        match self {
            Self::OAuth1(c) => c.user_agent.as_deref(),
            Self::OAuth2(c) => c.user_agent.as_deref(),
        }
        .filter(|ua| !ua.is_empty())
    }
}

impl From<OAuth1Credential> for Credential {
    fn from(credential: OAuth1Credential) -> Self {
        Self::OAuth1(credential)
    }
}

impl From<OAuth2Credential> for Credential {
    fn from(credential: OAuth2Credential) -> Self {
        Self::OAuth2(credential)
    }
}
