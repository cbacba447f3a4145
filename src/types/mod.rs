//! Types
//!
//! Credentials, requests and request outcomes.

pub mod credential;
pub mod outcome;
pub mod request;

pub use credential::{
    Credential, OAuth1Credential, OAuth2Credential, TokenLocation, DEFAULT_ACCESS_TOKEN_PARAM,
    DEFAULT_HEADER_SCHEME,
};
pub use outcome::{RequestOutcome, TransportError, TransportErrorKind};
pub use request::{HttpMethod, HttpRequest, HttpResponse, FORM_CONTENT_TYPE};
