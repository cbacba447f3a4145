//! OAuth2 bearer token attachment.
//!
//! No signature is computed: the access token is placed either in the
//! `Authorization` header or as a request parameter, never both.

use tracing::debug;
use url::Url;

use crate::error::SigningError;
use crate::types::{HttpMethod, HttpRequest, OAuth2Credential, TokenLocation};

/// Attaches OAuth2 credentials to outbound requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct OAuth2Attacher;

impl OAuth2Attacher {
    pub fn new() -> Self {
        Self
    }

    /// Attach `credential` to `request`.
    ///
    /// Always sets `Accept: application/json` and, when the credential has
    /// one, `User-Agent`. With [`TokenLocation::Parameter`] the token goes
    /// into the form body of a form-encoded POST, otherwise into the query.
    /// A request without a URL is rejected.
    pub fn attach(
        &self,
        mut request: HttpRequest,
        credential: &OAuth2Credential,
    ) -> Result<HttpRequest, SigningError> {
        if request.url.trim().is_empty() {
            return Err(SigningError::MissingUrlInRequest);
        }

        match (credential.token_location, credential.active_token()) {
            (TokenLocation::Header, Some(token)) => {
                request.set_header(
                    "authorization",
                    format!("{} {}", credential.header_scheme, token),
                );
            }
            (TokenLocation::Parameter, Some(token)) => {
                request = attach_parameter(request, &credential.param_name, token)?;
            }
            (_, None) => {
                debug!(url = %request.url, "No OAuth2 access token to attach");
            }
        }

        request.set_header("accept", "application/json");
        if let Some(user_agent) = credential.user_agent.as_deref().filter(|ua| !ua.is_empty()) {
            request.set_header("user-agent", user_agent);
        }
        Ok(request)
    }
}

fn attach_parameter(
    mut request: HttpRequest,
    name: &str,
    token: &str,
) -> Result<HttpRequest, SigningError> {
    if request.method == HttpMethod::Post && request.is_form_encoded() {
        let existing = match request.body.as_deref() {
            Some(body) => std::str::from_utf8(body)
                .map_err(|_| SigningError::RequestBodyNotUtf8Encodable)?
                .to_string(),
            None => String::new(),
        };
        let body = url::form_urlencoded::Serializer::for_suffix(existing, 0)
            .append_pair(name, token)
            .finish();
        request.body = Some(body.into_bytes());
        return Ok(request);
    }

    let mut url = Url::parse(&request.url).map_err(|_| SigningError::InvalidUrl {
        url: request.url.clone(),
    })?;
    url.query_pairs_mut().append_pair(name, token);
    request.url = url.into();
    Ok(request)
}
