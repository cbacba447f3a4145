//! OAuth 1.0a HMAC-SHA1 request signing (RFC 5849).
//!
//! The signing process involves:
//! 1. Collecting the protocol parameters (`oauth_*`)
//! 2. Merging them with form-body and query parameters
//! 3. Building the signature base string from method, base URL and the
//!    normalized parameter string
//! 4. Computing `base64(HMAC-SHA1(consumer_secret&token_secret, base))`
//! 5. Emitting the `Authorization: OAuth ...` header value
//!
//! Reference: https://www.rfc-editor.org/rfc/rfc5849#section-3.4

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use base64::Engine;
use ring::hmac;
use tracing::debug;
use url::Url;

use super::encoding::{canonicalize, escape};
use super::nonce::{Clock, NonceGenerator, SystemClock, UuidNonceGenerator};
use crate::error::SigningError;
use crate::types::{HttpMethod, HttpRequest, OAuth1Credential};

/// Signature method identifier.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";

/// Protocol version identifier.
pub const OAUTH_VERSION: &str = "1.0";

/// Result of signing one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuth1Authorization {
    /// Value for the `Authorization` header.
    pub header_value: String,
    /// Unescaped base64 signature.
    pub signature: String,
    /// Signature base string the signature was computed over.
    pub base_string: String,
    /// Protocol parameters, `oauth_signature` included.
    pub parameters: BTreeMap<String, String>,
}

/// OAuth 1.0a signer.
///
/// Stateless apart from its nonce and clock sources; safe to share across
/// any number of concurrent requests.
#[derive(Clone)]
pub struct OAuth1Signer {
    nonce: Arc<dyn NonceGenerator>,
    clock: Arc<dyn Clock>,
}

impl OAuth1Signer {
    /// Create a signer with random nonces and the system clock.
    pub fn new() -> Self {
        Self::with_sources(Arc::new(UuidNonceGenerator), Arc::new(SystemClock))
    }

    /// Create a signer with custom nonce and clock sources.
    pub fn with_sources(nonce: Arc<dyn NonceGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { nonce, clock }
    }

    /// Sign a request with a fresh nonce and the current time.
    pub fn sign(
        &self,
        request: &HttpRequest,
        credential: &OAuth1Credential,
    ) -> Result<OAuth1Authorization, SigningError> {
        let nonce = self.nonce.generate();
        self.sign_with(request, credential, self.clock.unix_timestamp(), &nonce)
    }

    /// Sign a request and set its `Authorization` header.
    pub fn sign_request(
        &self,
        mut request: HttpRequest,
        credential: &OAuth1Credential,
    ) -> Result<HttpRequest, SigningError> {
        let authorization = self.sign(&request, credential)?;
        request.set_header("authorization", authorization.header_value);
        Ok(request)
    }

    /// Sign a request with an explicit timestamp and nonce.
    ///
    /// Parameters are merged by name, so a key repeated in the query or
    /// form body is signed with its last value only (`?id=1&id=2` signs
    /// `id=2`). Services that sign every occurrence will reject such
    /// requests.
    pub fn sign_with(
        &self,
        request: &HttpRequest,
        credential: &OAuth1Credential,
        timestamp: i64,
        nonce: &str,
    ) -> Result<OAuth1Authorization, SigningError> {
        let url = parse_request_url(&request.url)?;

        let mut oauth_params = protocol_parameters(credential, timestamp, nonce);

        // Right-biased merge: protocol, then form body, then query.
        let mut merged: HashMap<String, String> = oauth_params.clone().into_iter().collect();
        merged.extend(form_parameters(request)?);
        merged.extend(
            url.query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );

        let parameter_string = canonicalize(&merged);
        let base_url = base_string_uri(&url);
        let base_string = signature_base_string(request.method, &base_url, &parameter_string);
        let signature = hmac_sha1_base64(&signing_key(credential), &base_string);

        oauth_params.insert("oauth_signature".to_string(), signature.clone());
        let header_value = authorization_header_value(&oauth_params);

        debug!(
            method = %request.method,
            base_url = %base_url,
            parameter_count = merged.len(),
            request_token_phase = credential.is_request_token_phase(),
            "Signed OAuth1 request"
        );

        Ok(OAuth1Authorization {
            header_value,
            signature,
            base_string,
            parameters: oauth_params,
        })
    }
}

impl Default for OAuth1Signer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OAuth1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Signer").finish_non_exhaustive()
    }
}

fn parse_request_url(raw: &str) -> Result<Url, SigningError> {
    if raw.trim().is_empty() {
        return Err(SigningError::MissingUrlInRequest);
    }
    let url = Url::parse(raw).map_err(|_| SigningError::InvalidUrl {
        url: raw.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(SigningError::InvalidUrl {
            url: raw.to_string(),
        });
    }
    Ok(url)
}

fn protocol_parameters(
    credential: &OAuth1Credential,
    timestamp: i64,
    nonce: &str,
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert(
        "oauth_consumer_key".to_string(),
        credential.consumer_key.clone(),
    );
    params.insert("oauth_nonce".to_string(), nonce.to_string());
    params.insert(
        "oauth_signature_method".to_string(),
        SIGNATURE_METHOD.to_string(),
    );
    params.insert("oauth_timestamp".to_string(), timestamp.to_string());
    params.insert("oauth_version".to_string(), OAUTH_VERSION.to_string());

    if let Some(token) = credential.active_token() {
        params.insert("oauth_token".to_string(), token.to_string());
    }
    if let Some(callback) = credential.callback.as_deref().filter(|c| !c.is_empty()) {
        params.insert("oauth_callback".to_string(), callback.to_string());
    }
    if let Some(verifier) = credential.verifier.as_deref().filter(|v| !v.is_empty()) {
        params.insert("oauth_verifier".to_string(), verifier.to_string());
    }
    params
}

/// Form parameters of a form-encoded POST body. Other requests have none.
fn form_parameters(request: &HttpRequest) -> Result<Vec<(String, String)>, SigningError> {
    if request.method != HttpMethod::Post || !request.is_form_encoded() {
        return Ok(Vec::new());
    }
    let Some(body) = request.body.as_deref() else {
        return Ok(Vec::new());
    };
    let body = std::str::from_utf8(body).map_err(|_| SigningError::RequestBodyNotUtf8Encodable)?;

    Ok(url::form_urlencoded::parse(body.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

/// Scheme, host, non-default port and path; no query, fragment or userinfo.
pub(crate) fn base_string_uri(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    format!(
        "{}://{}{}{}",
        url.scheme().to_ascii_lowercase(),
        host,
        port,
        url.path()
    )
}

pub(crate) fn signature_base_string(
    method: HttpMethod,
    base_url: &str,
    parameter_string: &str,
) -> String {
    format!(
        "{}&{}&{}",
        escape(&method.as_str().to_ascii_uppercase()),
        escape(base_url),
        escape(parameter_string)
    )
}

fn signing_key(credential: &OAuth1Credential) -> String {
    format!(
        "{}&{}",
        escape(credential.consumer_secret()),
        escape(credential.token_secret())
    )
}

fn hmac_sha1_base64(key: &str, message: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes());
    let tag = hmac::sign(&key, message.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(tag.as_ref())
}

fn authorization_header_value(oauth_params: &BTreeMap<String, String>) -> String {
    let mut entries: Vec<(String, String)> = oauth_params
        .iter()
        .map(|(k, v)| (escape(k), escape(v)))
        .collect();
    entries.sort();

    let joined = entries
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::nonce::{FixedClock, FixedNonceGenerator};

    fn credential() -> OAuth1Credential {
        OAuth1Credential::new("ck", "cs").with_token("tok", "ts")
    }

    #[test]
    fn test_reference_signature() {
        let signer = OAuth1Signer::new();
        let request = HttpRequest::get("https://api.example.com/1/resource");

        let auth = signer
            .sign_with(&request, &credential(), 1_700_000_000, "abc123")
            .unwrap();

        assert_eq!(
            auth.base_string,
            "GET&https%3A%2F%2Fapi.example.com%2F1%2Fresource&oauth_consumer_key%3Dck\
             %26oauth_nonce%3Dabc123%26oauth_signature_method%3DHMAC-SHA1\
             %26oauth_timestamp%3D1700000000%26oauth_token%3Dtok%26oauth_version%3D1.0"
        );
        assert_eq!(auth.signature, "B/535aoHWQAxxOOUAyqIgk5Kr+k=");
        assert_eq!(
            auth.header_value,
            "OAuth oauth_consumer_key=\"ck\", oauth_nonce=\"abc123\", \
             oauth_signature=\"B%2F535aoHWQAxxOOUAyqIgk5Kr%2Bk%3D\", \
             oauth_signature_method=\"HMAC-SHA1\", oauth_timestamp=\"1700000000\", \
             oauth_token=\"tok\", oauth_version=\"1.0\""
        );
    }

    #[test]
    fn test_form_body_is_signed() {
        // Worked example from Twitter's "Creating a signature" documentation.
        let credential = OAuth1Credential::new(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
        )
        .with_token(
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        );
        let request = HttpRequest::post(
            "https://api.twitter.com/1.1/statuses/update.json?include_entities=true",
        )
        .with_form([(
            "status",
            "Hello Ladies + Gentlemen, a signed OAuth request!",
        )]);

        let auth = OAuth1Signer::new()
            .sign_with(
                &request,
                &credential,
                1_318_622_958,
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            )
            .unwrap();

        assert_eq!(auth.signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
        assert!(!auth.parameters.contains_key("status"));
        assert!(!auth.header_value.contains("status"));
    }

    #[test]
    fn test_request_token_phase_with_port_and_query() {
        let credential = OAuth1Credential::new("ck", "cs").with_callback("oob");
        let request = HttpRequest::get("HTTP://API.Example.com:8080/path?count=5#frag");

        let auth = OAuth1Signer::new()
            .sign_with(&request, &credential, 1_700_000_000, "n1")
            .unwrap();

        assert!(auth
            .base_string
            .starts_with("GET&http%3A%2F%2Fapi.example.com%3A8080%2Fpath&count%3D5"));
        assert_eq!(auth.signature, "zrtr624VmHxVrg2tdLFsspV9U7E=");
        assert!(!auth.parameters.contains_key("oauth_token"));
        assert_eq!(auth.parameters.get("oauth_callback").map(String::as_str), Some("oob"));
    }

    #[test]
    fn test_default_port_is_dropped() {
        let url = Url::parse("https://api.example.com:443/a/b?x=1").unwrap();
        assert_eq!(base_string_uri(&url), "https://api.example.com/a/b");

        let url = Url::parse("http://user:pw@example.com:80/").unwrap();
        assert_eq!(base_string_uri(&url), "http://example.com/");
    }

    #[test]
    fn test_query_overrides_protocol_parameter_in_base_string() {
        let request = HttpRequest::get("https://api.example.com/r?oauth_version=2.0");
        let auth = OAuth1Signer::new()
            .sign_with(&request, &credential(), 1, "n")
            .unwrap();

        assert!(auth.base_string.contains("oauth_version%3D2.0"));
        // Header carries the protocol set, not the merged one.
        assert_eq!(
            auth.parameters.get("oauth_version").map(String::as_str),
            Some("1.0")
        );
    }

    #[test]
    fn test_repeated_query_key_signs_last_value() {
        let signer = OAuth1Signer::new();
        let repeated = signer
            .sign_with(
                &HttpRequest::get("https://api.example.com/r?id=1&id=2"),
                &credential(),
                1,
                "n",
            )
            .unwrap();
        let single = signer
            .sign_with(
                &HttpRequest::get("https://api.example.com/r?id=2"),
                &credential(),
                1,
                "n",
            )
            .unwrap();

        assert_eq!(repeated.base_string, single.base_string);
        assert_eq!(repeated.signature, single.signature);
        assert!(!repeated.base_string.contains("id%3D1"));
    }

    #[test]
    fn test_form_params_ignored_for_get_and_non_form_bodies() {
        let plain = HttpRequest::get("https://api.example.com/r");
        let json_post = HttpRequest::post("https://api.example.com/r")
            .with_header("content-type", "application/json")
            .with_body(r#"{"a":"b"}"#);
        let signer = OAuth1Signer::new();

        let a = signer.sign_with(&plain, &credential(), 1, "n").unwrap();
        let b = signer.sign_with(&json_post, &credential(), 1, "n").unwrap();
        assert_eq!(
            a.base_string.replacen("GET", "POST", 1),
            b.base_string
        );
    }

    #[test]
    fn test_missing_url() {
        let request = HttpRequest::get("");
        let err = OAuth1Signer::new().sign(&request, &credential()).unwrap_err();
        assert_eq!(err, SigningError::MissingUrlInRequest);
    }

    #[test]
    fn test_invalid_url() {
        let request = HttpRequest::get("not a url");
        let err = OAuth1Signer::new().sign(&request, &credential()).unwrap_err();
        assert!(matches!(err, SigningError::InvalidUrl { .. }));
    }

    #[test]
    fn test_non_utf8_form_body() {
        let request = HttpRequest::post("https://api.example.com/r")
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_body(vec![0x61, 0x3d, 0xff, 0xfe]);
        let err = OAuth1Signer::new().sign(&request, &credential()).unwrap_err();
        assert_eq!(err, SigningError::RequestBodyNotUtf8Encodable);
    }

    #[test]
    fn test_injected_sources_are_used() {
        let signer = OAuth1Signer::with_sources(
            Arc::new(FixedNonceGenerator::new("fixed")),
            Arc::new(FixedClock::new(1_700_000_000)),
        );
        let request = HttpRequest::get("https://api.example.com/1/resource");

        let first = signer.sign(&request, &credential()).unwrap();
        let second = signer.sign(&request, &credential()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.parameters.get("oauth_timestamp").map(String::as_str),
            Some("1700000000")
        );
    }

    #[test]
    fn test_fresh_nonce_per_request() {
        let signer = OAuth1Signer::new();
        let request = HttpRequest::get("https://api.example.com/r");
        let a = signer.sign(&request, &credential()).unwrap();
        let b = signer.sign(&request, &credential()).unwrap();
        assert_ne!(a.parameters["oauth_nonce"], b.parameters["oauth_nonce"]);
    }

    #[test]
    fn test_secrets_never_appear_in_output() {
        let credential = OAuth1Credential::new("ck", "super-secret-consumer")
            .with_token("tok", "super-secret-token");
        let request = HttpRequest::get("https://api.example.com/r");
        let auth = OAuth1Signer::new().sign(&request, &credential).unwrap();

        for output in [&auth.header_value, &auth.base_string] {
            assert!(!output.contains("super-secret"));
        }
    }

    #[test]
    fn test_sign_request_sets_header() {
        let request = HttpRequest::get("https://api.example.com/r");
        let signed = OAuth1Signer::new()
            .sign_request(request, &credential())
            .unwrap();
        assert!(signed.header("Authorization").unwrap().starts_with("OAuth "));
    }
}
