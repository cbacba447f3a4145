//! HTTP Transport
//!
//! The seam requests are executed through. Status codes are never turned
//! into errors here; only failures below HTTP are reported as
//! [`TransportError`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::error::Error as _;
use std::time::Duration;

use crate::types::{HttpMethod, HttpRequest, HttpResponse, TransportError, TransportErrorKind};

/// HTTP transport interface (for dependency injection).
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send an HTTP request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Default reqwest-based HTTP transport.
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl ReqwestHttpTransport {
    /// Create new transport with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create transport with a custom default timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            default_timeout: timeout,
        }
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }
}

impl Default for ReqwestHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        };

        let mut req_builder = self.client.request(method, &request.url).timeout(timeout);

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("")
            .to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.as_str().to_ascii_lowercase(), v.to_string());
            }
        }

        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            status_text,
            headers,
            body,
        })
    }
}

/// Map a reqwest failure into the transport error vocabulary.
pub fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    let mut detail = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    let lowered = detail.to_ascii_lowercase();

    let kind = if error.is_timeout() {
        TransportErrorKind::TimedOut
    } else if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl")
    {
        TransportErrorKind::SecureConnectionFailed
    } else if lowered.contains("dns") || lowered.contains("failed to lookup") {
        TransportErrorKind::DnsLookupFailed
    } else if error.is_connect() {
        TransportErrorKind::CannotConnectToHost
    } else if error.is_request() || error.is_body() {
        TransportErrorKind::NetworkConnectionLost
    } else {
        TransportErrorKind::Other
    };

    TransportError::new(kind, detail)
}

/// Mock HTTP transport for testing.
///
/// Queued results are returned first-in first-out.
#[derive(Default)]
pub struct MockHttpTransport {
    results: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    request_history: Mutex<Vec<HttpRequest>>,
    default_response: Mutex<Option<HttpResponse>>,
}

impl MockHttpTransport {
    /// Create new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response to return.
    pub fn queue_response(&self, response: HttpResponse) -> &Self {
        self.results.lock().push_back(Ok(response));
        self
    }

    /// Queue a JSON response.
    pub fn queue_json_response(&self, status: u16, body: &serde_json::Value) -> &Self {
        self.queue_response(HttpResponse::json(status, body))
    }

    /// Queue a transport failure.
    pub fn queue_error(&self, error: TransportError) -> &Self {
        self.results.lock().push_back(Err(error));
        self
    }

    /// Set default response when queue is empty.
    pub fn set_default_response(&self, response: HttpResponse) -> &Self {
        *self.default_response.lock() = Some(response);
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<HttpRequest> {
        self.request_history.lock().clone()
    }

    /// Get last request.
    pub fn get_last_request(&self) -> Option<HttpRequest> {
        self.request_history.lock().last().cloned()
    }

    /// Number of requests sent.
    pub fn request_count(&self) -> usize {
        self.request_history.lock().len()
    }
}

#[async_trait]
impl HttpTransport for MockHttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.request_history.lock().push(request);

        let queued = self.results.lock().pop_front();
        match queued {
            Some(result) => result,
            None => self.default_response.lock().clone().ok_or_else(|| {
                TransportError::new(
                    TransportErrorKind::CannotConnectToHost,
                    "No mock response available",
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_is_fifo() {
        let transport = MockHttpTransport::new();
        transport
            .queue_json_response(500, &serde_json::json!({"n": 1}))
            .queue_error(TransportError::new(TransportErrorKind::TimedOut, "slow"))
            .queue_json_response(200, &serde_json::json!({"n": 3}));

        let request = HttpRequest::get("https://example.com");

        let first = transport.send(request.clone()).await.unwrap();
        assert_eq!(first.status, 500);

        let second = transport.send(request.clone()).await.unwrap_err();
        assert_eq!(second.kind, TransportErrorKind::TimedOut);

        let third = transport.send(request).await.unwrap();
        assert_eq!(third.status, 200);
        assert!(third.body.contains('3'));

        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_transport_default_and_empty() {
        let transport = MockHttpTransport::new();
        let err = transport
            .send(HttpRequest::get("https://example.com"))
            .await
            .unwrap_err();
        assert!(err.is_connection_error());

        transport.set_default_response(HttpResponse::new(204, ""));
        let response = transport
            .send(HttpRequest::get("https://example.com/other"))
            .await
            .unwrap();
        assert_eq!(response.status, 204);
        assert_eq!(
            transport.get_last_request().map(|r| r.url),
            Some("https://example.com/other".to_string())
        );
    }
}
