use std::error::Error as StdError;

use http::{HeaderMap, Method, StatusCode};
use thiserror::Error;

/// Network-level failure: DNS, connection refused, TLS, malformed URL.
///
/// Distinct from HTTP responses with non-success statuses, which are
/// delivered as [`HttpResponse`] values and classified by the caller.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        TransportError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Fully-buffered HTTP response.
///
/// The body is read to the end before the value is returned, which keeps the
/// underlying connection drained on every exit path, including the probe
/// response whose body is discarded.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// The raw digest challenge value, if the server sent one
    pub fn challenge_header(&self) -> Option<&str> {
        self.headers
            .get(http::header::WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
    }
}

/// Request/response seam the authentication flow drives.
///
/// One implementation call is one HTTP round trip; the flow performs exactly
/// two per operation. Implementations own timeouts and connection pooling.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        method: &Method,
        uri: &str,
        headers: &HeaderMap,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, TransportError>;
}

#[cfg(feature = "reqwest")]
mod blocking {
    use http::{HeaderMap, Method};
    use tracing::trace;

    use super::{HttpResponse, Transport, TransportError};

    /// Blocking transport backed by [`reqwest`].
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::blocking::Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Result<Self, TransportError> {
            let client = reqwest::blocking::Client::builder()
                .build()
                .map_err(|e| TransportError::with_source("failed to build http client", e))?;
            Ok(ReqwestTransport { client })
        }

        /// Wrap an already-configured client (timeouts, proxies, pools)
        pub fn with_client(client: reqwest::blocking::Client) -> Self {
            ReqwestTransport { client }
        }
    }

    impl Transport for ReqwestTransport {
        fn send(
            &self,
            method: &Method,
            uri: &str,
            headers: &HeaderMap,
            body: Option<&[u8]>,
        ) -> Result<HttpResponse, TransportError> {
            let mut request = self.client.request(method.clone(), uri).headers(headers.clone());
            if let Some(body) = body {
                request = request.body(body.to_vec());
            }

            let response = request
                .send()
                .map_err(|e| TransportError::with_source(format!("request to {uri} failed"), e))?;

            let status = response.status();
            let headers = response.headers().clone();
            // bytes() reads to the end, releasing the pooled connection
            let body = response
                .bytes()
                .map_err(|e| TransportError::with_source("failed to read response body", e))?
                .to_vec();

            trace!(%status, bytes = body.len(), "round trip complete");
            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use blocking::ReqwestTransport;

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::WWW_AUTHENTICATE;
    use http::HeaderValue;

    #[test]
    fn challenge_header_is_extracted_when_present() {
        let mut headers = HeaderMap::new();
        headers.insert(
            WWW_AUTHENTICATE,
            HeaderValue::from_static(r#"Digest realm="r", nonce="n", qop="auth""#),
        );
        let response = HttpResponse {
            status: StatusCode::UNAUTHORIZED,
            headers,
            body: Vec::new(),
        };
        assert_eq!(
            response.challenge_header(),
            Some(r#"Digest realm="r", nonce="n", qop="auth""#)
        );
    }

    #[test]
    fn challenge_header_is_none_when_absent() {
        let response = HttpResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        };
        assert_eq!(response.challenge_header(), None);
    }

    #[test]
    fn transport_error_carries_its_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = TransportError::with_source("connect failed", inner);
        assert_eq!(err.to_string(), "connect failed");
        assert!(StdError::source(&err).is_some());

        let bare = TransportError::new("dns lookup failed");
        assert!(StdError::source(&bare).is_none());
    }
}
